//! Invoice total calculation and financial aggregation.
//!
//! Pure functions over invoice rows already fetched from the store. All
//! money math is integer cents; rounding happens once per line (half-up),
//! never on running sums.

use serde::Serialize;

use crate::schema::{Invoice, InvoiceLine, InvoiceStatus};

/// Computed totals for one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// Aggregated financials across a fetched invoice list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    /// Issued volume: sent + paid + overdue (drafts and cancelled excluded).
    pub invoiced_cents: i64,
    pub paid_cents: i64,
    /// Sent + overdue, i.e. everything still awaiting payment.
    pub outstanding_cents: i64,
    pub overdue_cents: i64,
    pub draft_count: usize,
    pub sent_count: usize,
    pub paid_count: usize,
    pub overdue_count: usize,
    pub cancelled_count: usize,
}

/// Quantity times unit price, rounded half-up to whole cents.
pub fn line_total_cents(line: &InvoiceLine) -> i64 {
    (line.quantity * line.unit_price_cents as f64).round() as i64
}

/// Totals for one invoice: line sum, clamped discount, percentage tax on
/// the discounted subtotal. Never negative.
pub fn totals(invoice: &Invoice) -> InvoiceTotals {
    let subtotal_cents: i64 = invoice.lines.iter().map(line_total_cents).sum();
    let discount_cents = invoice.discount_cents.clamp(0, subtotal_cents);
    let taxable = subtotal_cents - discount_cents;
    let tax_cents = (taxable as f64 * invoice.tax_rate / 100.0).round() as i64;
    InvoiceTotals {
        subtotal_cents,
        discount_cents,
        tax_cents,
        total_cents: taxable + tax_cents,
    }
}

/// Roll a list of invoices up into the admin dashboard summary.
pub fn summarize(invoices: &[Invoice]) -> FinancialSummary {
    let mut summary = FinancialSummary::default();
    for invoice in invoices {
        let total = totals(invoice).total_cents;
        match invoice.status {
            InvoiceStatus::Draft => summary.draft_count += 1,
            InvoiceStatus::Sent => {
                summary.sent_count += 1;
                summary.invoiced_cents += total;
                summary.outstanding_cents += total;
            }
            InvoiceStatus::Paid => {
                summary.paid_count += 1;
                summary.invoiced_cents += total;
                summary.paid_cents += total;
            }
            InvoiceStatus::Overdue => {
                summary.overdue_count += 1;
                summary.invoiced_cents += total;
                summary.outstanding_cents += total;
                summary.overdue_cents += total;
            }
            InvoiceStatus::Cancelled => summary.cancelled_count += 1,
        }
    }
    summary
}
