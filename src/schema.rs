//! Record and wire types for the agency site's content tables.
//!
//! These mirror the Postgres columns exposed through the Supabase REST API;
//! enum wire forms are the lowercase strings stored in the tables.

use serde::{Deserialize, Deserializer, Serialize};

/// Which rendered menu(s) a root item appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuLocation {
    Header,
    Footer,
    Both,
}

/// A concrete render target. `MenuLocation::Both` matches either slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuSlot {
    Header,
    Footer,
}

impl MenuLocation {
    /// Whether a root item with this location shows up in the given slot.
    pub fn visible_in(self, slot: MenuSlot) -> bool {
        match (self, slot) {
            (MenuLocation::Both, _) => true,
            (MenuLocation::Header, MenuSlot::Header) => true,
            (MenuLocation::Footer, MenuSlot::Footer) => true,
            _ => false,
        }
    }
}

/// A persisted navigation menu record.
///
/// The tree is stored flat: `parent_id` links to another record's `id`
/// (null = root), `sort_order` orders items within one sibling group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub link: String,
    pub location: MenuLocation,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
}

/// Create-form payload. `sort_order` is assigned by the editor (appended
/// to the end of the target sibling group), never by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub title: String,
    pub link: String,
    pub location: MenuLocation,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// A fully-specified record ready for insertion (id generated by the store).
#[derive(Debug, Clone, Serialize)]
pub struct InsertMenuItem {
    pub title: String,
    pub link: String,
    pub location: MenuLocation,
    pub parent_id: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
}

/// Partial update for a menu record. Absent fields are left untouched.
///
/// `parent_id` distinguishes "not in the patch" (`None`) from "set to null,
/// make this a root item" (`Some(None)`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub location: Option<MenuLocation>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<String>>,
    /// Never read from request bodies: `sort_order` is only written by the
    /// reorder operations, which renumber whole sibling groups and so
    /// cannot introduce duplicate ordering keys.
    #[serde(skip)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl MenuItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.link.is_none()
            && self.location.is_none()
            && self.parent_id.is_none()
            && self.sort_order.is_none()
            && self.is_active.is_none()
    }
}

/// Deserialize a present-but-possibly-null field into `Some(Option<T>)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// A node in the nested public menu view, derived on demand from the flat
/// record list. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MenuNode {
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

/// Textual/metadata fields of a content item (blog post, page, service)
/// as submitted by an editor for SEO scoring. Ephemeral, never persisted
/// by this service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoInput {
    pub title: String,
    pub slug: String,
    pub meta_title: String,
    pub meta_description: String,
    pub content: String,
    pub focus_keyword: String,
}

/// Invoice lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

/// One billable line on an invoice. Quantities are fractional (hours),
/// prices are integer cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: f64,
    pub unit_price_cents: i64,
}

/// An invoice row as stored in Supabase (`lines` is a jsonb column).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub number: String,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
    /// Tax applied to the discounted subtotal, in percent (e.g. 19.0).
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub issued_at: Option<String>,
}

/// A contact-form submission headed for the `contact_messages` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}
