//! Weighted SEO scoring for content editors.
//!
//! Pure and deterministic: the same input always produces the same report,
//! and the check order never changes, so the editor UI can diff reports
//! without flicker. Regexes are compiled once at scorer construction.

use regex::Regex;
use serde::Serialize;

use crate::schema::SeoInput;

/// One rubric dimension with its pass/fail result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoCheck {
    pub label: &'static str,
    pub passed: bool,
    pub weight: u32,
}

/// The scored rubric: 0-100 overall plus the itemized checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoReport {
    pub score: u32,
    pub checks: Vec<SeoCheck>,
}

/// Scores content fields against a fixed seven-check rubric whose weights
/// sum to 100.
pub struct SeoScorer {
    tag_pattern: Regex,
    slug_pattern: Regex,
}

impl SeoScorer {
    pub fn new() -> Self {
        Self {
            tag_pattern: Regex::new(r"<[^>]*>").expect("static regex"),
            slug_pattern: Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("static regex"),
        }
    }

    pub fn score(&self, input: &SeoInput) -> SeoReport {
        let keyword = input.focus_keyword.trim().to_lowercase();
        let slug = input.slug.trim();
        let body = self.strip_tags(&input.content);
        let word_count = body.split_whitespace().count();

        let meta_title_len = input.meta_title.trim().chars().count();
        let meta_description_len = input.meta_description.trim().chars().count();

        // Hyphenated form for slug matching ("web design" -> "web-design").
        let slug_keyword = keyword.replace(' ', "-");

        let checks = vec![
            SeoCheck {
                label: "Meta title is 30-60 characters",
                passed: (30..=60).contains(&meta_title_len),
                weight: 15,
            },
            SeoCheck {
                label: "Meta description is 70-160 characters",
                passed: (70..=160).contains(&meta_description_len),
                weight: 15,
            },
            SeoCheck {
                label: "Focus keyword appears in the title",
                passed: !keyword.is_empty() && input.title.to_lowercase().contains(&keyword),
                weight: 15,
            },
            SeoCheck {
                label: "Focus keyword appears in the slug",
                passed: !keyword.is_empty() && slug.to_lowercase().contains(&slug_keyword),
                weight: 10,
            },
            SeoCheck {
                label: "Focus keyword appears early in the content",
                passed: !keyword.is_empty() && keyword_appears_early(&body, &keyword),
                weight: 15,
            },
            SeoCheck {
                label: "Content is at least 300 words",
                passed: word_count >= 300,
                weight: 20,
            },
            SeoCheck {
                label: "Slug is URL-safe (lowercase, hyphen-separated)",
                passed: self.slug_pattern.is_match(slug),
                weight: 10,
            },
        ];

        // Clamp guards against a misconfigured rubric; the shipped weights
        // sum to exactly 100.
        let score = checks
            .iter()
            .filter(|c| c.passed)
            .map(|c| c.weight)
            .sum::<u32>()
            .min(100);

        SeoReport { score, checks }
    }

    /// Naive tag stripping: replace anything `<...>` with a space and
    /// collapse whitespace. Not an HTML parser, and does not need to be.
    fn strip_tags(&self, html: &str) -> String {
        let stripped = self.tag_pattern.replace_all(html, " ");
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Default for SeoScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the keyword occurs within roughly the first 10% of the body
/// (by characters, keyword-length slack so a match may straddle the cut).
fn keyword_appears_early(body: &str, keyword: &str) -> bool {
    let lower = body.to_lowercase();
    let total = lower.chars().count();
    let window = total / 10 + keyword.chars().count();
    let prefix: String = lower.chars().take(window).collect();
    prefix.contains(keyword)
}
