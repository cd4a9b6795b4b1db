//! Post categories reported by the drafting model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Category the model assigns on the first line of its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TechnicalSupport,
    BugReport,
    MigrationQuestion,
    PerformanceIssue,
    GeneralDiscussion,
    JobPosting,
    Spam,
    Other,
}

impl Category {
    /// Get all categories.
    #[must_use]
    pub fn all() -> &'static [Category] {
        &[
            Category::TechnicalSupport,
            Category::BugReport,
            Category::MigrationQuestion,
            Category::PerformanceIssue,
            Category::GeneralDiscussion,
            Category::JobPosting,
            Category::Spam,
            Category::Other,
        ]
    }

    /// Human-readable label, as the model is asked to write it.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Category::TechnicalSupport => "Technical Support",
            Category::BugReport => "Bug Report",
            Category::MigrationQuestion => "Migration Question",
            Category::PerformanceIssue => "Performance Issue",
            Category::GeneralDiscussion => "General Discussion",
            Category::JobPosting => "Job Posting",
            Category::Spam => "Spam",
            Category::Other => "Other",
        }
    }

    /// Extract the category from a drafted reply.
    ///
    /// Only the first non-blank line is inspected. Unrecognized lines map to
    /// [`Category::Other`].
    pub fn from_reply(reply: &str) -> Self {
        let first_line = reply
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_lowercase();

        Self::all()
            .iter()
            .copied()
            .find(|c| first_line.contains(&c.label().to_lowercase()))
            .unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Count categories, most frequent first (ties by label).
pub fn count_categories<I>(categories: I) -> Vec<(Category, usize)>
where
    I: IntoIterator<Item = Category>,
{
    let mut counts: HashMap<Category, usize> = HashMap::new();
    for category in categories {
        *counts.entry(category).or_default() += 1;
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.label().cmp(b.0.label())));
    counts
}

/// Format counts as "3 Technical Support, 1 Spam", or "none".
pub fn format_counts(counts: &[(Category, usize)]) -> String {
    if counts.is_empty() {
        return "none".to_string();
    }
    counts
        .iter()
        .map(|(cat, n)| format!("{n} {cat}"))
        .collect::<Vec<_>>()
        .join(", ")
}
