//! Source abstraction: where candidate posts and comments come from.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::MentionsResult;
use crate::records::ItemKind;

/// Bounded period a run covers, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl TimeWindow {
    /// The window of length `span` that ends at `until`.
    ///
    /// Spans reaching past the earliest representable time start there.
    #[must_use]
    pub fn ending_at(until: DateTime<Utc>, span: Duration) -> Self {
        Self {
            since: until
                .checked_sub_signed(span)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            until,
        }
    }

    /// Whether a timestamp falls inside the window.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.since && ts <= self.until
    }
}

/// A post or comment as returned by a source, before filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceItem {
    /// Type-prefixed unique ID (e.g. `t3_abc123`).
    pub id: String,
    pub kind: ItemKind,
    pub author: String,
    /// Post title; for comments, the title of the thread.
    pub title: String,
    /// Self-text for posts, body for comments. May be empty.
    pub body: String,
    pub subreddit: String,
    /// Absolute URL to the item.
    pub permalink: String,
    pub created_at: DateTime<Utc>,
}

/// Something that can be searched for keyword mentions.
#[async_trait]
pub trait MentionSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// Posts mentioning `keyword`, newest first, limited to roughly `window`.
    ///
    /// Implementations may return items slightly outside the window; the
    /// filter stage enforces it exactly.
    async fn search_posts(&self, keyword: &str, window: &TimeWindow)
        -> MentionsResult<Vec<SourceItem>>;

    /// All comments in the thread of `post`, flattened.
    async fn thread_comments(&self, post: &SourceItem) -> MentionsResult<Vec<SourceItem>>;
}
