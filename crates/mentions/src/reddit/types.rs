//! Reddit API data types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::records::ItemKind;
use crate::source::SourceItem;

/// Prefix for building absolute permalinks.
pub const REDDIT_WEB_BASE: &str = "https://www.reddit.com";

/// OAuth token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: i64,
}

/// A paginated listing of things.
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingData {
    /// Cursor for the next page.
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// A kind-tagged entry of a listing (`t3` link, `t1` comment, `more` stub).
///
/// `data` stays untyped until the kind is known.
#[derive(Debug, Deserialize)]
pub struct Thing {
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Data of a `t3` thing (a post).
#[derive(Debug, Deserialize)]
pub struct LinkData {
    /// Fullname, e.g. `t3_1abcde`.
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subreddit: String,
    pub permalink: String,
    pub created_utc: f64,
}

impl LinkData {
    /// Convert to a source item. Returns `None` for unrepresentable timestamps.
    pub fn into_item(self) -> Option<SourceItem> {
        Some(SourceItem {
            id: self.name,
            kind: ItemKind::Post,
            author: self.author,
            title: self.title,
            body: self.selftext,
            subreddit: self.subreddit,
            permalink: absolute_permalink(&self.permalink),
            created_at: from_epoch(self.created_utc)?,
        })
    }
}

/// Data of a `t1` thing (a comment).
#[derive(Debug, Deserialize)]
pub struct CommentData {
    /// Fullname, e.g. `t1_kxyz12`.
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    pub created_utc: f64,
    /// Either an empty string or a nested [`Listing`].
    #[serde(default)]
    pub replies: serde_json::Value,
}

impl CommentData {
    /// Convert to a source item belonging to a thread titled `thread_title`.
    pub fn to_item(&self, thread_title: &str) -> Option<SourceItem> {
        Some(SourceItem {
            id: self.name.clone(),
            kind: ItemKind::Comment,
            author: self.author.clone(),
            title: thread_title.to_string(),
            body: self.body.clone(),
            subreddit: self.subreddit.clone(),
            permalink: absolute_permalink(&self.permalink),
            created_at: from_epoch(self.created_utc)?,
        })
    }
}

/// Flatten a comment tree depth-first, skipping `more` stubs.
pub fn flatten_comments(children: Vec<Thing>, thread_title: &str, out: &mut Vec<SourceItem>) {
    for thing in children {
        if thing.kind != "t1" {
            continue;
        }
        let comment: CommentData = match serde_json::from_value(thing.data) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed comment");
                continue;
            }
        };

        if let Some(item) = comment.to_item(thread_title) {
            out.push(item);
        }

        if comment.replies.is_object() {
            match serde_json::from_value::<Listing>(comment.replies) {
                Ok(replies) => flatten_comments(replies.data.children, thread_title, out),
                Err(e) => tracing::debug!(error = %e, "Skipping malformed replies"),
            }
        }
    }
}

fn absolute_permalink(path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{REDDIT_WEB_BASE}{path}")
    }
}

fn from_epoch(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp(secs.trunc() as i64, 0)
}
