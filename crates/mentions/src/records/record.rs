//! The normalized record produced for every matched post or comment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::drafting::Category;
use crate::source::SourceItem;

/// Whether a record is a top-level post or a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    Comment,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => write!(f, "post"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

/// Drafting state of a record's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SuggestedReply {
    /// Not drafted yet.
    Pending,
    /// Drafted successfully; `text` is never empty.
    Drafted { text: String, category: Category },
    /// Generation failed for this record only.
    Failed { reason: String },
}

impl SuggestedReply {
    /// Reply text if drafting succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Drafted { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Category if drafting succeeded.
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Drafted { category, .. } => Some(*category),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A matched post or comment plus its drafted reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Type-prefixed unique ID, unique within a run.
    pub id: String,
    pub kind: ItemKind,
    pub author: String,
    /// Post title; for comments, the title of the thread.
    pub title: String,
    pub text: String,
    pub subreddit: String,
    pub permalink: String,
    pub created_at: DateTime<Utc>,
    /// Every tracked keyword this item mentions.
    pub keywords: Vec<String>,
    pub suggested_reply: SuggestedReply,
}

impl MatchRecord {
    /// Normalize a source item that matched `keyword`.
    #[must_use]
    pub fn from_item(item: SourceItem, keyword: &str) -> Self {
        let author = if item.author.trim().is_empty() {
            "[deleted]".to_string()
        } else {
            item.author
        };

        Self {
            id: item.id,
            kind: item.kind,
            author,
            title: item.title,
            text: item.body,
            subreddit: item.subreddit,
            permalink: item.permalink,
            created_at: item.created_at,
            keywords: vec![keyword.to_string()],
            suggested_reply: SuggestedReply::Pending,
        }
    }

    /// Whether this record mentions `keyword`.
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    /// Attach the drafting outcome. Records are only drafted once.
    pub fn attach_reply(&mut self, reply: SuggestedReply) {
        debug_assert!(
            self.suggested_reply == SuggestedReply::Pending,
            "reply attached twice to {}",
            self.id
        );
        self.suggested_reply = reply;
    }
}
