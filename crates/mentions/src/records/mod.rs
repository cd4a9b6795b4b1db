//! Normalized match records and the filter stage that produces them.

mod filter;
mod record;

pub use filter::{mentions_keyword, Offer, RecordSet};
pub use record::{ItemKind, MatchRecord, SuggestedReply};
