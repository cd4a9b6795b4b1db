//! Keyword filtering and per-run de-duplication.

use std::collections::HashMap;

use crate::records::{ItemKind, MatchRecord};
use crate::source::{SourceItem, TimeWindow};

/// Outcome of offering an item to a [`RecordSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// New record created.
    Added,
    /// Already seen this run; keyword merged into the existing record.
    Merged,
    /// Item does not mention the keyword.
    NoMatch,
    /// Item falls outside the run's window.
    OutOfWindow,
}

/// Case-insensitive keyword check.
///
/// Posts match on title or body, comments on body only.
pub fn mentions_keyword(item: &SourceItem, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    let in_body = item.body.to_lowercase().contains(&needle);
    match item.kind {
        ItemKind::Post => in_body || item.title.to_lowercase().contains(&needle),
        ItemKind::Comment => in_body,
    }
}

/// Matched records for one run, unique by ID, in first-seen order.
#[derive(Debug)]
pub struct RecordSet {
    window: TimeWindow,
    records: Vec<MatchRecord>,
    by_id: HashMap<String, usize>,
}

impl RecordSet {
    #[must_use]
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            records: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Filter, normalize and de-duplicate one item found for `keyword`.
    pub fn offer(&mut self, item: SourceItem, keyword: &str) -> Offer {
        if !self.window.contains(item.created_at) {
            return Offer::OutOfWindow;
        }
        if !mentions_keyword(&item, keyword) {
            return Offer::NoMatch;
        }

        if let Some(&idx) = self.by_id.get(&item.id) {
            let record = &mut self.records[idx];
            if !record.has_keyword(keyword) {
                record.keywords.push(keyword.to_string());
            }
            return Offer::Merged;
        }

        self.by_id.insert(item.id.clone(), self.records.len());
        self.records.push(MatchRecord::from_item(item, keyword));
        Offer::Added
    }

    /// Whether an ID has already been recorded this run.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MatchRecord> {
        self.records
    }
}
