//! Mention pipeline - orchestrates the fetch-filter-draft-persist flow.

use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, OutputFormat};
use crate::drafting::ReplyDrafter;
use crate::errors::MentionsResult;
use crate::records::{ItemKind, Offer, RecordSet};
use crate::source::{MentionSource, SourceItem, TimeWindow};
use crate::storage::{ReportWriter, RunReport};

/// Configuration for the mention pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Lowercased keywords to search for.
    pub keywords: Vec<String>,
    /// How far back a run looks.
    pub window: Duration,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    /// Also scan comment threads of matching posts.
    pub include_comments: bool,
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            keywords: config.keywords.clone(),
            window: config.window,
            output_dir: config.output_dir.clone(),
            output_format: config.output_format,
            include_comments: config.include_comments,
        }
    }
}

/// Result of a single run.
#[derive(Debug)]
pub struct RunSummary {
    /// Items returned by the source, before filtering.
    pub fetched: usize,
    /// Unique records kept.
    pub matched: usize,
    pub drafted: usize,
    pub failed: usize,
    pub output_path: PathBuf,
}

/// Mention pipeline orchestrator.
pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn MentionSource>,
    drafter: ReplyDrafter,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig, source: Arc<dyn MentionSource>, drafter: ReplyDrafter) -> Self {
        Self {
            config,
            source,
            drafter,
        }
    }

    /// Run once over the window ending at `now`.
    ///
    /// Stages run strictly in order. Errors returned here are fatal;
    /// record-level failures end up flagged in the report instead.
    pub async fn run(&self, now: DateTime<Utc>) -> MentionsResult<RunSummary> {
        let window = TimeWindow::ending_at(now, self.config.window);
        tracing::info!(
            source = self.source.name(),
            keywords = ?self.config.keywords,
            since = %window.since,
            until = %window.until,
            "Starting run"
        );

        let mut set = RecordSet::new(window);
        let mut fetched = 0;

        // Fetch + filter posts
        let mut threads: Vec<SourceItem> = Vec::new();
        for keyword in &self.config.keywords {
            let items = self.source.search_posts(keyword, &window).await?;
            fetched += items.len();
            tracing::info!(keyword = %keyword, fetched = items.len(), "Searched posts");

            for item in items {
                let post = item.clone();
                match set.offer(item, keyword) {
                    Offer::Added => threads.push(post),
                    Offer::Merged | Offer::NoMatch | Offer::OutOfWindow => {}
                }
            }
        }

        // Fetch + filter comments of matched threads
        if self.config.include_comments {
            for post in &threads {
                fetched += self.scan_thread(post, &mut set).await?;
            }
        }

        tracing::info!(fetched, matched = set.len(), "Filtered mentions");

        // Draft
        let mut records = set.into_records();
        for record in &mut records {
            let reply = self.drafter.draft(record).await?;
            record.attach_reply(reply);
        }

        // Persist
        let report = RunReport::new(
            now,
            window,
            self.config.keywords.clone(),
            self.drafter.prompts(),
            records,
        );
        let writer = ReportWriter::new(self.config.output_dir.clone(), self.config.output_format);
        let output_path = writer.write(&report, now)?;

        let summary = RunSummary {
            fetched,
            matched: report.records.len(),
            drafted: report.drafted(),
            failed: report.failed(),
            output_path,
        };

        tracing::info!(
            fetched = summary.fetched,
            matched = summary.matched,
            drafted = summary.drafted,
            failed = summary.failed,
            path = %summary.output_path.display(),
            "Run complete"
        );

        Ok(summary)
    }

    /// Offer every comment of one thread; returns how many were fetched.
    async fn scan_thread(&self, post: &SourceItem, set: &mut RecordSet) -> MentionsResult<usize> {
        debug_assert_eq!(post.kind, ItemKind::Post);

        let comments = match self.source.thread_comments(post).await {
            Ok(comments) => comments,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(post = %post.id, error = %e, "Skipping comment thread");
                return Ok(0);
            }
        };

        let fetched = comments.len();
        for comment in comments {
            for keyword in &self.config.keywords {
                set.offer(comment.clone(), keyword);
            }
        }
        Ok(fetched)
    }
}
