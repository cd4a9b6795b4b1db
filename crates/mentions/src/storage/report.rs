//! Run report and its markdown rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use uuid::Uuid;

use crate::drafting::{count_categories, format_counts, PromptSet};
use crate::records::{ItemKind, MatchRecord, SuggestedReply};
use crate::source::TimeWindow;

/// Bodies longer than this are cut in the markdown output.
const MAX_BODY_CHARS: usize = 1500;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Everything a run produced, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub window: TimeWindow,
    pub keywords: Vec<String>,
    pub prompt_name: String,
    pub prompt: String,
    pub records: Vec<MatchRecord>,
}

impl RunReport {
    /// Create a report for a finished run.
    #[must_use]
    pub fn new(
        generated_at: DateTime<Utc>,
        window: TimeWindow,
        keywords: Vec<String>,
        prompts: &PromptSet,
        records: Vec<MatchRecord>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at,
            window,
            keywords,
            prompt_name: prompts.name().to_string(),
            prompt: prompts.prompt().to_string(),
            records,
        }
    }

    /// Records that drafted successfully.
    pub fn drafted(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.suggested_reply.text().is_some())
            .count()
    }

    /// Records flagged as generation-failed.
    pub fn failed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.suggested_reply.is_failed())
            .count()
    }

    /// Render the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# Reddit Keyword Mentions\n\n");
        let _ = writeln!(
            md,
            "*Generated: {} | Window: {} to {}*\n",
            self.generated_at.format(TIMESTAMP_FORMAT),
            self.window.since.format(TIMESTAMP_FORMAT),
            self.window.until.format(TIMESTAMP_FORMAT),
        );

        for keyword in &self.keywords {
            let matching: Vec<&MatchRecord> = self
                .records
                .iter()
                .filter(|r| r.has_keyword(keyword))
                .collect();
            let posts = matching.iter().filter(|r| r.kind == ItemKind::Post).count();
            let comments = matching.len() - posts;
            let categories =
                count_categories(matching.iter().filter_map(|r| r.suggested_reply.category()));

            let _ = writeln!(md, "* **{keyword}:** {posts} posts, {comments} comments");
            let _ = writeln!(md, "  * {}", format_counts(&categories));
        }

        if self.keywords.len() > 1 {
            let all = self
                .records
                .iter()
                .filter(|r| self.keywords.iter().all(|k| r.has_keyword(k)))
                .count();
            let _ = writeln!(md, "* **All of {}:** {all}", self.keywords.join(", "));
        }

        let failed = self.failed();
        if failed > 0 {
            let _ = writeln!(md, "* **Generation failed:** {failed}");
        }

        // Free text is blockquoted; only record markers start a line with `<!--`.
        let _ = writeln!(
            md,
            "\n**AI prompt ({}):**\n\n{}\n",
            self.prompt_name,
            blockquote(self.prompt.trim())
        );
        md.push_str("---\n\n## Mentions\n\n");

        if self.records.is_empty() {
            md.push_str("*No mentions found.*\n");
            return md;
        }

        let mut records: Vec<&MatchRecord> = self.records.iter().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        for record in records {
            render_record(&mut md, record);
        }

        md
    }
}

fn render_record(md: &mut String, record: &MatchRecord) {
    let _ = writeln!(md, "<!-- record: {} -->", record.id);
    let _ = writeln!(
        md,
        "### [r/{sub}](https://reddit.com/r/{sub}) – [{title}]({url})",
        sub = record.subreddit,
        title = record.title.replace('\n', " "),
        url = record.permalink,
    );
    let _ = writeln!(
        md,
        "{} | {} by u/{} | {}\n",
        record.created_at.format(TIMESTAMP_FORMAT),
        record.kind,
        record.author,
        record.keywords.join(", "),
    );

    let body = record.text.trim();
    if !body.is_empty() {
        let _ = writeln!(md, "{}\n", blockquote(&truncate_body(body, &record.permalink)));
    }

    match &record.suggested_reply {
        SuggestedReply::Drafted { text, .. } => {
            let _ = writeln!(md, "**AI suggested comment:**\n\n{}\n", blockquote(text));
        }
        SuggestedReply::Failed { reason } => {
            let _ = writeln!(md, "**AI suggestion failed:** {}\n", reason.replace('\n', " "));
        }
        SuggestedReply::Pending => {
            md.push_str("**AI suggested comment:** *not drafted*\n\n");
        }
    }
}

/// Cut long text at a paragraph or sentence break and link to the rest.
fn truncate_body(body: &str, url: &str) -> String {
    let Some((cut, _)) = body.char_indices().nth(MAX_BODY_CHARS) else {
        return body.to_string();
    };

    let head = &body[..cut];
    let half = cut / 2;

    let head = match head.rfind("\n\n") {
        Some(idx) if idx > half => &head[..idx],
        _ => {
            let sentence = [". ", "! ", "? "]
                .iter()
                .filter_map(|end| head.rfind(end))
                .max();
            match sentence {
                Some(idx) if idx > half => &head[..=idx],
                _ => head,
            }
        }
    };

    format!(
        "{}\n\n*[... Click to read whole post/comment]({url})*",
        head.trim()
    )
}

fn blockquote(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
