//! One output file per run.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::OutputFormat;
use crate::errors::MentionsResult;

use super::report::RunReport;

const RECORD_MARKER_PREFIX: &str = "<!-- record: ";
const RECORD_MARKER_SUFFIX: &str = " -->";
const RECORD_HEADING_PREFIX: &str = "### ";

/// Writes run reports into an output directory.
pub struct ReportWriter {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl ReportWriter {
    #[must_use]
    pub fn new(output_dir: PathBuf, format: OutputFormat) -> Self {
        Self { output_dir, format }
    }

    /// Write `report` to `<YYYY-MM-DD_HHMM>.<ext>`, named after `now`.
    ///
    /// Never overwrites: a taken name gets a `-2`, `-3`, ... suffix.
    pub fn write(&self, report: &RunReport, now: DateTime<Utc>) -> MentionsResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let content = match self.format {
            OutputFormat::Markdown => report.to_markdown(),
            OutputFormat::Json => serde_json::to_string_pretty(report)?,
        };

        let stem = now.format("%Y-%m-%d_%H%M").to_string();
        let ext = self.format.extension();

        let mut attempt = 1u32;
        loop {
            let name = if attempt == 1 {
                format!("{stem}.{ext}")
            } else {
                format!("{stem}-{attempt}.{ext}")
            };
            let path = self.output_dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())?;
                    tracing::info!(
                        path = %path.display(),
                        records = report.records.len(),
                        "Wrote run report"
                    );
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Record IDs stored in a report file of either format.
///
/// The format is chosen by extension: `.json` is parsed as a [`RunReport`],
/// anything else is scanned for markdown record markers. A marker only
/// counts when it starts a line and the record heading follows it.
pub fn read_record_ids(path: &Path) -> MentionsResult<BTreeSet<String>> {
    let content = std::fs::read_to_string(path)?;

    if path.extension().is_some_and(|ext| ext == "json") {
        let report: RunReport = serde_json::from_str(&content)?;
        return Ok(report.records.into_iter().map(|r| r.id).collect());
    }

    let lines: Vec<&str> = content.lines().collect();
    Ok(lines
        .windows(2)
        .filter(|pair| pair[1].starts_with(RECORD_HEADING_PREFIX))
        .filter_map(|pair| {
            pair[0]
                .trim_end()
                .strip_prefix(RECORD_MARKER_PREFIX)?
                .strip_suffix(RECORD_MARKER_SUFFIX)
                .map(str::to_string)
        })
        .collect())
}
