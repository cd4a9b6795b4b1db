//! Prompt catalog and template rendering.

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{MentionsError, MentionsResult};

/// Name of the template that builds the user message.
const REPLY_TEMPLATE_NAME: &str = "reply";

/// User message sent for every record.
const REPLY_TEMPLATE: &str = r"{{prompt}}

Title: {{title}}{{#if body}}

{{body}}{{/if}}";

/// Prompt used when no prompt catalog exists.
const BUILTIN_PROMPT: &str = r"You help a database community team respond to Reddit posts and comments.

On the first line, write exactly one category for the post: Technical Support, Bug Report, Migration Question, Performance Issue, General Discussion, Job Posting, Spam, or Other.

Then draft a short, friendly, technically accurate reply the team could post. Do not invent facts, do not be promotional, and if the post is Spam or a Job Posting, say that no reply is needed.";

/// One entry of the prompt catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEntry {
    #[serde(default = "unnamed")]
    pub name: String,
    pub prompt: String,
    /// Marks the active prompt.
    #[serde(default, rename = "use")]
    pub active: bool,
}

fn unnamed() -> String {
    "unnamed".to_string()
}

#[derive(Debug, Deserialize)]
struct PromptFile {
    prompts: Vec<PromptEntry>,
}

/// The prompt selected for this run, plus the message template.
pub struct PromptSet {
    name: String,
    prompt: String,
    handlebars: Handlebars<'static>,
}

impl std::fmt::Debug for PromptSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptSet")
            .field("name", &self.name)
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ReplyContext<'a> {
    prompt: &'a str,
    title: &'a str,
    body: &'a str,
}

impl PromptSet {
    /// Create a prompt set around a specific prompt.
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> MentionsResult<Self> {
        let mut handlebars = Handlebars::new();
        // Prompts and Reddit text are plain text, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);
        handlebars
            .register_template_string(REPLY_TEMPLATE_NAME, REPLY_TEMPLATE)
            .map_err(|e| MentionsError::Prompt(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            prompt: prompt.into(),
            handlebars,
        })
    }

    /// The built-in prompt.
    pub fn builtin() -> MentionsResult<Self> {
        Self::new("builtin", BUILTIN_PROMPT)
    }

    /// Load the active prompt from a catalog file.
    ///
    /// A missing file falls back to the built-in prompt. A file that exists
    /// but has no entry with `"use": true` is an error.
    pub fn load(path: &Path) -> MentionsResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No prompt catalog, using built-in prompt");
            return Self::builtin();
        }

        let content = std::fs::read_to_string(path)?;
        let file: PromptFile = serde_json::from_str(&content).map_err(|e| {
            MentionsError::Prompt(format!("{} is not a valid prompt catalog: {e}", path.display()))
        })?;

        let entry = file
            .prompts
            .into_iter()
            .find(|p| p.active)
            .ok_or_else(|| {
                MentionsError::Prompt(format!(
                    "no prompt with \"use\": true found in {}",
                    path.display()
                ))
            })?;

        if entry.prompt.trim().is_empty() {
            return Err(MentionsError::Prompt(format!(
                "active prompt {:?} in {} is empty",
                entry.name,
                path.display()
            )));
        }

        tracing::info!(name = %entry.name, "Loaded active prompt");
        Self::new(entry.name, entry.prompt)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Render the user message for one post or comment.
    pub fn render(&self, title: &str, body: &str) -> MentionsResult<String> {
        let context = ReplyContext {
            prompt: &self.prompt,
            title,
            body: body.trim(),
        };
        Ok(self.handlebars.render(REPLY_TEMPLATE_NAME, &context)?)
    }
}
