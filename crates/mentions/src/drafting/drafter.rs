//! Reply drafting using an AI provider.

use std::sync::Arc;

use crate::ai::{AIMessage, AIProvider, GenerateOptions};
use crate::errors::{MentionsError, MentionsResult};
use crate::records::{MatchRecord, SuggestedReply};

use super::categories::Category;
use super::prompts::PromptSet;

/// Token budget for a single drafted reply.
const REPLY_MAX_TOKENS: u32 = 1024;

/// Drafts suggested replies for match records.
pub struct ReplyDrafter {
    provider: Arc<dyn AIProvider>,
    prompts: PromptSet,
    model: String,
}

impl ReplyDrafter {
    /// Create a new drafter with the given AI provider.
    pub fn new(provider: Arc<dyn AIProvider>, prompts: PromptSet, model: String) -> Self {
        Self {
            provider,
            prompts,
            model,
        }
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    /// Draft a reply for one record.
    ///
    /// Record-level failures come back as [`SuggestedReply::Failed`]; only
    /// errors where [`MentionsError::is_fatal`] holds are returned as `Err`.
    pub async fn draft(&self, record: &MatchRecord) -> MentionsResult<SuggestedReply> {
        match self.generate(record).await {
            Ok(text) => {
                let category = Category::from_reply(&text);
                Ok(SuggestedReply::Drafted { text, category })
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(id = %record.id, error = %e, "Reply generation failed");
                Ok(SuggestedReply::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn generate(&self, record: &MatchRecord) -> MentionsResult<String> {
        let message = self.prompts.render(&record.title, &record.text)?;
        let messages = vec![AIMessage::user(message)];

        let options = GenerateOptions {
            max_tokens: Some(REPLY_MAX_TOKENS),
        };

        let response = self
            .provider
            .generate_text(&self.model, &messages, &options)
            .await?;

        tracing::debug!(
            id = %record.id,
            model = %response.model,
            tokens = response.usage.total(),
            "Drafted reply"
        );

        let text = response.text.trim();
        if text.is_empty() {
            return Err(MentionsError::EmptyReply(self.provider.name()));
        }
        Ok(text.to_string())
    }
}
