//! Reply drafting: prompt selection, model calls and category extraction.

mod categories;
mod drafter;
mod prompts;

pub use categories::{count_categories, format_counts, Category};
pub use drafter::ReplyDrafter;
pub use prompts::{PromptEntry, PromptSet};
