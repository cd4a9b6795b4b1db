//! Mentions CLI - find Reddit posts mentioning tracked keywords and draft replies.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mentions::ai::AnthropicProvider;
use mentions::config::Config;
use mentions::drafting::{PromptSet, ReplyDrafter};
use mentions::pipeline::{Pipeline, PipelineConfig, RunSummary};
use mentions::reddit::RedditClient;

/// Search Reddit for keyword mentions over the last window and draft a
/// suggested reply for each one.
///
/// Configured entirely through environment variables.
#[derive(Parser)]
#[command(name = "mentions")]
#[command(version)]
struct Cli {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mentions=info,warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Everything that can be checked offline is checked before any request.
    let config = Config::from_env().context("Invalid configuration")?;
    let prompts = PromptSet::load(&config.prompts_file).with_context(|| {
        format!(
            "Failed to load prompts from {}",
            config.prompts_file.display()
        )
    })?;
    tracing::debug!(?config, "Loaded configuration");

    let provider = AnthropicProvider::new(config.anthropic_api_key.clone())
        .context("Failed to create Anthropic client")?;
    let drafter = ReplyDrafter::new(Arc::new(provider), prompts, config.model.clone());

    let reddit = RedditClient::connect(config.reddit.clone(), config.max_pages)
        .await
        .context("Failed to authenticate with Reddit")?;

    let pipeline = Pipeline::new(PipelineConfig::from(&config), Arc::new(reddit), drafter);
    let summary = pipeline.run(Utc::now()).await.context("Run failed")?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\n{}", "Mention Run Summary".bold().cyan());
    println!("   Fetched: {}", summary.fetched);
    println!("   Matched: {}", summary.matched);
    println!("   Drafted: {}", summary.drafted.to_string().green());
    if summary.failed > 0 {
        println!("   Failed:  {}", summary.failed.to_string().yellow());
    } else {
        println!("   Failed:  0");
    }
    println!("   Output:  {}", summary.output_path.display());
}
