//! Runtime configuration loaded from environment variables.

use chrono::Duration;
use std::path::PathBuf;
use thiserror::Error;

/// Reddit app client ID.
pub const ENV_REDDIT_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
/// Reddit app client secret.
pub const ENV_REDDIT_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
/// User-Agent sent with every Reddit request.
pub const ENV_REDDIT_USER_AGENT: &str = "REDDIT_USER_AGENT";
/// Anthropic API key.
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

const ENV_KEYWORDS: &str = "MENTIONS_KEYWORDS";
const ENV_WINDOW_HOURS: &str = "MENTIONS_WINDOW_HOURS";
const ENV_OUTPUT_DIR: &str = "MENTIONS_OUTPUT_DIR";
const ENV_OUTPUT_FORMAT: &str = "MENTIONS_OUTPUT_FORMAT";
const ENV_MODEL: &str = "MENTIONS_MODEL";
const ENV_PROMPTS_FILE: &str = "MENTIONS_PROMPTS_FILE";
const ENV_INCLUDE_COMMENTS: &str = "MENTIONS_INCLUDE_COMMENTS";
const ENV_MAX_PAGES: &str = "MENTIONS_MAX_PAGES";

/// Default keywords to track.
pub const DEFAULT_KEYWORDS: &[&str] = &["mariadb", "mysql"];

/// Default look-back window in hours.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Longest accepted look-back window in hours (ten years).
pub const MAX_WINDOW_HOURS: i64 = 24 * 365 * 10;

/// Default model for reply drafting.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default cap on search result pages per keyword.
pub const DEFAULT_MAX_PAGES: usize = 10;

/// Configuration errors. All of them abort the run before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required variables are unset or blank
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// A variable is set but cannot be parsed
    #[error("invalid value for {var} ({value:?}): {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Output file format for a run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Operator-readable markdown.
    #[default]
    Markdown,
    /// Structured JSON.
    Json,
}

impl OutputFormat {
    /// File extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Reddit application credentials.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Full configuration for one run.
#[derive(Clone)]
pub struct Config {
    pub reddit: RedditCredentials,
    pub anthropic_api_key: String,
    /// Lowercased, de-duplicated keywords.
    pub keywords: Vec<String>,
    pub window: Duration,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub model: String,
    pub prompts_file: PathBuf,
    /// Also scan comment threads of matching posts.
    pub include_comments: bool,
    pub max_pages: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("reddit", &self.reddit)
            .field("anthropic_api_key", &"<redacted>")
            .field("keywords", &self.keywords)
            .field("window", &self.window)
            .field("output_dir", &self.output_dir)
            .field("output_format", &self.output_format)
            .field("model", &self.model)
            .field("prompts_file", &self.prompts_file)
            .field("include_comments", &self.include_comments)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl Config {
    /// Create configuration from the process environment.
    ///
    /// # Required Environment Variables
    /// - `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, `REDDIT_USER_AGENT`
    /// - `ANTHROPIC_API_KEY`
    ///
    /// # Optional Environment Variables
    /// - `MENTIONS_KEYWORDS`: comma-separated (default: mariadb,mysql)
    /// - `MENTIONS_WINDOW_HOURS`: look-back window (default: 24)
    /// - `MENTIONS_OUTPUT_DIR`: report directory (default: output)
    /// - `MENTIONS_OUTPUT_FORMAT`: markdown or json (default: markdown)
    /// - `MENTIONS_MODEL`: Claude model (default: claude-sonnet-4-20250514)
    /// - `MENTIONS_PROMPTS_FILE`: prompt catalog (default: prompts.json)
    /// - `MENTIONS_INCLUDE_COMMENTS`: scan comment threads (default: true)
    /// - `MENTIONS_MAX_PAGES`: search pages per keyword (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |name: &'static str| {
            get(name).unwrap_or_else(|| {
                missing.push(name);
                String::new()
            })
        };

        let client_id = required(ENV_REDDIT_CLIENT_ID);
        let client_secret = required(ENV_REDDIT_CLIENT_SECRET);
        let user_agent = required(ENV_REDDIT_USER_AGENT);
        let anthropic_api_key = required(ENV_ANTHROPIC_API_KEY);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let keywords = match get(ENV_KEYWORDS) {
            Some(raw) => parse_keywords(&raw).ok_or_else(|| ConfigError::Invalid {
                var: ENV_KEYWORDS,
                value: raw.clone(),
                reason: "expected at least one keyword".to_string(),
            })?,
            None => DEFAULT_KEYWORDS.iter().map(ToString::to_string).collect(),
        };

        let window_hours = parse_number(get(ENV_WINDOW_HOURS), ENV_WINDOW_HOURS)?
            .unwrap_or(DEFAULT_WINDOW_HOURS);
        let window = Some(window_hours)
            .filter(|h| (1..=MAX_WINDOW_HOURS).contains(h))
            .and_then(Duration::try_hours)
            .ok_or_else(|| ConfigError::Invalid {
                var: ENV_WINDOW_HOURS,
                value: window_hours.to_string(),
                reason: format!("window must be between 1 and {MAX_WINDOW_HOURS} hours"),
            })?;

        let output_format = match get(ENV_OUTPUT_FORMAT) {
            Some(raw) => OutputFormat::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                var: ENV_OUTPUT_FORMAT,
                value: raw.clone(),
                reason: "expected markdown or json".to_string(),
            })?,
            None => OutputFormat::default(),
        };

        let include_comments = match get(ENV_INCLUDE_COMMENTS) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                var: ENV_INCLUDE_COMMENTS,
                value: raw.clone(),
                reason: "expected true or false".to_string(),
            })?,
            None => true,
        };

        let max_pages =
            parse_number(get(ENV_MAX_PAGES), ENV_MAX_PAGES)?.unwrap_or(DEFAULT_MAX_PAGES);

        Ok(Self {
            reddit: RedditCredentials {
                client_id,
                client_secret,
                user_agent,
            },
            anthropic_api_key,
            keywords,
            window,
            output_dir: get(ENV_OUTPUT_DIR).map_or_else(|| PathBuf::from("output"), PathBuf::from),
            output_format,
            model: get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            prompts_file: get(ENV_PROMPTS_FILE)
                .map_or_else(|| PathBuf::from("prompts.json"), PathBuf::from),
            include_comments,
            max_pages: max_pages.max(1),
        })
    }
}

fn parse_keywords(raw: &str) -> Option<Vec<String>> {
    let mut keywords: Vec<String> = Vec::new();
    for kw in raw.split(',').map(|k| k.trim().to_lowercase()) {
        if !kw.is_empty() && !keywords.contains(&kw) {
            keywords.push(kw);
        }
    }
    (!keywords.is_empty()).then_some(keywords)
}

fn parse_number<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.map(|v| {
        v.parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            value: v.clone(),
            reason: e.to_string(),
        })
    })
    .transpose()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
