//! Reddit search client.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::RedditCredentials;
use crate::errors::{MentionsError, MentionsResult};
use crate::source::{MentionSource, SourceItem, TimeWindow};

use super::auth::{fetch_token, AccessToken};
use super::types::{flatten_comments, LinkData, Listing};

const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Max results Reddit returns per listing page.
const PAGE_LIMIT: u32 = 100;

/// Max comments requested per thread.
const COMMENT_LIMIT: u32 = 500;

/// Where the client sends requests.
#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    pub token_url: String,
    pub api_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            token_url: REDDIT_TOKEN_URL.to_string(),
            api_base: REDDIT_API_BASE.to_string(),
        }
    }
}

/// Authenticated Reddit API client.
pub struct RedditClient {
    client: Client,
    credentials: RedditCredentials,
    endpoints: RedditEndpoints,
    token: Mutex<AccessToken>,
    max_pages: usize,
}

impl RedditClient {
    /// Authenticate against Reddit's production endpoints.
    pub async fn connect(credentials: RedditCredentials, max_pages: usize) -> MentionsResult<Self> {
        Self::connect_to(credentials, max_pages, RedditEndpoints::default()).await
    }

    /// Authenticate against specific endpoints.
    pub async fn connect_to(
        credentials: RedditCredentials,
        max_pages: usize,
        endpoints: RedditEndpoints,
    ) -> MentionsResult<Self> {
        let client = Client::builder()
            .user_agent(credentials.user_agent.clone())
            .timeout(Duration::from_secs(30))
            .build()?;

        let token = fetch_token(&client, &endpoints.token_url, &credentials).await?;

        Ok(Self {
            client,
            credentials,
            endpoints,
            token: Mutex::new(token),
            max_pages: max_pages.max(1),
        })
    }

    /// Current bearer token, refreshed if it has expired.
    async fn bearer(&self) -> MentionsResult<String> {
        let mut token = self.token.lock().await;
        if token.is_expired(Utc::now()) {
            tracing::info!("Reddit access token expired, refreshing");
            *token = fetch_token(&self.client, &self.endpoints.token_url, &self.credentials).await?;
        }
        Ok(token.value.clone())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> MentionsResult<T> {
        let url = format!("{}{path}", self.endpoints.api_base.trim_end_matches('/'));
        let bearer = self.bearer().await?;

        let response = self
            .client
            .get(&url)
            .bearer_auth(bearer)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MentionsError::Api {
                service: "reddit",
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Reddit's coarse `t` filter covering the window.
fn time_filter(window: &TimeWindow) -> &'static str {
    let hours = (window.until - window.since).num_hours();
    match hours {
        h if h <= 1 => "hour",
        h if h <= 24 => "day",
        h if h <= 24 * 7 => "week",
        h if h <= 24 * 31 => "month",
        h if h <= 24 * 366 => "year",
        _ => "all",
    }
}

#[async_trait]
impl MentionSource for RedditClient {
    fn name(&self) -> &'static str {
        "reddit"
    }

    async fn search_posts(
        &self,
        keyword: &str,
        window: &TimeWindow,
    ) -> MentionsResult<Vec<SourceItem>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        for page in 1..=self.max_pages {
            let mut query = vec![
                ("q", keyword.to_string()),
                ("sort", "new".to_string()),
                ("t", time_filter(window).to_string()),
                ("type", "link".to_string()),
                ("limit", PAGE_LIMIT.to_string()),
                ("raw_json", "1".to_string()),
            ];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let listing: Listing = self.get_json("/r/all/search", &query).await?;
            let returned = listing.data.children.len();
            let mut reached_cutoff = false;

            for thing in listing.data.children {
                if thing.kind != "t3" {
                    continue;
                }
                let link: LinkData = match serde_json::from_value(thing.data) {
                    Ok(link) => link,
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping malformed post");
                        continue;
                    }
                };
                let Some(item) = link.into_item() else {
                    continue;
                };
                if item.created_at < window.since {
                    reached_cutoff = true;
                    continue;
                }
                items.push(item);
            }

            tracing::debug!(keyword, page, returned, total = items.len(), "Fetched search page");

            after = listing.data.after;
            if reached_cutoff || after.is_none() || returned == 0 {
                break;
            }
            if page == self.max_pages {
                tracing::warn!(keyword, max_pages = self.max_pages, "Search page limit reached");
            }
        }

        Ok(items)
    }

    async fn thread_comments(&self, post: &SourceItem) -> MentionsResult<Vec<SourceItem>> {
        let article = post.id.strip_prefix("t3_").unwrap_or(&post.id);
        let query = [
            ("sort", "new".to_string()),
            ("limit", COMMENT_LIMIT.to_string()),
            ("raw_json", "1".to_string()),
        ];

        // [0] is the post itself, [1] the comment tree.
        let listings: Vec<Listing> = self
            .get_json(&format!("/comments/{article}"), &query)
            .await?;

        let mut comments = Vec::new();
        if let Some(tree) = listings.into_iter().nth(1) {
            flatten_comments(tree.data.children, &post.title, &mut comments);
        }

        tracing::debug!(post = %post.id, comments = comments.len(), "Fetched thread comments");
        Ok(comments)
    }
}
