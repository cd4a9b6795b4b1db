//! Application-only OAuth for the Reddit API.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;

use crate::config::RedditCredentials;
use crate::errors::{MentionsError, MentionsResult};

use super::types::TokenResponse;

/// Lifetime assumed when the token response carries none.
const FALLBACK_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Bearer token for `oauth.reddit.com`.
#[derive(Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Fetch a token using the client-credentials grant.
pub async fn fetch_token(
    client: &Client,
    token_url: &str,
    credentials: &RedditCredentials,
) -> MentionsResult<AccessToken> {
    tracing::debug!(url = token_url, "Requesting Reddit access token");

    let response = client
        .post(token_url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
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

    let token: TokenResponse = response.json().await?;
    if token.access_token.is_empty() {
        // Reddit answers 200 with an error body for bad credentials.
        return Err(MentionsError::Api {
            service: "reddit",
            status: 401,
            body: "token endpoint returned no access_token".to_string(),
        });
    }

    tracing::info!(
        token_type = %token.token_type,
        expires_in = token.expires_in,
        "Obtained Reddit access token"
    );

    Ok(AccessToken {
        expires_at: Utc::now() + token_lifetime(token.expires_in),
        value: token.access_token,
    })
}

fn token_lifetime(expires_in: i64) -> Duration {
    Duration::try_seconds(expires_in)
        .filter(|d| *d > Duration::zero())
        .unwrap_or_else(|| Duration::seconds(FALLBACK_TOKEN_LIFETIME_SECS))
}
