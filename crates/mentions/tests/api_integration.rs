//! Integration tests against mocked Reddit and Anthropic endpoints.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mentions::ai::{AIMessage, AIProvider, AnthropicProvider, GenerateOptions};
use mentions::config::{OutputFormat, RedditCredentials};
use mentions::drafting::{PromptSet, ReplyDrafter};
use mentions::pipeline::{Pipeline, PipelineConfig};
use mentions::reddit::{RedditClient, RedditEndpoints};
use mentions::source::{MentionSource, TimeWindow};
use mentions::storage::{read_record_ids, RunReport};
use mentions::{ItemKind, MentionsError};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

fn epoch(minutes_ago: i64) -> f64 {
    (now() - Duration::minutes(minutes_ago)).timestamp() as f64
}

fn credentials() -> RedditCredentials {
    RedditCredentials {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        user_agent: "mentions-test/0.1 by u/tester".to_string(),
    }
}

fn endpoints(server: &MockServer) -> RedditEndpoints {
    RedditEndpoints {
        token_url: format!("{}/api/v1/access_token", server.uri()),
        api_base: server.uri(),
    }
}

fn post(id: &str, title: &str, body: &str, minutes_ago: i64) -> Value {
    json!({
        "kind": "t3",
        "data": {
            "id": id,
            "name": format!("t3_{id}"),
            "title": title,
            "selftext": body,
            "author": "dba_person",
            "subreddit": "databases",
            "permalink": format!("/r/databases/comments/{id}/slug/"),
            "created_utc": epoch(minutes_ago)
        }
    })
}

fn comment(id: &str, body: &str, minutes_ago: i64) -> Value {
    json!({
        "kind": "t1",
        "data": {
            "name": format!("t1_{id}"),
            "body": body,
            "author": "",
            "subreddit": "databases",
            "permalink": format!("/r/databases/comments/p/slug/{id}/"),
            "created_utc": epoch(minutes_ago),
            "replies": ""
        }
    })
}

fn listing(children: Vec<Value>, after: Option<&str>) -> Value {
    json!({"kind": "Listing", "data": {"after": after, "children": children}})
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "reddit-token",
            "token_type": "bearer",
            "expires_in": 86400,
            "scope": "*"
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn claude_reply(text: &str) -> Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-20250514",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 120, "output_tokens": 48}
    })
}

mod reddit_tests {
    use super::*;

    #[tokio::test]
    async fn test_rejected_credentials_fail_connect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = RedditClient::connect_to(credentials(), 5, endpoints(&server))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, MentionsError::Api { status: 401, .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_search_pages_until_window_cutoff() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/r/all/search"))
            .and(query_param("after", "t3_p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(
                vec![
                    post("p2", "MySQL 8.4 upgrade", "", 300),
                    post("p3", "Old MySQL thread", "", 60 * 30),
                ],
                Some("t3_p3"),
            )))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/r/all/search"))
            .and(query_param("q", "mysql"))
            .and(query_param("sort", "new"))
            .and(query_param("t", "day"))
            .and(header("authorization", "Bearer reddit-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(
                vec![post("p1", "mysql replication lag", "", 10)],
                Some("t3_p2"),
            )))
            .with_priority(2)
            .expect(1)
            .mount(&server)
            .await;

        let client = RedditClient::connect_to(credentials(), 5, endpoints(&server))
            .await
            .unwrap();
        let window = TimeWindow::ending_at(now(), Duration::hours(24));
        let items = client.search_posts("mysql", &window).await.unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["t3_p1", "t3_p2"]);
        assert_eq!(
            items[0].permalink,
            "https://www.reddit.com/r/databases/comments/p1/slug/"
        );
    }

    #[tokio::test]
    async fn test_token_without_lifetime_is_reused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "reddit-token",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/r/all/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(Vec::new(), None)))
            .expect(2)
            .mount(&server)
            .await;

        let client = RedditClient::connect_to(credentials(), 5, endpoints(&server))
            .await
            .unwrap();
        let window = TimeWindow::ending_at(now(), Duration::hours(24));
        client.search_posts("mysql", &window).await.unwrap();
        client.search_posts("mariadb", &window).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_stops_at_page_limit() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/r/all/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(
                vec![post("p1", "mariadb", "", 10)],
                Some("t3_p1"),
            )))
            .expect(2)
            .mount(&server)
            .await;

        let client = RedditClient::connect_to(credentials(), 2, endpoints(&server))
            .await
            .unwrap();
        let window = TimeWindow::ending_at(now(), Duration::hours(24));
        let items = client.search_posts("mariadb", &window).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_thread_comments_flattened() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/comments/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                listing(vec![post("p1", "MariaDB question", "", 10)], None),
                listing(
                    vec![
                        comment("c1", "Try MariaDB 11.4", 5),
                        json!({"kind": "more", "data": {"count": 12, "children": ["c9"]}}),
                    ],
                    None
                ),
            ])))
            .mount(&server)
            .await;

        let client = RedditClient::connect_to(credentials(), 5, endpoints(&server))
            .await
            .unwrap();

        let thread = mentions::SourceItem {
            id: "t3_p1".to_string(),
            kind: ItemKind::Post,
            author: "dba_person".to_string(),
            title: "MariaDB question".to_string(),
            body: String::new(),
            subreddit: "databases".to_string(),
            permalink: "https://www.reddit.com/r/databases/comments/p1/slug/".to_string(),
            created_at: now() - Duration::minutes(10),
        };
        let comments = client.thread_comments(&thread).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, "t1_c1");
        assert_eq!(comments[0].kind, ItemKind::Comment);
        assert_eq!(comments[0].title, "MariaDB question");
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/r/all/search"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = RedditClient::connect_to(credentials(), 5, endpoints(&server))
            .await
            .unwrap();
        let window = TimeWindow::ending_at(now(), Duration::hours(24));
        let err = client.search_posts("mysql", &window).await.unwrap_err();
        assert_eq!(err.to_string(), "reddit API error (503): upstream down");
    }
}

mod anthropic_tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 1024
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(claude_reply("Bug Report\nPlease file it on JIRA.")),
            )
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("sk-test")
            .unwrap()
            .with_base_url(format!("{}/v1/messages", server.uri()));
        let response = provider
            .generate_text(
                "claude-sonnet-4-20250514",
                &[AIMessage::user("hello")],
                &GenerateOptions {
                    max_tokens: Some(1024),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.text, "Bug Report\nPlease file it on JIRA.");
        assert_eq!(response.usage.total(), 168);
    }

    #[tokio::test]
    async fn test_error_body_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("bad")
            .unwrap()
            .with_base_url(format!("{}/v1/messages", server.uri()));
        let err = provider
            .generate_text("sonnet", &[AIMessage::user("hi")], &GenerateOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "anthropic API error (401): authentication_error - invalid x-api-key"
        );
        assert!(err.is_fatal());
    }
}

mod run_tests {
    use super::*;

    async fn mount_search(server: &MockServer, keyword: &str, children: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/r/all/search"))
            .and(query_param("q", keyword))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(children, None)))
            .mount(server)
            .await;
    }

    async fn run(format: OutputFormat, claude_status: u16) -> (mentions::RunSummary, tempfile::TempDir) {
        let reddit = MockServer::start().await;
        mount_token(&reddit).await;
        mount_search(
            &reddit,
            "mariadb",
            vec![
                post("both", "MariaDB vs MySQL for a new app", "", 20),
                post("old", "MariaDB 10.3 EOL", "", 60 * 48),
            ],
        )
        .await;
        mount_search(
            &reddit,
            "mysql",
            vec![
                post("both", "MariaDB vs MySQL for a new app", "", 20),
                post("aside", "Postgres indexes", "we moved off MySQL last year", 40),
            ],
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/comments/both"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                listing(vec![], None),
                listing(vec![comment("c1", "MariaDB has better Galera support", 5)], None),
            ])))
            .mount(&reddit)
            .await;
        Mock::given(method("GET"))
            .and(path("/comments/aside"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&reddit)
            .await;

        let claude = MockServer::start().await;
        let response = if claude_status == 200 {
            ResponseTemplate::new(200).set_body_json(claude_reply("Migration Question\nBoth work well."))
        } else {
            ResponseTemplate::new(claude_status).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            }))
        };
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(response)
            .expect(3)
            .mount(&claude)
            .await;

        let client = RedditClient::connect_to(credentials(), 3, endpoints(&reddit))
            .await
            .unwrap();
        let provider = AnthropicProvider::new("sk-test")
            .unwrap()
            .with_base_url(format!("{}/v1/messages", claude.uri()));
        let drafter = ReplyDrafter::new(
            Arc::new(provider),
            PromptSet::new("community", "Draft a friendly reply.").unwrap(),
            "claude-sonnet-4-20250514".to_string(),
        );

        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            keywords: vec!["mariadb".to_string(), "mysql".to_string()],
            window: Duration::hours(24),
            output_dir: dir.path().join("output"),
            output_format: format,
            include_comments: true,
        };
        let summary = Pipeline::new(config, Arc::new(client), drafter)
            .run(now())
            .await
            .unwrap();
        (summary, dir)
    }

    #[tokio::test]
    async fn test_full_run_json() {
        let (summary, _dir) = run(OutputFormat::Json, 200).await;

        assert_eq!(summary.matched, 3);
        assert_eq!(summary.drafted, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.output_path.file_name().unwrap(), "2026-03-10_1200.json");

        let report: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&summary.output_path).unwrap()).unwrap();
        assert_eq!(report.prompt_name, "community");

        let ids: Vec<_> = report.records.iter().map(|r| r.id.clone()).collect();
        let unique: std::collections::BTreeSet<_> = ids.iter().cloned().collect();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(read_record_ids(&summary.output_path).unwrap(), unique);

        for record in &report.records {
            assert!(report.window.contains(record.created_at));
            assert!(record.suggested_reply.text().is_some_and(|t| !t.is_empty()));
        }

        let both = report.records.iter().find(|r| r.id == "t3_both").unwrap();
        assert_eq!(both.keywords, vec!["mariadb", "mysql"]);

        let comment = report.records.iter().find(|r| r.id == "t1_c1").unwrap();
        assert_eq!(comment.author, "[deleted]");
        assert_eq!(comment.title, "MariaDB vs MySQL for a new app");
    }

    #[tokio::test]
    async fn test_overloaded_model_flags_records() {
        let (summary, _dir) = run(OutputFormat::Markdown, 529).await;

        assert_eq!(summary.matched, 3);
        assert_eq!(summary.drafted, 0);
        assert_eq!(summary.failed, 3);

        let md = std::fs::read_to_string(&summary.output_path).unwrap();
        assert!(md.contains("**AI suggestion failed:** anthropic API error (529): overloaded_error - Overloaded"));
        assert_eq!(read_record_ids(&summary.output_path).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rejected_api_key_aborts_run() {
        let reddit = MockServer::start().await;
        mount_token(&reddit).await;
        mount_search(&reddit, "mariadb", vec![post("p1", "MariaDB help", "", 5)]).await;

        let claude = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&claude)
            .await;

        let client = RedditClient::connect_to(credentials(), 1, endpoints(&reddit))
            .await
            .unwrap();
        let provider = AnthropicProvider::new("bad")
            .unwrap()
            .with_base_url(format!("{}/v1/messages", claude.uri()));
        let drafter = ReplyDrafter::new(
            Arc::new(provider),
            PromptSet::builtin().unwrap(),
            "claude-sonnet-4-20250514".to_string(),
        );

        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            keywords: vec!["mariadb".to_string()],
            window: Duration::hours(24),
            output_dir: dir.path().to_path_buf(),
            output_format: OutputFormat::Markdown,
            include_comments: false,
        };
        let err = Pipeline::new(config, Arc::new(client), drafter)
            .run(now())
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
