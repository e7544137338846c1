// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON Feed collection against a mock HTTP server.

use std::time::Duration;

use courier_core::{CourierError, SourceCollector, identity_for};
use courier_resilience::{RequestExecutor, RetryPolicy};
use courier_sources::JsonFeedCollector;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn collector(server: &MockServer) -> JsonFeedCollector {
    JsonFeedCollector::new(
        "campus-news",
        format!("{}/feed.json", server.uri()),
        RequestExecutor::with_policy(RetryPolicy::fixed(
            2,
            Duration::from_millis(10),
            Duration::from_secs(5),
        )),
    )
}

#[tokio::test]
async fn feed_items_become_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "version": "https://jsonfeed.org/version/1.1",
            "title": "Campus News",
            "items": [
                {
                    "id": "https://example.com/posts/1",
                    "title": "Library hours",
                    "content_text": "Open until 22:00 this week.",
                    "url": "https://example.com/posts/1",
                    "date_published": "2026-01-14T08:00:00Z",
                    "authors": [{"name": "Library"}]
                },
                {
                    "id": "2",
                    "content_html": "<p>Canteen closed</p>"
                },
                {
                    "title": "no id, no url"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = collector(&server).collect().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].identity, identity_for("https://example.com/posts/1"));
    assert_eq!(items[0].title.as_deref(), Some("Library hours"));
    assert_eq!(items[0].author.as_deref(), Some("Library"));
    assert!(items[0].published_at.is_some());
    assert_eq!(items[1].identity, identity_for("2"));
    assert_eq!(items[1].content, "<p>Canteen closed</p>");
}

#[tokio::test]
async fn transient_feed_outage_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .mount(&server)
        .await;

    assert!(collector(&server).collect().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_feed_is_a_source_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = collector(&server).collect().await.unwrap_err();
    assert!(matches!(err, CourierError::Source { ref source_name, .. } if source_name == "campus-news"));
    assert!(!err.is_run_fatal());
}

#[tokio::test]
async fn malformed_feed_is_a_source_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<rss></rss>"))
        .mount(&server)
        .await;

    let err = collector(&server).collect().await.unwrap_err();
    assert!(err.to_string().contains("not valid JSON Feed"), "got: {err}");
}
