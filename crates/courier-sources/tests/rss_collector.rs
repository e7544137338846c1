// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RSS collection against a mock HTTP server.

use std::time::Duration;

use courier_config::model::{BatchMode, CollectorKind, SourceConfig, TransformKind};
use courier_core::{CourierError, SourceCollector, identity_for};
use courier_resilience::{RequestExecutor, RetryPolicy};
use courier_sources::collector_from_config;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NEWS_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>IT Services News</title>
    <link>https://itsc.example.edu/</link>
    <description>Service announcements</description>
    <item>
      <title>Scheduled maintenance of campus Wi-Fi</title>
      <link>https://itsc.example.edu/news/maintenance</link>
      <guid>https://itsc.example.edu/news/maintenance</guid>
      <description>Wi-Fi will be unavailable from 02:00 to 04:00.</description>
      <pubDate>Wed, 14 Jan 2026 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>New printing quota</title>
      <link>https://itsc.example.edu/news/printing</link>
      <description>Quota raised to 500 pages.</description>
    </item>
  </channel>
</rss>"#;

fn executor() -> RequestExecutor {
    RequestExecutor::with_policy(RetryPolicy::fixed(
        2,
        Duration::from_millis(10),
        Duration::from_secs(5),
    ))
}

fn rss_source(server: &MockServer) -> SourceConfig {
    SourceConfig {
        name: "itsc-news".into(),
        short_code: "itsc".into(),
        kind: CollectorKind::Rss,
        url: Some(format!("{}/rss.xml", server.uri())),
        webhook_url: Some("https://discord.com/api/webhooks/1/abc".into()),
        username: Some("ITSC News".into()),
        transform: TransformKind::Embed,
        batch: BatchMode::PerItem,
        retention_days: 7,
        max_item_age_days: Some(5),
        document: Some("rss_news_record.json".into()),
        color: Some(0x013466),
    }
}

#[tokio::test]
async fn rss_items_become_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss.xml"))
        .and(header_exists("accept"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(NEWS_RSS),
        )
        .expect(1)
        .mount(&server)
        .await;

    let collector = collector_from_config(&rss_source(&server), executor()).unwrap();
    assert_eq!(collector.name(), "itsc-news");
    let items = collector.collect().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0].identity,
        identity_for("https://itsc.example.edu/news/maintenance")
    );
    assert_eq!(
        items[0].title.as_deref(),
        Some("Scheduled maintenance of campus Wi-Fi")
    );
    assert_eq!(items[0].content, "Wi-Fi will be unavailable from 02:00 to 04:00.");
    assert!(items[0].published_at.is_some());
    assert_eq!(
        items[1].url.as_deref(),
        Some("https://itsc.example.edu/news/printing")
    );
    assert!(items[1].published_at.is_none());
}

#[tokio::test]
async fn same_feed_yields_same_identities_on_every_poll() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(NEWS_RSS))
        .expect(2)
        .mount(&server)
        .await;

    let collector = collector_from_config(&rss_source(&server), executor()).unwrap();
    let first: Vec<String> = collector
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.identity)
        .collect();
    let second: Vec<String> = collector
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.identity)
        .collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn html_page_instead_of_feed_is_a_source_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>login</body></html>"))
        .mount(&server)
        .await;

    let collector = collector_from_config(&rss_source(&server), executor()).unwrap();
    let err = collector.collect().await.unwrap_err();

    assert!(matches!(err, CourierError::Source { ref source_name, .. } if source_name == "itsc-news"));
    assert!(err.to_string().contains("not valid RSS or Atom"), "got: {err}");
    assert!(!err.is_run_fatal());
}
