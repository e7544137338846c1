// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential cache behaviour against a mocked token endpoint.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use courier_auth::{
    CachedToken, CredentialCache, CredentialSettings, FileTokenStore, MemoryTokenStore, TokenStore,
};
use courier_core::{AuthError, Clock};
use courier_resilience::{RequestExecutor, RetryPolicy};
use courier_test_utils::ManualClock;
use secrecy::{ExposeSecret, SecretString};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> CredentialSettings {
    CredentialSettings {
        token_url: format!("{}/oauth2/token", server.uri()),
        client_id: "client-123".into(),
        client_secret: SecretString::from("s3cr3t".to_string()),
        refresh_token: SecretString::from("rt-configured".to_string()),
        scope: None,
        margin: Duration::from_secs(120),
    }
}

fn executor() -> RequestExecutor {
    RequestExecutor::with_policy(RetryPolicy::fixed(
        3,
        Duration::from_millis(10),
        Duration::from_secs(5),
    ))
}

fn cache(
    server: &MockServer,
    store: Arc<dyn TokenStore>,
    clock: Arc<ManualClock>,
) -> CredentialCache {
    CredentialCache::new(settings(server), executor(), store, clock)
}

fn token_body(access_token: &str) -> serde_json::Value {
    serde_json::json!({
        "token_type": "Bearer",
        "access_token": access_token,
        "expires_in": 3600
    })
}

#[tokio::test]
async fn token_is_reused_until_it_expires() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-1")))
        .expect(2)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::fixed());
    let cache = cache(&server, Arc::new(MemoryTokenStore::new()), clock.clone());

    let first = cache.get_token().await.unwrap();
    let second = cache.get_token().await.unwrap();
    assert_eq!(first.expose_secret(), "at-1");
    assert_eq!(second.expose_secret(), "at-1");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    // Inside the safety margin counts as expired.
    clock.advance(Duration::from_secs(3600 - 60));
    cache.get_token().await.unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("at-shared"))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(cache(
        &server,
        Arc::new(MemoryTokenStore::new()),
        Arc::new(ManualClock::fixed()),
    ));

    let tasks = (0..5).map(|_| {
        let cache = cache.clone();
        async move { cache.get_token().await }
    });
    let tokens = futures::future::join_all(tasks).await;

    for token in tokens {
        assert_eq!(token.unwrap().expose_secret(), "at-shared");
    }
}

#[tokio::test]
async fn persisted_token_survives_a_new_process() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-persisted")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    let clock = Arc::new(ManualClock::fixed());

    let first_run = cache(&server, Arc::new(FileTokenStore::new(&path)), clock.clone());
    first_run.get_token().await.unwrap();
    drop(first_run);

    clock.advance(Duration::from_secs(600));
    let second_run = cache(&server, Arc::new(FileTokenStore::new(&path)), clock);
    let token = second_run.get_token().await.unwrap();
    assert_eq!(token.expose_secret(), "at-persisted");
}

#[tokio::test]
async fn expired_persisted_token_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-new")))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::fixed());
    let stale = CachedToken {
        access_token: SecretString::from("at-old".to_string()),
        expires_at: clock.now() - TimeDelta::minutes(5),
        refresh_token: None,
    };
    let cache = cache(&server, Arc::new(MemoryTokenStore::with_token(stale)), clock);

    assert_eq!(cache.get_token().await.unwrap().expose_secret(), "at-new");
}

#[tokio::test]
async fn rotated_refresh_token_is_used_next_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("refresh_token=rt-configured"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-1",
            "expires_in": 3600,
            "refresh_token": "rt-rotated"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("refresh_token=rt-rotated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-2")))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::fixed());
    let store = Arc::new(MemoryTokenStore::new());
    let cache = cache(&server, store.clone(), clock.clone());

    assert_eq!(cache.get_token().await.unwrap().expose_secret(), "at-1");
    clock.advance(Duration::from_secs(7200));
    assert_eq!(cache.get_token().await.unwrap().expose_secret(), "at-2");

    let stored = store.load().await.unwrap().expect("token persisted");
    assert_eq!(stored.access_token.expose_secret(), "at-2");
}

#[tokio::test]
async fn rotated_refresh_token_outlives_a_response_without_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("refresh_token=rt-configured"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-1",
            "expires_in": 3600,
            "refresh_token": "rt-rotated"
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("refresh_token=rt-rotated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-2")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("refresh_token=rt-rotated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-3")))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::fixed());
    let store = Arc::new(MemoryTokenStore::new());
    let cache = cache(&server, store.clone(), clock.clone());

    assert_eq!(cache.get_token().await.unwrap().expose_secret(), "at-1");
    clock.advance(Duration::from_secs(7200));
    assert_eq!(cache.get_token().await.unwrap().expose_secret(), "at-2");

    let stored = store.load().await.unwrap().expect("token persisted");
    let kept = stored.refresh_token.expect("rotated refresh token kept");
    assert_eq!(kept.expose_secret(), "rt-rotated");

    clock.advance(Duration::from_secs(7200));
    assert_eq!(cache.get_token().await.unwrap().expose_secret(), "at-3");
}

#[tokio::test]
async fn invalid_grant_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "AADSTS70008: The refresh token has expired."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = cache(
        &server,
        Arc::new(MemoryTokenStore::new()),
        Arc::new(ManualClock::fixed()),
    );
    let err = cache.get_token().await.unwrap_err();

    match err {
        AuthError::Rejected { status, code, .. } => {
            assert_eq!(status, 400);
            assert_eq!(code, "invalid_grant");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn outage_surfaces_as_unavailable_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let cache = cache(
        &server,
        Arc::new(MemoryTokenStore::new()),
        Arc::new(ManualClock::fixed()),
    );
    let err = cache.get_token().await.unwrap_err();
    assert!(matches!(err, AuthError::Unavailable { .. }), "got {err:?}");
}

#[tokio::test]
async fn invalidate_forces_a_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-1")))
        .expect(2)
        .mount(&server)
        .await;

    let cache = cache(
        &server,
        Arc::new(MemoryTokenStore::new()),
        Arc::new(ManualClock::fixed()),
    );
    cache.get_token().await.unwrap();
    cache.invalidate().await;
    cache.get_token().await.unwrap();
}
