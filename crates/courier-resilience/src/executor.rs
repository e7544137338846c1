// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The retrying request executor.
//!
//! Every outbound HTTP call in Courier goes through [`RequestExecutor::execute`]:
//! the credential refresh, record document reads and writes, feed fetches and
//! webhook deliveries. Only transient failures are retried; a definitive
//! client error returns immediately with the response body attached.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Request, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use crate::policy::{RetryPolicy, is_transient_status, retry_hint};

/// Failure of a request after the retry policy has been applied.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server answered with a non-retryable status (4xx other than 429).
    #[error("request rejected with status {status}: {body}")]
    Rejected {
        status: StatusCode,
        body: String,
        headers: HeaderMap,
    },

    /// Every attempt failed with a transient error.
    #[error("request failed after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: String },

    /// The request could not be built or sent at all (bad URL, bad header).
    #[error("request could not be built: {0}")]
    Build(#[source] reqwest::Error),
}

impl RequestError {
    /// Status of a definitive rejection, if that is what happened.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Outcome of one attempt that did not produce a usable response.
struct TransientFailure {
    message: String,
    hint: Option<Duration>,
}

impl TransientFailure {
    fn timed_out(timeout: Duration) -> Self {
        Self {
            message: format!("attempt timed out after {timeout:?}"),
            hint: None,
        }
    }
}

/// A client builder whose total request timeout matches the policy's
/// attempt timeout. Callers add their own settings (user agent) on top.
pub fn client_builder(policy: &RetryPolicy) -> reqwest::ClientBuilder {
    reqwest::Client::builder().timeout(policy.attempt_timeout)
}

/// Wraps a [`reqwest::Client`] with bounded retry and per-attempt timeouts.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Creates an executor whose client enforces the policy's attempt timeout.
    pub fn with_policy(policy: RetryPolicy) -> Self {
        let client = client_builder(&policy).build().unwrap_or_else(|e| {
            warn!(error = %e, "could not configure http client, using defaults");
            reqwest::Client::new()
        });
        Self::new(client, policy)
    }

    /// The client used to build requests for [`execute`](Self::execute).
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `request`, retrying connection errors, timeouts, 429 and 5xx.
    ///
    /// Any status below 400 is returned as-is; callers decide whether it is
    /// the success status they expected. Requests whose body cannot be cloned
    /// are sent once.
    pub async fn execute(&self, request: Request) -> Result<Response, RequestError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let method = request.method().clone();
        let url = redact_url(request.url());
        let mut pending = Some(request);
        let mut attempts = 0;
        let mut last = String::from("request was not attempted");

        while attempts < max_attempts {
            let req = match pending.as_ref().and_then(Request::try_clone) {
                Some(req) => req,
                None => match pending.take() {
                    Some(req) => req,
                    None => break,
                },
            };
            attempts += 1;

            let failure = match self.attempt(req).await? {
                Ok(response) => {
                    debug!(%method, %url, status = %response.status(), attempt = attempts, "request succeeded");
                    return Ok(response);
                }
                Err(failure) => failure,
            };

            last = failure.message;
            if attempts >= max_attempts || pending.is_none() {
                break;
            }

            let wait = self.policy.wait_before_retry(attempts, failure.hint);
            warn!(
                %method,
                %url,
                attempt = attempts,
                wait_ms = wait.as_millis() as u64,
                error = %last,
                "transient failure, will retry"
            );
            tokio::time::sleep(wait).await;
        }

        warn!(%method, %url, attempts, error = %last, "retries exhausted");
        Err(RequestError::Exhausted { attempts, last })
    }

    /// Runs one timed attempt. The outer `Result` carries fail-fast errors,
    /// the inner one a transient failure.
    ///
    /// The attempt timeout covers connecting, the response head and reading
    /// an error body. It also rides along on the request itself, so a caller
    /// reading a successful body is held to the same deadline.
    async fn attempt(
        &self,
        mut request: Request,
    ) -> Result<Result<Response, TransientFailure>, RequestError> {
        let timeout = self.policy.attempt_timeout;
        let deadline = tokio::time::Instant::now() + timeout;
        if request.timeout().is_none() {
            *request.timeout_mut() = Some(timeout);
        }

        let response = match tokio::time::timeout_at(deadline, self.client.execute(request)).await
        {
            Err(_) => return Ok(Err(TransientFailure::timed_out(timeout))),
            Ok(Err(e)) if e.is_builder() => return Err(RequestError::Build(e)),
            Ok(Err(e)) => {
                return Ok(Err(TransientFailure {
                    message: format!("transport error: {e}"),
                    hint: None,
                }));
            }
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_client_error() && !status.is_server_error() {
            return Ok(Ok(response));
        }

        let headers = response.headers().clone();
        let body = match tokio::time::timeout_at(deadline, response.text()).await {
            Err(_) => return Ok(Err(TransientFailure::timed_out(timeout))),
            Ok(body) => body.unwrap_or_default(),
        };

        if is_transient_status(status) {
            let hint = (status == StatusCode::TOO_MANY_REQUESTS)
                .then(|| retry_hint(&headers))
                .flatten();
            return Ok(Err(TransientFailure {
                message: format!("status {status}: {body}"),
                hint,
            }));
        }

        Err(RequestError::Rejected {
            status,
            body,
            headers,
        })
    }
}

/// Strips the query and any path segments after the first two, so webhook
/// tokens embedded in URLs do not end up in logs.
pub fn redact_url(url: &reqwest::Url) -> String {
    let host = url.host_str().unwrap_or("unknown-host");
    let mut segments = url
        .path_segments()
        .map(|s| s.take(2).collect::<Vec<_>>().join("/"))
        .unwrap_or_default();
    if url.path_segments().is_some_and(|s| s.count() > 2) {
        segments.push_str("/…");
    }
    format!("{}://{host}/{segments}", url.scheme())
}
