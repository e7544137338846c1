// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feed download shared by the built-in collectors.

use courier_core::CourierError;
use courier_resilience::{RequestError, RequestExecutor, redact_url};

/// Downloads a feed document through the retrying executor.
///
/// Any failure, including a non-2xx answer, becomes a [`CourierError::Source`]
/// for `source_name`, so one broken feed never stops the other sources.
pub(crate) async fn fetch_feed(
    executor: &RequestExecutor,
    source_name: &str,
    url: &str,
    accept: &'static str,
) -> Result<Vec<u8>, CourierError> {
    let failure = |message: String| CourierError::Source {
        source_name: source_name.to_string(),
        message,
    };

    let request = executor
        .client()
        .get(url)
        .header(reqwest::header::ACCEPT, accept)
        .build()
        .map_err(|e| failure(format!("invalid feed url: {e}")))?;
    let target = redact_url(request.url());

    let response = executor.execute(request).await.map_err(|e| match e {
        RequestError::Rejected { status, .. } => failure(format!("feed {target} answered {status}")),
        other => failure(other.to_string()),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(failure(format!("feed {target} answered {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| failure(format!("failed to read feed body: {e}")))?;
    Ok(bytes.to_vec())
}
