// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record documents behind an authenticated HTTP document API.
//!
//! A document is fetched with `GET` and overwritten with a full-document `PUT`
//! at `url_template` with `{document}` substituted. Every call carries a
//! bearer token from the credential cache; a 401 invalidates the token and
//! the call is repeated once with a fresh one.

use std::sync::Arc;

use async_trait::async_trait;
use courier_auth::CredentialCache;
use courier_core::{DocumentBackend, StoreError};
use courier_resilience::{RequestError, RequestExecutor};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use super::check_document_name;

pub struct RemoteDocumentBackend {
    url_template: String,
    executor: RequestExecutor,
    credentials: Arc<CredentialCache>,
}

#[derive(Clone, Copy)]
enum Op {
    Load,
    Save,
}

impl RemoteDocumentBackend {
    pub fn new(
        url_template: impl Into<String>,
        executor: RequestExecutor,
        credentials: Arc<CredentialCache>,
    ) -> Self {
        Self {
            url_template: url_template.into(),
            executor,
            credentials,
        }
    }

    fn url_for(&self, document: &str) -> String {
        self.url_template.replace("{document}", document)
    }

    async fn send(
        &self,
        op: Op,
        document: &str,
        body: Option<&[u8]>,
    ) -> Result<Option<reqwest::Response>, StoreError> {
        let error = |message: String| match op {
            Op::Load => StoreError::Load {
                document: document.to_string(),
                message,
            },
            Op::Save => StoreError::Save {
                document: document.to_string(),
                message,
            },
        };
        check_document_name(document).map_err(error)?;

        let method = match op {
            Op::Load => Method::GET,
            Op::Save => Method::PUT,
        };
        let url = self.url_for(document);

        let mut refused_once = false;
        loop {
            let token = self
                .credentials
                .get_token()
                .await
                .map_err(|e| error(format!("no access token: {e}")))?;

            let mut builder = self
                .executor
                .client()
                .request(method.clone(), &url)
                .bearer_auth(token.expose_secret());
            if let Some(bytes) = body {
                builder = builder
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes.to_vec());
            }
            let request = builder.build().map_err(|e| error(e.to_string()))?;

            match self.executor.execute(request).await {
                Ok(response) => return Ok(Some(response)),
                Err(RequestError::Rejected { status, .. })
                    if status == StatusCode::UNAUTHORIZED && !refused_once =>
                {
                    warn!(document, "access token refused, refreshing once");
                    refused_once = true;
                    self.credentials.invalidate().await;
                }
                Err(RequestError::Rejected { status, .. })
                    if status == StatusCode::NOT_FOUND && matches!(op, Op::Load) =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(error(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl DocumentBackend for RemoteDocumentBackend {
    fn describe(&self) -> String {
        let host = reqwest::Url::parse(&self.url_template)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown host".to_string());
        format!("remote documents on {host}")
    }

    async fn read(&self, document: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(response) = self.send(Op::Load, document, None).await? else {
            debug!(document, "remote record document does not exist yet");
            return Ok(None);
        };

        let bytes = response.bytes().await.map_err(|e| StoreError::Load {
            document: document.to_string(),
            message: format!("reading body: {e}"),
        })?;
        Ok(Some(bytes.to_vec()))
    }

    async fn write(&self, document: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        if let Some(response) = self.send(Op::Save, document, Some(&bytes)).await? {
            debug!(document, status = %response.status(), "remote record document saved");
        }
        Ok(())
    }
}
