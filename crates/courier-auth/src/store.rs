// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token persistence between process runs.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use courier_core::AuthError;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::token::{CachedToken, StoredToken};

/// Where a [`CachedToken`] survives between runs.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Returns the persisted token, or `None` when nothing usable is stored.
    async fn load(&self) -> Result<Option<CachedToken>, AuthError>;

    async fn save(&self, token: &CachedToken) -> Result<(), AuthError>;
}

/// Keeps the token in process memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<CachedToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a token already stored, as if saved by an earlier run.
    pub fn with_token(token: CachedToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<CachedToken>, AuthError> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &CachedToken) -> Result<(), AuthError> {
        *self.token.lock().await = Some(token.clone());
        Ok(())
    }
}

/// JSON file holding the access token, its expiry and any rotated refresh
/// token. Written atomically with owner-only permissions.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<CachedToken>, AuthError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached token file");
                return Ok(None);
            }
            Err(e) => {
                return Err(AuthError::Persist {
                    message: format!("reading {}: {e}", self.path.display()),
                });
            }
        };

        // An unreadable cache only costs one refresh.
        match serde_json::from_slice::<StoredToken>(&bytes) {
            Ok(stored) => Ok(Some(stored.into())),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt token cache");
                Ok(None)
            }
        }
    }

    async fn save(&self, token: &CachedToken) -> Result<(), AuthError> {
        let bytes = serde_json::to_vec_pretty(&token.to_stored()).map_err(|e| {
            AuthError::Persist {
                message: format!("serializing token: {e}"),
            }
        })?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| AuthError::Persist {
                message: format!("token writer panicked: {e}"),
            })?
            .map_err(|e| AuthError::Persist {
                message: format!("writing {}: {e}", self.path.display()),
            })
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    // NamedTempFile is created 0600 on unix.
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use secrecy::{ExposeSecret, SecretString};

    fn token() -> CachedToken {
        CachedToken {
            access_token: SecretString::from("at-1".to_string()),
            expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            refresh_token: Some(SecretString::from("rt-rotated".to_string())),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saved_token_is_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested/token.json"));
        store.save(&token()).await.unwrap();

        let loaded = store.load().await.unwrap().expect("token should be stored");
        assert_eq!(loaded.access_token.expose_secret(), "at-1");
        assert_eq!(loaded.expires_at, token().expires_at);
        assert_eq!(
            loaded.refresh_token.map(|t| t.expose_secret().to_string()),
            Some("rt-rotated".to_string())
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileTokenStore::new(path);
        assert!(store.load().await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        FileTokenStore::new(&path).save(&token()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[tokio::test]
    async fn memory_store_keeps_last_saved_token() {
        let store = MemoryTokenStore::new();
        assert!(store.load().await.unwrap().is_none());
        store.save(&token()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
    }
}
