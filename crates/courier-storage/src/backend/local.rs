// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record documents as JSON files in a local directory.
//!
//! Writes use the write-to-temp-then-rename pattern: the temp file lives in
//! the target directory, is fsynced, renamed over the document, and the
//! directory is fsynced so the rename survives a power loss.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use courier_core::{DocumentBackend, StoreError};
use tracing::debug;

use super::check_document_name;

#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    directory: PathBuf,
}

impl LocalFileBackend {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, document: &str) -> PathBuf {
        self.directory.join(document)
    }
}

#[async_trait]
impl DocumentBackend for LocalFileBackend {
    fn describe(&self) -> String {
        format!("local directory {}", self.directory.display())
    }

    async fn read(&self, document: &str) -> Result<Option<Vec<u8>>, StoreError> {
        check_document_name(document).map_err(|message| StoreError::Load {
            document: document.to_string(),
            message,
        })?;

        let path = self.path_for(document);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "record document does not exist yet");
                Ok(None)
            }
            Err(e) => Err(StoreError::Load {
                document: document.to_string(),
                message: format!("{}: {e}", path.display()),
            }),
        }
    }

    async fn write(&self, document: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let save_error = |message: String| StoreError::Save {
            document: document.to_string(),
            message,
        };
        check_document_name(document).map_err(save_error)?;

        let directory = self.directory.clone();
        let path = self.path_for(document);
        tokio::task::spawn_blocking(move || save_atomic(&directory, &path, &bytes))
            .await
            .map_err(|e| save_error(format!("writer task failed: {e}")))?
            .map_err(|e| save_error(format!("{}: {e}", self.path_for(document).display())))
    }
}

fn save_atomic(directory: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(directory)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".courier-")
        .suffix(".tmp")
        .tempfile_in(directory)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    fsync_dir(directory)
}

#[cfg(unix)]
fn fsync_dir(directory: &Path) -> std::io::Result<()> {
    std::fs::File::open(directory)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_directory: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path());
        assert_eq!(backend.read("news_record.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_replaces_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path().join("state"));

        backend.write("news.json", b"{\"a\":1}".to_vec()).await.unwrap();
        backend.write("news.json", b"{}".to_vec()).await.unwrap();

        assert_eq!(
            backend.read("news.json").await.unwrap().as_deref(),
            Some(&b"{}"[..])
        );
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("state"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn unreadable_document_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("news.json")).unwrap();
        let backend = LocalFileBackend::new(dir.path());

        let err = backend.read("news.json").await.unwrap_err();
        assert!(matches!(err, StoreError::Load { .. }));
    }

    #[tokio::test]
    async fn path_traversal_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path());
        let err = backend.write("../escape.json", b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, StoreError::Save { .. }));
    }
}
