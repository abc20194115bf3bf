//! Output directory management.
//!
//! Every request writes into its own batch directory
//! `{root}/{batch_id}/` (UUID v7, time-ordered), so repeated or
//! concurrent requests never overwrite each other's files.

use std::path::{Path, PathBuf};

use illustrator_core::error::CoreError;
use illustrator_core::naming::is_safe_path_segment;
use serde::Serialize;
use uuid::Uuid;

use crate::error::PipelineError;

/// Root of all generated images.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

/// A file written by a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    /// Path as reported to clients, with `/` separators.
    pub path: String,
    /// Route that serves the file: `/image/{batch_id}/{filename}`.
    pub url: String,
    /// Size on disk in bytes.
    pub size_bytes: u64,
}

/// One request's output namespace.
#[derive(Debug)]
pub struct Batch {
    id: Uuid,
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if absent.
    pub async fn ensure_root(&self) -> Result<(), PipelineError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PipelineError::storage(&self.root, e))
    }

    /// Create a fresh batch directory.
    pub async fn begin_batch(&self) -> Result<Batch, PipelineError> {
        let id = Uuid::now_v7();
        let dir = self.root.join(id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PipelineError::storage(&dir, e))?;
        tracing::debug!(batch_id = %id, dir = %dir.display(), "Batch directory created");
        Ok(Batch {
            id,
            dir,
            written: Vec::new(),
        })
    }

    /// Resolve client-supplied path segments to a file under the root.
    ///
    /// Every segment must pass [`is_safe_path_segment`]; this closes
    /// directory traversal. The file must exist.
    pub async fn resolve(&self, segments: &[&str]) -> Result<PathBuf, CoreError> {
        if segments.is_empty() {
            return Err(CoreError::Validation("Empty image path".to_string()));
        }
        let mut path = self.root.clone();
        for segment in segments {
            if !is_safe_path_segment(segment) {
                return Err(CoreError::Validation(format!(
                    "Invalid path segment '{segment}'"
                )));
            }
            path.push(segment);
        }

        if is_file(&path).await {
            Ok(path)
        } else {
            Err(CoreError::NotFound(segments.join("/")))
        }
    }

    /// Resolve a bare filename: the root first, then batch directories
    /// from newest to oldest.
    ///
    /// Batch ids are UUID v7, so their order is creation order. The same
    /// filename recurs in every batch; this returns the most recent one.
    pub async fn resolve_latest(&self, filename: &str) -> Result<PathBuf, CoreError> {
        match self.resolve(&[filename]).await {
            Err(CoreError::NotFound(_)) => {}
            found_or_invalid => return found_or_invalid,
        }

        let mut batches: Vec<(Uuid, PathBuf)> = Vec::new();
        if let Ok(mut entries) = tokio::fs::read_dir(&self.root).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let id = entry
                    .file_name()
                    .to_str()
                    .and_then(|name| Uuid::parse_str(name).ok());
                if let Some(id) = id {
                    batches.push((id, entry.path()));
                }
            }
        }
        batches.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        for (_, dir) in batches {
            let candidate = dir.join(filename);
            if is_file(&candidate).await {
                return Ok(candidate);
            }
        }
        Err(CoreError::NotFound(filename.to_string()))
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

impl Batch {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to `filename` inside the batch directory.
    pub async fn write(&mut self, filename: &str, bytes: &[u8]) -> Result<StoredImage, PipelineError> {
        let path = self.dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PipelineError::storage(&path, e))?;

        let stored = StoredImage {
            path: display_path(&path),
            url: format!("/image/{}/{filename}", self.id),
            size_bytes: bytes.len() as u64,
        };
        self.written.push(path);
        Ok(stored)
    }

    /// Number of files written so far.
    pub fn written(&self) -> usize {
        self.written.len()
    }

    /// Remove the batch directory and everything written into it.
    pub async fn discard(self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            tracing::warn!(
                batch_id = %self.id,
                dir = %self.dir.display(),
                error = %e,
                "Failed to remove discarded batch",
            );
        } else {
            tracing::info!(batch_id = %self.id, files = self.written.len(), "Batch discarded");
        }
    }
}

/// Render a path with `/` separators regardless of platform.
fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn batch_directories_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());

        let a = store.begin_batch().await.unwrap();
        let b = store.begin_batch().await.unwrap();
        assert_ne!(a.id(), b.id());
        assert!(a.dir().is_dir());
        assert!(b.dir().is_dir());
    }

    #[tokio::test]
    async fn write_reports_path_and_size() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        let mut batch = store.begin_batch().await.unwrap();

        let stored = batch.write("story_scene_1.png", b"abc").await.unwrap();
        assert_eq!(stored.size_bytes, 3);
        assert_eq!(stored.url, format!("/image/{}/story_scene_1.png", batch.id()));
        assert!(stored.path.ends_with(&format!("{}/story_scene_1.png", batch.id())));
        assert_eq!(batch.written(), 1);
        assert_eq!(std::fs::read(batch.dir().join("story_scene_1.png")).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn discard_removes_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        let mut batch = store.begin_batch().await.unwrap();
        batch.write("a.png", b"x").await.unwrap();
        let dir = batch.dir().to_path_buf();

        batch.discard().await;
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn resolve_finds_batch_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        let mut batch = store.begin_batch().await.unwrap();
        batch.write("story_scene_1.png", b"x").await.unwrap();
        let id = batch.id().to_string();

        let path = store.resolve(&[id.as_str(), "story_scene_1.png"]).await.unwrap();
        assert_eq!(path, batch.dir().join("story_scene_1.png"));
    }

    #[tokio::test]
    async fn resolve_latest_prefers_newest_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        let mut older = store.begin_batch().await.unwrap();
        older.write("story_scene_1.png", b"old").await.unwrap();
        let mut newer = store.begin_batch().await.unwrap();
        newer.write("story_scene_1.png", b"new").await.unwrap();
        older.write("story_scene_2.png", b"only-old").await.unwrap();

        let path = store.resolve_latest("story_scene_1.png").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"new");

        let path = store.resolve_latest("story_scene_2.png").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"only-old");
    }

    #[tokio::test]
    async fn resolve_latest_checks_root_first_and_validates() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        let mut batch = store.begin_batch().await.unwrap();
        batch.write("legacy.png", b"batch").await.unwrap();
        std::fs::write(tmp.path().join("legacy.png"), b"root").unwrap();

        let path = store.resolve_latest("legacy.png").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"root");

        assert_matches!(
            store.resolve_latest("../legacy.png").await,
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            store.resolve_latest("missing.png").await,
            Err(CoreError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn resolve_rejects_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path().join("static"));
        store.ensure_root().await.unwrap();
        std::fs::write(tmp.path().join("secret.txt"), b"s").unwrap();

        assert_matches!(
            store.resolve(&["..", "secret.txt"]).await,
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            store.resolve(&["../secret.txt"]).await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn resolve_missing_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        assert_matches!(
            store.resolve(&["nope.png"]).await,
            Err(CoreError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn resolve_rejects_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let store = OutputStore::new(tmp.path());
        let batch = store.begin_batch().await.unwrap();
        let id = batch.id().to_string();
        assert_matches!(store.resolve(&[id.as_str()]).await, Err(CoreError::NotFound(_)));
    }
}
