//! Local-disk storage for recordings and screenshots
//!
//! Files land in `<root>/<recordings|screenshots>/<uuid>-<sanitized name>` and
//! are served read-only from `/uploads`. When a [`DriveMirror`] is configured the
//! same bytes are pushed to Google Drive; a mirroring failure is logged and the
//! local copy stays authoritative.

mod drive;

use std::io;
use std::path::{Component, Path, PathBuf};

use axum::body::Bytes;
use uuid::Uuid;

pub use drive::{DriveError, DriveMirror};

use crate::types::MediaKind;

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("uploaded file is empty")]
    Empty,
    #[error("expected a {expected} file, got '{found}'")]
    ContentType { expected: &'static str, found: String },
    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Metadata of a file written by [`UploadStore::save`]
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub original_name: String,
    /// Path relative to the uploads root, always with `/` separators
    pub stored_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub drive_file_id: Option<String>,
}

#[derive(Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: usize,
    drive: Option<DriveMirror>,
}

impl UploadStore {
    pub fn new(root: PathBuf, max_bytes: usize, drive: Option<DriveMirror>) -> Self {
        Self { root, max_bytes, drive }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Rejects empty, oversized or wrongly typed files before touching disk
    pub fn check(&self, kind: MediaKind, content_type: &str, len: usize) -> Result<(), UploadError> {
        if len == 0 {
            return Err(UploadError::Empty);
        }
        if len > self.max_bytes {
            return Err(UploadError::TooLarge { limit: self.max_bytes });
        }
        if !kind.accepts(content_type) {
            let expected = match kind {
                MediaKind::Recording => "video",
                MediaKind::Screenshot => "image",
            };
            return Err(UploadError::ContentType { expected, found: content_type.to_string() });
        }
        Ok(())
    }

    pub async fn save(
        &self,
        kind: MediaKind,
        original_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredFile, UploadError> {
        self.check(kind, content_type, bytes.len())?;

        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let dir = self.root.join(kind.directory());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &bytes).await?;

        let stored_path = format!("{}/{}", kind.directory(), file_name);
        tracing::debug!(path = %stored_path, size = bytes.len(), "Wrote upload to disk");

        let drive_file_id = match &self.drive {
            Some(drive) => match drive.upload(&file_name, content_type, bytes.clone()).await {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(path = %stored_path, error = %e, "Drive mirroring failed");
                    None
                }
            },
            None => None,
        };

        Ok(StoredFile {
            original_name: original_name.to_string(),
            stored_path,
            content_type: content_type.to_string(),
            size_bytes: bytes.len() as i64,
            drive_file_id,
        })
    }

    /// Deletes a stored file; an already missing file is not an error
    pub async fn remove(&self, stored_path: &str) -> Result<(), UploadError> {
        let Some(path) = self.resolve(stored_path) else {
            tracing::warn!(path = %stored_path, "Refusing to remove path outside uploads root");
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Joins a stored relative path onto the root, rejecting traversal
    fn resolve(&self, stored_path: &str) -> Option<PathBuf> {
        let relative = Path::new(stored_path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root.join(relative))
    }
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        return "file".to_string();
    }
    let start = trimmed.len().saturating_sub(MAX_NAME_LEN);
    trimmed[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, max: usize) -> UploadStore {
        UploadStore::new(dir.to_path_buf(), max, None)
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\clips\\lesson 1.mp4"), "lesson_1.mp4");
        assert_eq!(sanitize_file_name("수업.png"), "__.png");
        assert_eq!(sanitize_file_name("..."), "file");
    }

    #[tokio::test]
    async fn saves_and_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = store(dir.path(), 1024);

        let stored = uploads
            .save(MediaKind::Screenshot, "board.png", "image/png", Bytes::from_static(b"png-bytes"))
            .await
            .unwrap();
        assert!(stored.stored_path.starts_with("screenshots/"));
        assert!(stored.stored_path.ends_with("-board.png"));
        assert_eq!(stored.size_bytes, 9);
        assert!(stored.drive_file_id.is_none());

        let on_disk = dir.path().join(&stored.stored_path);
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"png-bytes");

        uploads.remove(&stored.stored_path).await.unwrap();
        assert!(!on_disk.exists());
        // second removal is a no-op
        uploads.remove(&stored.stored_path).await.unwrap();
    }

    #[tokio::test]
    async fn failed_mirroring_still_stores_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let drive = DriveMirror::new(crate::config::DriveConfig {
            client_email: "uploader@academy.iam.gserviceaccount.com".into(),
            private_key: "not a pem key".into(),
            folder_id: None,
            token_uri: "http://127.0.0.1:1/token".into(),
        });
        let uploads = UploadStore::new(dir.path().to_path_buf(), 1024, Some(drive));

        let stored = uploads
            .save(MediaKind::Recording, "lesson.mp4", "video/mp4", Bytes::from_static(b"mp4"))
            .await
            .unwrap();
        assert!(stored.drive_file_id.is_none());
        assert!(dir.path().join(&stored.stored_path).exists());
    }

    #[tokio::test]
    async fn rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = store(dir.path(), 4);

        let empty = uploads.save(MediaKind::Recording, "a.mp4", "video/mp4", Bytes::new()).await;
        assert!(matches!(empty, Err(UploadError::Empty)));

        let wrong = uploads
            .save(MediaKind::Recording, "a.png", "image/png", Bytes::from_static(b"abc"))
            .await;
        assert!(matches!(wrong, Err(UploadError::ContentType { expected: "video", .. })));

        let big = uploads
            .save(MediaKind::Recording, "a.mp4", "video/mp4", Bytes::from_static(b"too big"))
            .await;
        assert!(matches!(big, Err(UploadError::TooLarge { limit: 4 })));
    }

    #[test]
    fn resolve_rejects_traversal() {
        let uploads = store(Path::new("/srv/uploads"), 1);
        assert!(uploads.resolve("../secret").is_none());
        assert!(uploads.resolve("/etc/passwd").is_none());
        assert_eq!(
            uploads.resolve("recordings/x.mp4"),
            Some(PathBuf::from("/srv/uploads/recordings/x.mp4"))
        );
    }
}
