use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 64;

/// An uploaded image staged on disk for the duration of one batch.
///
/// The file is deleted exactly once: by [`TempImage::release`] on the normal
/// path, or by `Drop` if the guard goes away any other way (early return,
/// panic, cancelled task).
#[derive(Debug)]
pub struct TempImage {
    path: PathBuf,
    original_name: String,
    released: bool,
}

impl TempImage {
    /// Write `data` into `dir` under a collision-free name and guard it.
    pub async fn stage(dir: &Path, original_name: &str, data: &[u8]) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let guard = Self::adopt(dir.join(unique_file_name(original_name)), original_name);
        // On a failed write the guard drops and removes any partial file.
        tokio::fs::write(&guard.path, data).await?;
        Ok(guard)
    }

    /// Take ownership of a file someone else already wrote.
    pub fn adopt(path: PathBuf, original_name: impl Into<String>) -> Self {
        Self { path, original_name: original_name.into(), released: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Delete the file now. A file that is already gone counts as deleted.
    pub async fn release(mut self) -> io::Result<()> {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "Failed to delete staged image: {e}");
            }
        }
    }
}

/// `<unix-millis>-<uuid>-<sanitized name>`
fn unique_file_name(original_name: &str) -> String {
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize_file_name(original_name)
    )
}

/// Keep only the final path component and a conservative character set.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let clean: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .take(MAX_NAME_LEN)
        .collect();
    let clean = clean.trim_start_matches('.');
    if clean.is_empty() { "upload".to_string() } else { clean.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stage_writes_file_and_release_deletes_it() {
        let dir = tempfile::tempdir().unwrap();
        let img = TempImage::stage(dir.path(), "card.png", b"pixels").await.unwrap();
        let path = img.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(img.read().await.unwrap(), b"pixels");
        assert_eq!(img.original_name(), "card.png");

        img.release().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_deletes_unreleased_file() {
        let dir = tempfile::tempdir().unwrap();
        let img = TempImage::stage(dir.path(), "card.png", b"pixels").await.unwrap();
        let path = img.path().to_path_buf();

        drop(img);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn release_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let img = TempImage::stage(dir.path(), "card.png", b"pixels").await.unwrap();
        std::fs::remove_file(img.path()).unwrap();

        img.release().await.unwrap();
    }

    #[tokio::test]
    async fn same_name_stages_to_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempImage::stage(dir.path(), "scan.jpg", b"a").await.unwrap();
        let b = TempImage::stage(dir.path(), "scan.jpg", b"b").await.unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().to_string_lossy().ends_with("-scan.jpg"));
        assert_eq!(a.path().parent(), Some(dir.path()));
    }

    #[tokio::test]
    async fn stage_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads").join("batch");
        let img = TempImage::stage(&nested, "x.png", b"x").await.unwrap();
        assert!(img.path().starts_with(&nested));
    }

    #[test]
    fn adopted_file_is_deleted_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.png");
        std::fs::write(&path, b"x").unwrap();

        drop(TempImage::adopt(path.clone(), "existing.png"));
        assert!(!path.exists());
    }

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(r"C:\photos\my card.png"), "my_card.png");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name(&"a".repeat(200)).len(), MAX_NAME_LEN);
    }
}
