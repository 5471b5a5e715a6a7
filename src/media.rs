use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult};

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Storage for uploaded images, addressed by file name.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `data`, preferably under `name`. Never overwrites; returns the
    /// name actually used.
    async fn store(&self, name: &str, data: &[u8]) -> std::io::Result<String>;

    /// Load a stored file, `None` if it does not exist.
    async fn load(&self, name: &str) -> std::io::Result<Option<Vec<u8>>>;

    async fn remove(&self, name: &str) -> std::io::Result<()>;
}

/// Media store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn create_new(&self, name: &str, data: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.root.join(name))
            .await?;
        file.write_all(data).await?;
        file.flush().await
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn store(&self, name: &str, data: &[u8]) -> std::io::Result<String> {
        if !is_safe_name(name) {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("unsafe media name: {}", name),
            ));
        }
        tokio::fs::create_dir_all(&self.root).await?;

        match self.create_new(name, data).await {
            Ok(()) => Ok(name.to_string()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let fallback = with_suffix(name, &uuid::Uuid::now_v7().simple().to_string());
                tracing::debug!("{} already stored, using {}", name, fallback);
                self.create_new(&fallback, data).await?;
                Ok(fallback)
            }
            Err(e) => Err(e),
        }
    }

    async fn load(&self, name: &str) -> std::io::Result<Option<Vec<u8>>> {
        if !is_safe_name(name) {
            return Ok(None);
        }
        match tokio::fs::read(self.root.join(name)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn remove(&self, name: &str) -> std::io::Result<()> {
        if !is_safe_name(name) {
            return Ok(());
        }
        match tokio::fs::remove_file(self.root.join(name)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Whether `filename` carries an allow-listed image extension (case-insensitive).
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Reject missing or disallowed uploads before anything is stored.
pub fn validate_upload(filename: Option<&str>) -> AppResult<&str> {
    let filename = filename
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::Validation("Please choose an image.".into()))?;

    if !allowed_file(filename) {
        return Err(AppError::Validation(
            "Format not allowed. Use png, jpg, jpeg, gif or webp.".into(),
        ));
    }
    Ok(filename)
}

/// Storage name for an upload: `<user id>_<epoch seconds>_<original name>`,
/// sanitized.
pub fn upload_filename(user_id: i64, epoch_secs: i64, original: &str) -> String {
    secure_filename(&format!("{}_{}_{}", user_id, epoch_secs, base_name(original)))
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; whitespace becomes `_`;
/// everything else is dropped. Leading dots and underscores are stripped so
/// the result is never hidden or relative.
pub fn secure_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();

    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// A name that stays inside the media root: a single, non-hidden path segment.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\', '\0'])
}

// Browsers may send a full client-side path.
fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", name, suffix),
    }
}
