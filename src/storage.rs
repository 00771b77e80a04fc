//! Media storage capability and a file-system media library

use crate::config::StorageConfig;
use crate::errors::StorageError;
use crate::types::{ClipRef, StorageAssetId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Media storage capability. Persists a captured clip into durable storage.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn persist(&self, clip: &ClipRef) -> Result<StorageAssetId, StorageError>;
}

/// Media library rooted at a local directory.
///
/// Each saved clip is copied to `<root>[/<day>]/<asset-id>.<ext>`. The
/// source file is left in place.
#[derive(Debug, Clone)]
pub struct FileMediaLibrary {
    root: PathBuf,
    date_format: Option<String>,
}

impl FileMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            date_format: None,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        let library = Self::new(&config.library_directory);
        if config.organize_by_date {
            library.organized_by_date(&config.date_format)
        } else {
            library
        }
    }

    /// Group saved clips into per-day folders named with `date_format`
    pub fn organized_by_date(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = Some(date_format.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target_dir(&self) -> PathBuf {
        match &self.date_format {
            Some(format) => self
                .root
                .join(chrono::Local::now().format(format).to_string()),
            None => self.root.clone(),
        }
    }

    /// Locate a previously saved asset
    pub async fn find_asset(&self, id: &StorageAssetId) -> Option<PathBuf> {
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.file_stem().and_then(|s| s.to_str()) == Some(id.as_str()) {
                    return Some(path);
                }
            }
        }
        None
    }
}

#[async_trait]
impl MediaStorage for FileMediaLibrary {
    async fn persist(&self, clip: &ClipRef) -> Result<StorageAssetId, StorageError> {
        let source = clip.local_path().ok_or_else(|| {
            StorageError::NotFound(format!("unsupported clip locator: {}", clip.uri))
        })?;

        if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
            return Err(StorageError::NotFound(source.display().to_string()));
        }

        let dir = self.target_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let id = StorageAssetId::new(uuid::Uuid::new_v4().to_string());
        let file_name = match source.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.to_string(),
        };
        let dest = dir.join(file_name);

        let bytes = tokio::fs::copy(&source, &dest).await?;
        log::info!(
            "Saved clip {} to library as {} ({} bytes)",
            clip.uri,
            id,
            bytes
        );
        Ok(id)
    }
}
