//! Core data types shared by the session controller and its capabilities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default recording length cap in seconds
pub const DEFAULT_MAX_DURATION_SECS: u64 = 10;
/// Default recording size cap (100 MiB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Reference to a just-captured video file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRef {
    /// Storage locator, either a `file://` URI or a bare path
    pub uri: String,
    pub duration_secs: Option<f64>,
    pub size_bytes: Option<u64>,
    pub captured_at: Option<DateTime<Utc>>,
}

impl ClipRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            duration_secs: None,
            size_bytes: None,
            captured_at: None,
        }
    }

    /// Build a clip reference for a local file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(format!("file://{}", path.into().display()))
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_secs = Some(duration.as_secs_f64());
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    /// Resolve the locator to a local path.
    ///
    /// Returns `None` for non-file schemes such as `content://`.
    pub fn local_path(&self) -> Option<PathBuf> {
        if let Some(rest) = self.uri.strip_prefix("file://") {
            return Some(PathBuf::from(rest));
        }
        if self.uri.contains("://") {
            return None;
        }
        Some(PathBuf::from(&self.uri))
    }
}

/// Identifier of a clip persisted in the media library
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageAssetId(pub String);

impl StorageAssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageAssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Limits handed to the camera for a single recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingLimits {
    pub max_duration: Duration,
    pub max_file_size_bytes: u64,
}

impl RecordingLimits {
    pub fn new(max_duration_secs: u64, max_file_size_bytes: u64) -> Self {
        Self {
            max_duration: Duration::from_secs(max_duration_secs),
            max_file_size_bytes,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_duration.is_zero() {
            return Err("max duration must be greater than zero".to_string());
        }
        if self.max_file_size_bytes == 0 {
            return Err("max file size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for RecordingLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DURATION_SECS, DEFAULT_MAX_FILE_SIZE_BYTES)
    }
}
