//! Configuration management for clipcam
//!
//! Provides configuration loading, saving, and validation for recording
//! limits, the media library location, the synthetic camera, and the
//! wording of user notifications.

use crate::errors::SessionError;
use crate::types::{RecordingLimits, DEFAULT_MAX_DURATION_SECS, DEFAULT_MAX_FILE_SIZE_BYTES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest resolution the synthetic camera accepts (8K UHD)
pub const MAX_CAMERA_WIDTH: u32 = 7680;
pub const MAX_CAMERA_HEIGHT: u32 = 4320;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipcamConfig {
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
    pub camera: CameraConfig,
    pub notifications: NotificationConfig,
}

/// What to do when a recording starts while an unsaved clip is pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingClipPolicy {
    /// Allow the recording; the new clip replaces the old one
    Replace,
    /// Reject the recording until the pending clip is saved or dismissed
    Block,
}

impl Default for PendingClipPolicy {
    fn default() -> Self {
        PendingClipPolicy::Replace
    }
}

/// Recording limits and session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Maximum clip length in seconds
    pub max_duration_secs: u64,
    /// Maximum clip size in bytes
    pub max_file_size_bytes: u64,
    pub pending_clip_policy: PendingClipPolicy,
}

/// Media library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the media library
    pub library_directory: String,
    /// Put saved clips under one folder per day
    pub organize_by_date: bool,
    /// chrono format string for the per-day folder
    pub date_format: String,
}

/// Synthetic camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Where in-flight clips are written before they are saved
    pub output_directory: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Notification wording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub saved_title: String,
    pub saved_message: String,
    pub saved_actions: Vec<String>,
    pub capture_failed_title: String,
    pub save_failed_title: String,
}

impl Default for ClipcamConfig {
    fn default() -> Self {
        Self {
            recording: RecordingConfig {
                max_duration_secs: DEFAULT_MAX_DURATION_SECS,
                max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
                pending_clip_policy: PendingClipPolicy::Replace,
            },
            storage: StorageConfig {
                library_directory: "./library".to_string(),
                organize_by_date: true,
                date_format: "%Y-%m-%d".to_string(),
            },
            camera: CameraConfig {
                output_directory: "./captures".to_string(),
                width: 320,
                height: 240,
                fps: 30,
            },
            notifications: NotificationConfig {
                saved_title: "Saved".to_string(),
                saved_message: "Video saved to the library".to_string(),
                saved_actions: vec!["Close".to_string(), "OK".to_string()],
                capture_failed_title: "Recording failed".to_string(),
                save_failed_title: "Save failed".to_string(),
            },
        }
    }
}

impl RecordingConfig {
    pub fn limits(&self) -> RecordingLimits {
        RecordingLimits::new(self.max_duration_secs, self.max_file_size_bytes)
    }
}

impl ClipcamConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("Failed to read config file: {}", e)))?;

        let config: ClipcamConfig = toml::from_str(&contents)
            .map_err(|e| SessionError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(SessionError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SessionError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SessionError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| SessionError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| SessionError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("clipcam.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        self.recording.limits().validate()?;

        if self.storage.library_directory.trim().is_empty() {
            return Err("Library directory must not be empty".to_string());
        }
        if self.storage.organize_by_date && self.storage.date_format.trim().is_empty() {
            return Err("Date format must not be empty when organizing by date".to_string());
        }

        if self.camera.width == 0
            || self.camera.height == 0
            || self.camera.width > MAX_CAMERA_WIDTH
            || self.camera.height > MAX_CAMERA_HEIGHT
        {
            return Err(format!(
                "Invalid camera resolution {}x{} (max {}x{})",
                self.camera.width, self.camera.height, MAX_CAMERA_WIDTH, MAX_CAMERA_HEIGHT
            ));
        }
        if self.camera.fps == 0 || self.camera.fps > 240 {
            return Err("Invalid camera FPS (must be 1-240)".to_string());
        }

        Ok(())
    }
}
