//! clipcam: capture-session controller for short video clips
//!
//! This crate holds the state machine behind a single camera screen:
//! check or request camera permission, record one clip with duration and
//! size limits, then save it to a media library or dismiss it. Platform
//! services are reached through small capability traits so the same
//! controller runs against real devices, the bundled synthetic camera and
//! file-system library, or scripted test doubles.
//!
//! # Features
//! - `plugin`: Tauri plugin exposing the session as commands and events
//!
//! # Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use clipcam::{CaptureSession, FileMediaLibrary, LogNotifier, SyntheticCamera, SystemPermissions};
//!
//! let session = CaptureSession::new(
//!     Arc::new(SystemPermissions),
//!     Arc::new(SyntheticCamera::new("./captures", 320, 240, 30)),
//!     Arc::new(FileMediaLibrary::new("./library")),
//!     Arc::new(LogNotifier),
//! );
//! session.check_permission().await;
//! let clip = session.start_recording_default().await?;
//! session.save_clip().await?;
//! ```
pub mod camera;
#[cfg(feature = "plugin")]
pub mod commands;
pub mod config;
pub mod errors;
pub mod notify;
pub mod permissions;
pub mod session;
pub mod storage;
pub mod types;

// Testing utilities - scripted capabilities for offline testing
pub mod testing;

// Re-exports for convenience
pub use camera::{CameraCapture, SyntheticCamera};
pub use config::{ClipcamConfig, PendingClipPolicy};
pub use errors::{CaptureError, SessionError, StorageError};
pub use notify::{LogNotifier, Notification, NotificationKind, Notifier};
pub use permissions::{PermissionProvider, PermissionState, StaticPermissions, SystemPermissions};
pub use session::{CaptureSession, RecordingState, Screen, SessionSnapshot};
pub use storage::{FileMediaLibrary, MediaStorage};
pub use types::{ClipRef, RecordingLimits, StorageAssetId};

#[cfg(feature = "plugin")]
pub use commands::{init, PluginCapabilities};

/// Initialize logging for clipcam
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "clipcam=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
