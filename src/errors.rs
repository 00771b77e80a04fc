use crate::permissions::PermissionState;

/// Failure reported by a camera capability while capturing a clip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    #[error("Camera busy: {0}")]
    Busy(String),
    #[error("Capture IO error: {0}")]
    Io(String),
    #[error("Capture aborted: {0}")]
    Aborted(String),
}

/// Failure reported by a media storage capability while persisting a clip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Clip not found: {0}")]
    NotFound(String),
    #[error("Storage permission denied: {0}")]
    PermissionDenied(String),
    #[error("Storage IO error: {0}")]
    Io(String),
}

/// Errors returned at the capture session boundary.
///
/// Precondition failures leave the session untouched. Capability failures
/// are returned after the session has reset its own state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Camera permission not granted (state: {0})")]
    NotGranted(PermissionState),
    #[error("A recording is already in progress")]
    AlreadyRecording,
    #[error("No recording in progress")]
    NotRecording,
    #[error("No recorded clip is pending")]
    NoPendingClip,
    #[error("A save is already in progress")]
    SaveInProgress,
    #[error("A recorded clip is still pending; save or dismiss it first")]
    PendingClipUnsaved,
    #[error("Invalid recording limits: {0}")]
    InvalidLimits(String),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// True when the operation was rejected before any capability was called.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, SessionError::Capture(_) | SessionError::Storage(_))
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        CaptureError::Io(e.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(e.to_string()),
            _ => StorageError::Io(e.to_string()),
        }
    }
}
