//! Capture session: the state machine behind the single camera screen
//!
//! ```rust,ignore
//! use clipcam::session::CaptureSession;
//!
//! let session = CaptureSession::new(permissions, camera, storage, notifier);
//! if session.check_permission().await != PermissionState::Granted {
//!     session.request_permission().await;
//! }
//! let clip = session.start_recording_default().await?;
//! let asset = session.save_clip().await?;
//! ```

mod controller;
mod state;

pub use controller::CaptureSession;
pub use state::{RecordingState, Screen, SessionSnapshot};
