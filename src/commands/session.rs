//! Tauri commands for the capture session
//!
//! Errors are returned to the front end as strings.

use crate::permissions::PermissionState;
use crate::session::{CaptureSession, SessionSnapshot};
use crate::types::{ClipRef, RecordingLimits, StorageAssetId};
use std::sync::Arc;
use tauri::{command, State};

/// Session handle managed by the Tauri app
pub struct SharedSession(pub Arc<CaptureSession>);

/// Query the platform permission state
#[command]
pub async fn check_camera_permission(
    session: State<'_, SharedSession>,
) -> Result<PermissionState, String> {
    Ok(session.0.check_permission().await)
}

/// Prompt for camera access unless already granted
#[command]
pub async fn request_camera_permission(
    session: State<'_, SharedSession>,
) -> Result<PermissionState, String> {
    Ok(session.0.request_permission().await)
}

/// Record a clip; resolves when the recording finishes
///
/// # Arguments
/// * `max_duration_secs` - Duration cap, session default when omitted
/// * `max_file_size_bytes` - Size cap, session default when omitted
#[command]
pub async fn start_recording(
    session: State<'_, SharedSession>,
    max_duration_secs: Option<u64>,
    max_file_size_bytes: Option<u64>,
) -> Result<ClipRef, String> {
    let limits = resolve_limits(
        session.0.default_limits(),
        max_duration_secs,
        max_file_size_bytes,
    );
    session
        .0
        .start_recording(limits)
        .await
        .map_err(|e| e.to_string())
}

/// Stop the running recording
#[command]
pub fn stop_recording(session: State<'_, SharedSession>) -> Result<SessionSnapshot, String> {
    session.0.stop_recording().map_err(|e| e.to_string())?;
    Ok(session.0.snapshot())
}

/// Save the pending clip to the media library
#[command]
pub async fn save_clip(session: State<'_, SharedSession>) -> Result<StorageAssetId, String> {
    session.0.save_clip().await.map_err(|e| e.to_string())
}

/// Discard the pending clip
#[command]
pub fn dismiss_clip(session: State<'_, SharedSession>) -> Result<ClipRef, String> {
    session.0.dismiss_clip().map_err(|e| e.to_string())
}

#[command]
pub fn get_session_snapshot(session: State<'_, SharedSession>) -> SessionSnapshot {
    session.0.snapshot()
}

fn resolve_limits(
    defaults: RecordingLimits,
    max_duration_secs: Option<u64>,
    max_file_size_bytes: Option<u64>,
) -> RecordingLimits {
    RecordingLimits {
        max_duration: max_duration_secs
            .map(std::time::Duration::from_secs)
            .unwrap_or(defaults.max_duration),
        max_file_size_bytes: max_file_size_bytes.unwrap_or(defaults.max_file_size_bytes),
    }
}
