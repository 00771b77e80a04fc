//! Capture session state and the screen model derived from it

use crate::permissions::PermissionState;
use crate::types::ClipRef;
use serde::{Deserialize, Serialize};

/// Whether a recording is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    Idle,
    Recording,
}

impl Default for RecordingState {
    fn default() -> Self {
        RecordingState::Idle
    }
}

/// Mutable state owned by a capture session
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SessionState {
    pub permission: PermissionState,
    pub recording: RecordingState,
    pub pending_clip: Option<ClipRef>,
    /// The camera has not returned yet. Outlives `recording` after a manual stop.
    pub capture_in_flight: bool,
    pub saving: bool,
}

impl SessionState {
    pub fn can_start(&self) -> bool {
        self.permission == PermissionState::Granted
            && self.recording == RecordingState::Idle
            && !self.capture_in_flight
    }

    pub fn screen(&self) -> Screen {
        match self.permission {
            PermissionState::Unknown => Screen::Blank,
            PermissionState::Denied => Screen::PermissionRequest,
            PermissionState::Granted => Screen::Camera {
                recording: self.recording == RecordingState::Recording,
                can_start: self.can_start(),
                can_stop: self.recording == RecordingState::Recording,
                can_save: self.pending_clip.is_some() && !self.saving,
            },
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            permission: self.permission,
            recording: self.recording,
            pending_clip: self.pending_clip.clone(),
            saving: self.saving,
            screen: self.screen(),
        }
    }
}

/// What the single screen should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Screen {
    /// Permission not known yet; render nothing
    Blank,
    /// Ask the user for camera access
    PermissionRequest,
    /// Live camera view with its action affordances
    Camera {
        recording: bool,
        can_start: bool,
        can_stop: bool,
        can_save: bool,
    },
}

/// Read-only view of the session published on every state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub permission: PermissionState,
    pub recording: RecordingState,
    pub pending_clip: Option<ClipRef>,
    pub saving: bool,
    pub screen: Screen,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SessionState::default().snapshot()
    }
}
