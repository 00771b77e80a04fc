//! Capture session controller
//!
//! Owns the permission check, the recording lifecycle and the save action.
//! All state lives in one [`SessionState`] behind a mutex that is only held
//! for synchronous transitions, never across a capability call.

use super::state::{RecordingState, SessionSnapshot, SessionState};
use crate::camera::CameraCapture;
use crate::config::{ClipcamConfig, NotificationConfig, PendingClipPolicy};
use crate::errors::{CaptureError, SessionError, StorageError};
use crate::notify::{Notification, Notifier};
use crate::permissions::{PermissionProvider, PermissionState};
use crate::storage::MediaStorage;
use crate::types::{ClipRef, RecordingLimits, StorageAssetId};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub struct CaptureSession {
    state: Mutex<SessionState>,
    permissions: Arc<dyn PermissionProvider>,
    camera: Arc<dyn CameraCapture>,
    storage: Arc<dyn MediaStorage>,
    notifier: Arc<dyn Notifier>,
    policy: PendingClipPolicy,
    messages: NotificationConfig,
    default_limits: RecordingLimits,
    updates: watch::Sender<SessionSnapshot>,
}

impl CaptureSession {
    pub fn new(
        permissions: Arc<dyn PermissionProvider>,
        camera: Arc<dyn CameraCapture>,
        storage: Arc<dyn MediaStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let config = ClipcamConfig::default();
        let (updates, _) = watch::channel(SessionSnapshot::default());
        Self {
            state: Mutex::new(SessionState::default()),
            permissions,
            camera,
            storage,
            notifier,
            policy: config.recording.pending_clip_policy,
            messages: config.notifications,
            default_limits: config.recording.limits(),
            updates,
        }
    }

    /// Build a session whose policy, limits and wording come from `config`
    pub fn from_config(
        config: &ClipcamConfig,
        permissions: Arc<dyn PermissionProvider>,
        camera: Arc<dyn CameraCapture>,
        storage: Arc<dyn MediaStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(permissions, camera, storage, notifier)
            .with_policy(config.recording.pending_clip_policy)
            .with_default_limits(config.recording.limits())
            .with_messages(config.notifications.clone())
    }

    pub fn with_policy(mut self, policy: PendingClipPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_limits(mut self, limits: RecordingLimits) -> Self {
        self.default_limits = limits;
        self
    }

    pub fn with_messages(mut self, messages: NotificationConfig) -> Self {
        self.messages = messages;
        self
    }

    pub fn policy(&self) -> PendingClipPolicy {
        self.policy
    }

    pub fn default_limits(&self) -> RecordingLimits {
        self.default_limits
    }

    /// Current state of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Query the platform for the current permission state
    pub async fn check_permission(&self) -> PermissionState {
        let permission = self.permissions.query().await;
        log::debug!("Camera permission: {}", permission);
        self.update(|state| state.permission = permission);
        permission
    }

    /// Ask the platform to prompt for camera access.
    ///
    /// No prompt is shown when access is already granted. Denial is not an
    /// error; the session stays on the permission request screen.
    pub async fn request_permission(&self) -> PermissionState {
        let current = self.lock().permission;
        if current == PermissionState::Granted {
            return current;
        }

        log::info!("Requesting camera permission");
        let permission = self.permissions.request().await;
        if permission == PermissionState::Granted {
            log::info!("Camera permission granted");
        } else {
            log::warn!("Camera permission not granted: {}", permission);
        }
        self.update(|state| state.permission = permission);
        permission
    }

    /// Record with the session's default limits
    pub async fn start_recording_default(&self) -> Result<ClipRef, SessionError> {
        self.start_recording(self.default_limits).await
    }

    /// Record a clip and wait for it to finish.
    ///
    /// The session shows "recording" before the camera is called. The call
    /// resolves when the camera reaches a limit or honours a stop request.
    pub async fn start_recording(&self, limits: RecordingLimits) -> Result<ClipRef, SessionError> {
        limits.validate().map_err(SessionError::InvalidLimits)?;

        self.update(|state| {
            if state.permission != PermissionState::Granted {
                return Err(SessionError::NotGranted(state.permission));
            }
            if !state.can_start() {
                return Err(SessionError::AlreadyRecording);
            }
            if let Some(pending) = &state.pending_clip {
                match self.policy {
                    PendingClipPolicy::Block => return Err(SessionError::PendingClipUnsaved),
                    PendingClipPolicy::Replace => log::warn!(
                        "Starting a new recording while {} is unsaved; it will be replaced",
                        pending.uri
                    ),
                }
            }
            state.recording = RecordingState::Recording;
            state.capture_in_flight = true;
            Ok(())
        })?;

        log::info!(
            "Recording started (max {}s, max {} bytes)",
            limits.max_duration.as_secs_f64(),
            limits.max_file_size_bytes
        );

        let mut unwind = Unwind::new(self, Interrupted::Capture);
        let result = self.capture(limits).await;
        unwind.disarm();

        match result {
            Ok(clip) => {
                let replaced = self.update(|state| {
                    state.recording = RecordingState::Idle;
                    state.capture_in_flight = false;
                    state.pending_clip.replace(clip.clone())
                });
                if let Some(old) = replaced {
                    log::warn!("Discarded unsaved clip {}", old.uri);
                }
                log::info!("Recording finished: {}", clip.uri);
                Ok(clip)
            }
            Err(e) => {
                self.update(|state| {
                    state.recording = RecordingState::Idle;
                    state.capture_in_flight = false;
                });
                log::error!("Recording failed: {}", e);
                self.notify_capture_failed(&e);
                Err(SessionError::Capture(e))
            }
        }
    }

    /// Stop the running recording.
    ///
    /// The session flips to idle immediately; the pending `start_recording`
    /// call resolves once the camera has finalized the clip.
    pub fn stop_recording(&self) -> Result<(), SessionError> {
        self.update(|state| {
            if state.recording != RecordingState::Recording {
                return Err(SessionError::NotRecording);
            }
            state.recording = RecordingState::Idle;
            Ok(())
        })?;

        self.camera.request_stop();
        log::info!("Recording stop requested");
        Ok(())
    }

    /// Persist the pending clip to the media library.
    ///
    /// On failure the clip stays pending so the user can retry.
    pub async fn save_clip(&self) -> Result<StorageAssetId, SessionError> {
        let clip = self.update(|state| {
            if state.saving {
                return Err(SessionError::SaveInProgress);
            }
            let clip = state.pending_clip.clone().ok_or(SessionError::NoPendingClip)?;
            state.saving = true;
            Ok(clip)
        })?;

        let mut unwind = Unwind::new(self, Interrupted::Save);
        let result = self.storage.persist(&clip).await;
        unwind.disarm();

        match result {
            Ok(asset_id) => {
                log::info!("Saved {} as asset {}", clip.uri, asset_id);
                self.notifier.notify(
                    Notification::success(
                        &self.messages.saved_title,
                        &self.messages.saved_message,
                    )
                    .with_actions(self.messages.saved_actions.iter().cloned()),
                );
                self.update(|state| {
                    state.saving = false;
                    if state.pending_clip.as_ref() == Some(&clip) {
                        state.pending_clip = None;
                    }
                });
                Ok(asset_id)
            }
            Err(e) => {
                self.update(|state| state.saving = false);
                log::error!("Failed to save {}: {}", clip.uri, e);
                self.notify_save_failed(&e);
                Err(SessionError::Storage(e))
            }
        }
    }

    /// Drop the pending clip without saving it
    pub fn dismiss_clip(&self) -> Result<ClipRef, SessionError> {
        let clip = self.update(|state| {
            if state.saving {
                return Err(SessionError::SaveInProgress);
            }
            state.pending_clip.take().ok_or(SessionError::NoPendingClip)
        })?;
        log::info!("Dismissed clip {}", clip.uri);
        Ok(clip)
    }

    /// Drive the camera, re-sending a stop that landed before it was running
    async fn capture(&self, limits: RecordingLimits) -> Result<ClipRef, CaptureError> {
        let mut capture = self.camera.capture(limits);
        let mut first_poll = true;
        std::future::poll_fn(|cx| {
            let poll = capture.as_mut().poll(cx);
            if first_poll {
                first_poll = false;
                if poll.is_pending() && self.lock().recording == RecordingState::Idle {
                    log::debug!("Stop arrived before the camera started; forwarding it");
                    self.camera.request_stop();
                }
            }
            poll
        })
        .await
    }

    fn notify_capture_failed(&self, error: &CaptureError) {
        self.notifier.notify(
            Notification::failure(&self.messages.capture_failed_title, error.to_string())
                .with_actions(["OK"]),
        );
    }

    fn notify_save_failed(&self, error: &StorageError) {
        self.notifier.notify(
            Notification::failure(&self.messages.save_failed_title, error.to_string())
                .with_actions(["OK"]),
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply a transition and publish the new snapshot if anything changed
    fn update<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut state = self.lock();
        let before = state.clone();
        let out = f(&mut state);
        if *state != before {
            self.updates.send_replace(state.snapshot());
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
enum Interrupted {
    Capture,
    Save,
}

/// Restores the session when an operation future is dropped or unwinds
/// before its capability call returns.
struct Unwind<'a> {
    session: &'a CaptureSession,
    op: Interrupted,
    armed: bool,
}

impl<'a> Unwind<'a> {
    fn new(session: &'a CaptureSession, op: Interrupted) -> Self {
        Self {
            session,
            op,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Unwind<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.op {
            Interrupted::Capture => {
                log::warn!("Recording abandoned before the camera returned");
                self.session.update(|state| {
                    state.recording = RecordingState::Idle;
                    state.capture_in_flight = false;
                });
                self.session.camera.request_stop();
            }
            Interrupted::Save => {
                log::warn!("Save abandoned before storage returned; clip kept");
                self.session.update(|state| state.saving = false);
            }
        }
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("state", &*self.lock())
            .field("policy", &self.policy)
            .field("default_limits", &self.default_limits)
            .finish_non_exhaustive()
    }
}
