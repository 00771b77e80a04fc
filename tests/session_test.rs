//! Capture session scenarios against scripted capabilities

use async_trait::async_trait;
use clipcam::testing::{CaptureScript, RecordingNotifier, ScriptedCamera, ScriptedStorage};
use clipcam::{
    CameraCapture, CaptureError, CaptureSession, ClipRef, NotificationKind, PendingClipPolicy,
    PermissionState, RecordingLimits, RecordingState, Screen, SessionError, StaticPermissions,
    StorageAssetId, StorageError,
};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

struct Harness {
    session: Arc<CaptureSession>,
    permissions: Arc<StaticPermissions>,
    camera: Arc<ScriptedCamera>,
    storage: Arc<ScriptedStorage>,
    notifier: Arc<RecordingNotifier>,
}

fn harness_with(
    permissions: StaticPermissions,
    scripts: Vec<CaptureScript>,
    storage: ScriptedStorage,
) -> Harness {
    let permissions = Arc::new(permissions);
    let camera = Arc::new(ScriptedCamera::new(scripts));
    let storage = Arc::new(storage);
    let notifier = Arc::new(RecordingNotifier::new());
    let session = Arc::new(CaptureSession::new(
        permissions.clone(),
        camera.clone(),
        storage.clone(),
        notifier.clone(),
    ));
    Harness {
        session,
        permissions,
        camera,
        storage,
        notifier,
    }
}

async fn granted(scripts: Vec<CaptureScript>) -> Harness {
    let h = harness_with(StaticPermissions::granted(), scripts, ScriptedStorage::default());
    assert_eq!(h.session.check_permission().await, PermissionState::Granted);
    h
}

fn clip(uri: &str) -> ClipRef {
    ClipRef::new(uri)
}

#[tokio::test]
async fn permission_denied_then_granted_switches_to_camera_view() {
    let h = harness_with(
        StaticPermissions::new(PermissionState::Denied, PermissionState::Granted),
        vec![],
        ScriptedStorage::default(),
    );
    assert_eq!(h.session.snapshot().screen, Screen::Blank);

    assert_eq!(h.session.check_permission().await, PermissionState::Denied);
    assert_eq!(h.session.snapshot().screen, Screen::PermissionRequest);

    assert_eq!(h.session.request_permission().await, PermissionState::Granted);
    assert_eq!(h.permissions.request_count(), 1);
    assert!(matches!(
        h.session.snapshot().screen,
        Screen::Camera {
            can_start: true,
            can_save: false,
            ..
        }
    ));
}

#[tokio::test]
async fn permission_denial_stays_on_request_view() {
    let h = harness_with(
        StaticPermissions::new(PermissionState::Unknown, PermissionState::Denied),
        vec![],
        ScriptedStorage::default(),
    );
    assert_eq!(h.session.request_permission().await, PermissionState::Denied);
    assert_eq!(h.session.snapshot().screen, Screen::PermissionRequest);
    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn request_permission_when_granted_does_not_prompt() {
    let h = granted(vec![]).await;
    assert_eq!(h.session.request_permission().await, PermissionState::Granted);
    assert_eq!(h.permissions.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn recording_completes_at_duration_limit() {
    let h = granted(vec![CaptureScript::finish_after(
        Duration::from_secs(10),
        clip("file://clip1.mp4"),
    )])
    .await;

    let session = h.session.clone();
    let task = tokio::spawn(async move {
        session
            .start_recording(RecordingLimits::new(10, 104_857_600))
            .await
    });
    tokio::task::yield_now().await;

    let during = h.session.snapshot();
    assert_eq!(during.recording, RecordingState::Recording);
    assert!(matches!(
        during.screen,
        Screen::Camera {
            recording: true,
            can_start: false,
            can_stop: true,
            ..
        }
    ));

    let recorded = task.await.unwrap().unwrap();
    assert_eq!(recorded.uri, "file://clip1.mp4");

    let after = h.session.snapshot();
    assert_eq!(after.recording, RecordingState::Idle);
    assert_eq!(after.pending_clip, Some(clip("file://clip1.mp4")));
    assert_eq!(
        h.camera.last_limits(),
        Some(RecordingLimits::new(10, 104_857_600))
    );
    assert_eq!(h.camera.stop_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn manual_stop_resolves_recording_early() {
    let h = granted(vec![CaptureScript::finish_on_stop(clip("file://clip2.mp4"))]).await;

    let session = h.session.clone();
    let task = tokio::spawn(async move { session.start_recording_default().await });
    tokio::time::sleep(Duration::from_secs(3)).await;

    h.session.stop_recording().unwrap();

    // The flag flips before the camera has finalized the clip
    let stopping = h.session.snapshot();
    assert_eq!(stopping.recording, RecordingState::Idle);
    assert_eq!(stopping.pending_clip, None);
    assert!(matches!(
        stopping.screen,
        Screen::Camera {
            can_start: false,
            can_stop: false,
            ..
        }
    ));

    let recorded = task.await.unwrap().unwrap();
    assert_eq!(recorded.uri, "file://clip2.mp4");
    assert_eq!(h.camera.stop_count(), 1);

    let after = h.session.snapshot();
    assert_eq!(after.recording, RecordingState::Idle);
    assert_eq!(after.pending_clip, Some(clip("file://clip2.mp4")));
}

#[tokio::test]
async fn save_confirms_and_clears_pending_clip() {
    let h = harness_with(
        StaticPermissions::granted(),
        vec![CaptureScript::finish_after(Duration::ZERO, clip("file://clip1.mp4"))],
        ScriptedStorage::new([Ok(StorageAssetId::new("asset-1"))]),
    );
    h.session.check_permission().await;
    h.session.start_recording_default().await.unwrap();

    let asset = h.session.save_clip().await.unwrap();
    assert_eq!(asset.as_str(), "asset-1");
    assert_eq!(h.session.snapshot().pending_clip, None);
    assert_eq!(h.storage.persisted(), vec![clip("file://clip1.mp4")]);

    let shown = h.notifier.notifications();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].kind, NotificationKind::Success);
    assert_eq!(shown[0].actions, vec!["Close".to_string(), "OK".to_string()]);
}

#[tokio::test]
async fn capture_failure_resets_to_idle_without_clip() {
    let h = granted(vec![CaptureScript::fail(CaptureError::Io(
        "IOError".to_string(),
    ))])
    .await;

    let err = h.session.start_recording_default().await.unwrap_err();
    assert_eq!(err, SessionError::Capture(CaptureError::Io("IOError".to_string())));
    assert!(!err.is_rejection());

    let after = h.session.snapshot();
    assert_eq!(after.recording, RecordingState::Idle);
    assert_eq!(after.pending_clip, None);
    assert_eq!(h.notifier.count(NotificationKind::Success), 0);
    assert_eq!(h.notifier.count(NotificationKind::Failure), 1);
}

#[tokio::test]
async fn capture_failure_keeps_previous_pending_clip() {
    let h = granted(vec![
        CaptureScript::finish_after(Duration::ZERO, clip("file://keep.mp4")),
        CaptureScript::fail(CaptureError::Aborted("interrupted".to_string())),
    ])
    .await;

    h.session.start_recording_default().await.unwrap();
    assert!(h.session.start_recording_default().await.is_err());
    assert_eq!(h.session.snapshot().pending_clip, Some(clip("file://keep.mp4")));
}

#[tokio::test]
async fn start_is_rejected_without_permission() {
    let h = harness_with(
        StaticPermissions::new(PermissionState::Denied, PermissionState::Denied),
        vec![CaptureScript::finish_on_stop(clip("file://never.mp4"))],
        ScriptedStorage::default(),
    );
    h.session.check_permission().await;

    let err = h.session.start_recording_default().await.unwrap_err();
    assert_eq!(err, SessionError::NotGranted(PermissionState::Denied));
    assert!(err.is_rejection());
    assert_eq!(h.camera.capture_count(), 0);
    assert_eq!(h.session.snapshot().recording, RecordingState::Idle);
}

#[tokio::test]
async fn start_is_rejected_before_permission_is_known() {
    let h = harness_with(
        StaticPermissions::granted(),
        vec![],
        ScriptedStorage::default(),
    );
    let err = h.session.start_recording_default().await.unwrap_err();
    assert_eq!(err, SessionError::NotGranted(PermissionState::Unknown));
    assert_eq!(h.camera.capture_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn second_start_while_recording_is_rejected() {
    let h = granted(vec![
        CaptureScript::finish_on_stop(clip("file://first.mp4")),
        CaptureScript::finish_on_stop(clip("file://second.mp4")),
    ])
    .await;

    let session = h.session.clone();
    let task = tokio::spawn(async move { session.start_recording_default().await });
    tokio::task::yield_now().await;

    let err = h.session.start_recording_default().await.unwrap_err();
    assert_eq!(err, SessionError::AlreadyRecording);
    assert_eq!(h.camera.capture_count(), 1);

    h.session.stop_recording().unwrap();

    // Stopped but not yet finalized: still no second capture
    let err = h.session.start_recording_default().await.unwrap_err();
    assert_eq!(err, SessionError::AlreadyRecording);

    assert_eq!(task.await.unwrap().unwrap().uri, "file://first.mp4");
    assert_eq!(h.camera.capture_count(), 1);
}

#[tokio::test]
async fn invalid_limits_are_rejected() {
    let h = granted(vec![]).await;
    let err = h
        .session
        .start_recording(RecordingLimits::new(0, 1024))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidLimits(_)));
    assert_eq!(h.camera.capture_count(), 0);
}

#[tokio::test]
async fn stop_while_idle_is_rejected() {
    let h = granted(vec![]).await;
    assert_eq!(h.session.stop_recording(), Err(SessionError::NotRecording));
    assert_eq!(h.camera.stop_count(), 0);
}

#[tokio::test]
async fn save_without_clip_is_rejected() {
    let h = granted(vec![]).await;
    assert_eq!(h.session.save_clip().await, Err(SessionError::NoPendingClip));
    assert_eq!(h.storage.persist_count(), 0);
}

#[tokio::test]
async fn second_save_after_success_is_a_no_op() {
    let h = granted(vec![CaptureScript::finish_after(
        Duration::ZERO,
        clip("file://clip1.mp4"),
    )])
    .await;
    h.session.start_recording_default().await.unwrap();

    assert!(h.session.save_clip().await.is_ok());
    assert_eq!(h.session.save_clip().await, Err(SessionError::NoPendingClip));
    assert_eq!(h.storage.persist_count(), 1);
    assert_eq!(h.notifier.count(NotificationKind::Success), 1);
}

#[tokio::test]
async fn save_failure_keeps_clip_for_retry() {
    let h = harness_with(
        StaticPermissions::granted(),
        vec![CaptureScript::finish_after(Duration::ZERO, clip("file://clip1.mp4"))],
        ScriptedStorage::new([Err(StorageError::Io("disk full".to_string()))]),
    );
    h.session.check_permission().await;
    h.session.start_recording_default().await.unwrap();

    let err = h.session.save_clip().await.unwrap_err();
    assert_eq!(err, SessionError::Storage(StorageError::Io("disk full".to_string())));
    assert_eq!(h.session.snapshot().pending_clip, Some(clip("file://clip1.mp4")));
    assert!(!h.session.snapshot().saving);
    assert_eq!(h.notifier.count(NotificationKind::Failure), 1);
    assert_eq!(h.notifier.count(NotificationKind::Success), 0);

    assert!(h.session.save_clip().await.is_ok());
    assert_eq!(h.session.snapshot().pending_clip, None);
    assert_eq!(h.storage.persist_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_save_is_rejected() {
    let h = harness_with(
        StaticPermissions::granted(),
        vec![CaptureScript::finish_after(Duration::ZERO, clip("file://clip1.mp4"))],
        ScriptedStorage::default().with_delay(Duration::from_secs(2)),
    );
    h.session.check_permission().await;
    h.session.start_recording_default().await.unwrap();

    let session = h.session.clone();
    let first = tokio::spawn(async move { session.save_clip().await });
    tokio::task::yield_now().await;

    assert!(h.session.snapshot().saving);
    assert_eq!(h.session.save_clip().await, Err(SessionError::SaveInProgress));
    assert_eq!(h.session.dismiss_clip(), Err(SessionError::SaveInProgress));

    assert!(first.await.unwrap().is_ok());
    assert_eq!(h.storage.persist_count(), 1);
}

#[tokio::test]
async fn dismiss_clears_pending_clip() {
    let h = granted(vec![CaptureScript::finish_after(
        Duration::ZERO,
        clip("file://clip1.mp4"),
    )])
    .await;
    h.session.start_recording_default().await.unwrap();

    assert_eq!(h.session.dismiss_clip().unwrap().uri, "file://clip1.mp4");
    assert_eq!(h.session.snapshot().pending_clip, None);
    assert_eq!(h.session.dismiss_clip(), Err(SessionError::NoPendingClip));
    assert_eq!(h.storage.persist_count(), 0);
}

#[tokio::test]
async fn replace_policy_overwrites_pending_clip() {
    let h = granted(vec![
        CaptureScript::finish_after(Duration::ZERO, clip("file://old.mp4")),
        CaptureScript::finish_after(Duration::ZERO, clip("file://new.mp4")),
    ])
    .await;
    assert_eq!(h.session.policy(), PendingClipPolicy::Replace);

    h.session.start_recording_default().await.unwrap();
    h.session.start_recording_default().await.unwrap();
    assert_eq!(h.session.snapshot().pending_clip, Some(clip("file://new.mp4")));
}

#[tokio::test]
async fn block_policy_requires_save_or_dismiss_first() {
    let permissions = Arc::new(StaticPermissions::granted());
    let camera = Arc::new(ScriptedCamera::new([
        CaptureScript::finish_after(Duration::ZERO, clip("file://first.mp4")),
        CaptureScript::finish_after(Duration::ZERO, clip("file://second.mp4")),
    ]));
    let session = CaptureSession::new(
        permissions,
        camera.clone(),
        Arc::new(ScriptedStorage::default()),
        Arc::new(RecordingNotifier::new()),
    )
    .with_policy(PendingClipPolicy::Block);
    session.check_permission().await;

    session.start_recording_default().await.unwrap();
    assert_eq!(
        session.start_recording_default().await,
        Err(SessionError::PendingClipUnsaved)
    );
    assert_eq!(camera.capture_count(), 1);

    session.dismiss_clip().unwrap();
    assert_eq!(
        session.start_recording_default().await.unwrap().uri,
        "file://second.mp4"
    );
}

#[tokio::test]
async fn subscribers_see_each_transition() {
    let h = granted(vec![CaptureScript::finish_after(
        Duration::ZERO,
        clip("file://clip1.mp4"),
    )])
    .await;
    let mut updates = h.session.subscribe();
    assert_eq!(updates.borrow().permission, PermissionState::Granted);

    h.session.start_recording_default().await.unwrap();
    assert!(updates.has_changed().unwrap());
    let latest = updates.borrow_and_update().clone();
    assert_eq!(latest.pending_clip, Some(clip("file://clip1.mp4")));
    assert!(matches!(latest.screen, Screen::Camera { can_save: true, .. }));

    // Rejections do not publish
    let _ = h.session.stop_recording();
    assert!(!updates.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn save_keeps_clip_recorded_while_saving() {
    let h = harness_with(
        StaticPermissions::granted(),
        vec![
            CaptureScript::finish_after(Duration::ZERO, clip("file://first.mp4")),
            CaptureScript::finish_after(Duration::from_millis(500), clip("file://second.mp4")),
        ],
        ScriptedStorage::default().with_delay(Duration::from_secs(2)),
    );
    h.session.check_permission().await;
    h.session.start_recording_default().await.unwrap();

    let session = h.session.clone();
    let save = tokio::spawn(async move { session.save_clip().await });
    tokio::task::yield_now().await;
    assert!(h.session.snapshot().saving);

    let second = h.session.start_recording_default().await.unwrap();
    assert_eq!(second.uri, "file://second.mp4");

    assert!(save.await.unwrap().is_ok());
    assert_eq!(h.storage.persisted(), vec![clip("file://first.mp4")]);

    let after = h.session.snapshot();
    assert!(!after.saving);
    assert_eq!(after.pending_clip, Some(clip("file://second.mp4")));
}

#[tokio::test(start_paused = true)]
async fn abandoned_save_leaves_clip_ready_for_retry() {
    let h = harness_with(
        StaticPermissions::granted(),
        vec![CaptureScript::finish_after(Duration::ZERO, clip("file://clip1.mp4"))],
        ScriptedStorage::default().with_delay(Duration::from_secs(5)),
    );
    h.session.check_permission().await;
    h.session.start_recording_default().await.unwrap();

    let timed_out = tokio::time::timeout(Duration::from_secs(1), h.session.save_clip()).await;
    assert!(timed_out.is_err());

    let after = h.session.snapshot();
    assert!(!after.saving);
    assert_eq!(after.pending_clip, Some(clip("file://clip1.mp4")));
    assert!(matches!(after.screen, Screen::Camera { can_save: true, .. }));

    assert!(h.session.save_clip().await.is_ok());
    assert_eq!(h.session.snapshot().pending_clip, None);
    assert_eq!(h.storage.persist_count(), 2);
    assert_eq!(h.storage.persisted(), vec![clip("file://clip1.mp4")]);
}

#[tokio::test(start_paused = true)]
async fn abandoned_save_still_allows_dismiss() {
    let h = harness_with(
        StaticPermissions::granted(),
        vec![CaptureScript::finish_after(Duration::ZERO, clip("file://clip1.mp4"))],
        ScriptedStorage::default().with_delay(Duration::from_secs(5)),
    );
    h.session.check_permission().await;
    h.session.start_recording_default().await.unwrap();

    let session = h.session.clone();
    let save = tokio::spawn(async move { session.save_clip().await });
    tokio::task::yield_now().await;
    save.abort();
    assert!(save.await.unwrap_err().is_cancelled());

    assert_eq!(h.session.dismiss_clip().unwrap().uri, "file://clip1.mp4");
}

#[tokio::test(start_paused = true)]
async fn abandoned_recording_returns_to_idle_and_stops_camera() {
    let h = granted(vec![CaptureScript::finish_on_stop(clip("file://lost.mp4"))]).await;

    let timed_out =
        tokio::time::timeout(Duration::from_secs(1), h.session.start_recording_default()).await;
    assert!(timed_out.is_err());

    let after = h.session.snapshot();
    assert_eq!(after.recording, RecordingState::Idle);
    assert_eq!(after.pending_clip, None);
    assert!(matches!(after.screen, Screen::Camera { can_start: true, .. }));
    assert_eq!(h.camera.stop_count(), 1);
    assert_eq!(h.session.stop_recording(), Err(SessionError::NotRecording));

    h.camera.push(CaptureScript::finish_after(
        Duration::ZERO,
        clip("file://again.mp4"),
    ));
    let again = h.session.start_recording_default().await.unwrap();
    assert_eq!(again.uri, "file://again.mp4");
    assert_eq!(h.session.snapshot().pending_clip, Some(again));
}

/// Camera that delivers a user stop before it has started listening for one
struct StopsBeforeListening {
    session: OnceLock<Weak<CaptureSession>>,
    inner: ScriptedCamera,
}

#[async_trait]
impl CameraCapture for StopsBeforeListening {
    async fn capture(&self, limits: RecordingLimits) -> Result<ClipRef, CaptureError> {
        if let Some(session) = self.session.get().and_then(Weak::upgrade) {
            session.stop_recording().unwrap();
        }
        self.inner.capture(limits).await
    }

    fn request_stop(&self) {
        self.inner.request_stop();
    }
}

#[tokio::test(start_paused = true)]
async fn stop_before_camera_is_running_still_ends_recording() {
    let camera = Arc::new(StopsBeforeListening {
        session: OnceLock::new(),
        inner: ScriptedCamera::new([CaptureScript::finish_on_stop(clip("file://early.mp4"))]),
    });
    let session = Arc::new(CaptureSession::new(
        Arc::new(StaticPermissions::granted()),
        camera.clone(),
        Arc::new(ScriptedStorage::default()),
        Arc::new(RecordingNotifier::new()),
    ));
    camera.session.set(Arc::downgrade(&session)).unwrap();
    session.check_permission().await;

    let recorded =
        tokio::time::timeout(Duration::from_secs(60), session.start_recording_default())
            .await
            .expect("recording should end once the stop is forwarded")
            .unwrap();

    assert_eq!(recorded.uri, "file://early.mp4");
    assert_eq!(session.snapshot().recording, RecordingState::Idle);
    assert_eq!(session.snapshot().pending_clip, Some(recorded));
}
