//! Capability doubles driven by pre-recorded scripts

use crate::camera::CameraCapture;
use crate::errors::{CaptureError, StorageError};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::storage::MediaStorage;
use crate::types::{ClipRef, RecordingLimits, StorageAssetId};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

/// How one scripted capture ends
#[derive(Debug, Clone)]
pub struct CaptureScript {
    /// Finish on its own after this long; `None` waits for a stop request
    pub after: Option<Duration>,
    pub result: Result<ClipRef, CaptureError>,
}

impl CaptureScript {
    /// Resolve with `clip` once the limit (`after`) elapses or on stop
    pub fn finish_after(after: Duration, clip: ClipRef) -> Self {
        Self {
            after: Some(after),
            result: Ok(clip),
        }
    }

    /// Resolve with `clip` only when stopped
    pub fn finish_on_stop(clip: ClipRef) -> Self {
        Self {
            after: None,
            result: Ok(clip),
        }
    }

    /// Fail with `error` after `after`, or earlier if stopped
    pub fn fail_after(after: Duration, error: CaptureError) -> Self {
        Self {
            after: Some(after),
            result: Err(error),
        }
    }

    /// Fail right away
    pub fn fail(error: CaptureError) -> Self {
        Self::fail_after(Duration::ZERO, error)
    }
}

/// Camera that replays [`CaptureScript`]s in order
#[derive(Debug, Default)]
pub struct ScriptedCamera {
    scripts: Mutex<VecDeque<CaptureScript>>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
    last_limits: Mutex<Option<RecordingLimits>>,
    captures: AtomicUsize,
    stop_requests: AtomicUsize,
}

impl ScriptedCamera {
    pub fn new(scripts: impl IntoIterator<Item = CaptureScript>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn push(&self, script: CaptureScript) {
        lock(&self.scripts).push_back(script);
    }

    /// Number of times `capture` was called
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// Number of times `request_stop` was called
    pub fn stop_count(&self) -> usize {
        self.stop_requests.load(Ordering::SeqCst)
    }

    pub fn last_limits(&self) -> Option<RecordingLimits> {
        *lock(&self.last_limits)
    }
}

#[async_trait]
impl CameraCapture for ScriptedCamera {
    async fn capture(&self, limits: RecordingLimits) -> Result<ClipRef, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_limits) = Some(limits);

        let script = lock(&self.scripts)
            .pop_front()
            .ok_or_else(|| CaptureError::Unavailable("no scripted capture left".to_string()))?;

        let (tx, rx) = oneshot::channel();
        *lock(&self.stop_tx) = Some(tx);

        match script.after {
            Some(after) => {
                tokio::select! {
                    _ = tokio::time::sleep(after) => {}
                    _ = rx => {}
                }
            }
            None => {
                let _ = rx.await;
            }
        }

        lock(&self.stop_tx).take();
        script.result
    }

    fn request_stop(&self) {
        self.stop_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = lock(&self.stop_tx).take() {
            let _ = tx.send(());
        }
    }
}

/// Media storage that replays scripted results.
///
/// Once the script runs out every save succeeds with `asset-<n>`.
#[derive(Debug, Default)]
pub struct ScriptedStorage {
    results: Mutex<VecDeque<Result<StorageAssetId, StorageError>>>,
    persisted: Mutex<Vec<ClipRef>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedStorage {
    pub fn new(results: impl IntoIterator<Item = Result<StorageAssetId, StorageError>>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Make every `persist` call take `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, result: Result<StorageAssetId, StorageError>) {
        lock(&self.results).push_back(result);
    }

    pub fn persist_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Clips that were successfully persisted
    pub fn persisted(&self) -> Vec<ClipRef> {
        lock(&self.persisted).clone()
    }
}

#[async_trait]
impl MediaStorage for ScriptedStorage {
    async fn persist(&self, clip: &ClipRef) -> Result<StorageAssetId, StorageError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = lock(&self.results)
            .pop_front()
            .unwrap_or_else(|| Ok(StorageAssetId::new(format!("asset-{}", call))));
        if result.is_ok() {
            lock(&self.persisted).push(clip.clone());
        }
        result
    }
}

/// Notifier that keeps everything it was asked to show
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.shown).clone()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        lock(&self.shown).iter().filter(|n| n.kind == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        lock(&self.shown).push(notification);
    }
}
