//! Front-end events emitted by the plugin

use crate::notify::{Notification, Notifier};
use crate::session::SessionSnapshot;
use tauri::{AppHandle, Emitter, Runtime};
use tokio::sync::watch;

pub const NOTIFICATION_EVENT: &str = "clipcam://notification";
pub const STATE_EVENT: &str = "clipcam://state";

/// Notifier that hands notifications to the web view as events
pub struct EventNotifier<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> EventNotifier<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> Notifier for EventNotifier<R> {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.app.emit(NOTIFICATION_EVENT, notification) {
            log::warn!("Failed to emit notification: {}", e);
        }
    }
}

/// Re-emit every session snapshot until the session is dropped
pub(crate) fn forward_state<R: Runtime>(
    app: AppHandle<R>,
    mut updates: watch::Receiver<SessionSnapshot>,
) {
    tauri::async_runtime::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if let Err(e) = app.emit(STATE_EVENT, snapshot) {
                log::warn!("Failed to emit session state: {}", e);
            }
        }
    });
}
