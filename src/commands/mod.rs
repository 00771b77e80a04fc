//! Tauri plugin surface for the capture session

pub mod events;
pub mod session;

use crate::camera::CameraCapture;
use crate::config::ClipcamConfig;
use crate::permissions::PermissionProvider;
use crate::session::CaptureSession;
use crate::storage::MediaStorage;
use std::sync::Arc;
use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

pub use events::{EventNotifier, NOTIFICATION_EVENT, STATE_EVENT};
pub use session::SharedSession;

/// Platform services the host application plugs into the session
pub struct PluginCapabilities {
    pub permissions: Arc<dyn PermissionProvider>,
    pub camera: Arc<dyn CameraCapture>,
    pub storage: Arc<dyn MediaStorage>,
}

/// Initialize the clipcam plugin with all commands
pub fn init<R: Runtime>(capabilities: PluginCapabilities) -> TauriPlugin<R> {
    Builder::new("clipcam")
        .invoke_handler(tauri::generate_handler![
            session::check_camera_permission,
            session::request_camera_permission,
            session::start_recording,
            session::stop_recording,
            session::save_clip,
            session::dismiss_clip,
            session::get_session_snapshot,
        ])
        .setup(move |app, _api| {
            let config = ClipcamConfig::load_or_default();
            let notifier = Arc::new(EventNotifier::new(app.clone()));
            let session = Arc::new(CaptureSession::from_config(
                &config,
                capabilities.permissions,
                capabilities.camera,
                capabilities.storage,
                notifier,
            ));

            events::forward_state(app.clone(), session.subscribe());
            app.manage(SharedSession(session));
            log::info!("clipcam plugin initialized");
            Ok(())
        })
        .build()
}
