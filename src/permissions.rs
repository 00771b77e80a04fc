use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Camera permission state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Not determined yet (user hasn't been asked, or the probe is still pending)
    Unknown,
    /// Permission denied
    Denied,
    /// Permission granted
    Granted,
}

impl Default for PermissionState {
    fn default() -> Self {
        PermissionState::Unknown
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionState::Unknown => write!(f, "unknown"),
            PermissionState::Denied => write!(f, "denied"),
            PermissionState::Granted => write!(f, "granted"),
        }
    }
}

/// Platform permission capability.
///
/// `request` may prompt the user; its result reflects the user's choice.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn query(&self) -> PermissionState;
    async fn request(&self) -> PermissionState;
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionState,
    pub message: String,
    pub can_request: bool,
}

/// Check camera permission status
pub fn check_permission() -> PermissionState {
    check_permission_detailed().status
}

/// Check camera permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(not(target_os = "linux"))]
    {
        PermissionInfo {
            status: PermissionState::Unknown,
            message: "Permission probing not supported on this host".to_string(),
            can_request: false,
        }
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    use std::fs;
    use std::path::Path;

    let video_devices: Vec<_> = (0..10)
        .map(|i| format!("/dev/video{}", i))
        .filter(|path| Path::new(path).exists())
        .collect();

    let Some(first_device) = video_devices.first() else {
        return PermissionInfo {
            status: PermissionState::Unknown,
            message: "No video devices found at /dev/video*".to_string(),
            can_request: false,
        };
    };

    match fs::metadata(first_device) {
        Ok(_) if check_linux_group_membership() => PermissionInfo {
            status: PermissionState::Granted,
            message: format!(
                "Camera access granted (user in video group, {} found)",
                first_device
            ),
            can_request: false,
        },
        Ok(_) => PermissionInfo {
            status: PermissionState::Denied,
            message: format!(
                "Camera device {} exists but user not in video group - run: sudo usermod -a -G video $USER",
                first_device
            ),
            can_request: true,
        },
        Err(e) => PermissionInfo {
            status: PermissionState::Denied,
            message: format!("Cannot access {}: {}", first_device, e),
            can_request: true,
        },
    }
}

#[cfg(target_os = "linux")]
fn check_linux_group_membership() -> bool {
    use std::process::Command;

    let Ok(output) = Command::new("groups").output() else {
        return false;
    };
    match String::from_utf8(output.stdout) {
        Ok(groups) => groups
            .split_whitespace()
            .any(|g| g == "video" || g == "plugdev"),
        Err(_) => false,
    }
}

/// Permission provider backed by the host's device permissions.
///
/// Desktop hosts have no programmatic prompt, so `request` re-probes and
/// logs what the user has to do instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPermissions;

impl SystemPermissions {
    async fn probe() -> PermissionInfo {
        tokio::task::spawn_blocking(check_permission_detailed)
            .await
            .unwrap_or_else(|e| PermissionInfo {
                status: PermissionState::Unknown,
                message: format!("Permission probe failed: {}", e),
                can_request: false,
            })
    }
}

#[async_trait]
impl PermissionProvider for SystemPermissions {
    async fn query(&self) -> PermissionState {
        let info = Self::probe().await;
        log::debug!("Camera permission probe: {} ({})", info.status, info.message);
        info.status
    }

    async fn request(&self) -> PermissionState {
        let info = Self::probe().await;
        if info.status != PermissionState::Granted {
            log::warn!("Cannot prompt for camera permission: {}", info.message);
        }
        info.status
    }
}

/// Permission provider with a fixed answer.
///
/// Starts at `initial`; every prompt moves it to `on_request`.
#[derive(Debug)]
pub struct StaticPermissions {
    current: Mutex<PermissionState>,
    on_request: PermissionState,
    requests: AtomicUsize,
}

impl StaticPermissions {
    pub fn new(initial: PermissionState, on_request: PermissionState) -> Self {
        Self {
            current: Mutex::new(initial),
            on_request,
            requests: AtomicUsize::new(0),
        }
    }

    /// Always granted, no prompt needed
    pub fn granted() -> Self {
        Self::new(PermissionState::Granted, PermissionState::Granted)
    }

    /// Number of times the user was prompted
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn current(&self) -> PermissionState {
        *self.current.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl PermissionProvider for StaticPermissions {
    async fn query(&self) -> PermissionState {
        self.current()
    }

    async fn request(&self) -> PermissionState {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        *current = self.on_request;
        *current
    }
}
