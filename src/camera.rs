//! Camera capture capability and a synthetic file-backed camera

use crate::config::CameraConfig;
use crate::errors::CaptureError;
use crate::types::{ClipRef, RecordingLimits};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Camera capture capability.
///
/// `capture` suspends until the recording finishes, either because a limit
/// was reached or because `request_stop` was called.
#[async_trait]
pub trait CameraCapture: Send + Sync {
    async fn capture(&self, limits: RecordingLimits) -> Result<ClipRef, CaptureError>;

    /// Signal the in-flight capture to finalize. No-op when idle.
    fn request_stop(&self);
}

/// Camera that records generated RGB frames to disk.
///
/// Frames are written at a fixed rate; timing is derived from the frame
/// count, so a clip of `n` frames always lasts `n / fps` seconds.
pub struct SyntheticCamera {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    fps: u32,
    in_flight: AtomicBool,
    stop_flag: AtomicBool,
}

impl SyntheticCamera {
    pub fn new(output_dir: impl Into<PathBuf>, width: u32, height: u32, fps: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            width: width.max(1),
            height: height.max(1),
            fps: fps.max(1),
            in_flight: AtomicBool::new(false),
            stop_flag: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(
            &config.output_directory,
            config.width,
            config.height,
            config.fps,
        )
    }

    /// Size of one RGB24 frame in bytes
    pub fn frame_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * 3
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }

    async fn record(&self, limits: RecordingLimits) -> Result<ClipRef, CaptureError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let captured_at = chrono::Utc::now();
        let name = format!(
            "clip_{}_{}.rgb",
            captured_at.format("%Y%m%d_%H%M%S"),
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );
        let path = self.output_dir.join(name);
        let mut file = tokio::fs::File::create(&path).await?;

        let max_frames = (limits.max_duration.as_secs_f64() * self.fps as f64).ceil() as u64;
        let frame_len = self.frame_len();
        let mut interval = tokio::time::interval(self.frame_interval());
        let mut frames = 0u64;
        let mut written = 0u64;

        log::info!(
            "Synthetic capture started: {:?} ({}x{}@{}fps, max {} frames, max {} bytes)",
            path,
            self.width,
            self.height,
            self.fps,
            max_frames,
            limits.max_file_size_bytes
        );

        loop {
            interval.tick().await;

            if self.stop_flag.load(Ordering::SeqCst) {
                log::debug!("Stop requested after {} frames", frames);
                break;
            }
            if frames >= max_frames {
                log::debug!("Duration limit reached after {} frames", frames);
                break;
            }
            if written + frame_len > limits.max_file_size_bytes {
                log::debug!("Size limit reached at {} bytes", written);
                break;
            }

            let frame = synthetic_frame(frames, self.width, self.height);
            file.write_all(&frame).await?;
            frames += 1;
            written += frame_len;
        }

        file.flush().await?;
        file.sync_all().await?;

        let duration = Duration::from_secs_f64(frames as f64 / self.fps as f64);
        log::info!(
            "Synthetic capture finished: {} frames, {:.2}s, {} bytes",
            frames,
            duration.as_secs_f64(),
            written
        );

        Ok(ClipRef::from_path(path)
            .with_duration(duration)
            .with_size(written)
            .with_captured_at(captured_at))
    }
}

#[async_trait]
impl CameraCapture for SyntheticCamera {
    async fn capture(&self, limits: RecordingLimits) -> Result<ClipRef, CaptureError> {
        if self.in_flight.load(Ordering::SeqCst) {
            return Err(CaptureError::Busy("a capture is already running".to_string()));
        }
        // Cleared before going in flight so a stop that follows is never lost
        self.stop_flag.store(false, Ordering::SeqCst);
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::Busy("a capture is already running".to_string()));
        }
        let _in_flight = InFlight(&self.in_flight);

        self.record(limits).await
    }

    fn request_stop(&self) {
        if self.in_flight.load(Ordering::SeqCst) {
            self.stop_flag.store(true, Ordering::SeqCst);
        }
    }
}

/// Clears the in-flight mark when a capture ends, is dropped or unwinds
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Generate one RGB24 frame whose gradient shifts with the frame number
pub fn synthetic_frame(frame_number: u64, width: u32, height: u32) -> Vec<u8> {
    let (width, height) = (width as usize, height as usize);
    let mut data = vec![0u8; width * height * 3];
    let base = (frame_number % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) * 3;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }
    data
}
