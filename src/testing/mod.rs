//! Testing utilities for clipcam
//!
//! Scripted capability doubles so session behaviour can be exercised
//! without a camera or a media library.

pub mod scripted;

pub use scripted::{CaptureScript, RecordingNotifier, ScriptedCamera, ScriptedStorage};
