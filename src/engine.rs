//! Boundary to the emulation engine.
//!
//! The engine runs on its own thread. Every call here is a fire-and-forget
//! signal: implementations must not block the caller and must not report
//! failures back through these calls.

use std::path::Path;

use crate::touch::{TouchResultFlags, TouchSample};

/// Audio device parameters handed to the engine at creation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AudioParams {
    pub sample_rate: i32,
    pub mono_buffer_bytes: i32,
    pub stereo_buffer_bytes: i32,
}

/// Drawable surface dimensions, always landscape.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: i32,
    pub height: i32,
}

impl SurfaceSize {
    /// Normalize observed dimensions so that `width >= height`.
    pub fn landscape(width: i32, height: i32) -> Self {
        if width < height {
            Self {
                width: height,
                height: width,
            }
        } else {
            Self { width, height }
        }
    }
}

/// Lifecycle and input entry points exposed by the engine.
///
/// `on_pause`/`on_resume` must tolerate redundant calls: the overlay stack
/// issues a pause on every push, even when the engine is already paused.
pub trait EngineBridge: Send + Sync {
    fn on_create(&self, data_dir: &Path, audio: AudioParams);
    fn on_graphics_ready(&self, size: SurfaceSize);
    fn on_graphics_resized(&self, size: SurfaceSize);
    fn on_key_down(&self, code: i32, modifiers: i32);
    fn on_key_up(&self, code: i32, modifiers: i32);
    fn on_pause(&self, host_initiated: bool);
    fn on_resume(&self, host_initiated: bool);
    fn on_quit(&self);
    fn on_reboot(&self);
    fn on_render(&self);
    fn on_touch(&self, sample: &TouchSample) -> TouchResultFlags;
    fn choose_disk(&self, path: &Path, drive_a: bool, read_only: bool);
    fn on_uncaught_failure(&self, home_dir: &Path, text: &str);
}
