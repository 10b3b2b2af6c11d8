//! Host-side bridge for an emulator front-end.
//!
//! Sits between the host UI surface and an emulation engine that runs on its
//! own thread:
//! - a stack of modal overlays that keeps the engine paused while shown
//! - translation of multi-touch batches into the engine's touch protocol
//! - capture and later reporting of fatal failures
//!
//! The engine is reached only through [`EngineBridge`]. The C ABI lives in
//! [`ffi`], and the Android JNI entry points wrap it.

pub mod config;
pub mod crash;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod frontend;
pub mod overlay;
pub mod run_state;
pub mod testing;
pub mod touch;

#[cfg(target_os = "android")]
mod jni;

pub use config::{BridgeConfig, DeviceInfo, Preferences};
pub use crash::{CrashCapture, CrashHandler, CrashRecord, CrashReporter, ReportOutcome};
pub use engine::{AudioParams, EngineBridge, SurfaceSize};
pub use error::{BridgeError, Result};
pub use frontend::{ConfirmOutcome, Frontend};
pub use overlay::{Overlay, OverlayKind, OverlayStackController};
pub use run_state::{PauseReason, PauseReasons, RunState};
pub use touch::{TouchAction, TouchEventTranslator, TouchOutcome, TouchResultFlags, TouchSample};

/// Install the platform logger. Safe to call more than once.
pub fn init_logging() {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("EmuBridge"),
    );
}
