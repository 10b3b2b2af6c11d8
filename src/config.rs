//! Bridge configuration supplied by the host at startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::crash::{
    CrashCapture, CrashReporter, DeviceFingerprint, CRASH_TEXT_BUDGET, FALLBACK_REPORT_DIR,
};
use crate::engine::{AudioParams, EngineBridge};

/// Build identification of the device the host runs on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub brand: String,
    pub model: String,
    pub manufacturer: String,
    pub device: String,
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Private data directory: disks, crash records, native dumps.
    pub data_dir: PathBuf,
    /// Home directory reported to the engine on failure.
    pub home_dir: PathBuf,
    /// Public storage for the aggregate crash report, if mounted.
    pub shared_dir: Option<PathBuf>,
    pub fallback_dir: PathBuf,
    pub audio: AudioParams,
    pub device: DeviceInfo,
    pub crash_budget_bytes: usize,
    pub read_attempts: u32,
    pub retry_delay: Duration,
}

impl BridgeConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            home_dir: data_dir.clone(),
            data_dir,
            shared_dir: None,
            fallback_dir: PathBuf::from(FALLBACK_REPORT_DIR),
            audio: AudioParams::default(),
            device: DeviceInfo::default(),
            crash_budget_bytes: CRASH_TEXT_BUDGET,
            read_attempts: 5,
            retry_delay: Duration::from_millis(100),
        }
    }

    pub fn with_home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.home_dir = dir.into();
        self
    }

    pub fn with_shared_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shared_dir = Some(dir.into());
        self
    }

    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    pub fn with_audio(mut self, audio: AudioParams) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    pub fn with_crash_budget(mut self, bytes: usize) -> Self {
        self.crash_budget_bytes = bytes;
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.read_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn disks_dir(&self) -> PathBuf {
        self.data_dir.join("disks")
    }

    pub fn fingerprint(&self) -> DeviceFingerprint {
        DeviceFingerprint {
            brand: self.device.brand.clone(),
            model: self.device.model.clone(),
            manufacturer: self.device.manufacturer.clone(),
            device: self.device.device.clone(),
            audio: self.audio,
        }
    }

    pub fn crash_reporter(&self) -> CrashReporter {
        CrashReporter::new(&self.data_dir)
            .with_shared_dir(self.shared_dir.clone())
            .with_fallback_dir(&self.fallback_dir)
            .with_retry(self.read_attempts, self.retry_delay)
    }

    pub fn crash_capture(&self, engine: Arc<dyn EngineBridge>) -> CrashCapture {
        CrashCapture::new(engine, &self.data_dir)
            .with_home_dir(&self.home_dir)
            .with_fingerprint(self.fingerprint())
            .with_budget(self.crash_budget_bytes)
    }
}

/// Persisted preference touchpoints. The storage format belongs to the host.
pub trait Preferences {
    /// Whether first-run setup (asset extraction) has completed.
    fn is_configured(&self) -> bool;
    fn set_configured(&mut self, configured: bool);
}

/// Run `first_run` against the data directory unless `prefs` says it already
/// ran, then record that it did. Returns whether it ran.
pub fn ensure_configured<E>(
    prefs: &mut dyn Preferences,
    data_dir: &Path,
    first_run: impl FnOnce(&Path) -> Result<(), E>,
) -> Result<bool, E> {
    if prefs.is_configured() {
        return Ok(false);
    }
    log::debug!("First run, preparing {}", data_dir.display());
    first_run(data_dir)?;
    prefs.set_configured(true);
    Ok(true)
}
