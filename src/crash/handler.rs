//! Panic interception.
//!
//! [`CrashHandler::install`] places a hook in front of whatever panic hook is
//! already registered. The hook records the failure and then always calls the
//! previous hook, so default panic behavior is unchanged.

use std::backtrace::Backtrace;
use std::panic::{self, PanicHookInfo};
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::{CrashKind, CrashRecord, DeviceFingerprint, CRASH_TEXT_BUDGET};
use crate::engine::EngineBridge;
use crate::error::Result;

static CAPTURE: OnceCell<Arc<CrashCapture>> = OnceCell::new();

/// What the panic hook needs to write a record.
pub struct CrashCapture {
    engine: Arc<dyn EngineBridge>,
    home_dir: PathBuf,
    data_dir: PathBuf,
    fingerprint: DeviceFingerprint,
    budget: usize,
}

impl CrashCapture {
    pub fn new(engine: Arc<dyn EngineBridge>, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            engine,
            home_dir: data_dir.clone(),
            data_dir,
            fingerprint: DeviceFingerprint::default(),
            budget: CRASH_TEXT_BUDGET,
        }
    }

    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = home_dir.into();
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: DeviceFingerprint) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    /// Format, persist and forward one failure. The record is returned even
    /// if it could not be written.
    pub fn record(&self, kind: CrashKind, trace: &str) -> (CrashRecord, Result<PathBuf>) {
        let record = CrashRecord::managed(&self.fingerprint, kind, trace, self.budget);
        let written = record.persist(&self.data_dir);
        self.engine.on_uncaught_failure(&self.home_dir, record.text());
        (record, written)
    }

    fn record_panic(&self, info: &PanicHookInfo<'_>) {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("Box<dyn Any>");
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "<unknown>".to_string());
        let thread = std::thread::current();
        let trace = format!(
            "thread '{}' panicked at {}:\n{}\n{}",
            thread.name().unwrap_or("<unnamed>"),
            location,
            message,
            Backtrace::force_capture()
        );

        if let (_, Err(e)) = self.record(CrashKind::Panic, &trace) {
            log::error!("Could not write crash record: {}", e);
        }
    }
}

pub struct CrashHandler;

impl CrashHandler {
    /// Install the panic hook. Only the first call in a process installs;
    /// later calls return false and leave the existing hook alone.
    pub fn install(capture: CrashCapture) -> bool {
        let capture = Arc::new(capture);
        if CAPTURE.set(capture.clone()).is_err() {
            log::debug!("Crash handler already installed");
            return false;
        }

        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            // A panic in here would abort, so recording only logs its errors
            capture.record_panic(info);
            previous(info);
        }));
        log::info!("Crash handler installed");
        true
    }

    pub fn is_installed() -> bool {
        CAPTURE.get().is_some()
    }

    /// Record a failure the host caught itself, such as an uncaught exception
    /// on its UI thread. Returns false if no handler is installed.
    pub fn report(kind: CrashKind, trace: &str) -> bool {
        let Some(capture) = CAPTURE.get() else {
            log::warn!("Crash handler not installed, dropping {:?}", kind);
            return false;
        };
        if let (_, Err(e)) = capture.record(kind, trace) {
            log::error!("Could not write crash record: {}", e);
        }
        true
    }
}
