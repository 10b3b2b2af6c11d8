//! Crash reporting on the next healthy launch.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use super::CrashOrigin;
use crate::error::{BridgeError, Result};

/// Managed-origin records, appended in the private data directory.
pub const MANAGED_CRASH_FILE: &str = "managed_crash.txt";
/// Native dumps are any file in the data directory with this suffix.
pub const NATIVE_DUMP_SUFFIX: &str = ".dmp";
/// Name of the aggregate report handed to the transport.
pub const AGGREGATE_REPORT_FILE: &str = "emu_crash.txt";
/// Used when no shared storage is available.
pub const FALLBACK_REPORT_DIR: &str = "/data/local/tmp";

const PROCESSED_DUMP_SUFFIX: &str = ".txt";

/// Host mechanism that ships the aggregate report (share sheet, mail, upload).
pub trait ReportTransport {
    fn send(&self, report: &Path) -> Result<()>;
}

/// Crash files found in the data directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrashArtifacts {
    entries: Vec<(CrashOrigin, PathBuf)>,
}

impl CrashArtifacts {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CrashOrigin, &Path)> {
        self.entries.iter().map(|(origin, path)| (*origin, path.as_path()))
    }

    pub fn has_managed(&self) -> bool {
        self.entries.iter().any(|(o, _)| *o == CrashOrigin::Managed)
    }

    pub fn has_native(&self) -> bool {
        self.entries.iter().any(|(o, _)| *o == CrashOrigin::Native)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Sent { report: PathBuf, artifacts: usize },
    AlreadySent,
    NothingToSend,
}

fn is_native_dump(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.len() > NATIVE_DUMP_SUFFIX.len()
        && name
            .get(name.len() - NATIVE_DUMP_SUFFIX.len()..)
            .is_some_and(|s| s.eq_ignore_ascii_case(NATIVE_DUMP_SUFFIX))
}

/// `crash.dmp` -> `crash.txt`, where the engine leaves a symbolicated copy.
fn processed_path(dump: &Path) -> PathBuf {
    let name = dump.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let stem = &name[..name.len().saturating_sub(NATIVE_DUMP_SUFFIX.len())];
    dump.with_file_name(format!("{stem}{PROCESSED_DUMP_SUFFIX}"))
}

fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
    )
}

/// Read `path`, retrying transient failures up to `attempts` times with
/// `delay` between tries. Any other error, or running out of attempts,
/// yields `None`.
pub fn read_with_retry(path: &Path, attempts: u32, delay: Duration) -> Option<String> {
    for attempt in 1..=attempts {
        match fs::read(path) {
            Ok(bytes) => return Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if is_transient(e.kind()) => {
                log::trace!("Interrupted reading {} (attempt {})", path.display(), attempt);
            }
            Err(e) => {
                log::debug!("Error reading {}: {}", path.display(), e);
                return None;
            }
        }
        if attempt < attempts {
            thread::sleep(delay);
        }
    }
    None
}

fn write_with_retry(path: &Path, data: &str, attempts: u32, delay: Duration) -> Result<()> {
    let mut last = None;
    for attempt in 1..=attempts {
        match fs::write(path, data) {
            Ok(()) => return Ok(()),
            Err(e) => {
                log::warn!("Error writing {} (attempt {}): {}", path.display(), attempt, e);
                last = Some(e);
            }
        }
        if attempt < attempts {
            thread::sleep(delay);
        }
    }
    Err(match last {
        Some(e) => BridgeError::io(path, e),
        None => BridgeError::NoStorage,
    })
}

pub struct CrashReporter {
    data_dir: PathBuf,
    shared_dir: Option<PathBuf>,
    fallback_dir: PathBuf,
    attempts: u32,
    delay: Duration,
    checked: AtomicBool,
    sent: AtomicBool,
}

impl CrashReporter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            shared_dir: None,
            fallback_dir: PathBuf::from(FALLBACK_REPORT_DIR),
            attempts: 5,
            delay: Duration::from_millis(100),
            checked: AtomicBool::new(false),
            sent: AtomicBool::new(false),
        }
    }

    pub fn with_shared_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.shared_dir = dir;
        self
    }

    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.delay = delay;
        self
    }

    /// List the managed record and every native dump in the data directory.
    pub fn scan(&self) -> CrashArtifacts {
        let mut entries = Vec::new();

        let managed = self.data_dir.join(super::MANAGED_CRASH_FILE);
        if managed.is_file() {
            entries.push((CrashOrigin::Managed, managed));
        }

        match fs::read_dir(&self.data_dir) {
            Ok(dir) => {
                let mut dumps: Vec<PathBuf> = dir
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file() && is_native_dump(path))
                    .collect();
                dumps.sort();
                entries.extend(dumps.into_iter().map(|p| (CrashOrigin::Native, p)));
            }
            Err(e) => log::warn!("Cannot scan {} for crashes: {}", self.data_dir.display(), e),
        }

        CrashArtifacts { entries }
    }

    pub fn crashes_present(&self) -> bool {
        !self.scan().is_empty()
    }

    /// Scan once per process. Later calls return `None`.
    pub fn check_once(&self) -> Option<CrashArtifacts> {
        if self.checked.swap(true, Ordering::AcqRel) {
            return None;
        }
        let artifacts = self.scan();
        if artifacts.is_empty() {
            None
        } else {
            log::info!("Found {} crash artifact(s)", artifacts.len());
            Some(artifacts)
        }
    }

    /// Concatenate every artifact into one report. Unreadable artifacts are
    /// noted in place.
    pub fn aggregate(&self, artifacts: &CrashArtifacts) -> String {
        let mut report = String::new();
        for (origin, path) in artifacts.iter() {
            let source = match origin {
                CrashOrigin::Native if processed_path(path).is_file() => processed_path(path),
                _ => path.to_path_buf(),
            };
            let _ = writeln!(report, "=== {:?} crash: {} ===", origin, source.display());
            match read_with_retry(&source, self.attempts, self.delay) {
                Some(text) => report.push_str(&text),
                None => report.push_str("<unreadable>"),
            }
            report.push('\n');
        }
        report
    }

    /// Write the aggregate to shared storage, or to the fallback directory
    /// when shared storage is missing or refuses the write.
    pub fn write_aggregate(&self, report: &str) -> Result<PathBuf> {
        let mut targets = Vec::with_capacity(2);
        if let Some(shared) = self.shared_dir.as_deref().filter(|d| d.is_dir()) {
            targets.push(shared);
        }
        targets.push(self.fallback_dir.as_path());

        let mut last = BridgeError::NoStorage;
        for dir in targets {
            let path = dir.join(AGGREGATE_REPORT_FILE);
            log::debug!("Writing crash report to {}", path.display());
            match write_with_retry(&path, report, self.attempts, self.delay) {
                Ok(()) => return Ok(path),
                Err(e) => last = e,
            }
        }
        Err(last)
    }

    /// Send the aggregate report through `transport`, at most once per
    /// process. Artifacts are deleted only after a successful send.
    pub fn transmit(&self, transport: &dyn ReportTransport) -> Result<ReportOutcome> {
        let artifacts = self.scan();
        if artifacts.is_empty() {
            return Ok(ReportOutcome::NothingToSend);
        }
        if self.sent.swap(true, Ordering::AcqRel) {
            log::debug!("Crash report already sent this session");
            return Ok(ReportOutcome::AlreadySent);
        }

        let report = self.aggregate(&artifacts);
        let path = self.write_aggregate(&report)?;
        transport.send(&path)?;
        log::info!("Crash report sent: {}", path.display());

        self.delete(&artifacts);
        Ok(ReportOutcome::Sent {
            report: path,
            artifacts: artifacts.len(),
        })
    }

    /// Delete the current artifacts without sending them.
    pub fn discard(&self) -> usize {
        let artifacts = self.scan();
        self.delete(&artifacts)
    }

    fn delete(&self, artifacts: &CrashArtifacts) -> usize {
        let mut removed = 0;
        for (origin, path) in artifacts.iter() {
            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
            }
            if origin == CrashOrigin::Native {
                let processed = processed_path(path);
                if processed.is_file() {
                    let _ = fs::remove_file(processed);
                }
            }
        }
        removed
    }
}
