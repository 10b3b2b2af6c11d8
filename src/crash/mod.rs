//! Crash capture and reporting.
//!
//! A [`CrashRecord`] is formatted at failure time, bounded to a fixed byte
//! budget and appended to a file in the private data directory. On a later
//! healthy launch the [`CrashReporter`] gathers those records together with
//! any native dump files and hands one aggregate report to the host.

mod handler;
mod report;

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::engine::AudioParams;
use crate::error::{BridgeError, Result};

pub use handler::{CrashCapture, CrashHandler};
pub use report::{
    read_with_retry, CrashArtifacts, CrashReporter, ReportOutcome, ReportTransport,
    AGGREGATE_REPORT_FILE, FALLBACK_REPORT_DIR, MANAGED_CRASH_FILE, NATIVE_DUMP_SUFFIX,
};

/// Byte budget for a rendered record, kept under half a 4 KiB page.
pub const CRASH_TEXT_BUDGET: usize = 2048 + 1024 + 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashOrigin {
    /// A panic in the bridge or its host.
    Managed,
    /// A fault inside the engine, written out as a dump file.
    Native,
}

/// Category token. The discriminants are shared with the engine's crash
/// test hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum CrashKind {
    Panic = 0,
    NullDeref = 1,
    StackCallOverflow = 2,
    StackBufOverflow = 3,
}

impl From<i32> for CrashKind {
    fn from(value: i32) -> Self {
        match value {
            1 => CrashKind::NullDeref,
            2 => CrashKind::StackCallOverflow,
            3 => CrashKind::StackBufOverflow,
            _ => CrashKind::Panic,
        }
    }
}

impl CrashKind {
    pub fn title(self) -> &'static str {
        match self {
            CrashKind::Panic => "panic",
            CrashKind::NullDeref => "null dereference",
            CrashKind::StackCallOverflow => "stack call overflow",
            CrashKind::StackBufOverflow => "stack buffer overflow",
        }
    }
}

/// Device identification prepended to every managed record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceFingerprint {
    pub brand: String,
    pub model: String,
    pub manufacturer: String,
    pub device: String,
    pub audio: AudioParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashRecord {
    origin: CrashOrigin,
    kind: CrashKind,
    text: String,
}

impl CrashRecord {
    /// Format a managed-origin record: fingerprint, category, then the trace,
    /// truncated as a whole to `budget` bytes.
    pub fn managed(
        fingerprint: &DeviceFingerprint,
        kind: CrashKind,
        trace: &str,
        budget: usize,
    ) -> Self {
        let mut text = String::with_capacity(budget.min(trace.len() + 256));
        let _ = writeln!(text, "{}", fingerprint.brand);
        let _ = writeln!(text, "{}", fingerprint.model);
        let _ = writeln!(text, "{}", fingerprint.manufacturer);
        let _ = writeln!(text, "{}", fingerprint.device);
        let _ = writeln!(text, "Device sample rate:{}", fingerprint.audio.sample_rate);
        let _ = writeln!(text, "Device mono buffer size:{}", fingerprint.audio.mono_buffer_bytes);
        let _ = writeln!(text, "Device stereo buffer size:{}", fingerprint.audio.stereo_buffer_bytes);
        let _ = writeln!(text, "{}", kind.title());
        text.push_str(trace);
        text.push('\n');

        let cut = truncate_utf8(&text, budget).len();
        text.truncate(cut);

        Self {
            origin: CrashOrigin::Managed,
            kind,
            text,
        }
    }

    pub fn origin(&self) -> CrashOrigin {
        self.origin
    }

    pub fn kind(&self) -> CrashKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Append to `<dir>/`[`MANAGED_CRASH_FILE`] and sync to disk.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANAGED_CRASH_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| BridgeError::io(&path, e))?;
        file.write_all(self.text.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| BridgeError::io(&path, e))?;
        Ok(path)
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
pub fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint() -> DeviceFingerprint {
        DeviceFingerprint {
            brand: "acme".into(),
            model: "A1".into(),
            manufacturer: "Acme Corp".into(),
            device: "a1dev".into(),
            audio: AudioParams {
                sample_rate: 44100,
                mono_buffer_bytes: 512,
                stereo_buffer_bytes: 1024,
            },
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_utf8("héllo", 2), "h");
        assert_eq!(truncate_utf8("héllo", 3), "hé");
        assert_eq!(truncate_utf8("abc", 10), "abc");
        assert_eq!(truncate_utf8("abc", 0), "");
    }

    #[test]
    fn record_starts_with_fingerprint() {
        let record = CrashRecord::managed(&fingerprint(), CrashKind::Panic, "boom", CRASH_TEXT_BUDGET);
        let lines: Vec<_> = record.text().lines().collect();
        assert_eq!(lines[0], "acme");
        assert_eq!(lines[4], "Device sample rate:44100");
        assert_eq!(lines[6], "Device stereo buffer size:1024");
        assert_eq!(lines[7], "panic");
        assert_eq!(lines[8], "boom");
        assert_eq!(record.origin(), CrashOrigin::Managed);
    }

    #[test]
    fn long_trace_is_cut_to_budget() {
        let trace = "x".repeat(10_000);
        let record = CrashRecord::managed(&fingerprint(), CrashKind::Panic, &trace, CRASH_TEXT_BUDGET);
        assert_eq!(record.text().len(), CRASH_TEXT_BUDGET);
    }

    #[test]
    fn multibyte_trace_is_not_split() {
        let trace = "€".repeat(5_000);
        let record = CrashRecord::managed(&fingerprint(), CrashKind::Panic, &trace, CRASH_TEXT_BUDGET);
        assert!(record.text().len() <= CRASH_TEXT_BUDGET);
        assert!(record.text().ends_with('€'));
    }

    #[test]
    fn persist_appends() {
        let dir = tempfile::tempdir().unwrap();
        let first = CrashRecord::managed(&fingerprint(), CrashKind::Panic, "one", 4096);
        let second = CrashRecord::managed(&fingerprint(), CrashKind::Panic, "two", 4096);
        let path = first.persist(dir.path()).unwrap();
        second.persist(dir.path()).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, format!("{}{}", first.text(), second.text()));
    }
}
