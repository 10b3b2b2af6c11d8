use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use emu_bridge::crash::{
    CrashCapture, CrashKind, CrashReporter, ReportOutcome, AGGREGATE_REPORT_FILE,
    MANAGED_CRASH_FILE,
};
use emu_bridge::testing::{RecordingEngine, RecordingTransport};

fn reporter(data: &Path, shared: &Path) -> CrashReporter {
    CrashReporter::new(data)
        .with_shared_dir(Some(shared.to_path_buf()))
        .with_fallback_dir(shared.join("missing"))
        .with_retry(2, Duration::from_millis(1))
}

fn record_managed(data: &Path, trace: &str) {
    let capture = CrashCapture::new(Arc::new(RecordingEngine::new()), data);
    let (_, written) = capture.record(CrashKind::Panic, trace);
    written.unwrap();
}

#[test]
fn sends_every_artifact_once_then_deletes() {
    let data = tempfile::tempdir().unwrap();
    let shared = tempfile::tempdir().unwrap();
    record_managed(data.path(), "managed trace");
    fs::write(data.path().join("1.dmp"), b"raw dump").unwrap();

    let reporter = reporter(data.path(), shared.path());
    let transport = RecordingTransport::new();
    let outcome = reporter.transmit(&transport).unwrap();

    let report = shared.path().join(AGGREGATE_REPORT_FILE);
    assert_eq!(
        outcome,
        ReportOutcome::Sent {
            report: report.clone(),
            artifacts: 2
        }
    );
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, report);
    assert!(sent[0].1.contains("managed trace"));
    assert!(sent[0].1.contains("raw dump"));

    assert!(!reporter.crashes_present());
    assert!(!data.path().join(MANAGED_CRASH_FILE).exists());

    fs::write(data.path().join("2.dmp"), b"another").unwrap();
    assert_eq!(reporter.transmit(&transport).unwrap(), ReportOutcome::AlreadySent);
    assert_eq!(transport.sent().len(), 1);
}

#[test]
fn nothing_to_send_does_not_use_up_the_session() {
    let data = tempfile::tempdir().unwrap();
    let shared = tempfile::tempdir().unwrap();
    let reporter = reporter(data.path(), shared.path());
    let transport = RecordingTransport::new();

    assert_eq!(reporter.transmit(&transport).unwrap(), ReportOutcome::NothingToSend);

    fs::write(data.path().join("late.dmp"), b"dump").unwrap();
    assert!(matches!(
        reporter.transmit(&transport).unwrap(),
        ReportOutcome::Sent { artifacts: 1, .. }
    ));
}

#[test]
fn refused_send_keeps_artifacts() {
    let data = tempfile::tempdir().unwrap();
    let shared = tempfile::tempdir().unwrap();
    record_managed(data.path(), "trace");

    let reporter = reporter(data.path(), shared.path());
    assert!(reporter.transmit(&RecordingTransport::refusing()).is_err());
    assert!(data.path().join(MANAGED_CRASH_FILE).exists());
    assert!(reporter.crashes_present());
}

#[test]
fn falls_back_when_shared_storage_is_missing() {
    let data = tempfile::tempdir().unwrap();
    let fallback = tempfile::tempdir().unwrap();
    fs::write(data.path().join("x.DMP"), b"dump").unwrap();

    let reporter = CrashReporter::new(data.path())
        .with_shared_dir(Some(data.path().join("no-such-dir")))
        .with_fallback_dir(fallback.path())
        .with_retry(1, Duration::ZERO);
    let outcome = reporter.transmit(&RecordingTransport::new()).unwrap();

    assert_eq!(
        outcome,
        ReportOutcome::Sent {
            report: fallback.path().join(AGGREGATE_REPORT_FILE),
            artifacts: 1
        }
    );
}

#[test]
fn processed_dump_is_preferred_and_removed() {
    let data = tempfile::tempdir().unwrap();
    let shared = tempfile::tempdir().unwrap();
    fs::write(data.path().join("7.dmp"), b"\x00\x01binary").unwrap();
    fs::write(data.path().join("7.txt"), b"symbolicated frames").unwrap();

    let reporter = reporter(data.path(), shared.path());
    let transport = RecordingTransport::new();
    reporter.transmit(&transport).unwrap();

    let (_, contents) = &transport.sent()[0];
    assert!(contents.contains("symbolicated frames"));
    assert!(!contents.contains("binary"));
    assert!(!data.path().join("7.dmp").exists());
    assert!(!data.path().join("7.txt").exists());
}

#[test]
fn discard_removes_without_sending() {
    let data = tempfile::tempdir().unwrap();
    record_managed(data.path(), "first");
    record_managed(data.path(), "second");
    fs::write(data.path().join("a.dmp"), b"dump").unwrap();

    let reporter = CrashReporter::new(data.path());
    let artifacts = reporter.scan();
    assert_eq!(artifacts.len(), 2);
    assert!(artifacts.has_managed() && artifacts.has_native());

    let text = fs::read_to_string(data.path().join(MANAGED_CRASH_FILE)).unwrap();
    assert!(text.find("first").unwrap() < text.find("second").unwrap());

    assert_eq!(reporter.discard(), 2);
    assert!(!reporter.crashes_present());
}
