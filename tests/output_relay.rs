use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};
use trajrun::engine::JobEvent;
use trajrun::exec::{DiagnosticTail, OutputStream, RelaySinks, spawn_relay};
use trajrun::fs::FileSystem;
use trajrun::fs::mock::MockFileSystem;
use trajrun::logging::JobLog;
use trajrun_test_utils::{init_tracing, with_timeout};

fn sinks(log_path: &Path) -> (RelaySinks, mpsc::Receiver<JobEvent>) {
    let (tx, rx) = mpsc::channel(256);
    let sinks = RelaySinks {
        job: 1,
        log: JobLog::open(log_path).unwrap(),
        tail: DiagnosticTail::new(3),
        events: tx,
    };
    (sinks, rx)
}

fn texts(rx: &mut mpsc::Receiver<JobEvent>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let JobEvent::Output { line, .. } = event {
            out.push(line.text);
        }
    }
    out
}

#[tokio::test]
async fn test_relay_strips_line_endings_and_keeps_partial_last_line() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (sinks, mut rx) = sinks(&dir.path().join("job.log"));
    let tail = sinks.tail.clone();
    let (_cancel_tx, cancel) = watch::channel(false);

    let input: &[u8] = b"first\r\nsecond\n\xffbad utf8\nno newline";
    let relay = spawn_relay(input, OutputStream::Stdout, sinks, cancel, Duration::from_secs(1));

    assert_eq!(with_timeout(relay).await.unwrap(), 4);
    assert_eq!(
        texts(&mut rx),
        vec!["first", "second", "\u{FFFD}bad utf8", "no newline"]
    );
    assert_eq!(tail.snapshot(), vec!["second", "\u{FFFD}bad utf8", "no newline"]);

    let log = std::fs::read_to_string(dir.path().join("job.log")).unwrap();
    assert_eq!(log.lines().count(), 4);
    assert!(log.lines().all(|l| l.contains(" - STDOUT - ")));
}

#[tokio::test]
async fn test_relay_drains_buffered_lines_after_cancel() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (sinks, mut rx) = sinks(&dir.path().join("job.log"));
    let (cancel_tx, cancel) = watch::channel(false);
    let (mut writer, reader) = tokio::io::duplex(1024);

    writer.write_all(b"before\n").await.unwrap();
    let relay = spawn_relay(reader, OutputStream::Stderr, sinks, cancel, Duration::from_secs(2));
    tokio::time::sleep(Duration::from_millis(50)).await;

    cancel_tx.send_replace(true);
    writer.write_all(b"after 1\nafter 2\n").await.unwrap();
    drop(writer);

    assert_eq!(with_timeout(relay).await.unwrap(), 3);
    assert_eq!(texts(&mut rx), vec!["before", "after 1", "after 2"]);
}

#[tokio::test]
async fn test_relay_gives_up_at_drain_deadline() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (sinks, _rx) = sinks(&dir.path().join("job.log"));
    let (_cancel_tx, cancel) = watch::channel(true);
    // Writer stays open: no EOF ever arrives.
    let (_writer, reader) = tokio::io::duplex(64);

    let relay = spawn_relay(reader, OutputStream::Stdout, sinks, cancel, Duration::from_millis(100));
    assert_eq!(with_timeout(relay).await.unwrap(), 0);
}

#[test]
fn test_job_log_appends_timestamped_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis.log");

    let log = JobLog::open(&path).unwrap();
    log.info("Starting analysis job");
    log.warn("plots skipped");
    drop(log);

    let reopened = JobLog::open(&path).unwrap();
    reopened.error("Engine exited with code 2");
    reopened.engine_line(OutputStream::Stderr, "atom selection failed");
    assert_eq!(reopened.path(), path.as_path());

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with(" - INFO - Starting analysis job"));
    assert!(lines[1].ends_with(" - WARNING - plots skipped"));
    assert!(lines[2].ends_with(" - ERROR - Engine exited with code 2"));
    assert!(lines[3].ends_with(" - STDERR - atom selection failed"));

    // RFC 3339 UTC timestamp up front, e.g. 2024-05-01T12:00:00.123Z
    let timestamp = lines[0].split(" - ").next().unwrap();
    assert!(timestamp.contains('T') && timestamp.ends_with('Z'), "{timestamp}");
}

#[test]
fn test_mock_fs_tracks_files_and_dirs() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/Analysis/RMSD_A.dat", b"0 1.0".to_vec());

    assert!(fs.is_file(Path::new("/p/Analysis/RMSD_A.dat")));
    assert!(fs.is_dir(Path::new("/p/Analysis")));
    assert!(fs.exists(Path::new("/p")));
    assert!(!fs.exists(Path::new("/p/Analysis/RGYR_A.dat")));
    assert_eq!(
        fs.contents("/p/Analysis/RMSD_A.dat").as_deref(),
        Some(b"0 1.0".as_slice())
    );

    assert!(fs.create_dir_all(Path::new("/p/Analysis/RMSD_A.dat")).is_err());
    fs.create_dir_all(Path::new("/p/Contacts")).unwrap();
    assert!(fs.is_dir(Path::new("/p/Contacts")));

    fs.write(Path::new("/p/Contacts/contacts.log"), b"x").unwrap();
    assert_eq!(fs.contents("/p/Contacts/contacts.log"), Some(b"x".to_vec()));
    assert_eq!(fs.contents("/p/Contacts"), None);
    assert_eq!(fs.snapshot().len(), 6);
}
