use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use wm_logger::{LevelFilter, Logger};

#[test]
fn file_logging_creates_log_files() {
    let tmp_dir = tempdir().expect("temp dir");
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder("file-test")
        .path(&log_dir)
        .level(LevelFilter::INFO)
        .init()
        .expect("file logger should initialize");

    tracing::info!("hello world");
    // Give the background worker a moment, then flush explicitly.
    std::thread::sleep(Duration::from_millis(20));
    logger.flush();

    assert!(log_dir.exists(), "log directory should be created by logger init");
    assert!(logger.guard().is_some(), "file appender should hold a worker guard");

    let has_log = fs::read_dir(&log_dir)
        .expect("read log dir")
        .flatten()
        .any(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("log"));

    assert!(has_log, "at least one log file should be created");
}
