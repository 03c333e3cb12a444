use wm_logger::{LevelFilter, Logger};

#[test]
fn console_only_init_has_no_worker_guard() {
    let logger = Logger::builder("console-test")
        .console(true)
        .level(LevelFilter::DEBUG)
        .init()
        .expect("console-only logger should initialize");

    tracing::info!("console logging is alive");
    assert!(logger.guard().is_none(), "no file appender means no worker guard");
}
