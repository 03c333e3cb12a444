//! # Logger
//!
//! Tracing subscriber setup for the whole process.
//!
//! The binary initializes logging exactly once: a compact console layer,
//! optionally mirrored into a rolling file in a log directory the way the
//! production mirror keeps `logs/`. File output goes through a non-blocking
//! writer; the returned [`Logger`] owns the worker guard and must stay alive
//! until shutdown or buffered lines are lost.
//!
//! Filtering follows `RUST_LOG` when set; [`LoggerBuilder::env_filter`]
//! supplies the programmatic default (e.g. `"webmirror=debug,hyper=info"`).
//!
//! ## Example
//!
//! ```rust
//! # use wm_logger::{Logger, LevelFilter};
//!
//! let _logger = Logger::builder("my-app")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::LoggerError;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Rotated files kept before the oldest is deleted.
const KEEP_LOG_FILES: usize = 10;
/// Extension of rolled log files.
const FILE_SUFFIX: &str = "log";

/// Configures and installs the global tracing subscriber.
///
/// Obtained from [`Logger::builder`]; finish with [`LoggerBuilder::init`].
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    console: bool,
    dir: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    env_filter: Option<String>,
}

impl LoggerBuilder {
    /// Minimum level emitted when neither `RUST_LOG` nor an env filter says
    /// otherwise.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Programmatic default filter, e.g. `webmirror=debug,hyper=info`.
    ///
    /// `RUST_LOG` still wins when set. An unparsable filter surfaces from
    /// [`LoggerBuilder::init`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Toggles the console layer (on by default).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Directory for rolled log files; setting it enables file output.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// How many rotated files to keep.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    /// Rotation strategy for the file layer (daily by default).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Switches the file layer to JSON lines.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Installs the global tracing subscriber and returns its handle.
    ///
    /// The handle carries the non-blocking worker guard when file output is
    /// enabled; keep it alive for the lifetime of the program.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for a blank name, `max_files`
    ///   of zero, every output disabled, or an unparsable env filter.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already set.
    pub fn init(self) -> Result<Logger, LoggerError> {
        self.validate()?;

        let filter = self.filter()?;

        let mut layers = Vec::new();
        if self.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }

        let guard = match &self.dir {
            Some(dir) => {
                let (writer, guard) = self.file_writer(dir)?;
                let file_layer = layer().with_writer(writer).with_ansi(false);
                layers.push(if self.json { file_layer.json().boxed() } else { file_layer.boxed() });
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }

    fn validate(&self) -> Result<(), LoggerError> {
        let invalid = |msg: &str| Err(LoggerError::InvalidConfiguration(msg.to_owned()));

        if self.name.trim().is_empty() {
            return invalid("Logger name cannot be empty");
        }
        if self.max_files == 0 {
            return invalid("max_files must be at least 1");
        }
        if !self.console && self.dir.is_none() {
            return invalid("Neither console nor file output is enabled");
        }
        Ok(())
    }

    fn filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.env_filter {
            None => Ok(builder.from_env_lossy()),
            Some(directives) => builder.parse(directives).map_err(|e| {
                LoggerError::InvalidConfiguration(format!("Bad env filter {directives:?}: {e}"))
            }),
        }
    }

    fn file_writer(&self, dir: &Path) -> Result<(NonBlocking, WorkerGuard), LoggerError> {
        fs::create_dir_all(dir)?;

        let appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(&self.name)
            .filename_suffix(FILE_SUFFIX)
            .max_log_files(self.max_files)
            .build(dir)?;

        Ok(tracing_appender::non_blocking(appender))
    }
}

/// Handle to the installed logging system.
///
/// Holds the background worker guard for the file layer; drop it only when
/// the application is shutting down.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Returns a new [`LoggerBuilder`].
    ///
    /// `name` identifies the process in rolled file names
    /// (e.g. `my-app.2023-10-27.log`).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            console: true,
            dir: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: KEEP_LOG_FILES,
            json: false,
            env_filter: None,
        }
    }

    /// Best-effort synchronization point before shutdown; flushing also
    /// happens when the handle is dropped.
    pub fn flush(&self) {
        tracing::debug!("Logger flushed");
    }

    /// The worker guard of the file layer, if file output is enabled.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn builder_starts_console_only_at_info() {
        let builder = Logger::builder("test-app").env_filter("webmirror=debug");
        assert!(builder.console);
        assert_eq!(builder.level, LevelFilter::INFO);
        assert_eq!(builder.env_filter.as_deref(), Some("webmirror=debug"));
        assert!(builder.dir.is_none());
    }

    #[test]
    #[serial]
    fn builder_records_file_settings() {
        let builder = Logger::builder("test-app")
            .env_filter("webmirror=info")
            .path("logs")
            .max_files(5)
            .level(LevelFilter::DEBUG);

        assert_eq!(builder.level, LevelFilter::DEBUG);
        assert_eq!(builder.max_files, 5);
        assert_eq!(builder.dir.as_deref(), Some(Path::new("logs")));
    }

    #[test]
    #[serial]
    fn invalid_settings_are_rejected_before_install() {
        let err = Logger::builder("   ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration(_)));

        let err = Logger::builder("test-app").max_files(0).init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration(_)));

        let err = Logger::builder("test-app").console(false).init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration(_)));

        let err = Logger::builder("test-app").env_filter("===").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration(_)));
    }
}
