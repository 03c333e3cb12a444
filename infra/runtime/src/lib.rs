//! # Runtime
//!
//! Construction of the tokio runtime the server boots on.
//!
//! Worker count, stack size, and thread naming come from a [`RuntimeConfig`];
//! out-of-range values are clamped at build time rather than rejected, so a
//! bad environment variable cannot keep the server from starting.
//!
//! ## Example
//!
//! ```rust
//! use wm_runtime::{RuntimeConfig, build_runtime_with_config};
//!
//! let runtime = build_runtime_with_config(&RuntimeConfig::high_performance()).unwrap();
//! runtime.block_on(async {
//!     // server future goes here
//! });
//! ```

use anyhow::{Context, Result};
use std::thread::available_parallelism;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Hard cap on configured worker threads.
const MAX_WORKERS: usize = 1024;
/// Worker stack floor (1 `MiB`) and ceiling (16 `MiB`).
const STACK_MIN: usize = 1 << 20;
const STACK_MAX: usize = 16 << 20;
/// Workers to assume when hardware detection fails.
const FALLBACK_WORKERS: usize = 4;
/// Name given to worker threads when none is configured.
const WORKER_NAME: &str = "wm-worker";

/// Worker count from `TOKIO_WORKER_THREADS` when set and sane, otherwise the
/// detected hardware parallelism.
fn detect_workers() -> usize {
    std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|&n| (1..=MAX_WORKERS).contains(&n))
        .unwrap_or_else(|| {
            available_parallelism().map_or(FALLBACK_WORKERS, std::num::NonZero::get)
        })
}

/// Settings applied to the tokio runtime at startup.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detect_workers(),
            stack_size: 3 << 20,
            thread_name: WORKER_NAME.to_owned(),
            thread_keep_alive: Duration::from_secs(60),
        }
    }
}

impl RuntimeConfig {
    /// Preset the server boots on: bigger stacks, long keep-alive.
    #[must_use]
    pub fn high_performance() -> Self {
        Self {
            stack_size: 4 << 20,
            thread_name: "wm-server".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    #[must_use]
    pub const fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    #[must_use]
    pub const fn with_thread_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.thread_keep_alive = keep_alive;
        self
    }

    /// Copy of the config with every field forced into its legal range.
    fn normalized(&self) -> Self {
        let thread_name = if self.thread_name.trim().is_empty() {
            WORKER_NAME.to_owned()
        } else {
            self.thread_name.clone()
        };

        Self {
            worker_threads: self.worker_threads.clamp(1, MAX_WORKERS),
            stack_size: self.stack_size.clamp(STACK_MIN, STACK_MAX),
            thread_name,
            thread_keep_alive: self.thread_keep_alive,
        }
    }
}

/// Builds a multi-threaded tokio runtime from the given configuration.
///
/// All tokio drivers (I/O, timers, signals) are enabled. The configuration
/// is normalized first, so callers never see a failure from an out-of-range
/// worker count or stack size.
///
/// # Errors
///
/// Returns an error if the runtime itself cannot be created, which in
/// practice means the OS refused to spawn threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(?config, "Building tokio runtime");

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .context("Failed to initialize the tokio runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_counts_are_clamped() {
        let normalized = RuntimeConfig::default().with_worker_threads(0).normalized();
        assert_eq!(normalized.worker_threads, 1);

        let normalized = RuntimeConfig::default().with_worker_threads(2000).normalized();
        assert_eq!(normalized.worker_threads, MAX_WORKERS);
    }

    #[test]
    fn stack_sizes_are_clamped() {
        let normalized = RuntimeConfig::default().with_stack_size(100).normalized();
        assert_eq!(normalized.stack_size, STACK_MIN);

        let normalized = RuntimeConfig::default().with_stack_size(100 << 20).normalized();
        assert_eq!(normalized.stack_size, STACK_MAX);
    }

    #[test]
    fn blank_thread_names_fall_back() {
        let normalized = RuntimeConfig::default().with_thread_name("   ").normalized();
        assert_eq!(normalized.thread_name, WORKER_NAME);

        let normalized = RuntimeConfig::default().with_thread_name("mirror").normalized();
        assert_eq!(normalized.thread_name, "mirror");
    }
}
