//! # Capture Archive
//!
//! Read access to the capture snapshot behind the mirror, backed by an
//! embedded [SurrealDB](https://surrealdb.com) engine. The snapshot is
//! prepared offline; at runtime this crate only resolves URLs to captures.
//!
//! * `mem://` engines for tests, `rocksdb://` on disk behind the
//!   `storage-rocksdb` feature, remote `ws://`/`http://` via the `any` engine.
//! * Connection health is retried with backoff while the engine starts up.
//! * A bounded in-memory cache absorbs repeated reads of popular pages.
//!
//! ## Example
//!
//! ```rust
//! use wm_archive::{Archive, ArchiveError, Capture};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ArchiveError> {
//!     let archive = Archive::builder()
//!         .url("mem://")
//!         .session("webmirror", "captures")
//!         .init()
//!         .await?;
//!
//!     let home = Capture::Content { body: b"<p>hi</p>".to_vec(), mime: "text/html".to_owned() };
//!     archive.put("https://www.cdc.gov/", home).await?;
//!
//!     let hit = archive.resolve("www.cdc.gov").await?;
//!     assert!(hit.is_some());
//!
//!     Ok(())
//! }
//! ```

mod capture;
mod error;

pub use capture::{Capture, KEY_SCHEME};
pub use error::ArchiveError;

use capture::{CAPTURE_TABLE, CaptureRecord, fallback_key, primary_key};
use moka::future::Cache;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{debug, info, instrument, warn};

/// Default bound for the hot-capture cache.
static DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Health checks attempted before the engine is declared unreachable.
const HEALTH_ATTEMPTS: u32 = 3;

/// Inner state of the [`Archive`] wrapper.
#[derive(Debug)]
pub struct ArchiveInner {
    instance: Surreal<Any>,
    cache: Cache<String, Arc<Capture>>,
    ns: String,
    db: String,
}

impl Drop for ArchiveInner {
    fn drop(&mut self) {
        info!(ns = %self.ns, db = %self.db, "Snapshot session handle dropped");
    }
}

/// Snapshot client wrapper that provides thread-safety and contextual error handling.
#[derive(Debug, Clone)]
pub struct Archive {
    inner: Arc<ArchiveInner>,
}

impl Archive {
    /// Creates a new [`ArchiveBuilder`].
    pub fn builder() -> ArchiveBuilder {
        ArchiveBuilder::new()
    }
}

impl Deref for Archive {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

/// A fluent builder for opening a snapshot session.
///
/// URL, namespace, and database name are mandatory; everything else has
/// a usable default.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    url: Option<String>,
    ns: Option<String>,
    db: Option<String>,
    auth: Option<(String, String)>,
    cache_capacity: Option<u64>,
}

impl ArchiveBuilder {
    /// Creates a new [`ArchiveBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection URL (`rocksdb://<dir>` for on-disk snapshots, `mem://` in tests).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the namespace and database name.
    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.ns = Some(namespace.into());
        self.db = Some(database.into());
        self
    }

    /// Add root credentials to the connection (only remote engines need them).
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Bounds the hot-capture cache.
    pub const fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    fn required(&self) -> Result<(String, String, String), ArchiveError> {
        let missing = |what: &str| ArchiveError::Validation(format!("{what} is required"));
        Ok((
            self.url.clone().ok_or_else(|| missing("URL"))?,
            self.ns.clone().ok_or_else(|| missing("Namespace"))?,
            self.db.clone().ok_or_else(|| missing("Database"))?,
        ))
    }

    /// Consumes the builder and attempts to open the snapshot.
    ///
    /// Connects the `any` engine, waits for it to report healthy (retrying
    /// with exponential backoff from 500ms), signs in when credentials were
    /// given, and activates the namespace/database session.
    ///
    /// # Errors
    /// * [`ArchiveError::Validation`] if required parameters are missing.
    /// * [`ArchiveError::Connection`] if the engine fails to start or remains unhealthy.
    /// * [`ArchiveError::Db`] if authentication or session activation fails.
    #[instrument(skip(self), fields(url = self.url, ns = self.ns, db = self.db))]
    pub async fn init(self) -> Result<Archive, ArchiveError> {
        let (url, ns, db) = self.required()?;

        let instance = connect(&url)
            .await
            .map_err(|e| ArchiveError::Connection(format!("Initializing engine: {e}")))?;

        let mut delay = Duration::from_millis(500);
        for attempt in 1..=HEALTH_ATTEMPTS {
            if instance.health().await.is_ok() {
                break;
            }
            if attempt == HEALTH_ATTEMPTS {
                return Err(ArchiveError::Connection(format!("Unhealthy after retries: {url}")));
            }
            warn!(attempt, ?delay, "Snapshot engine not ready, retrying...");
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        if let Some((username, password)) = self.auth {
            instance.signin(Root { username, password }).await?;
        }

        instance.use_ns(&ns).use_db(&db).await?;

        let version =
            instance.version().await.map_or_else(|_| "unknown".to_owned(), |v| v.to_string());
        info!(namespace = %ns, database = %db, %version, "Snapshot opened");

        let cache = Cache::builder()
            .max_capacity(self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY))
            .build();

        Ok(Archive { inner: Arc::new(ArchiveInner { instance, cache, ns, db }) })
    }
}

impl Archive {
    /// Fetches a capture by its full snapshot key (`https://…`).
    ///
    /// Hits are served from the hot-capture cache when possible; misses are
    /// not cached so a later snapshot refresh is picked up immediately.
    ///
    /// # Errors
    /// * [`ArchiveError::MalformedRecord`] if the stored record is half-written.
    /// * [`ArchiveError::Db`] on engine failures.
    pub async fn get(&self, url: &str) -> Result<Option<Arc<Capture>>, ArchiveError> {
        if let Some(capture) = self.inner.cache.get(url).await {
            return Ok(Some(capture));
        }

        let record = self
            .inner
            .instance
            .query("SELECT mime, body, redirect FROM type::thing($tb, $url)")
            .bind(("tb", CAPTURE_TABLE))
            .bind(("url", url.to_owned()))
            .await?
            .take::<Option<CaptureRecord>>(0)?;
        let Some(record) = record else {
            return Ok(None);
        };

        let capture = Arc::new(record.into_capture(url)?);
        self.inner.cache.insert(url.to_owned(), Arc::clone(&capture)).await;
        Ok(Some(capture))
    }

    /// Resolves a normalized, scheme-less request path against the snapshot.
    ///
    /// Tries the path verbatim first, then once more with the trailing slash
    /// toggled, mirroring how crawls disagree about directory URLs.
    ///
    /// # Errors
    /// Same failure modes as [`Archive::get`].
    pub async fn resolve(&self, path: &str) -> Result<Option<Arc<Capture>>, ArchiveError> {
        let key = primary_key(path);
        debug!(%key, "Looking up capture");
        if let Some(capture) = self.get(&key).await? {
            return Ok(Some(capture));
        }

        let secondary = fallback_key(path);
        debug!(key = %secondary, "Looking up secondary key");
        match self.get(&secondary).await? {
            Some(capture) => {
                debug!(key = %secondary, "Found capture after slash fixup");
                Ok(Some(capture))
            },
            None => {
                warn!(%path, "Missing capture for path");
                Ok(None)
            },
        }
    }

    /// Stores a capture under its full snapshot key.
    ///
    /// This is the seeding path used by the offline converter and by tests;
    /// the serving path never writes.
    ///
    /// # Errors
    /// * [`ArchiveError::Validation`] if the key does not carry the `https://` scheme.
    /// * [`ArchiveError::Db`] on engine failures (including duplicate keys).
    pub async fn put(&self, url: &str, capture: Capture) -> Result<(), ArchiveError> {
        if !url.starts_with(KEY_SCHEME) {
            return Err(ArchiveError::Validation(format!(
                "Snapshot keys must start with {KEY_SCHEME}: {url}"
            )));
        }

        let record = CaptureRecord::from(capture);
        self.inner
            .instance
            .query("CREATE type::thing($tb, $url) CONTENT $record")
            .bind(("tb", CAPTURE_TABLE))
            .bind(("url", url.to_owned()))
            .bind(("record", record))
            .await?
            .check()
            .map_err(surrealdb::Error::from)?;
        self.inner.cache.invalidate(url).await;
        Ok(())
    }
}
