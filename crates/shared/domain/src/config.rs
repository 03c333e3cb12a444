use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level mirror configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfigInner {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rewrite: RewriteConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    #[serde(flatten, default)]
    inner: Arc<MirrorConfigInner>,
}

impl Deref for MirrorConfig {
    type Target = MirrorConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for MirrorConfig {
    fn deref_mut(&mut self) -> &mut MirrorConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Listen address and TLS material of the HTTP front.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::LOCALHOST), port: 7070, ssl: None }
    }
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

/// Where the capture snapshot lives and how to open it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DatabaseCredentials>,
    pub cache_capacity: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_owned(),
            namespace: "webmirror".to_owned(),
            database: "captures".to_owned(),
            credentials: None,
            cache_capacity: 10_000,
        }
    }
}

/// Root credentials; only remote engines need them, embedded snapshots run
/// unauthenticated.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

impl Default for DatabaseCredentials {
    fn default() -> Self {
        Self { username: "root".to_owned(), password: "root".to_owned() }
    }
}

/// Link-rewriting rules applied to archived HTML bodies.
///
/// A domain in `local_domains` is served by this instance and rewrites to a
/// root-relative mirror path. A domain in `primary_domains` lives on the
/// canonical public mirror and rewrites to an absolute URL on `primary_host`.
/// Everything else under `domain_suffix` falls back to the local form.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub domain_suffix: String,
    pub local_domains: Vec<String>,
    pub primary_host: String,
    pub primary_domains: Vec<String>,
    /// Broken capture-time hostnames mapped to their canonical form.
    pub aliases: HashMap<String, String>,
}

impl RewriteConfig {
    /// The domain the root route redirects to.
    #[must_use]
    pub fn home_domain(&self) -> Option<&str> {
        self.local_domains.first().map(String::as_str)
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            domain_suffix: "cdc.gov".to_owned(),
            local_domains: vec!["www.cdc.gov".to_owned()],
            primary_host: "www.restoredcdc.org".to_owned(),
            primary_domains: Vec::new(),
            aliases: HashMap::from([(
                "hivriskstage.cdc.gov".to_owned(),
                "hivrisk.cdc.gov".to_owned(),
            )]),
        }
    }
}

/// Log output configuration; `dir = None` keeps logging console-only.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub filter: Option<String>,
}
