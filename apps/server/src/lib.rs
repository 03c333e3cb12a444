//! # WebMirror Server
//!
//! Serves a read-only mirror of an archived web property: an `Axum` HTTP
//! front over an embedded `SurrealDB` capture snapshot, with HTML link
//! rewriting so the mirror stays self-contained.
//!
//! ## Example
//! ```no_run
//! use wm_runtime::RuntimeConfig;
//! use wm_server::Server;
//!
//! fn main() -> anyhow::Result<()> {
//!     let runtime = wm_runtime::build_runtime_with_config(&RuntimeConfig::high_performance())?;
//!     runtime.block_on(async { Server::builder().port(7070).build().await?.run().await })
//! }
//! ```

mod router;

use anyhow::{Context, Result, anyhow, bail};
use axum_server::Handle;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use webmirror::domain::config::{MirrorConfig, SslConfig};
use webmirror::kernel::server::ApiState;
use wm_archive::Archive;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_WINDOW: Duration = Duration::from_secs(30);

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: MirrorConfig,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: MirrorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Consumes the builder and initializes the server.
    ///
    /// Validates the TLS material when configured, opens the capture
    /// snapshot, initializes the feature slices (link rewriting), and
    /// assembles the shared API state.
    ///
    /// # Errors
    /// Returns an error if:
    /// * The snapshot cannot be opened (missing directory, corrupt store)
    /// * A feature slice fails to initialize (uncompilable rewrite rules)
    /// * SSL certificate/key files cannot be read
    pub async fn build(self) -> Result<Server> {
        if let Some(ssl) = &self.cfg.server.ssl {
            check_tls_material(ssl)?;
        }

        info!(
            address = %SocketAddr::new(self.cfg.server.address, self.cfg.server.port),
            "Initializing server"
        );

        let archive = open_snapshot(&self.cfg).await?;

        let slices =
            webmirror::init(&self.cfg).map_err(|e| anyhow!("Feature bootstrap failed: {e}"))?;

        let mut state = ApiState::builder().config(self.cfg).archive(archive);
        for slice in slices {
            state = state.register_slice(slice);
        }
        let state = state.build().context("Assembling API state")?;

        Ok(Server { state })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Serves the mirror until a shutdown signal arrives, then drains.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address
    /// or if SSL/TLS setup fails.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);
        let app = router::init(self.state);

        let handle = Handle::<SocketAddr>::new();
        tokio::spawn(drain_on_signal(handle.clone()));

        match &cfg.server.ssl {
            Some(ssl) => {
                info!(%address, "Serving the mirror over HTTPS");

                let tls =
                    axum_server::tls_rustls::RustlsConfig::from_pem_file(&ssl.cert, &ssl.key)
                        .await
                        .context("Loading TLS certificate and key")?;

                axum_server::bind_rustls(address, tls)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                    .context("HTTPS server failed")?;
            },
            None => {
                info!(%address, "Serving the mirror over HTTP");

                axum_server::bind(address)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                    .context("HTTP server failed")?;
            },
        }

        info!("Server stopped");
        Ok(())
    }
}

/// Opens the capture snapshot named by the configuration.
async fn open_snapshot(cfg: &MirrorConfig) -> Result<Archive> {
    let db = &cfg.database;
    let mut archive = Archive::builder()
        .url(&db.url)
        .session(&db.namespace, &db.database)
        .cache_capacity(db.cache_capacity);

    if let Some(creds) = &db.credentials {
        archive = archive.auth(&creds.username, &creds.password);
    }

    archive.init().await.with_context(|| format!("Opening capture snapshot at {}", db.url))
}

/// Rejects missing TLS material up front; a world-readable key only warns.
fn check_tls_material(ssl: &SslConfig) -> Result<()> {
    if !ssl.cert.exists() {
        bail!("SSL certificate not found at: {}", ssl.cert.display());
    }
    if !ssl.key.exists() {
        bail!("SSL key not found at: {}", ssl.key.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = ssl.key.metadata()?;
        if metadata.permissions().mode() & 0o077 != 0 {
            tracing::warn!(
                "SECURITY: SSL Private Key {} has insecure permissions (should be 600)",
                ssl.key.display()
            );
        }
    }

    Ok(())
}

/// Starts the graceful drain once a shutdown signal arrives.
async fn drain_on_signal(handle: Handle<SocketAddr>) {
    if let Err(e) = shutdown_signal().await {
        error!("Error while waiting for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received, draining connections...");
    handle.graceful_shutdown(Some(DRAIN_WINDOW));
}

/// Resolves on SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?;

        tokio::select! {
            res = signal::ctrl_c() => res.context("Failed to install Ctrl+C handler")?,
            _ = terminate.recv() => {},
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.context("Failed to install Ctrl+C handler")
    }
}
