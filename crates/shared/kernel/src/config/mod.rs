//! Layered configuration loading: one base file, environment on top.

use config::{Case, Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Prefix of environment overrides (`WM__SERVER__PORT` -> `server.port`).
const ENV_PREFIX: &str = "WM";
/// File stem consulted when no explicit path is given.
const DEFAULT_SOURCE: &str = "server";

/// Custom error type for config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Loads configuration from a base file overlaid with environment variables.
///
/// The file is required (default: `server.*` in the working directory, any
/// format the `config` crate recognizes). On top of it, variables prefixed
/// with `WM__` override individual keys, with `__` separating nesting
/// levels: `WM__DATABASE__URL` maps to `database.url`.
///
/// # Errors
/// Fails when the file is missing or the merged values do not deserialize
/// into `T`.
///
/// # Example
/// ```rust
/// use wm_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let source =
        path.map_or_else(|| PathBuf::from(DEFAULT_SOURCE), |p| p.as_ref().to_path_buf());
    info!("Loading config from {}", source.display());

    let overrides =
        Environment::with_prefix(ENV_PREFIX).separator("__").convert_case(Case::Snake);

    let merged = Config::builder()
        .add_source(File::from(source.as_path()).required(true))
        .add_source(overrides)
        .build()?;

    Ok(merged.try_deserialize::<T>()?)
}
