//! One-stop imports for server crates.

pub use crate::config::{ConfigError, load_config};
pub use crate::server::state::{ApiState, ApiStateError};
pub use wm_domain::config::MirrorConfig;
