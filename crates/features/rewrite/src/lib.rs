//! Rewrite feature slice: compiles the configured rule set into byte-level
//! patterns applied to archived HTML bodies before they are served.

mod error;
mod rewriter;

pub use error::RewriteError;
pub use rewriter::Rewriter;

use std::any::Any;
use wm_domain::config::RewriteConfig;
use wm_domain::registry::{FeatureSlice, InitializedSlice};

/// Rewrite feature state
#[derive(Debug)]
pub struct Rewrite {
    rewriter: Rewriter,
}

impl Rewrite {
    /// The compiled rewrite engine.
    #[must_use]
    pub fn rewriter(&self) -> &Rewriter {
        &self.rewriter
    }
}

impl FeatureSlice for Rewrite {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Initialize the rewrite feature from the mirror configuration.
///
/// # Errors
/// Returns an error if the configured domain suffix cannot be compiled into
/// the rewrite patterns.
pub fn init(config: &RewriteConfig) -> Result<InitializedSlice, RewriteError> {
    let rewriter = Rewriter::new(config)?;
    tracing::info!(domains = config.local_domains.len(), "Rewrite slice initialized");

    Ok(InitializedSlice::new(Rewrite { rewriter }))
}
