use thiserror::Error;

/// Errors raised while compiling the rewrite rule set.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The configured domain suffix produced an uncompilable pattern.
    #[error("Rewrite pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
