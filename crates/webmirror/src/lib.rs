//! Facade crate tying the `WebMirror` pieces together.
//!
//! Re-exports the domain and kernel crates and aggregates feature-slice
//! initialization; no business logic lives here.
//!
//! ## Usage
//! - Call [`init`] to register feature slices; extend as new slices appear.
//! - Mount [`features::mirror::router`] behind the system routes.

pub use wm_domain as domain;
pub use wm_kernel as kernel;

use wm_domain::config::MirrorConfig;

pub mod server {
    pub mod router {
        pub use wm_kernel::server::router::system_router;
    }
}

/// Feature registry for runtime introspection.
pub mod features {
    pub use wm_mirror as mirror;
    pub use wm_rewrite as rewrite;

    /// Built-in features of the mirror server.
    pub const ENABLED: &[&str] = &["mirror", "rewrite"];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Initialize all enabled features for server mode.
///
/// # Errors
/// Returns an error if any feature initialization fails.
pub fn init(
    config: &MirrorConfig,
) -> Result<Vec<domain::registry::InitializedSlice>, Box<dyn std::error::Error>> {
    let mut slices = Vec::new();

    // Link rewriting
    slices.push(features::rewrite::init(&config.rewrite)?);

    Ok(slices)
}
