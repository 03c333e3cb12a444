//! Mirror feature: resolves archived URLs and serves their captures.
//!
//! The whole mirror hangs off two routes: the root redirect into the home
//! domain, and a catch-all that treats the remaining path (query string
//! included) as an archived URL.

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use tracing::{debug, error, info};
use wm_archive::Capture;
use wm_kernel::prelude::ApiState;
use wm_rewrite::Rewrite;

/// The mirror's routes, to be merged into the application router.
pub fn router() -> Router<ApiState> {
    Router::new().route("/", get(home)).route("/{*path}", get(lookup))
}

/// Default route
async fn home(State(state): State<ApiState>) -> Response {
    match state.config.rewrite.home_domain() {
        Some(domain) => Redirect::temporary(&format!("/{domain}/")).into_response(),
        None => not_found(),
    }
}

/// Catch-all route
async fn lookup(State(state): State<ApiState>, uri: Uri) -> Response {
    let full_path = uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str());
    let full_path = simplify_path(full_path.trim_start_matches('/'));
    debug!(path = %full_path, "Resolving mirror path");

    let capture = match state.archive.resolve(full_path).await {
        Ok(Some(capture)) => capture,
        Ok(None) => return not_found(),
        Err(err) => {
            error!(path = %full_path, error = %err, "Error retrieving capture");
            return internal_error();
        },
    };

    match capture.as_ref() {
        Capture::Redirect { location } => {
            info!(from = %full_path, to = %location, "Following archived redirect");
            Redirect::temporary(&format!("/{location}")).into_response()
        },
        Capture::Content { body, mime } => {
            let bytes = if capture.is_html() {
                let rewrite = match state.try_get_slice::<Rewrite>() {
                    Ok(slice) => slice,
                    Err(err) => {
                        error!(error = %err, "Rewrite slice not registered");
                        return internal_error();
                    },
                };
                rewrite.rewriter().rewrite_html(full_path, body)
            } else {
                body.clone()
            };

            ([(header::CONTENT_TYPE, mime.clone())], bytes).into_response()
        },
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Strips the scheme prefixes browsers and proxies leave on mirror paths,
/// including the single-slash mangled forms.
fn simplify_path(path: &str) -> &str {
    for scheme in ["https://", "http://", "https:/", "http:/"] {
        if let Some(stripped) = path.strip_prefix(scheme) {
            return stripped;
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::simplify_path;

    #[test]
    fn simplify_path_strips_scheme_prefixes() {
        assert_eq!(simplify_path("https://hivrisk.cdc.gov/testing.html"), "hivrisk.cdc.gov/testing.html");
        assert_eq!(simplify_path("http://hivrisk.cdc.gov/testing.html"), "hivrisk.cdc.gov/testing.html");
        assert_eq!(simplify_path("https:/hivrisk.cdc.gov/testing.html"), "hivrisk.cdc.gov/testing.html");
        assert_eq!(simplify_path("http:/hivrisk.cdc.gov/testing.html"), "hivrisk.cdc.gov/testing.html");
        assert_eq!(simplify_path("hivrisk.cdc.gov/testing.html"), "hivrisk.cdc.gov/testing.html");
    }
}
