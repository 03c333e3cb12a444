use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};
use webmirror::kernel::prelude::ApiState;

#[derive(OpenApi)]
struct ApiDoc;

#[allow(unreachable_pub)]
pub fn init(state: ApiState) -> Router {
    let api = ApiDoc::openapi();

    // Separate the OpenAPI routes and the API documentation object
    let (openapi_routes, api_doc) = OpenApiRouter::with_openapi(api)
        .merge(webmirror::server::router::system_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone())
        .split_for_parts();

    // Create the Scalar UI routes
    let scalar_routes = Scalar::with_url("/api", api_doc);

    // Merge all routes; the capture catch-all stays last so the more specific
    // system routes keep winning
    Router::new()
        .merge(openapi_routes)
        .merge(scalar_routes)
        .merge(webmirror::features::mirror::router().with_state(state))
}
