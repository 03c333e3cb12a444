use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use std::collections::HashMap;
use tower::util::ServiceExt;
use wm_archive::{Archive, Capture};
use wm_domain::config::{MirrorConfig, RewriteConfig};
use wm_kernel::prelude::ApiState;

async fn seeded_state() -> ApiState {
    let archive = Archive::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://");

    archive
        .put(
            "https://hivrisk.cdc.gov/",
            Capture::Content {
                body: b"<a href=\"/about.html\">Start</a>".to_vec(),
                mime: "text/html".to_owned(),
            },
        )
        .await
        .expect("seed home page");
    archive
        .put(
            "https://nccd.cdc.gov/favicon.ico",
            Capture::Content { body: b"1234".to_vec(), mime: "image/x-icon".to_owned() },
        )
        .await
        .expect("seed favicon");
    archive
        .put(
            "https://hivrisk.cdc.gov/old",
            Capture::Redirect { location: "hivrisk.cdc.gov/new.html".to_owned() },
        )
        .await
        .expect("seed redirect");
    archive
        .put(
            "https://nccd.cdc.gov/search/?q=flu",
            Capture::Content {
                body: b"<p>results</p>".to_vec(),
                mime: "text/html; charset=utf-8".to_owned(),
            },
        )
        .await
        .expect("seed search page");

    let mut config = MirrorConfig::default();
    config.rewrite = RewriteConfig {
        domain_suffix: "cdc.gov".to_owned(),
        local_domains: vec!["hivrisk.cdc.gov".to_owned(), "nccd.cdc.gov".to_owned()],
        primary_host: "www.restoredcdc.org".to_owned(),
        primary_domains: vec!["www.cdc.gov".to_owned()],
        aliases: HashMap::new(),
    };

    let slices = vec![wm_rewrite::init(&config.rewrite).expect("rewrite slice")];

    ApiState::builder()
        .config(config)
        .archive(archive)
        .register_slices(slices)
        .build()
        .expect("api state")
}

async fn get(state: ApiState, uri: &str) -> axum::response::Response {
    let app = wm_mirror::router().with_state(state);
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response")
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body").to_vec()
}

#[tokio::test]
async fn root_redirects_to_the_home_domain() {
    let response = get(seeded_state().await, "/").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/hivrisk.cdc.gov/");
}

#[tokio::test]
async fn serves_html_with_rewritten_links() {
    let response = get(seeded_state().await, "/hivrisk.cdc.gov/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");

    let body = body_bytes(response).await;
    assert_eq!(body, b"<a href=\"/hivrisk.cdc.gov/about.html\">Start</a>");
}

#[tokio::test]
async fn missing_trailing_slash_still_resolves() {
    let response = get(seeded_state().await, "/hivrisk.cdc.gov").await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn scheme_prefixed_paths_are_simplified() {
    let response = get(seeded_state().await, "/https://hivrisk.cdc.gov/").await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_html_bodies_are_served_verbatim() {
    let response = get(seeded_state().await, "/nccd.cdc.gov/favicon.ico").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/x-icon");
    assert_eq!(body_bytes(response).await, b"1234");
}

#[tokio::test]
async fn archived_redirects_are_followed() {
    let response = get(seeded_state().await, "/hivrisk.cdc.gov/old").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/hivrisk.cdc.gov/new.html");
}

#[tokio::test]
async fn query_strings_survive_lookup() {
    let response = get(seeded_state().await, "/nccd.cdc.gov/search?q=flu").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
}

#[tokio::test]
async fn unknown_paths_return_not_found() {
    let response = get(seeded_state().await, "/hivrisk.cdc.gov/definitely-not-there.html").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(response).await, b"Not Found");
}
