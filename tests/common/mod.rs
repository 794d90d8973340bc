//! Shared helpers for driving UI routers in-process.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use registry_ui::config::{AppConfig, ExtensionsConfig, SearchConfig, UiConfig};
use registry_ui::web::security::security_headers;
use rust_embed::RustEmbed;
use tower::ServiceExt;

/// A small bundled tree: index.html is "<html>OK</html>".
#[derive(RustEmbed)]
#[folder = "tests/fixtures/embedded/"]
pub struct Fixture;

pub const FIXTURE_INDEX: &[u8] = b"<html>OK</html>";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, method: Method, uri: &str) -> TestResponse {
    send_with_headers(app, method, uri, &[]).await
}

pub async fn send_with_headers(
    app: &Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let request = request.body(Body::empty()).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse { status, headers, body }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri).await
}

pub fn assert_security_headers(response: &TestResponse) {
    for (name, value) in security_headers() {
        assert_eq!(response.header(name), Some(value), "header {}", name);
    }
}

pub fn ui_config(search: bool, ui: bool, content_path: &str) -> AppConfig {
    AppConfig {
        extensions: ExtensionsConfig {
            search: Some(SearchConfig { enable: Some(search) }),
            ui: Some(UiConfig {
                enable: Some(ui),
                content_path: content_path.to_string(),
            }),
        },
        ..AppConfig::default()
    }
}
