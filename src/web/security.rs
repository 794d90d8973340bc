//! Defensive response headers for every UI route.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::sync::LazyLock;

pub const PERMISSIONS_POLICY: &str =
    "microphone=(), geolocation=(), battery=(), camera=(), autoplay=(), gyroscope=(), payment=()";

pub const CSP_DIRECTIVES: [&str; 8] = [
    "default-src 'none'",
    "script-src 'self' 'unsafe-inline'",
    "style-src 'self' 'unsafe-inline'",
    "font-src 'self'",
    "connect-src 'self'",
    "img-src 'self'",
    "manifest-src 'self'",
    "base-uri 'self'",
];

static CONTENT_SECURITY_POLICY: LazyLock<String> = LazyLock::new(|| CSP_DIRECTIVES.join("; "));

/// `CSP_DIRECTIVES` joined with "; ".
pub fn content_security_policy() -> &'static str {
    CONTENT_SECURITY_POLICY.as_str()
}

/// Header names and values, in the order they are applied.
pub fn security_headers() -> [(&'static str, &'static str); 4] {
    [
        ("permissions-policy", PERMISSIONS_POLICY),
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("content-security-policy", content_security_policy()),
    ]
}

/// Middleware that stamps [`security_headers`] onto the response before its body is sent.
///
/// Values set by the wrapped handler for the same names are overridden.
pub async fn add_ui_security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    for (name, value) in security_headers() {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    response
}
