use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::borrow::Cow;
use std::fmt::Write;
use tracing::{debug, error};

use crate::web::assets::{clean_path, AssetError, DirEntry, EntryKind, ENTRY_DOCUMENT};
use crate::web::range::{etag_for, etag_matches, parse_range, RangeOutcome};
use crate::web::state::UiState;

pub async fn static_root_handler(State(ui): State<UiState>, headers: HeaderMap) -> Response {
    serve_path(&ui, "/", &headers).await
}

/// Resolves a decoded request path against the asset source.
///
/// Directories are only served with a trailing slash: their entry document if they
/// have one, a listing otherwise. Paths ending in `/index.html` redirect to the directory.
pub async fn serve_path(ui: &UiState, request_path: &str, headers: &HeaderMap) -> Response {
    if request_path.ends_with("/index.html") {
        return redirect("./");
    }

    let path = match clean_path(request_path) {
        Ok(path) => path,
        Err(e) => return error_response(e),
    };
    let wants_dir = request_path.ends_with('/');

    let kind = match ui.assets.stat(&path).await {
        Ok(kind) => kind,
        Err(e) => return error_response(e),
    };

    match (kind, wants_dir) {
        (EntryKind::Dir, false) => redirect(&format!("{}/", base_name(&path))),
        (EntryKind::File, true) => redirect(&format!("../{}", base_name(&path))),
        (EntryKind::Dir, true) => serve_directory(ui, &path, request_path).await,
        (EntryKind::File, false) => serve_file(ui, &path, headers).await,
    }
}

/// The plain 404 every unservable static path gets.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}

async fn serve_file(ui: &UiState, path: &str, headers: &HeaderMap) -> Response {
    let content = match ui.assets.read_file(path).await {
        Ok(content) => content,
        Err(e) => return error_response(e),
    };

    let content_type = content_type_for(path, &content);
    let etag = etag_for(&content);

    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    if etag_matches(if_none_match, &etag) {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let total = content.len();
    match parse_range(range, total) {
        RangeOutcome::Full => (
            [
                (header::CONTENT_TYPE, content_type),
                (header::ETAG, etag),
                (header::ACCEPT_RANGES, "bytes".to_string()),
            ],
            content,
        )
            .into_response(),
        RangeOutcome::Partial(range) => {
            let body = match content {
                Cow::Borrowed(bytes) => Cow::Borrowed(&bytes[range.start..=range.end]),
                Cow::Owned(mut bytes) => {
                    bytes.truncate(range.end + 1);
                    bytes.drain(..range.start);
                    Cow::Owned(bytes)
                }
            };
            debug!("serving {} bytes of {} ({} total)", range.len(), path, total);
            (
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::ETAG, etag),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CONTENT_RANGE, range.content_range(total)),
                ],
                body,
            )
                .into_response()
        }
        RangeOutcome::NotSatisfiable => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{}", total))],
        )
            .into_response(),
    }
}

/// The type the extension names, or one sniffed from the bytes when it names none.
fn content_type_for(path: &str, content: &[u8]) -> String {
    match mime_guess::from_path(path).first() {
        Some(mime) => mime.to_string(),
        None => sniff_content_type(content).to_string(),
    }
}

fn sniff_content_type(content: &[u8]) -> &'static str {
    let head = &content[..content.len().min(512)];
    let text = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map_or(&head[..0], |start| &head[start..]);

    let lower: Vec<u8> = text.iter().take(14).map(u8::to_ascii_lowercase).collect();
    if lower.starts_with(b"<!doctype html") || lower.starts_with(b"<html") {
        return "text/html; charset=utf-8";
    }

    if head.starts_with(b"%PDF-") {
        "application/pdf"
    } else if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        "image/gif"
    } else if head.starts_with(b"\xff\xd8\xff") {
        "image/jpeg"
    } else if looks_like_text(head) {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

// A cut multi-byte character at the end of the window still counts as text.
fn looks_like_text(head: &[u8]) -> bool {
    let valid = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return false,
    };
    valid
        .chars()
        .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t' | '\x0c'))
}

async fn serve_directory(ui: &UiState, path: &str, request_path: &str) -> Response {
    let index = if path.is_empty() {
        ENTRY_DOCUMENT.to_string()
    } else {
        format!("{}/{}", path, ENTRY_DOCUMENT)
    };

    match ui.assets.read_file(&index).await {
        Ok(content) => {
            return (
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                content,
            )
                .into_response();
        }
        Err(e) if !e.is_not_found() => return error_response(e),
        Err(_) => {}
    }

    match ui.assets.read_dir(path).await {
        Ok(entries) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            render_listing(&entries),
        )
            .into_response(),
        Err(e) => {
            debug!("failed to list {}: {}", request_path, e);
            error_response(e)
        }
    }
}

fn render_listing(entries: &[DirEntry]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );

    for entry in entries {
        let name = match entry.kind {
            EntryKind::Dir => format!("{}/", entry.name),
            EntryKind::File => entry.name.clone(),
        };
        let _ = writeln!(
            html,
            "<a href=\"{}\">{}</a>",
            escape_href(&name),
            escape_html(&name)
        );
    }

    html.push_str("</pre>\n");
    html
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn redirect(location: &str) -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, escape_href(location))],
    )
        .into_response()
}

fn error_response(err: AssetError) -> Response {
    if err.is_not_found() {
        debug!("static asset not served: {}", err);
        not_found()
    } else {
        error!("failed to serve static asset: {}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error").into_response()
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

// Percent-encodes everything but unreserved characters and '/', keeping links relative.
fn escape_href(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            b => {
                let _ = write!(out, "%{:02X}", b);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("static/app.js"), "app.js");
        assert_eq!(base_name("assets"), "assets");
    }

    #[test]
    fn test_content_type_prefers_extension() {
        assert_eq!(content_type_for("static/app.css", b"plain"), "text/css");
        assert_eq!(content_type_for("LICENSE", b"MIT License\n"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_sniff_content_type() {
        assert_eq!(sniff_content_type(b"  <!DOCTYPE html><p>"), "text/html; charset=utf-8");
        assert_eq!(sniff_content_type(b"<html>OK</html>"), "text/html; charset=utf-8");
        assert_eq!(sniff_content_type(b"%PDF-1.7"), "application/pdf");
        assert_eq!(sniff_content_type(b"\x89PNG\r\n\x1a\n\0\0"), "image/png");
        assert_eq!(sniff_content_type(b"GIF89a"), "image/gif");
        assert_eq!(sniff_content_type(b"\xff\xd8\xff\xe0"), "image/jpeg");
        assert_eq!(sniff_content_type("h\u{e9}llo\tworld\n".as_bytes()), "text/plain; charset=utf-8");
        assert_eq!(sniff_content_type(b"\0\x01\x02binary"), "application/octet-stream");
        assert_eq!(sniff_content_type(b""), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_escape_href() {
        assert_eq!(escape_href("static/"), "static/");
        assert_eq!(escape_href("my file.js"), "my%20file.js");
        assert_eq!(escape_href("a?b#c"), "a%3Fb%23c");
        assert_eq!(escape_href("100%"), "100%25");
    }

    #[test]
    fn test_render_listing() {
        let entries = vec![
            DirEntry { name: "icons".to_string(), kind: EntryKind::Dir },
            DirEntry { name: "<b>.js".to_string(), kind: EntryKind::File },
        ];
        let html = render_listing(&entries);

        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<a href=\"icons/\">icons/</a>"));
        assert!(html.contains("<a href=\"%3Cb%3E.js\">&lt;b&gt;.js</a>"));
        assert!(html.ends_with("</pre>\n"));
    }
}
