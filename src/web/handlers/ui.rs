use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::web::assets::ENTRY_DOCUMENT;
use crate::web::routes::{allows, match_route, RouteTarget};
use crate::web::state::UiState;
use crate::web::static_files::{not_found, serve_path};

/// Sends a request below `/` to the first UI route whose prefix it starts with.
///
/// A path that does not percent-decode to UTF-8 is matched on its raw form; if that
/// lands on the static files it is a 404, since no asset can have that name.
pub async fn ui_handler(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
    State(ui): State<UiState>,
) -> Response {
    let decoded = match path {
        Ok(Path(path)) => Some(format!("/{}", path)),
        Err(rejection) => {
            debug!("undecodable ui path {}: {}", uri.path(), rejection);
            None
        }
    };
    let request_path = decoded.as_deref().unwrap_or(uri.path());

    let route = match_route(request_path);
    if !allows(route, &method) {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    match (route.target, decoded.as_deref()) {
        (RouteTarget::EntryDocument, _) => index_handler(State(ui)).await,
        (RouteTarget::StaticFiles, Some(path)) => serve_path(&ui, path, &headers).await,
        (RouteTarget::StaticFiles, None) => not_found(),
    }
}

/// Serves the SPA shell for every client-side route, whatever the sub-path.
///
/// A failed read is logged and answered with an empty 500.
pub async fn index_handler(State(ui): State<UiState>) -> Response {
    match ui.assets.read_file(ENTRY_DOCUMENT).await {
        Ok(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            content,
        )
            .into_response(),
        Err(e) => {
            error!("failed to serve {}: {}", ENTRY_DOCUMENT, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
