use axum::{
    handler::Handler,
    http::Method,
    middleware,
    routing::{MethodFilter, MethodRouter},
    Router,
};
use tracing::info;

use super::assets::resolve_asset_source;
use super::handlers;
use super::security::add_ui_security_headers;
use super::state::UiState;
use super::static_files::static_root_handler;
use crate::config::AppConfig;

/// What a reserved prefix serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// The SPA shell, whatever the sub-path.
    EntryDocument,
    /// Files looked up by path in the asset source.
    StaticFiles,
}

#[derive(Debug, Clone, Copy)]
pub struct UiRoute {
    pub prefix: &'static str,
    pub methods: &'static [Method],
    pub target: RouteTarget,
}

/// GET only. The method router answers HEAD with the GET handler.
pub const UI_METHODS: &[Method] = &[Method::GET];

/// Reserved UI prefixes, matched first to last. The catch-all comes last.
pub static UI_ROUTES: [UiRoute; 6] = [
    UiRoute { prefix: "/login", methods: UI_METHODS, target: RouteTarget::EntryDocument },
    UiRoute { prefix: "/home", methods: UI_METHODS, target: RouteTarget::EntryDocument },
    UiRoute { prefix: "/explore", methods: UI_METHODS, target: RouteTarget::EntryDocument },
    UiRoute { prefix: "/image", methods: UI_METHODS, target: RouteTarget::EntryDocument },
    UiRoute { prefix: "/user", methods: UI_METHODS, target: RouteTarget::EntryDocument },
    UiRoute { prefix: "/", methods: UI_METHODS, target: RouteTarget::StaticFiles },
];

/// First entry of [`UI_ROUTES`] whose prefix starts `path`.
///
/// Matching is on the raw string, so `/homepage` and `/images/x` belong to `/home` and `/image`.
pub fn match_route(path: &str) -> &'static UiRoute {
    UI_ROUTES
        .iter()
        .find(|route| path.starts_with(route.prefix))
        .unwrap_or(&UI_ROUTES[UI_ROUTES.len() - 1])
}

/// Whether `route` answers `method`. HEAD rides along with GET.
pub fn allows(route: &UiRoute, method: &Method) -> bool {
    route.methods.contains(method)
        || (*method == Method::HEAD && route.methods.contains(&Method::GET))
}

/// Every method some UI route answers; the router turns the rest into a 405.
fn mounted_methods() -> Vec<Method> {
    let mut methods: Vec<Method> = Vec::new();
    for route in UI_ROUTES.iter() {
        for method in route.methods {
            if !methods.contains(method) {
                methods.push(method.clone());
            }
        }
    }
    methods
}

/// A method router that answers only `methods`; everything else gets axum's 405.
fn allow_methods<H, T>(methods: &[Method], handler: H) -> MethodRouter<UiState>
where
    H: Handler<T, UiState>,
    T: 'static,
{
    methods
        .iter()
        .filter_map(|method| MethodFilter::try_from(method.clone()).ok())
        .fold(MethodRouter::new(), |router, filter| {
            router.on(filter, handler.clone())
        })
        .layer(middleware::from_fn(add_ui_security_headers))
}

/// Builds the UI routes over a resolved state, without the enablement check.
pub fn ui_router<S>(state: UiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let methods = mounted_methods();

    // Everything below "/" goes through the dispatcher, which walks UI_ROUTES in order.
    Router::new()
        .route("/", allow_methods(&methods, static_root_handler))
        .route("/{*path}", allow_methods(&methods, handlers::ui::ui_handler))
        .with_state(state)
}

/// Mounts the UI on `router` when the configuration enables it.
///
/// Call once per router; axum panics on duplicate routes.
pub fn setup_ui_routes<S>(config: &AppConfig, router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let Some(assets) = resolve_asset_source(config) else {
        info!("skip enabling the ui route as the config prerequisites are not met");
        return router;
    };

    info!("setting up ui routes from {}", assets.describe());
    let router = router.merge(ui_router(UiState::new(assets)));
    info!("finished setting up ui routes");

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table_order() {
        let prefixes: Vec<&str> = UI_ROUTES.iter().map(|r| r.prefix).collect();
        assert_eq!(prefixes, vec!["/login", "/home", "/explore", "/image", "/user", "/"]);
        assert_eq!(UI_ROUTES.last().unwrap().target, RouteTarget::StaticFiles);
        assert!(UI_ROUTES[..5].iter().all(|r| r.target == RouteTarget::EntryDocument));
    }

    #[test]
    fn test_route_methods_are_get_only() {
        for route in UI_ROUTES.iter() {
            assert_eq!(route.methods, &[Method::GET]);
        }
    }

    #[test]
    fn test_match_route_is_raw_prefix() {
        assert_eq!(match_route("/home").prefix, "/home");
        assert_eq!(match_route("/homepage").prefix, "/home");
        assert_eq!(match_route("/images/alpine").prefix, "/image");
        assert_eq!(match_route("/users").prefix, "/user");
        assert_eq!(match_route("/login.html").prefix, "/login");
        assert_eq!(match_route("/explorer/x").prefix, "/explore");
    }

    #[test]
    fn test_match_route_falls_back_to_catch_all() {
        for path in ["/", "/static/app.js", "/Home", "/v2/"] {
            assert_eq!(match_route(path).target, RouteTarget::StaticFiles, "{}", path);
        }
    }

    #[test]
    fn test_allows() {
        let route = match_route("/home");
        assert!(allows(route, &Method::GET));
        assert!(allows(route, &Method::HEAD));
        assert!(!allows(route, &Method::POST));
        assert!(!allows(route, &Method::DELETE));
    }
}
