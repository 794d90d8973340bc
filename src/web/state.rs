use std::sync::Arc;

use crate::web::assets::AssetSource;

/// Shared state for the UI handlers.
///
/// Built once during route setup; every request reads the same asset source.
#[derive(Clone)]
pub struct UiState {
    pub assets: Arc<dyn AssetSource>,
}

impl UiState {
    pub fn new(assets: Arc<dyn AssetSource>) -> Self {
        Self { assets }
    }
}
