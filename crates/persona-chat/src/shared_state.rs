//! State shared by every axum handler.

use std::sync::Arc;

use crate::app::App;

/// Single state type used by the router. Cloning is cheap; the app sits
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
}

impl AppState {
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }
}
