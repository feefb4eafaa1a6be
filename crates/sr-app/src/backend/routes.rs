use std::sync::Arc;
use axum::Router;
use axum::routing::{get, post};
use crate::backend::routes::render::handle_render;
use crate::backend::state::AppState;

mod render;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/render", post(handle_render))
        .route("/health", get(|| async { "ok" }))
}
