use std::sync::Arc;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use crate::backend::schemas::{ErrorResponse, RenderRequest, RenderResponse};
use crate::backend::state::AppState;

/// All failures collapse to a 500 with a single message string; the full
/// error detail only goes to the server log.
pub async fn handle_render(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenderRequest>,
) -> Response {
    match state.pipeline.process(request).await {
        Ok(image_url) => (StatusCode::OK, Json(RenderResponse { image_url })).into_response(),
        Err(e) => {
            error!("render request failed: {e:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
