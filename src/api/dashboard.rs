// ── Chatmark: Dashboard Route ──────────────────────────────────────────────

use axum::Json;

use crate::fixtures;
use crate::response::ApiResponse;

pub async fn get_dashboard() -> Json<ApiResponse> {
    Json(ApiResponse::ok(fixtures::dashboard_config()))
}
