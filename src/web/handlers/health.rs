use axum::{extract::State, http::StatusCode, Json};

use crate::services::ServiceHealthStatus;
use crate::web::state::AppState;

/// 200 when the database (and Redis, if configured) respond, 503 otherwise
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ServiceHealthStatus>) {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
