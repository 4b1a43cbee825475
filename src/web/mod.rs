//! HTTP layer
//!
//! JSON API under `/api`, guarded pages at the root and `GET /health`.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod state;

pub use error::ErrorBody;
pub use extractors::{CurrentUser, MaybeUser};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::settings::ImageConfig;
use handlers::{auth, certificates, chat, events, forums, health, pages, registrations, users};

/// Room for the event fields around the image
const EVENT_FIELDS_OVERHEAD: usize = 64 * 1024;

/// Request body limit for event writes: the largest accepted image as a
/// base64 data URL plus the event fields
pub fn event_body_limit(images: &ImageConfig) -> usize {
    let raw = images.max_upload_mb as usize * 1024 * 1024;
    raw.div_ceil(3) * 4 + EVENT_FIELDS_OVERHEAD
}

fn api_routes(event_body_limit: usize) -> Router<AppState> {
    let event_body = DefaultBodyLimit::max(event_body_limit);

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::login_with_google))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/stats", get(users::user_stats))
        .route(
            "/users/:uid",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        .route("/users/:uid/deletion-check", get(users::deletion_check))
        .route(
            "/events",
            get(events::list_published).post(events::create_event).layer(event_body),
        )
        .route("/events/mine", get(events::my_events))
        .route(
            "/events/:id",
            get(events::get_event).patch(events::update_event).layer(event_body),
        )
        .route("/events/:id/state", post(events::change_state))
        .route("/events/:id/cancel", post(events::cancel_event))
        .route(
            "/events/:id/registrations",
            get(registrations::list_by_event).post(registrations::register),
        )
        .route("/events/:id/forum", get(forums::forum_for_event))
        .route("/events/:id/certificates", get(certificates::for_event))
        .route("/coordinator/stats", get(events::coordinator_stats))
        .route("/registrations/mine", get(registrations::my_registrations))
        .route("/registrations/attendance", post(registrations::record_attendance))
        .route("/registrations/attendance/batch", post(registrations::record_attendance_batch))
        .route("/registrations/:id", delete(registrations::cancel))
        .route("/registrations/:id/certificate", get(certificates::download))
        .route("/dashboard/student", get(registrations::student_dashboard))
        .route("/forums/:id", get(forums::get_forum))
        .route("/forums/:id/messages", get(forums::list_messages).post(forums::post_message))
        .route("/forums/:id/messages/:mensaje_id", delete(forums::delete_message))
        .route("/forums/:id/closed", post(forums::set_closed))
        .route("/chat", get(chat::history).delete(chat::clear))
        .route("/chat/messages", post(chat::send_message))
        .fallback(api_not_found)
}

async fn api_not_found() -> (StatusCode, Json<ErrorBody>) {
    let body = ErrorBody {
        error: "Recurso no encontrado".to_string(),
        code: "NOT_FOUND".to_string(),
    };
    (StatusCode::NOT_FOUND, Json(body))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.server.cors_origins);
    let body_limit = event_body_limit(&state.settings.images);

    Router::new()
        .nest("/api", api_routes(body_limit))
        .route("/health", get(health::health))
        .fallback(pages::page)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::Settings;

    #[test]
    fn test_event_body_limit_fits_largest_encoded_image() {
        let images = Settings::default().images;
        let limit = event_body_limit(&images);
        let encoded = (images.max_upload_mb as usize * 1024 * 1024).div_ceil(3) * 4;

        assert!(limit > encoded);
        assert!(limit > 2 * 1024 * 1024);
    }
}
