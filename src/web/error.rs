//! Error → HTTP response mapping
//!
//! Business errors carry their own message to the client; infrastructure
//! failures are logged and answered with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::utils::errors::{GoogleError, VincuHubError};
use crate::utils::logging::log_api_error;

const INTERNAL_MESSAGE: &str = "Error interno del servidor";

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Status code and stable error code for an error
pub fn classify(err: &VincuHubError) -> (StatusCode, &'static str) {
    match err {
        VincuHubError::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
        VincuHubError::Image(_) | VincuHubError::UrlParse(_) | VincuHubError::Serialization(_) => {
            (StatusCode::BAD_REQUEST, "BAD_REQUEST")
        }
        VincuHubError::Authentication(_) | VincuHubError::Token(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        VincuHubError::Google(GoogleError::Disabled) => (StatusCode::SERVICE_UNAVAILABLE, "GOOGLE_DISABLED"),
        VincuHubError::Google(GoogleError::ApiError(_)) => (StatusCode::SERVICE_UNAVAILABLE, "GOOGLE_UNAVAILABLE"),
        VincuHubError::Google(_) => (StatusCode::UNAUTHORIZED, "INVALID_GOOGLE_TOKEN"),
        VincuHubError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        VincuHubError::UserNotFound { .. } => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
        VincuHubError::EventNotFound { .. } => (StatusCode::NOT_FOUND, "EVENT_NOT_FOUND"),
        VincuHubError::RegistrationNotFound { .. } => (StatusCode::NOT_FOUND, "REGISTRATION_NOT_FOUND"),
        VincuHubError::ForumNotFound => (StatusCode::NOT_FOUND, "FORUM_NOT_FOUND"),
        VincuHubError::MessageNotFound { .. } => (StatusCode::NOT_FOUND, "MESSAGE_NOT_FOUND"),
        VincuHubError::AlreadyRegistered => (StatusCode::CONFLICT, "ALREADY_REGISTERED"),
        VincuHubError::EventFull => (StatusCode::CONFLICT, "EVENT_FULL"),
        VincuHubError::EventNotOpen { .. } => (StatusCode::CONFLICT, "EVENT_NOT_OPEN"),
        VincuHubError::AttendanceAlreadyRecorded => (StatusCode::CONFLICT, "ATTENDANCE_RECORDED"),
        VincuHubError::ForumClosed => (StatusCode::CONFLICT, "FORUM_CLOSED"),
        VincuHubError::LastAdmin => (StatusCode::CONFLICT, "LAST_ADMIN"),
        VincuHubError::UserHasEvents => (StatusCode::CONFLICT, "USER_HAS_EVENTS"),
        VincuHubError::EmailTaken => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
        VincuHubError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        VincuHubError::Chat(_) => (StatusCode::SERVICE_UNAVAILABLE, "CHAT_UNAVAILABLE"),
        VincuHubError::ServiceUnavailable(_) | VincuHubError::Redis(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
        }
        VincuHubError::Database(_)
        | VincuHubError::Migration(_)
        | VincuHubError::Config(_)
        | VincuHubError::Http(_)
        | VincuHubError::Io(_)
        | VincuHubError::Certificate(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
    }
}

impl IntoResponse for VincuHubError {
    fn into_response(self) -> Response {
        let (status, code) = classify(&self);

        let message = if status.is_server_error() {
            log_api_error(code, &self.to_string(), Some(&self.severity().to_string()));
            match status {
                StatusCode::SERVICE_UNAVAILABLE => "Servicio no disponible, intenta más tarde".to_string(),
                _ => INTERNAL_MESSAGE.to_string(),
            }
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: message,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_business_errors_map_to_client_statuses() {
        assert_eq!(classify(&VincuHubError::EventFull).0, StatusCode::CONFLICT);
        assert_eq!(classify(&VincuHubError::invalid("x")).0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(classify(&VincuHubError::forbidden("x")).0, StatusCode::FORBIDDEN);
        assert_eq!(
            classify(&VincuHubError::EventNotFound { evento_id: Uuid::new_v4() }),
            (StatusCode::NOT_FOUND, "EVENT_NOT_FOUND")
        );
        assert_eq!(classify(&VincuHubError::RateLimitExceeded).0, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(classify(&VincuHubError::UserHasEvents), (StatusCode::CONFLICT, "USER_HAS_EVENTS"));
        assert_eq!(classify(&GoogleError::Disabled.into()).0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response = VincuHubError::Certificate("font table broken".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
