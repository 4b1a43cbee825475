//! Error handling for VincuHub
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for VincuHub application
#[derive(Error, Debug)]
pub enum VincuHubError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Chat completion error: {0}")]
    Chat(#[from] ChatError),

    #[error("Google sign-in error: {0}")]
    Google(#[from] GoogleError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Usuario no encontrado: {uid}")]
    UserNotFound { uid: Uuid },

    #[error("Evento no encontrado: {evento_id}")]
    EventNotFound { evento_id: Uuid },

    #[error("Inscripción no encontrada: {inscripcion_id}")]
    RegistrationNotFound { inscripcion_id: Uuid },

    #[error("Foro no encontrado")]
    ForumNotFound,

    #[error("Mensaje no encontrado: {mensaje_id}")]
    MessageNotFound { mensaje_id: Uuid },

    #[error("Ya estás inscrito en este evento")]
    AlreadyRegistered,

    #[error("Este evento ya no tiene cupo disponible")]
    EventFull,

    #[error("El evento no acepta inscripciones en estado {estado}")]
    EventNotOpen { estado: String },

    #[error("No puedes cancelar una inscripción con asistencia registrada")]
    AttendanceAlreadyRecorded,

    #[error("Este foro está cerrado")]
    ForumClosed,

    #[error("No puedes eliminar el último administrador del sistema")]
    LastAdmin,

    #[error("No puedes eliminar un usuario que ha creado eventos")]
    UserHasEvents,

    #[error("El correo ya está registrado")]
    EmailTaken,

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Authentication(String),

    #[error("Image processing error: {0}")]
    Image(String),

    #[error("Certificate generation error: {0}")]
    Certificate(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Chat completion API specific errors
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat completion request failed: {0}")]
    RequestFailed(String),

    #[error("Chat completion timeout")]
    Timeout,

    #[error("Invalid chat completion response: {0}")]
    InvalidResponse(String),

    #[error("Chat completion is not configured")]
    NotConfigured,
}

/// Google identity specific errors
#[derive(Error, Debug)]
pub enum GoogleError {
    #[error("Google tokeninfo error: {0}")]
    ApiError(String),

    #[error("Invalid Google token: {0}")]
    InvalidToken(String),

    #[error("Token audience mismatch: {0}")]
    AudienceMismatch(String),

    #[error("Google sign-in is disabled")]
    Disabled,
}

/// Result type alias for VincuHub operations
pub type Result<T> = std::result::Result<T, VincuHubError>;

/// Result type alias for chat completion operations
pub type ChatResult<T> = std::result::Result<T, ChatError>;

/// Result type alias for Google identity operations
pub type GoogleResult<T> = std::result::Result<T, GoogleError>;

impl VincuHubError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            VincuHubError::Database(_) => false,
            VincuHubError::Migration(_) => false,
            VincuHubError::Chat(_) => true,
            VincuHubError::Google(_) => true,
            VincuHubError::Config(_) => false,
            VincuHubError::PermissionDenied(_) => false,
            VincuHubError::UserNotFound { .. } => false,
            VincuHubError::EventNotFound { .. } => false,
            VincuHubError::RegistrationNotFound { .. } => false,
            VincuHubError::ForumNotFound => false,
            VincuHubError::MessageNotFound { .. } => false,
            VincuHubError::AlreadyRegistered => false,
            VincuHubError::EventFull => false,
            VincuHubError::EventNotOpen { .. } => false,
            VincuHubError::AttendanceAlreadyRecorded => false,
            VincuHubError::ForumClosed => false,
            VincuHubError::LastAdmin => false,
            VincuHubError::UserHasEvents => false,
            VincuHubError::EmailTaken => false,
            VincuHubError::Redis(_) => true,
            VincuHubError::Http(_) => true,
            VincuHubError::Serialization(_) => false,
            VincuHubError::Io(_) => true,
            VincuHubError::UrlParse(_) => false,
            VincuHubError::Token(_) => false,
            VincuHubError::Authentication(_) => false,
            VincuHubError::Image(_) => false,
            VincuHubError::Certificate(_) => false,
            VincuHubError::RateLimitExceeded => true,
            VincuHubError::InvalidInput(_) => false,
            VincuHubError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VincuHubError::Database(_) => ErrorSeverity::Critical,
            VincuHubError::Migration(_) => ErrorSeverity::Critical,
            VincuHubError::Config(_) => ErrorSeverity::Critical,
            VincuHubError::PermissionDenied(_) => ErrorSeverity::Warning,
            VincuHubError::Authentication(_) => ErrorSeverity::Warning,
            VincuHubError::Token(_) => ErrorSeverity::Warning,
            VincuHubError::RateLimitExceeded => ErrorSeverity::Warning,
            VincuHubError::InvalidInput(_)
            | VincuHubError::AlreadyRegistered
            | VincuHubError::EventFull
            | VincuHubError::EventNotOpen { .. }
            | VincuHubError::AttendanceAlreadyRecorded
            | VincuHubError::ForumClosed
            | VincuHubError::LastAdmin
            | VincuHubError::UserHasEvents
            | VincuHubError::EmailTaken => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Shorthand for a permission error with a user-facing message
    pub fn forbidden(message: impl Into<String>) -> Self {
        VincuHubError::PermissionDenied(message.into())
    }

    /// Shorthand for a validation error with a user-facing message
    pub fn invalid(message: impl Into<String>) -> Self {
        VincuHubError::InvalidInput(message.into())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_display_user_messages() {
        assert_eq!(VincuHubError::AlreadyRegistered.to_string(), "Ya estás inscrito en este evento");
        assert_eq!(VincuHubError::EventFull.to_string(), "Este evento ya no tiene cupo disponible");
        assert_eq!(VincuHubError::ForumClosed.to_string(), "Este foro está cerrado");
        assert_eq!(
            VincuHubError::LastAdmin.to_string(),
            "No puedes eliminar el último administrador del sistema"
        );
        assert_eq!(
            VincuHubError::UserHasEvents.to_string(),
            "No puedes eliminar un usuario que ha creado eventos"
        );
    }

    #[test]
    fn test_severity() {
        assert_eq!(VincuHubError::EventFull.severity(), ErrorSeverity::Info);
        assert_eq!(VincuHubError::forbidden("no").severity(), ErrorSeverity::Warning);
        assert_eq!(VincuHubError::Config("x".into()).severity(), ErrorSeverity::Critical);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }

    #[test]
    fn test_recoverable() {
        assert!(VincuHubError::RateLimitExceeded.is_recoverable());
        assert!(VincuHubError::Chat(ChatError::Timeout).is_recoverable());
        assert!(!VincuHubError::AttendanceAlreadyRecorded.is_recoverable());
    }
}
