//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the VincuHub service.

use tracing::{info, warn, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;
use crate::config::LoggingConfig;
use crate::utils::errors::{Result, VincuHubError};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer when dropped and must be held
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "vincuhub.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(non_blocking).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking).boxed()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.level)
            .map_err(|e| VincuHubError::Config(format!("Invalid log filter: {}", e)))?)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .try_init()
        .map_err(|e| VincuHubError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(uid: Uuid, action: &str, details: Option<&str>) {
    info!(
        uid = %uid,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log event management actions
pub fn log_event_action(evento_id: Uuid, action: &str, uid: Uuid, details: Option<&str>) {
    info!(
        evento_id = %evento_id,
        action = action,
        uid = %uid,
        details = details,
        "Event action performed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_uid: Uuid, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_uid = %admin_uid,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
