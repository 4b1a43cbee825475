//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{VincuHubError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_chat_config(&settings.chat, settings.features.chat_completion)?;
    validate_image_config(&settings.images)?;
    validate_rate_limit_config(&settings.rate_limit)?;
    validate_logging_config(&settings.logging)?;

    match settings.google {
        Some(ref google_config) => validate_google_config(google_config)?,
        None if settings.features.google_sign_in => {
            return Err(VincuHubError::Config(
                "Google sign-in is enabled but no [google] section is configured".to_string()
            ));
        }
        None => {}
    }

    Ok(())
}

/// Validate HTTP server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(VincuHubError::Config(
            "Server host is required".to_string()
        ));
    }

    if config.port == 0 {
        return Err(VincuHubError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(VincuHubError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(VincuHubError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(VincuHubError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(VincuHubError::Config(
            "Redis URL is required".to_string()
        ));
    }

    if config.ttl_seconds == 0 {
        return Err(VincuHubError::Config(
            "Redis TTL must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate session token configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < 16 {
        return Err(VincuHubError::Config(
            "JWT secret must be at least 16 characters".to_string()
        ));
    }

    if config.token_ttl_hours <= 0 {
        return Err(VincuHubError::Config(
            "Token TTL must be greater than 0".to_string()
        ));
    }

    if config.min_password_length == 0 {
        return Err(VincuHubError::Config(
            "Minimum password length must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate Google sign-in configuration
fn validate_google_config(config: &super::GoogleConfig) -> Result<()> {
    if config.client_id.is_empty() {
        return Err(VincuHubError::Config(
            "Google client ID is required".to_string()
        ));
    }

    url::Url::parse(&config.tokeninfo_url)?;

    if config.timeout_seconds == 0 {
        return Err(VincuHubError::Config(
            "Google timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate chat assistant configuration
fn validate_chat_config(config: &super::ChatConfig, completion_enabled: bool) -> Result<()> {
    if completion_enabled {
        url::Url::parse(&config.api_url)?;

        if config.model.is_empty() {
            return Err(VincuHubError::Config(
                "Chat model is required when chat completion is enabled".to_string()
            ));
        }
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(VincuHubError::Config(
            format!("Chat temperature must be between 0 and 2, got {}", config.temperature)
        ));
    }

    if config.history_limit == 0 || config.stored_messages < config.history_limit {
        return Err(VincuHubError::Config(
            "Chat history limit must be positive and not exceed stored messages".to_string()
        ));
    }

    Ok(())
}

/// Validate image processing configuration
fn validate_image_config(config: &super::ImageConfig) -> Result<()> {
    if config.max_upload_mb == 0 || config.max_size_kb == 0 || config.max_dimension == 0 {
        return Err(VincuHubError::Config(
            "Image limits must be greater than 0".to_string()
        ));
    }

    if config.quality > 100 || config.min_quality == 0 || config.min_quality > config.quality {
        return Err(VincuHubError::Config(
            format!("Invalid JPEG quality range: {}..={}", config.min_quality, config.quality)
        ));
    }

    Ok(())
}

/// Validate rate limiting configuration
fn validate_rate_limit_config(config: &super::RateLimitSettings) -> Result<()> {
    if config.max_requests == 0 || config.window_seconds == 0 {
        return Err(VincuHubError::Config(
            "Rate limit requests and window must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(VincuHubError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(VincuHubError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleConfig;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "short".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_google_enabled_without_section_rejected() {
        let mut settings = Settings::default();
        settings.features.google_sign_in = true;
        assert!(validate_settings(&settings).is_err());

        settings.google = Some(GoogleConfig {
            client_id: "client.apps.googleusercontent.com".to_string(),
            tokeninfo_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
            timeout_seconds: 5,
        });
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_quality_range() {
        let mut settings = Settings::default();
        settings.images.min_quality = 90;
        assert!(validate_settings(&settings).is_err());
    }
}
