//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub google: Option<GoogleConfig>,
    pub chat: ChatConfig,
    pub images: ImageConfig,
    pub certificates: CertificateConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL, or `memory://` for the in-memory store
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub const IN_MEMORY_URL: &'static str = "memory://";

    pub fn is_in_memory(&self) -> bool {
        self.url == Self::IN_MEMORY_URL
    }
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Session token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub min_password_length: usize,
    pub default_campus: String,
}

/// Google sign-in configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub tokeninfo_url: String,
    pub timeout_seconds: u64,
}

/// Chat assistant configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub history_limit: usize,
    pub stored_messages: usize,
    pub timeout_seconds: u64,
}

/// Event image processing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    pub max_upload_mb: u64,
    pub max_size_kb: u64,
    pub max_dimension: u32,
    pub quality: u8,
    pub min_quality: u8,
}

/// Certificate layout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CertificateConfig {
    pub institution: String,
    pub institution_subtitle: String,
    pub signer_title: String,
}

/// Per-user rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_seconds: u64,
    pub burst_allowance: u32,
    pub admin_exempt: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub json: bool,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub chat_completion: bool,
    pub google_sign_in: bool,
    pub rate_limiting: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_file("config")
    }

    /// Load settings from a specific configuration file (extension optional)
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("VINCUHUB")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::VincuHubError> {
        super::validation::validate_settings(self)
    }

    /// Socket address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Whether a chat completion endpoint can be called
    pub fn chat_completion_enabled(&self) -> bool {
        self.features.chat_completion
            && self.chat.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: vec!["http://localhost:4200".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/vincuhub".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "vincuhub:".to_string(),
                ttl_seconds: 86400,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                token_ttl_hours: 24,
                min_password_length: 6,
                default_campus: "Ceutec".to_string(),
            },
            google: None,
            chat: ChatConfig {
                api_url: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: None,
                model: "gpt-3.5-turbo".to_string(),
                temperature: 0.7,
                max_tokens: 500,
                history_limit: 10,
                stored_messages: 50,
                timeout_seconds: 20,
            },
            images: ImageConfig {
                max_upload_mb: 10,
                max_size_kb: 400,
                max_dimension: 1200,
                quality: 80,
                min_quality: 30,
            },
            certificates: CertificateConfig {
                institution: "CEUTEC".to_string(),
                institution_subtitle: "Centro Universitario Tecnológico".to_string(),
                signer_title: "Coordinador de Vinculación Universitaria".to_string(),
            },
            rate_limit: RateLimitSettings {
                max_requests: 20,
                window_seconds: 60,
                burst_allowance: 5,
                admin_exempt: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
                json: false,
            },
            features: FeaturesConfig {
                chat_completion: false,
                google_sign_in: false,
                rate_limiting: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
        assert_eq!(settings.chat.history_limit, 10);
        assert_eq!(settings.images.max_size_kb, 400);
        assert!(!settings.chat_completion_enabled());
        assert!(!settings.database.is_in_memory());
    }

    #[test]
    fn test_chat_completion_requires_key() {
        let mut settings = Settings::default();
        settings.features.chat_completion = true;
        assert!(!settings.chat_completion_enabled());

        settings.chat.api_key = Some(String::new());
        assert!(!settings.chat_completion_enabled());

        settings.chat.api_key = Some("sk-test".to_string());
        assert!(settings.chat_completion_enabled());
    }
}
