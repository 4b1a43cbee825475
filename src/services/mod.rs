//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod certificate;
pub mod chat;
pub mod event;
pub mod forum;
pub mod redis;
pub mod registration;
pub mod user;

// Re-export commonly used services
pub use auth::{AuthService, AuthSession, Claims};
pub use certificate::{Certificate, CertificateData, CertificateService};
pub use chat::{ChatService, ConversationStore, MemoryConversationStore, RedisConversationStore};
pub use event::EventService;
pub use forum::ForumService;
pub use redis::RedisService;
pub use registration::RegistrationService;
pub use user::UserService;

use std::sync::Arc;

use serde::Serialize;

use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;
use crate::utils::image_compressor::ImageCompressor;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    pub forum_service: ForumService,
    pub chat_service: ChatService,
    pub certificate_service: CertificateService,
    pub redis_service: Option<RedisService>,
    database: DatabaseService,
    google_enabled: bool,
}

impl ServiceFactory {
    /// Wire every service against `database`; conversations go to Redis when
    /// a Redis service is provided and stay in memory otherwise
    pub fn new(settings: &Settings, database: DatabaseService, redis_service: Option<RedisService>) -> Result<Self> {
        let conversations: Arc<dyn ConversationStore> = match redis_service {
            Some(ref redis) => Arc::new(RedisConversationStore::new(redis.clone())),
            None => Arc::new(MemoryConversationStore::new()),
        };

        let forum_service = ForumService::new(database.forums.clone());
        let auth_service = AuthService::new(database.users.clone(), settings.clone())?;
        let user_service = UserService::new(database.users.clone(), database.events.clone());
        let event_service = EventService::new(
            database.events.clone(),
            database.registrations.clone(),
            ImageCompressor::new(settings.images.clone()),
        );
        let registration_service =
            RegistrationService::new(database.registrations.clone(), database.events.clone());
        let chat_service = ChatService::new(
            conversations,
            settings.chat.clone(),
            settings.features.chat_completion,
        )?;
        let certificate_service = CertificateService::new(
            database.registrations.clone(),
            database.events.clone(),
            settings.certificates.clone(),
        );

        Ok(Self {
            auth_service,
            user_service,
            event_service,
            registration_service,
            forum_service,
            chat_service,
            certificate_service,
            redis_service,
            database,
            google_enabled: settings.features.google_sign_in && settings.google.is_some(),
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = self.database.health_check().await;
        let redis_healthy = match self.redis_service {
            Some(ref redis) => Some(redis.health_check().await),
            None => None,
        };

        ServiceHealthStatus {
            database_healthy,
            database_persistent: self.database.is_persistent(),
            redis_healthy,
            chat_completion_enabled: self.chat_service.is_completion_enabled(),
            google_enabled: self.google_enabled,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub database_persistent: bool,
    /// `None` when running without Redis
    pub redis_healthy: Option<bool>,
    pub chat_completion_enabled: bool,
    pub google_enabled: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database_healthy && self.redis_healthy.unwrap_or(true)
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if self.redis_healthy == Some(false) {
            issues.push("Redis connection failed".to_string());
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_factory_is_healthy() {
        let factory = ServiceFactory::new(&Settings::default(), DatabaseService::in_memory(), None).unwrap();
        let status = factory.health_check().await;

        assert!(status.is_healthy());
        assert!(status.get_issues().is_empty());
        assert!(!status.database_persistent);
        assert!(!status.chat_completion_enabled);
    }

    #[test]
    fn test_issues_listed() {
        let status = ServiceHealthStatus {
            database_healthy: false,
            database_persistent: true,
            redis_healthy: Some(false),
            chat_completion_enabled: false,
            google_enabled: false,
        };
        assert!(!status.is_healthy());
        assert_eq!(status.get_issues().len(), 2);
    }
}
