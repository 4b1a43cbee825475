//! Shared state for the HTTP handlers

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::middleware::RateLimitMiddleware;
use crate::services::ServiceFactory;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceFactory>,
    pub rate_limiter: RateLimitMiddleware,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(services: ServiceFactory, settings: Settings) -> Self {
        let rate_limiter = RateLimitMiddleware::from_settings(&settings.rate_limit, settings.features.rate_limiting);
        Self {
            services: Arc::new(services),
            rate_limiter,
            settings: Arc::new(settings),
        }
    }
}
