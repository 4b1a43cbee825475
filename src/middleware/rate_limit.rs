//! Rate limiting middleware
//!
//! Sliding-window limiter keyed by user id, guarding the write endpoints
//! (chat messages, forum posts, registrations).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::settings::RateLimitSettings;
use crate::models::user::{Role, User};
use crate::utils::errors::{Result, VincuHubError};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window duration
    pub window_duration: Duration,
    /// Burst allowance (extra requests allowed in short bursts)
    pub burst_allowance: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_duration: Duration::from_secs(60),
            burst_allowance: 5,
        }
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            max_requests: settings.max_requests,
            window_duration: Duration::from_secs(settings.window_seconds),
            burst_allowance: settings.burst_allowance,
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    requests: Vec<Instant>,
    burst_used: u32,
    last_reset: Instant,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self {
            requests: Vec::new(),
            burst_used: 0,
            last_reset: Instant::now(),
        }
    }

    /// Drop requests outside the window
    fn cleanup(&mut self, window_duration: Duration) {
        let now = Instant::now();
        self.requests.retain(|&time| now.duration_since(time) < window_duration);

        if self.last_reset.elapsed() > window_duration {
            self.burst_used = 0;
            self.last_reset = now;
        }
    }

    fn is_allowed(&mut self, config: &RateLimitConfig) -> bool {
        self.cleanup(config.window_duration);

        if (self.requests.len() as u32) < config.max_requests {
            return true;
        }

        if self.burst_used < config.burst_allowance {
            self.burst_used += 1;
            return true;
        }

        false
    }

    fn record_request(&mut self) {
        self.requests.push(Instant::now());
    }
}

#[derive(Clone, Debug)]
pub struct RateLimitMiddleware {
    config: RateLimitConfig,
    entries: Arc<Mutex<HashMap<Uuid, RateLimitEntry>>>,
    enabled: bool,
    admin_exempt: bool,
}

impl RateLimitMiddleware {
    pub fn new(config: RateLimitConfig, enabled: bool, admin_exempt: bool) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
            enabled,
            admin_exempt,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings, enabled: bool) -> Self {
        Self::new(RateLimitConfig::from(settings), enabled, settings.admin_exempt)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, RateLimitEntry>> {
        // a panic while holding the lock leaves counters that are still usable
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a request for `user`, failing once the window and burst are spent
    pub fn check_rate_limit(&self, user: &User) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.admin_exempt && user.rol == Role::Admin {
            debug!(uid = %user.uid, "Admin user exempt from rate limiting");
            return Ok(());
        }

        let mut entries = self.entries();
        let entry = entries.entry(user.uid).or_insert_with(RateLimitEntry::new);

        if entry.is_allowed(&self.config) {
            entry.record_request();
            Ok(())
        } else {
            warn!(uid = %user.uid, correo = %user.correo, "Rate limit exceeded");
            Err(VincuHubError::RateLimitExceeded)
        }
    }

    /// Forget users idle for more than two windows; returns how many
    pub fn cleanup_old_entries(&self) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        let keep_for = self.config.window_duration * 2;
        entries.retain(|_, entry| entry.requests.iter().any(|time| time.elapsed() < keep_for));

        debug!(remaining_entries = entries.len(), "Cleaned up old rate limit entries");
        before - entries.len()
    }

    /// Run `cleanup_old_entries` every `every` until the handle is aborted
    pub fn start_cleanup(&self, every: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        let handle = tokio::spawn(async move {
            let mut cleanup_interval = tokio::time::interval(every);

            loop {
                cleanup_interval.tick().await;

                let removed = limiter.cleanup_old_entries();
                if removed > 0 {
                    info!(removed = removed, "Rate limit cleanup removed idle users");
                }
            }
        });

        info!(interval = ?every, "Started rate limit cleanup task");
        handle
    }

    /// Length of the sliding window
    pub fn window(&self) -> Duration {
        self.config.window_duration
    }
}

impl Default for RateLimitMiddleware {
    fn default() -> Self {
        Self::new(RateLimitConfig::default(), true, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(rol: Role) -> User {
        User::new("Test".to_string(), format!("{}@ceutec.hn", Uuid::new_v4()), rol)
    }

    fn config(max_requests: u32, burst_allowance: u32) -> RateLimitConfig {
        RateLimitConfig {
            max_requests,
            window_duration: Duration::from_secs(60),
            burst_allowance,
        }
    }

    #[test]
    fn test_rate_limit_basic() {
        let limiter = RateLimitMiddleware::new(config(3, 1), true, false);
        let student = user(Role::Estudiante);

        for _ in 0..3 {
            assert!(limiter.check_rate_limit(&student).is_ok());
        }
        // burst
        assert!(limiter.check_rate_limit(&student).is_ok());
        assert!(matches!(
            limiter.check_rate_limit(&student),
            Err(VincuHubError::RateLimitExceeded)
        ));
    }

    #[test]
    fn test_admin_exemption() {
        let limiter = RateLimitMiddleware::new(config(1, 0), true, true);
        let admin = user(Role::Admin);
        let coordinator = user(Role::Coordinador);

        for _ in 0..5 {
            assert!(limiter.check_rate_limit(&admin).is_ok());
        }
        assert!(limiter.check_rate_limit(&coordinator).is_ok());
        assert!(limiter.check_rate_limit(&coordinator).is_err());
    }

    #[test]
    fn test_disabled_limiter_allows_everything() {
        let limiter = RateLimitMiddleware::new(config(0, 0), false, false);
        assert!(limiter.check_rate_limit(&user(Role::Estudiante)).is_ok());
    }

    #[test]
    fn test_cleanup_keeps_recent_users() {
        let limiter = RateLimitMiddleware::new(config(5, 2), true, false);
        let student = user(Role::Estudiante);

        limiter.check_rate_limit(&student).unwrap();
        assert_eq!(limiter.cleanup_old_entries(), 0);
        assert!(limiter.entries().contains_key(&student.uid));
    }

    #[tokio::test]
    async fn test_cleanup_task_forgets_idle_users() {
        let short_window = RateLimitConfig {
            max_requests: 5,
            window_duration: Duration::from_millis(20),
            burst_allowance: 0,
        };
        let limiter = RateLimitMiddleware::new(short_window, true, false);
        limiter.check_rate_limit(&user(Role::Estudiante)).unwrap();
        limiter.check_rate_limit(&user(Role::Coordinador)).unwrap();
        assert_eq!(limiter.entries().len(), 2);

        let handle = limiter.start_cleanup(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();

        assert!(limiter.entries().is_empty());
    }
}
