//! Middleware module
//!
//! Page route guards and per-user rate limiting

pub mod guard;
pub mod rate_limit;

// Re-export commonly used middleware
pub use guard::{check_page, GuardDecision, Page};
pub use rate_limit::{RateLimitConfig, RateLimitMiddleware};
