//! VincuHub
//!
//! Backend for university event management: students register for events,
//! coordinators credit attendance hours, administrators manage accounts, and
//! each event carries a discussion forum. A chat assistant and PDF
//! participation certificates round out the service.

pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{VincuHubError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;
pub use web::{router, AppState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
