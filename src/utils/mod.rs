//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup, image compression and helper functions.

pub mod errors;
pub mod logging;
pub mod helpers;
pub mod image_compressor;

pub use errors::{VincuHubError, Result};
