//! # Flowpilot Config
//!
//! Configuration management for Flowpilot: browser endpoint, detection and
//! extraction timing, boundary timeouts and logging.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
