//! Configuration module
//!
//! Settings file handling plus the environment variables that override it.

pub mod config;

pub use config::{ApiConfig, Config, LoggingConfig, OutputConfig};
