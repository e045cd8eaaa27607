//! # memvault-core
//!
//! Configuration and shared utilities for memvault.
//!
//! This crate provides functionality used across the memvault crates:
//!
//! - **Configuration**: Loading, validation, and persistence of the config file
//! - **Paths**: Resolution of the memvault home directory and config file
//! - **Environment**: Typed access to environment variables

pub mod config;
pub mod env;
pub mod error;
pub mod paths;

// Re-exports for convenience
pub use config::Config;
pub use error::ConfigError;
