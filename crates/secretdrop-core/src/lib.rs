//! # secretdrop-core
//!
//! Core types, configuration, and utilities for SecretDrop.
//!
//! This crate provides shared functionality used across all SecretDrop crates:
//!
//! - **Configuration**: Loading, validation, and persistence of the JSON5 config file
//! - **Secrets in memory**: [`SecretString`], which redacts itself and zeroes on drop
//! - **Utilities**: Path resolution, ID generation, and environment handling

pub mod config;
pub mod env;
pub mod error;
pub mod id;
pub mod paths;
pub mod secret;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, Result};
pub use secret::SecretString;
