//! Client Configuration Module
//!
//! Connection settings, default analysis band and storage location, loaded
//! from TOML and overridden by the environment and the command line.
//!
//! ## Loading Order
//!
//! 1. `T8_CONFIG` environment variable (path to TOML file)
//! 2. `t8_client.toml` in the current working directory
//! 3. Built-in defaults
//!
//! `T8_HOST`, `T8_USER` and `T8_PASSWORD` then override the file values.
//!
//! ## Usage
//!
//! The configuration is a plain value: build it once in `main()` and pass it
//! (or the relevant section) to constructors.
//!
//! ```ignore
//! let config = AppConfig::load();
//! let client = T8Client::connect(&config.connection)?;
//! ```

mod app_config;
pub mod defaults;
pub mod validation;

pub use app_config::*;
