//! # simple-router-core
//!
//! Core types for the simple-router workspace. This crate has no routing logic
//! of its own; it provides the foundation every other crate builds on.
//!
//! ## Modules
//!
//! - [`error`] - The router error type and result alias
//! - [`settings`] - Router settings with sensible defaults
//! - [`settings_loader`] - Loading settings from TOML, JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{RouterError, RouterResult};
pub use settings::{HistoryMode, Settings};
