//! Infrastructure layer
//!
//! - Configuration management (figment)
//! - Logging (tracing)
//! - Engine wiring and project setup

pub mod config;
pub mod engine;
pub mod logging;
pub mod setup;

pub use engine::Engine;
