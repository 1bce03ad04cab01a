//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - pretty or JSON console output on stderr
//! - optional JSON log files with rotation via tracing-appender

pub mod logger;

pub use logger::LoggerImpl;
