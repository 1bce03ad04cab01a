//! HTTP adapter for the remote quota service.

pub mod client;
pub mod wire;

pub use client::HttpQuotaClient;
