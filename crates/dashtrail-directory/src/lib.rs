//! dashtrail-directory: dashboard directory lookups.
//!
//! Provides a transport-agnostic `DirectoryClient` trait with implementations for:
//! - `HttpDirectoryClient`: the dashboard server's HTTP search and org API
//! - `MockDirectoryClient`: configurable mock for unit testing

pub mod error;
pub mod http;
pub mod mock;
pub mod service;
pub mod types;

/// Stable crate label used for bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "dashtrail-directory"
}
