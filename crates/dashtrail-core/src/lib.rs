//! dashtrail-core: trail model, encodings, and configuration for dashtrail.
//!
//! This crate holds everything that is synchronous and free of I/O:
//! - `model`: `BreadcrumbItem` and link resolution
//! - `store`: `BreadcrumbStore`, the in-memory authoritative trail
//! - `params`: the canonical query-parameter codec and control parameters
//! - `url_sync`: leaf-token encoding of a trail into the `breadcrumb` parameter
//! - `config`: panel options plus directory/logging settings
//! - `event`: structured trail events and sinks

pub mod config;
pub mod error;
pub mod event;
pub mod model;
pub mod params;
pub mod store;
pub mod url_sync;

/// Stable crate label used for bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "dashtrail-core"
}
