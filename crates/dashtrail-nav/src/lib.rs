//! dashtrail-nav: the navigation controller and its host ports.
//!
//! - `ports`: navigation, storage and messaging traits the controller talks to
//! - `memory`: in-memory port implementations
//! - `persistence`: the session-storage trail slot
//! - `relay`: notifications to the embedding parent window
//! - `state_machine`: controller states and transitions
//! - `controller`: `NavigationController`, the reconciliation engine
//! - `replay`: the `dashtrail-replay` command

pub mod controller;
pub mod memory;
pub mod persistence;
pub mod ports;
pub mod relay;
pub mod replay;
pub mod state_machine;

/// Stable crate label used for bootstrap smoke tests.
pub fn crate_label() -> &'static str {
    "dashtrail-nav"
}
