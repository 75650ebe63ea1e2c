//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`]: `ManualClock`, a settable [`Clock`](crate::clock::Clock).
//! - [`gateway`]: `ScriptedGateway`, an order gateway that records requests
//!   and fails on demand.
//! - [`notifier`]: `RecordingNotifier`, which keeps every event.
//! - [`config`]: canonical test configurations.
//! - [`data`]: periodic depth/spread series and snapshot builders.

pub mod clock;
pub mod config;
pub mod data;
pub mod gateway;
pub mod notifier;

pub use clock::ManualClock;
pub use gateway::ScriptedGateway;
pub use notifier::RecordingNotifier;
