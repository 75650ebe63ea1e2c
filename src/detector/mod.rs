//! Rotation period estimation and the four-condition signal gate.

mod rotation;
mod signal;

pub use rotation::{DetectorState, RotationDetector, RotationEstimation, RotationParams};
pub use signal::{GateObserver, SignalDetector};
