//! Application layer - wires the detectors, risk and execution into a
//! running pipeline.

mod orchestrator;

pub use orchestrator::{DropOldestQueue, Sources, Strategy, FEATURE_QUEUE_CAPACITY};
