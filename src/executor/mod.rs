//! Maker order execution.

mod engine;
mod ledger;

pub use engine::ExecutionEngine;
pub use ledger::ExposureLedger;
