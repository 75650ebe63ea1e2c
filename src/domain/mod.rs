//! Domain types shared by detection, risk and execution.

mod feature;
mod order;
mod signal;
pub mod stats;

pub use feature::{round_to_tick, FeatureSnapshot, Level1Quote};
pub use order::{BlockEvent, Fill, OrderId, OrderKind, OrderRequest, Side, SideMode};
pub use signal::{GateEvaluation, Signal, TraceId};
