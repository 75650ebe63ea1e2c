//! Rule-based risk advice and clip sizing.

mod manager;
mod sizing;

pub use manager::{RiskAdvice, RiskManager};
pub use sizing::SizeAllocator;
