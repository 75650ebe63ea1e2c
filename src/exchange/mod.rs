//! Exchange-facing seams.
//!
//! Order transmission and market data are injected collaborators; the core
//! only sees these traits. Paper trading and a synthetic feed are provided
//! for running without an exchange.

mod paper;
mod synthetic;
mod traits;

pub use paper::PaperGateway;
pub use synthetic::{SyntheticFeed, SyntheticFeedConfig};
pub use traits::{BlockSource, FeatureSource, FillSource, OrderGateway};
