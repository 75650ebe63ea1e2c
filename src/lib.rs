//! VRLG - rotation-gated liquidity provision.
//!
//! Some venues produce blocks on a regular clock, and around each block
//! boundary displayed depth thins and the spread widens. This crate detects
//! that rhythm online and quotes into it:
//!
//! - [`detector::RotationDetector`] estimates the period from depth and
//!   spread autocorrelation and checks that boundary samples really differ
//!   (one-sided Welch tests).
//! - [`detector::SignalDetector`] gates each snapshot on phase, thin depth,
//!   wide spread and balanced imbalance.
//! - [`executor::ExecutionEngine`] places post-only iceberg quotes with a
//!   TTL, an exposure ledger and per-side cooldowns.
//! - [`risk::RiskManager`] and [`risk::SizeAllocator`] throttle and size.
//! - [`app::Strategy`] wires everything into a task pipeline.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Feature snapshots, orders, signals and statistics
//! - [`exchange`] - Order gateway and market data seams, paper gateway,
//!   synthetic feed
//! - [`notifier`] - Observability events and sinks
//! - [`cli`] - Command-line interface
//!
//! # Features
//!
//! - `testkit` - Shared test doubles (manual clock, scripted gateway,
//!   recording notifier, synthetic series)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vrlg::app::{Sources, Strategy};
//! use vrlg::clock::{Clock, SystemClock};
//! use vrlg::config::Config;
//! use vrlg::exchange::{PaperGateway, SyntheticFeed};
//! use vrlg::notifier::{LogNotifier, NotifierRegistry};
//!
//! # async fn run() {
//! let config = Config::default();
//! let mut notifiers = NotifierRegistry::new();
//! notifiers.register(Box::new(LogNotifier));
//!
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let feed = SyntheticFeed::with_tick_size(config.symbol.tick_size, Arc::clone(&clock));
//! let strategy = Strategy::new(config, Arc::new(PaperGateway::new()), clock, notifiers);
//! strategy.start(Sources {
//!     features: Some(Box::new(feed)),
//!     ..Sources::default()
//! });
//! strategy.shutdown().await;
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod detector;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod executor;
pub mod notifier;
pub mod risk;
pub mod shutdown;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
