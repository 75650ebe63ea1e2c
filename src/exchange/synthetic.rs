//! Synthetic level 1 feed with a periodic thin-book pattern.
//!
//! Around every period boundary the displayed depth drops and the spread
//! widens, which is the structure the rotation detector looks for. Used in
//! paper mode when no live feed is wired in.
//!
//! The boundary phase is read from the injected clock, so the thin-book
//! windows sit at multiples of the period on the same timeline that stamps
//! the snapshots.

use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::FeatureSource;
use crate::clock::Clock;
use crate::domain::Level1Quote;

#[derive(Debug, Clone)]
pub struct SyntheticFeedConfig {
    pub base_mid: f64,
    pub tick_size: f64,
    pub period_s: f64,
    /// Phase half-width of the thin-book window.
    pub boundary_halfwidth: f64,
    pub boundary_depth: f64,
    pub off_depth: f64,
    pub boundary_spread_ticks: f64,
    pub off_spread_ticks: f64,
    /// Emission step.
    pub step: Duration,
    /// Relative uniform noise applied to sizes.
    pub size_noise: f64,
    pub seed: Option<u64>,
}

impl Default for SyntheticFeedConfig {
    fn default() -> Self {
        Self {
            base_mid: 70_000.0,
            tick_size: 0.5,
            period_s: 2.0,
            boundary_halfwidth: 0.15,
            boundary_depth: 600.0,
            off_depth: 1_200.0,
            boundary_spread_ticks: 3.0,
            off_spread_ticks: 1.0,
            step: Duration::from_millis(50),
            size_noise: 0.05,
            seed: None,
        }
    }
}

pub struct SyntheticFeed {
    config: SyntheticFeedConfig,
    clock: Arc<dyn Clock>,
    ticker: Option<Interval>,
    rng: StdRng,
    i: u64,
}

impl SyntheticFeed {
    pub fn new(config: SyntheticFeedConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            clock,
            ticker: None,
            rng,
            i: 0,
        }
    }

    pub fn with_tick_size(tick_size: f64, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            SyntheticFeedConfig {
                tick_size,
                ..SyntheticFeedConfig::default()
            },
            clock,
        )
    }

    /// Quote for the next step without waiting.
    pub fn next_quote_now(&mut self) -> Level1Quote {
        let cfg = &self.config;
        let phase = if cfg.period_s > 0.0 {
            self.clock.now().rem_euclid(cfg.period_s) / cfg.period_s
        } else {
            0.5
        };
        let boundary =
            phase < cfg.boundary_halfwidth || phase > 1.0 - cfg.boundary_halfwidth;

        let (depth, spread_ticks) = if boundary {
            (cfg.boundary_depth, cfg.boundary_spread_ticks)
        } else {
            (cfg.off_depth, cfg.off_spread_ticks)
        };
        let spread = spread_ticks * cfg.tick_size.max(1e-12);
        let mid = cfg.base_mid * (1.0 + 1e-5 * (2.0 * PI * self.i as f64 / 997.0).sin());

        let noise = cfg.size_noise.max(0.0);
        let (bid_jitter, ask_jitter) = if noise > 0.0 {
            (
                self.rng.gen_range(-noise..noise),
                self.rng.gen_range(-noise..noise),
            )
        } else {
            (0.0, 0.0)
        };

        self.i += 1;
        Level1Quote::new(
            mid - spread / 2.0,
            mid + spread / 2.0,
            depth * (1.0 + bid_jitter),
            depth * (1.0 + ask_jitter),
        )
    }
}

#[async_trait]
impl FeatureSource for SyntheticFeed {
    async fn next_quote(&mut self) -> Option<Level1Quote> {
        let step = self.config.step;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval(step);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;
        Some(self.next_quote_now())
    }
}
