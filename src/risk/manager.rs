//! Sliding-window risk advisor.
//!
//! The manager never places or blocks orders. It records order, fill,
//! stop-out and block-interval events and turns them into a [`RiskAdvice`]
//! that the execution stage consults before every placement.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::RiskConfig;
use crate::domain::stats::median;

const IMPACT_WINDOW_S: f64 = 5.0;
const SLIPPAGE_WINDOW_S: f64 = 60.0;
const STOPOUT_WINDOW_S: f64 = 600.0;
const STOPOUT_LIMIT: usize = 3;
const STOPOUT_PAUSE_S: f64 = 600.0;
const BLOCK_INTERVAL_CAPACITY: usize = 50;
/// Median is only trusted once 60% of the block window is filled.
const BLOCK_INTERVAL_MIN_SAMPLES: usize = 30;
const HEDGE_VAR_FRACTION: f64 = 0.8;
const REDUCED_SIZE_MULTIPLIER: f64 = 0.5;

/// Current recommended actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAdvice {
    /// Flatten and stop generating signals.
    pub killswitch: bool,
    pub forbid_market: bool,
    /// Quote post-only orders deeper than normal.
    pub deepen_post_only: bool,
    pub size_multiplier: f64,
    /// Set only while a pause is in effect.
    pub paused_until: Option<f64>,
    pub need_hedge: bool,
    /// Triggered conditions joined with "; ", or "ok".
    pub reason: String,
}

impl RiskAdvice {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.reason == "ok"
    }
}

#[derive(Default)]
struct RiskState {
    impacts: VecDeque<(f64, f64)>,
    slippage: VecDeque<(f64, f64)>,
    stopouts: VecDeque<f64>,
    block_intervals: VecDeque<f64>,
    killswitch: bool,
    killswitch_reason: Option<String>,
    paused_until: Option<f64>,
    need_hedge: bool,
}

impl RiskState {
    fn trim(&mut self, now: f64) {
        trim_window(&mut self.impacts, now - IMPACT_WINDOW_S);
        trim_window(&mut self.slippage, now - SLIPPAGE_WINDOW_S);
        let cut = now - STOPOUT_WINDOW_S;
        while self.stopouts.front().is_some_and(|t| *t < cut) {
            self.stopouts.pop_front();
        }
    }

    fn impact_sum(&self) -> f64 {
        self.impacts.iter().map(|(_, x)| x).sum()
    }

    fn average_slippage(&self) -> Option<f64> {
        if self.slippage.is_empty() {
            return None;
        }
        Some(self.slippage.iter().map(|(_, x)| x).sum::<f64>() / self.slippage.len() as f64)
    }
}

fn trim_window(window: &mut VecDeque<(f64, f64)>, cut: f64) {
    while window.front().is_some_and(|(t, _)| *t < cut) {
        window.pop_front();
    }
}

pub struct RiskManager {
    config: RiskConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<RiskState>,
}

impl RiskManager {
    pub fn new(config: RiskConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(RiskState::default()),
        }
    }

    /// Record a block interval; trips the killswitch when the moving median
    /// exceeds `block_interval_stop_s`. The killswitch never resets.
    pub fn update_block_interval(&self, interval_s: f64) {
        if !interval_s.is_finite() {
            return;
        }
        let mut state = self.state.lock();
        if state.block_intervals.len() == BLOCK_INTERVAL_CAPACITY {
            state.block_intervals.pop_front();
        }
        state.block_intervals.push_back(interval_s);

        if state.killswitch || state.block_intervals.len() < BLOCK_INTERVAL_MIN_SAMPLES {
            return;
        }
        if let Some(med) = median(state.block_intervals.iter().copied()) {
            if med > self.config.block_interval_stop_s {
                let reason = format!(
                    "block_interval_median={med:.2}s > {:.2}s",
                    self.config.block_interval_stop_s
                );
                warn!(reason = %reason, "Killswitch tripped");
                state.killswitch = true;
                state.killswitch_reason = Some(reason);
            }
        }
    }

    /// Record a visible order against the top-of-book depth it rests at.
    pub fn register_order_post(&self, display_size: f64, top_depth: f64) {
        if !(top_depth > 0.0) || !display_size.is_finite() {
            return;
        }
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.trim(now);
        state.impacts.push_back((now, display_size / top_depth));
    }

    /// Record fill slippage in ticks relative to the reference mid.
    pub fn register_fill(&self, fill_price: f64, ref_mid: f64, tick_size: f64) {
        if !(tick_size > 0.0) {
            return;
        }
        let slip_ticks = (fill_price - ref_mid).abs() / tick_size;
        if !slip_ticks.is_finite() {
            return;
        }
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.trim(now);
        state.slippage.push_back((now, slip_ticks));
    }

    /// Record a loss exit. Three within 600s pause trading for 600s.
    pub fn register_stopout(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.trim(now);
        state.stopouts.push_back(now);
        if state.stopouts.len() >= STOPOUT_LIMIT {
            drop(state);
            info!(count = STOPOUT_LIMIT, "Repeated stop-outs, pausing");
            self.pause_for(STOPOUT_PAUSE_S);
        }
    }

    /// Pause for `seconds`. Overlapping pauses keep the furthest expiry.
    pub fn pause_for(&self, seconds: f64) {
        let until = self.clock.now() + seconds.max(0.0);
        let mut state = self.state.lock();
        state.paused_until = Some(match state.paused_until {
            Some(current) => current.max(until),
            None => until,
        });
    }

    /// Report net delta and one-second VaR; flags a hedge when |delta| > 0.8 VaR.
    pub fn update_exposure(&self, net_delta: f64, var_1s: f64) {
        let need_hedge = net_delta.abs() > HEDGE_VAR_FRACTION * var_1s;
        self.state.lock().need_hedge = need_hedge && net_delta.is_finite();
    }

    #[must_use]
    pub fn advice(&self) -> RiskAdvice {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.trim(now);

        let mut reasons = Vec::new();

        if let Some(reason) = &state.killswitch_reason {
            reasons.push(format!("killswitch: {reason}"));
        }

        let impact = state.impact_sum();
        let size_multiplier = if impact > self.config.max_book_impact {
            reasons.push(format!(
                "book_impact_5s={impact:.4} > {:.4}",
                self.config.max_book_impact
            ));
            REDUCED_SIZE_MULTIPLIER
        } else {
            1.0
        };

        let slippage_breached = match state.average_slippage() {
            Some(avg) if avg > self.config.max_slippage_ticks => {
                reasons.push(format!(
                    "avg_slippage_60s={avg:.2} ticks > {:.2}",
                    self.config.max_slippage_ticks
                ));
                true
            }
            _ => false,
        };

        if state.paused_until.is_some_and(|until| now >= until) {
            state.paused_until = None;
        }
        if let Some(until) = state.paused_until {
            reasons.push(format!("paused for {:.0}s", until - now));
        }

        if state.need_hedge {
            reasons.push("net delta above 0.8 x VaR".to_string());
        }

        RiskAdvice {
            killswitch: state.killswitch,
            forbid_market: slippage_breached,
            deepen_post_only: slippage_breached,
            size_multiplier,
            paused_until: state.paused_until,
            need_hedge: state.need_hedge,
            reason: if reasons.is_empty() {
                "ok".to_string()
            } else {
                reasons.join("; ")
            },
        }
    }

    /// True while the killswitch is set or a pause has not expired.
    #[must_use]
    pub fn should_pause(&self) -> bool {
        let now = self.clock.now();
        let state = self.state.lock();
        state.killswitch || state.paused_until.is_some_and(|until| now < until)
    }

    #[must_use]
    pub fn killswitch(&self) -> bool {
        self.state.lock().killswitch
    }

    #[must_use]
    pub fn book_impact_sum_5s(&self) -> f64 {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.trim(now);
        state.impact_sum()
    }

    /// Mean slippage over the last 60s, 0 when there were no fills.
    #[must_use]
    pub fn average_slippage_60s(&self) -> f64 {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.trim(now);
        state.average_slippage().unwrap_or(0.0)
    }

    #[must_use]
    pub fn stop_ticks(&self) -> f64 {
        self.config.stop_ticks
    }

    #[must_use]
    pub fn time_stop_ms(&self) -> u64 {
        self.config.time_stop_ms
    }
}
