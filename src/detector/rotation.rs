//! Online rotation period detector.
//!
//! Keeps a rolling window of (time, depth, spread) samples, picks the lag
//! with the strongest autocorrelation across both channels, and then checks
//! that depth is lower and spread higher near the period boundary with a
//! one-sided Welch test. The detector is active only when both tests pass.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use crate::config::{clamp_phase_halfwidth, SignalConfig};
use crate::domain::stats::{lag_correlation, welch_one_sided_p, Tail};

/// Sampling interval of the feature clock, seconds.
pub const SAMPLE_INTERVAL_S: f64 = 0.1;

const BUFFER_MARGIN: usize = 4;
const MIN_SAMPLES_FLOOR: usize = 20;
const SCORE_TOLERANCE: f64 = 1e-9;

/// Detector tuning, taken from the `[signal]` section.
#[derive(Debug, Clone)]
pub struct RotationParams {
    pub t_roll: f64,
    pub p_thresh: f64,
    pub period_min_s: f64,
    pub period_max_s: f64,
    /// Already clamped into (0.01, 0.45].
    pub phase_halfwidth: f64,
    pub min_boundary_samples: usize,
    pub min_off_samples: usize,
}

impl From<&SignalConfig> for RotationParams {
    fn from(cfg: &SignalConfig) -> Self {
        Self {
            t_roll: cfg.t_roll,
            p_thresh: cfg.p_thresh,
            period_min_s: cfg.period_min_s,
            period_max_s: cfg.period_max_s,
            phase_halfwidth: clamp_phase_halfwidth(cfg.z),
            min_boundary_samples: cfg.min_boundary_samples,
            min_off_samples: cfg.min_off_samples,
        }
    }
}

/// Latest transition of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorState {
    InsufficientData,
    InsufficientSamples,
    NotSignificant,
    Active,
}

impl DetectorState {
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient data",
            Self::InsufficientSamples => "insufficient samples",
            Self::NotSignificant => "not significant",
            Self::Active => "active",
        }
    }
}

/// Result of the most recent estimation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationEstimation {
    pub period_s: Option<f64>,
    /// Mean absolute lag correlation of depth and spread at the chosen lag.
    pub score: f64,
    pub n_boundary: usize,
    pub n_off: usize,
    pub p_dob: Option<f64>,
    pub p_spread: Option<f64>,
    pub ts: f64,
}

impl RotationEstimation {
    fn empty(ts: f64) -> Self {
        Self {
            period_s: None,
            score: 0.0,
            n_boundary: 0,
            n_off: 0,
            p_dob: None,
            p_spread: None,
            ts,
        }
    }
}

pub struct RotationDetector {
    params: RotationParams,
    capacity: usize,
    ts: VecDeque<f64>,
    dob: VecDeque<f64>,
    spread: VecDeque<f64>,
    period_s: Option<f64>,
    state: DetectorState,
    last: RotationEstimation,
}

impl RotationDetector {
    pub fn new(params: RotationParams) -> Self {
        let capacity = (params.t_roll / SAMPLE_INTERVAL_S).max(0.0) as usize + BUFFER_MARGIN;
        Self {
            params,
            capacity,
            ts: VecDeque::with_capacity(capacity),
            dob: VecDeque::with_capacity(capacity),
            spread: VecDeque::with_capacity(capacity),
            period_s: None,
            state: DetectorState::InsufficientData,
            last: RotationEstimation::empty(0.0),
        }
    }

    pub fn from_config(cfg: &SignalConfig) -> Self {
        Self::new(RotationParams::from(cfg))
    }

    /// Add an observation and re-estimate.
    ///
    /// Non-finite observations are ignored.
    pub fn update(&mut self, t: f64, dob: f64, spread_ticks: f64) {
        if !(t.is_finite() && dob.is_finite() && spread_ticks.is_finite()) {
            debug!(t, dob, spread_ticks, "Ignoring non-finite rotation sample");
            return;
        }
        if self.ts.len() == self.capacity {
            self.ts.pop_front();
            self.dob.pop_front();
            self.spread.pop_front();
        }
        self.ts.push_back(t);
        self.dob.push_back(dob);
        self.spread.push_back(spread_ticks);

        self.recompute(t);
    }

    /// Phase of `t` within the estimated period, in [0, 1). 0 when no period is known.
    ///
    /// Independent of [`is_active`](Self::is_active).
    #[must_use]
    pub fn current_phase(&self, t: f64) -> f64 {
        match self.period_s {
            Some(period) if period > 0.0 => {
                let phase = t.rem_euclid(period) / period;
                if phase >= 1.0 {
                    0.0
                } else {
                    phase
                }
            }
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == DetectorState::Active
    }

    #[must_use]
    pub fn current_period(&self) -> Option<f64> {
        self.period_s
    }

    #[must_use]
    pub fn last_estimation(&self) -> &RotationEstimation {
        &self.last
    }

    #[must_use]
    pub fn state(&self) -> DetectorState {
        self.state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ts.is_empty()
    }

    fn min_samples(&self) -> usize {
        let from_period = (self.params.period_max_s / SAMPLE_INTERVAL_S).round() as usize + 5;
        from_period.max(MIN_SAMPLES_FLOOR)
    }

    fn transition(&mut self, next: DetectorState) {
        if next != self.state {
            debug!(from = self.state.reason(), to = next.reason(), "Rotation detector state");
        }
        self.state = next;
    }

    fn recompute(&mut self, now: f64) {
        let n = self.ts.len();
        if n < self.min_samples() {
            self.transition(DetectorState::InsufficientData);
            self.last = RotationEstimation::empty(now);
            return;
        }

        let ts: Vec<f64> = self.ts.iter().copied().collect();
        let dob: Vec<f64> = self.dob.iter().copied().collect();
        let spread: Vec<f64> = self.spread.iter().copied().collect();

        let Some((lag, score)) = self.best_lag(&dob, &spread) else {
            self.transition(DetectorState::InsufficientData);
            self.last = RotationEstimation::empty(now);
            return;
        };

        let period = lag as f64 * SAMPLE_INTERVAL_S;
        self.period_s = Some(period);

        let z = self.params.phase_halfwidth;
        let mut dob_on = Vec::new();
        let mut dob_off = Vec::new();
        let mut spr_on = Vec::new();
        let mut spr_off = Vec::new();
        for ((t, d), s) in ts.iter().zip(&dob).zip(&spread) {
            let phase = t.rem_euclid(period) / period;
            if phase < z || phase > 1.0 - z {
                dob_on.push(*d);
                spr_on.push(*s);
            } else {
                dob_off.push(*d);
                spr_off.push(*s);
            }
        }

        let mut estimation = RotationEstimation {
            period_s: Some(period),
            score,
            n_boundary: dob_on.len(),
            n_off: dob_off.len(),
            p_dob: None,
            p_spread: None,
            ts: now,
        };

        if dob_on.len() < self.params.min_boundary_samples
            || dob_off.len() < self.params.min_off_samples
        {
            self.transition(DetectorState::InsufficientSamples);
            self.last = estimation;
            return;
        }

        let p_dob = welch_one_sided_p(&dob_on, &dob_off, Tail::Less);
        let p_spread = welch_one_sided_p(&spr_on, &spr_off, Tail::Greater);
        estimation.p_dob = Some(p_dob);
        estimation.p_spread = Some(p_spread);

        let significant = p_dob < self.params.p_thresh && p_spread < self.params.p_thresh;
        self.transition(if significant {
            DetectorState::Active
        } else {
            DetectorState::NotSignificant
        });
        self.last = estimation;
    }

    /// Lowest lag with the maximum score over `[period_min, period_max)`.
    fn best_lag(&self, dob: &[f64], spread: &[f64]) -> Option<(usize, f64)> {
        let n = dob.len();
        let lag_min = ((self.params.period_min_s / SAMPLE_INTERVAL_S).round() as usize).max(1);
        let lag_max = ((self.params.period_max_s / SAMPLE_INTERVAL_S).round() as usize).min(n);

        let mut best: Option<(usize, f64)> = None;
        for lag in lag_min..lag_max {
            let score = 0.5 * (lag_correlation(dob, lag).abs() + lag_correlation(spread, lag).abs());
            match best {
                Some((_, best_score)) if score <= best_score + SCORE_TOLERANCE => {}
                _ => best = Some((lag, score)),
            }
        }
        best
    }
}
