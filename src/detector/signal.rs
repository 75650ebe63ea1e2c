//! Four-condition signal gate.
//!
//! A signal fires when all of the following hold for one snapshot:
//!
//! 1. the phase is within `z` of a period boundary,
//! 2. depth is at least `x` below its rolling median over `N` samples,
//! 3. the spread is at least `y` ticks,
//! 4. `|obi|` is at most `obi_limit`.

use std::collections::VecDeque;

use tracing::trace;

use crate::config::{clamp_phase_halfwidth, SignalConfig};
use crate::domain::stats::median;
use crate::domain::{FeatureSnapshot, GateEvaluation, Signal, TraceId};

/// Callback receiving every gate evaluation, pass or fail.
pub type GateObserver = Box<dyn Fn(&GateEvaluation) + Send + Sync>;

pub struct SignalDetector {
    window_len: usize,
    x: f64,
    y: f64,
    z: f64,
    obi_limit: f64,
    dob_window: VecDeque<f64>,
    observer: Option<GateObserver>,
}

impl SignalDetector {
    pub fn new(cfg: &SignalConfig) -> Self {
        let window_len = cfg.n.max(1);
        Self {
            window_len,
            x: cfg.x,
            y: cfg.y,
            z: clamp_phase_halfwidth(cfg.z),
            obi_limit: cfg.obi_limit,
            dob_window: VecDeque::with_capacity(window_len),
            observer: None,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: GateObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_observer(&mut self, observer: GateObserver) {
        self.observer = Some(observer);
    }

    /// Evaluate the gate for one snapshot.
    ///
    /// The depth window is updated on every call. A missing phase, or one
    /// outside [0, 1], fails the phase condition.
    pub fn update_and_maybe_signal(&mut self, t: f64, snap: &FeatureSnapshot) -> Option<Signal> {
        if self.dob_window.len() == self.window_len {
            self.dob_window.pop_front();
        }
        self.dob_window.push_back(snap.dob);

        let eval = self.evaluate(t, snap);
        if let Some(observer) = &self.observer {
            observer(&eval);
        }

        if !eval.all_pass() {
            trace!(t, missing = ?eval.missing(), "Gate closed");
            return None;
        }

        Some(Signal {
            t,
            mid: snap.mid,
            trace_id: TraceId::generate(),
        })
    }

    /// Median depth over the window once it holds `N` samples.
    #[must_use]
    pub fn dob_baseline(&self) -> Option<f64> {
        if self.dob_window.len() < self.window_len {
            return None;
        }
        median(self.dob_window.iter().copied())
    }

    fn evaluate(&self, t: f64, snap: &FeatureSnapshot) -> GateEvaluation {
        let phase = snap.block_phase;
        let phase_ok = match phase {
            Some(p) if (0.0..=1.0).contains(&p) => p < self.z || p > 1.0 - self.z,
            _ => false,
        };

        let dob_median = self.dob_baseline();
        let dob_thin = match dob_median {
            Some(med) if med > 0.0 => snap.dob < med * (1.0 - self.x),
            _ => false,
        };

        GateEvaluation {
            t,
            phase,
            phase_ok,
            dob_thin,
            spread_ok: snap.spread_ticks >= self.y,
            obi_ok: snap.obi.abs() <= self.obi_limit,
            mid: snap.mid,
            dob: snap.dob,
            dob_median,
            spread_ticks: snap.spread_ticks,
            obi: snap.obi,
        }
    }
}
