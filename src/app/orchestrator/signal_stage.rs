//! Features in, signals out.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use super::Context;
use crate::detector::{DetectorState, RotationDetector, SignalDetector};
use crate::domain::{FeatureSnapshot, Signal};
use crate::notifier::Event;
use crate::shutdown::{self, ShutdownRx};

/// Owns both detectors; nothing else mutates them.
pub(super) struct SignalStage {
    ctx: Arc<Context>,
    rotation: RotationDetector,
    detector: SignalDetector,
    signals: mpsc::Sender<Signal>,
    last_state: DetectorState,
}

impl SignalStage {
    pub(super) fn new(
        ctx: Arc<Context>,
        rotation: RotationDetector,
        detector: SignalDetector,
        signals: mpsc::Sender<Signal>,
    ) -> Self {
        let last_state = rotation.state();
        Self {
            ctx,
            rotation,
            detector,
            signals,
            last_state,
        }
    }

    pub(super) async fn run(mut self, mut shutdown_rx: ShutdownRx) {
        loop {
            let snapshot = tokio::select! {
                () = shutdown::signalled(&mut shutdown_rx) => break,
                snapshot = self.ctx.features.pop() => snapshot,
            };

            let Some(signal) = self.process(snapshot) else {
                continue;
            };

            tokio::select! {
                () = shutdown::signalled(&mut shutdown_rx) => break,
                sent = self.signals.send(signal) => {
                    if sent.is_err() {
                        debug!("Execution stage gone, signal stage stopping");
                        break;
                    }
                }
            }
        }
        debug!("Signal stage stopped");
    }

    /// Run one snapshot through the rotation estimate and the gate.
    fn process(&mut self, snapshot: FeatureSnapshot) -> Option<Signal> {
        if let Some(staleness_ms) = self.ctx.is_stale(snapshot.t) {
            trace!(staleness_ms, "Dropping stale feature");
            self.ctx.notify(Event::StaleFeature { staleness_ms });
            return None;
        }

        self.rotation
            .update(snapshot.t, snapshot.dob, snapshot.spread_ticks);
        self.log_transition();

        if !self.rotation.is_active() {
            *self.ctx.latest.lock() = Some(snapshot);
            return None;
        }

        let snapshot = snapshot.with_phase(self.rotation.current_phase(snapshot.t));
        *self.ctx.latest.lock() = Some(snapshot);
        self.ctx
            .engine
            .set_period_hint(self.rotation.current_period().unwrap_or(1.0));

        let signal = self.detector.update_and_maybe_signal(snapshot.t, &snapshot)?;
        self.ctx.notify(Event::Signal(signal.clone()));
        Some(signal)
    }

    fn log_transition(&mut self) {
        let state = self.rotation.state();
        if state == self.last_state {
            return;
        }
        let est = self.rotation.last_estimation();
        info!(
            from = self.last_state.reason(),
            to = state.reason(),
            period_s = ?est.period_s,
            score = est.score,
            p_dob = ?est.p_dob,
            p_spread = ?est.p_spread,
            "Rotation state changed"
        );
        self.last_state = state;
    }
}
