//! Signals in, orders out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::Context;
use crate::domain::{Side, Signal};
use crate::notifier::Event;
use crate::shutdown::{self, ShutdownRx};

const PAUSE_BACKOFF: Duration = Duration::from_millis(100);
const SPREAD_POLL_INTERVAL: Duration = Duration::from_millis(20);

enum Flow {
    Continue,
    Halt,
}

pub(super) struct ExecutionStage {
    ctx: Arc<Context>,
}

impl ExecutionStage {
    pub(super) fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    pub(super) async fn run(self, mut signals: mpsc::Receiver<Signal>, mut shutdown_rx: ShutdownRx) {
        loop {
            let signal = tokio::select! {
                () = shutdown::signalled(&mut shutdown_rx) => break,
                signal = signals.recv() => match signal {
                    Some(signal) => signal,
                    None => break,
                },
            };
            if let Flow::Halt = self.handle(signal, &mut shutdown_rx).await {
                break;
            }
        }
        debug!("Execution stage stopped");
    }

    async fn handle(&self, signal: Signal, shutdown_rx: &mut ShutdownRx) -> Flow {
        let ctx = &self.ctx;

        let advice = ctx.risk.advice();
        if advice.killswitch {
            ctx.trigger_killswitch(&advice.reason).await;
            return Flow::Halt;
        }
        if ctx.risk.should_pause() {
            ctx.notify(Event::Risk {
                reason: advice.reason.clone(),
            });
            tokio::select! {
                () = tokio::time::sleep(PAUSE_BACKOFF) => {}
                () = shutdown::signalled(shutdown_rx) => {}
            }
            return Flow::Continue;
        }
        if !advice.is_ok() {
            ctx.notify(Event::Risk {
                reason: advice.reason.clone(),
            });
        }

        let Some(snapshot) = ctx.latest_feature() else {
            debug!("No feature snapshot yet, skipping signal");
            return Flow::Continue;
        };
        if let Some(staleness_ms) = ctx.is_stale(snapshot.t) {
            ctx.notify(Event::StaleFeature { staleness_ms });
            return Flow::Continue;
        }

        let clip = ctx.sizer.next_size(signal.mid, advice.size_multiplier);
        if clip <= 0.0 {
            debug!(mid = signal.mid, "Clip below minimum, skipping signal");
            return Flow::Continue;
        }

        let trace_id = signal.trace_id.clone();
        ctx.engine.set_trace_id(Some(trace_id.clone()));
        info!(
            trace_id = %trace_id,
            mid = signal.mid,
            clip,
            deepen = advice.deepen_post_only,
            "Order intent"
        );

        let time_stop = {
            let ctx = Arc::clone(ctx);
            let rx = shutdown_rx.clone();
            let ms = ctx.risk.time_stop_ms();
            tokio::spawn(async move { ctx.engine.time_stop_after(ms, rx).await })
        };

        let stop_ticks = ctx.risk.stop_ticks();
        let mut stops = Vec::new();
        for side in [Side::Buy, Side::Sell] {
            if let Some(id) = ctx.engine.place_reverse_stop(side, signal.mid, stop_ticks).await {
                stops.push(id);
            }
        }

        let orders = ctx
            .engine
            .place_two_sided(signal.mid, clip, advice.deepen_post_only)
            .await;
        debug!(count = orders.len(), "Maker orders placed");

        let ttl = Duration::from_millis(ctx.config.exec.order_ttl_ms);
        let started = Instant::now();
        let collapsed = self.wait_spread_collapse(ttl, shutdown_rx).await;
        let remaining = ttl.saturating_sub(started.elapsed());

        if advice.forbid_market {
            ctx.notify(Event::Exit {
                reason: "ttl".into(),
                trace_id: Some(trace_id),
            });
            ctx.engine
                .wait_fill_or_ttl(&orders, remaining, shutdown_rx.clone())
                .await;

            // No IOC exit: the stops stay until the time stop has closed out.
            let cleanup = {
                let ctx = Arc::clone(ctx);
                tokio::spawn(async move {
                    if let Err(e) = time_stop.await {
                        warn!(error = %e, "Time stop task failed");
                    }
                    for id in &stops {
                        ctx.engine.cancel_order_safely(id).await;
                    }
                })
            };
            ctx.track_cleanup(cleanup);
        } else {
            let (reason, wait) = if collapsed {
                ("spread_collapse", Duration::ZERO)
            } else {
                ("ttl", remaining)
            };
            ctx.notify(Event::Exit {
                reason: reason.into(),
                trace_id: Some(trace_id),
            });

            time_stop.abort();
            for id in &stops {
                ctx.engine.cancel_order_safely(id).await;
            }
            ctx.engine
                .wait_fill_or_ttl(&orders, wait, shutdown_rx.clone())
                .await;

            let stopping = *shutdown_rx.borrow();
            if !stopping {
                ctx.engine.flatten_ioc().await;
            }
        }

        ctx.engine.set_trace_id(None);
        Flow::Continue
    }

    /// Poll the latest spread until it is at most `spread_collapse_ticks`.
    /// Returns false on timeout or shutdown.
    async fn wait_spread_collapse(&self, timeout: Duration, shutdown_rx: &mut ShutdownRx) -> bool {
        let threshold = self.ctx.config.exec.spread_collapse_ticks;
        let deadline = Instant::now() + timeout;
        loop {
            let collapsed = self
                .ctx
                .latest_feature()
                .is_some_and(|f| f.spread_ticks <= threshold);
            if collapsed {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::select! {
                () = tokio::time::sleep(SPREAD_POLL_INTERVAL.min(deadline - now)) => {}
                () = shutdown::signalled(shutdown_rx) => return false,
            }
        }
    }
}
