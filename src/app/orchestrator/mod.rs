//! Strategy orchestration.
//!
//! Runs the pipeline as independent tasks that share one shutdown signal:
//!
//! - feature pump: samples the latest L1 quote every 100ms into a
//!   drop-oldest queue
//! - signal stage: rotation estimate, phase attach, four-condition gate
//! - execution stage: risk advice, sizing, orders, exits
//! - fills and blocks monitors
//!
//! A tripped killswitch flattens once and halts every task.

mod execution;
mod monitors;
mod queue;
mod signal_stage;

pub use queue::DropOldestQueue;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::detector::{RotationDetector, SignalDetector};
use crate::domain::{FeatureSnapshot, OrderId, TraceId};
use crate::exchange::{BlockSource, FeatureSource, FillSource, OrderGateway};
use crate::executor::ExecutionEngine;
use crate::notifier::{Event, Notifier, NotifierRegistry, OrderEventKind};
use crate::risk::{RiskManager, SizeAllocator};
use crate::shutdown::{self, ShutdownRx, ShutdownTx};

use execution::ExecutionStage;
use signal_stage::SignalStage;

pub const FEATURE_QUEUE_CAPACITY: usize = 1024;
const SIGNAL_QUEUE_CAPACITY: usize = 1024;
const FEATURE_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Timestamps above this are epoch seconds; smaller ones are synthetic and
/// skip the staleness guard.
const EPOCH_GUARD_THRESHOLD_S: f64 = 1e6;

/// External inputs. Any of them may be absent.
#[derive(Default)]
pub struct Sources {
    pub features: Option<Box<dyn FeatureSource>>,
    pub fills: Option<Box<dyn FillSource>>,
    pub blocks: Option<Box<dyn BlockSource>>,
}

/// State shared by every task.
struct Context {
    config: Config,
    clock: Arc<dyn Clock>,
    notifiers: Arc<NotifierRegistry>,
    engine: ExecutionEngine,
    risk: Arc<RiskManager>,
    sizer: SizeAllocator,
    features: DropOldestQueue<FeatureSnapshot>,
    latest: Arc<Mutex<Option<FeatureSnapshot>>>,
    order_traces: Arc<Mutex<HashMap<OrderId, TraceId>>>,
    shutdown_tx: ShutdownTx,
    halted: AtomicBool,
    /// Stop-order cleanups that outlive the signal that spawned them.
    cleanup: Mutex<Vec<JoinHandle<()>>>,
}

impl Context {
    fn notify(&self, event: Event) {
        self.notifiers.notify_all(event);
    }

    fn latest_feature(&self) -> Option<FeatureSnapshot> {
        *self.latest.lock()
    }

    /// Staleness of a feature timestamp in milliseconds, or `None` when the
    /// timestamp is not on the epoch scale.
    fn staleness_ms(&self, t: f64) -> Option<f64> {
        (t > EPOCH_GUARD_THRESHOLD_S).then(|| ((self.clock.now() - t) * 1000.0).max(0.0))
    }

    fn is_stale(&self, t: f64) -> Option<f64> {
        let max = self.config.latency.max_staleness_ms as f64;
        self.staleness_ms(t).filter(|ms| *ms > max)
    }

    fn track_cleanup(&self, handle: JoinHandle<()>) {
        let mut cleanup = self.cleanup.lock();
        cleanup.retain(|h| !h.is_finished());
        cleanup.push(handle);
    }

    fn subscribe(&self) -> ShutdownRx {
        self.shutdown_tx.subscribe()
    }

    /// Mark the strategy halted. Returns true for the first caller only.
    fn begin_halt(&self) -> bool {
        !self.halted.swap(true, Ordering::SeqCst)
    }

    /// Flatten, notify and stop every task. Runs at most once.
    async fn trigger_killswitch(&self, reason: &str) {
        if !self.begin_halt() {
            return;
        }
        warn!(reason, "Killswitch tripped, flattening");
        self.notify(Event::Killswitch {
            reason: reason.to_string(),
        });
        self.engine.flatten_ioc().await;
        self.shutdown_tx.send_replace(true);
    }
}

/// Feeds posted displays into the book-impact window and keeps the
/// order-to-trace mapping used to correlate fills.
struct OrderTracker {
    risk: Arc<RiskManager>,
    latest: Arc<Mutex<Option<FeatureSnapshot>>>,
    order_traces: Arc<Mutex<HashMap<OrderId, TraceId>>>,
}

impl Notifier for OrderTracker {
    fn notify(&self, event: Event) {
        let Event::Order(order) = event else {
            return;
        };
        match order.kind {
            OrderEventKind::Submitted => {
                let top_depth = self.latest.lock().map_or(0.0, |f| f.dob);
                if let Some(display) = order.display {
                    if display > 0.0 && top_depth > 0.0 {
                        self.risk.register_order_post(display, top_depth);
                    }
                }
                if let (Some(id), Some(trace)) = (order.order_id, order.trace_id) {
                    self.order_traces.lock().insert(id, trace);
                }
            }
            OrderEventKind::Cancel => {
                if let Some(id) = order.order_id {
                    self.order_traces.lock().remove(&id);
                }
            }
            OrderEventKind::Skip | OrderEventKind::Reject => {}
        }
    }
}

/// The running strategy.
pub struct Strategy {
    ctx: Arc<Context>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Strategy {
    /// Build the pipeline. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: Config,
        gateway: Arc<dyn OrderGateway>,
        clock: Arc<dyn Clock>,
        mut notifiers: NotifierRegistry,
    ) -> Self {
        let risk = Arc::new(RiskManager::new(config.risk.clone(), Arc::clone(&clock)));
        let latest = Arc::new(Mutex::new(None));
        let order_traces = Arc::new(Mutex::new(HashMap::new()));

        notifiers.register(Box::new(OrderTracker {
            risk: Arc::clone(&risk),
            latest: Arc::clone(&latest),
            order_traces: Arc::clone(&order_traces),
        }));
        let notifiers = Arc::new(notifiers);

        let engine = ExecutionEngine::new(
            &config.symbol,
            config.exec.clone(),
            gateway,
            Arc::clone(&clock),
            Arc::clone(&notifiers),
        );
        let sizer = SizeAllocator::new(&config.exec);
        let (shutdown_tx, _) = shutdown::channel();

        Self {
            ctx: Arc::new(Context {
                config,
                clock,
                notifiers,
                engine,
                risk,
                sizer,
                features: DropOldestQueue::new(FEATURE_QUEUE_CAPACITY),
                latest,
                order_traces,
                shutdown_tx,
                halted: AtomicBool::new(false),
                cleanup: Mutex::new(Vec::new()),
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the pipeline tasks. Must be called inside a tokio runtime.
    pub fn start(&self, sources: Sources) {
        let ctx = &self.ctx;
        info!(
            symbol = %ctx.config.symbol.name,
            paper = ctx.config.paper,
            "VRLG starting"
        );

        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_QUEUE_CAPACITY);
        let mut tasks = Vec::new();

        if let Some(source) = sources.features {
            tasks.push(tokio::spawn(feature_pump(
                Arc::clone(ctx),
                source,
                ctx.subscribe(),
            )));
        }

        let rotation = RotationDetector::from_config(&ctx.config.signal);
        let notifiers = Arc::clone(&ctx.notifiers);
        let detector = SignalDetector::new(&ctx.config.signal).with_observer(Box::new(move |eval| {
            if eval.phase_ok && !eval.all_pass() {
                notifiers.notify_all(Event::Gate(eval.clone()));
            }
        }));
        let stage = SignalStage::new(Arc::clone(ctx), rotation, detector, signal_tx);
        tasks.push(tokio::spawn(stage.run(ctx.subscribe())));

        let stage = ExecutionStage::new(Arc::clone(ctx));
        tasks.push(tokio::spawn(stage.run(signal_rx, ctx.subscribe())));

        if let Some(source) = sources.fills {
            tasks.push(tokio::spawn(monitors::fills(
                Arc::clone(ctx),
                source,
                ctx.subscribe(),
            )));
        }
        if let Some(source) = sources.blocks {
            tasks.push(tokio::spawn(monitors::blocks(
                Arc::clone(ctx),
                source,
                ctx.subscribe(),
            )));
        }

        info!(tasks = tasks.len(), "Pipeline started");
        self.tasks.lock().extend(tasks);
    }

    /// Stop every task and flatten. Safe to call more than once; the
    /// position is flattened at most once, and not at all if the
    /// killswitch already did it.
    pub async fn shutdown(&self) {
        let first = self.ctx.begin_halt();
        if first {
            info!("VRLG shutting down");
        }
        self.ctx.shutdown_tx.send_replace(true);

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Pipeline task failed");
                }
            }
        }

        // Execution has stopped, so no new cleanups can appear.
        let cleanup = std::mem::take(&mut *self.ctx.cleanup.lock());
        if !cleanup.is_empty() {
            debug!(pending = cleanup.len(), "Waiting for stop-order cleanup");
        }
        for task in cleanup {
            if let Err(e) = task.await {
                warn!(error = %e, "Stop-order cleanup failed");
            }
        }

        if first {
            self.ctx.engine.flatten_ioc().await;
            info!("VRLG stopped");
        }
    }

    /// Resolves once shutdown or the killswitch has stopped the pipeline.
    pub async fn halted(&self) {
        let mut rx = self.ctx.subscribe();
        shutdown::signalled(&mut rx).await;
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.ctx.halted.load(Ordering::SeqCst)
    }

    /// Enqueue a feature snapshot directly, bypassing the feature pump.
    ///
    /// Returns true if an older snapshot was evicted.
    pub fn push_feature(&self, snapshot: FeatureSnapshot) -> bool {
        self.ctx.features.push(snapshot)
    }

    #[must_use]
    pub fn engine(&self) -> &ExecutionEngine {
        &self.ctx.engine
    }

    #[must_use]
    pub fn risk(&self) -> &RiskManager {
        &self.ctx.risk
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    /// Most recent snapshot seen by the signal stage.
    #[must_use]
    pub fn latest_feature(&self) -> Option<FeatureSnapshot> {
        self.ctx.latest_feature()
    }
}

/// Keep the latest quote and sample it on a fixed 100ms clock.
async fn feature_pump(
    ctx: Arc<Context>,
    mut source: Box<dyn FeatureSource>,
    mut shutdown_rx: ShutdownRx,
) {
    let tick_size = ctx.config.symbol.tick_size;
    let mut clock = tokio::time::interval(FEATURE_SAMPLE_INTERVAL);
    clock.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut latest = None;
    let mut source_open = true;

    loop {
        tokio::select! {
            () = shutdown::signalled(&mut shutdown_rx) => break,
            quote = source.next_quote(), if source_open => match quote {
                Some(quote) => latest = Some(quote),
                None => {
                    warn!("Feature source ended");
                    source_open = false;
                }
            },
            _ = clock.tick() => {
                if let Some(quote) = &latest {
                    let snapshot = FeatureSnapshot::from_quote(ctx.clock.now(), quote, tick_size);
                    if ctx.features.push(snapshot) {
                        debug!(dropped = ctx.features.dropped(), "Feature queue full, dropped oldest");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::PaperGateway;
    use crate::testkit::{self, ManualClock, RecordingNotifier};

    fn strategy() -> (Strategy, RecordingNotifier) {
        let recorder = RecordingNotifier::new();
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(recorder.clone()));
        let strategy = Strategy::new(
            testkit::config::config(),
            Arc::new(PaperGateway::new()),
            Arc::new(ManualClock::new(1_000.0)),
            registry,
        );
        (strategy, recorder)
    }

    #[test]
    fn test_staleness_only_for_epoch_timestamps() {
        let (strategy, _) = strategy();
        assert_eq!(strategy.ctx.staleness_ms(12.5), None);

        let clock = Arc::new(ManualClock::new(1_700_000_000.5));
        let strategy = Strategy::new(
            testkit::config::config(),
            Arc::new(PaperGateway::new()),
            clock,
            NotifierRegistry::new(),
        );
        let ms = strategy.ctx.staleness_ms(1_700_000_000.0).unwrap();
        assert!((ms - 500.0).abs() < 1e-3);
        assert!(strategy.ctx.is_stale(1_700_000_000.0).is_some());
        assert!(strategy.ctx.is_stale(1_700_000_000.4).is_none());
    }

    #[tokio::test]
    async fn test_killswitch_runs_once() {
        let (strategy, recorder) = strategy();
        strategy.ctx.trigger_killswitch("block interval").await;
        strategy.ctx.trigger_killswitch("again").await;
        assert!(strategy.is_halted());
        assert_eq!(recorder.count("killswitch"), 1);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (strategy, _) = strategy();
        strategy.start(Sources::default());
        strategy.shutdown().await;
        strategy.shutdown().await;
        assert!(strategy.is_halted());
        tokio::time::timeout(Duration::from_millis(100), strategy.halted())
            .await
            .expect("halted resolves after shutdown");
    }

    #[tokio::test]
    async fn test_order_tracker_registers_book_impact() {
        let (strategy, _) = strategy();
        *strategy.ctx.latest.lock() = Some(FeatureSnapshot::new(0.0, 100.0, 1.0, 10.0, 0.0));
        let ids = strategy.engine().place_two_sided(100.0, 0.2, false).await;
        assert_eq!(ids.len(), 2);
        // display 0.05 per side over top depth 10
        assert!((strategy.risk().book_impact_sum_5s() - 0.01).abs() < 1e-12);
        assert_eq!(strategy.ctx.order_traces.lock().len(), 0);
    }
}
