//! Execution engine.
//!
//! Turns a sized intent into post-only iceberg orders on one or both sides
//! of the mid, keeps them alive for the TTL, tracks aggregate open maker
//! exposure and enforces a per-side cooldown after fills.
//!
//! Order transmission failures never escape: they are logged and surfaced
//! as `reject`/`skip` events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::ExposureLedger;
use crate::clock::Clock;
use crate::config::{ExecConfig, SymbolConfig};
use crate::domain::{round_to_tick, OrderId, OrderRequest, Side, TraceId};
use crate::exchange::OrderGateway;
use crate::notifier::{Event, NotifierRegistry, OrderEvent, OrderEventKind};
use crate::shutdown::{self, ShutdownRx};

const DEFAULT_PERIOD_HINT_S: f64 = 1.0;
const MAX_STOP_SIZE_BTC: f64 = 1.0;

struct EngineState {
    ledger: ExposureLedger,
    cooldown_until: HashMap<Side, f64>,
    period_hint: f64,
    trace_id: Option<TraceId>,
}

pub struct ExecutionEngine {
    symbol: String,
    tick: f64,
    config: ExecConfig,
    gateway: Arc<dyn OrderGateway>,
    clock: Arc<dyn Clock>,
    notifiers: Arc<NotifierRegistry>,
    state: Mutex<EngineState>,
}

impl ExecutionEngine {
    pub fn new(
        symbol: &SymbolConfig,
        config: ExecConfig,
        gateway: Arc<dyn OrderGateway>,
        clock: Arc<dyn Clock>,
        notifiers: Arc<NotifierRegistry>,
    ) -> Self {
        Self {
            symbol: symbol.name.clone(),
            tick: symbol.tick_size,
            config,
            gateway,
            clock,
            notifiers,
            state: Mutex::new(EngineState {
                ledger: ExposureLedger::new(),
                cooldown_until: HashMap::new(),
                period_hint: DEFAULT_PERIOD_HINT_S,
                trace_id: None,
            }),
        }
    }

    /// Inject the current rotation period estimate used for cooldowns.
    pub fn set_period_hint(&self, period_s: f64) {
        if period_s.is_finite() && period_s > 0.0 {
            self.state.lock().period_hint = period_s;
        }
    }

    #[must_use]
    pub fn period_hint(&self) -> f64 {
        self.state.lock().period_hint
    }

    /// Correlate subsequent events with a signal.
    pub fn set_trace_id(&self, trace_id: Option<TraceId>) {
        self.state.lock().trace_id = trace_id;
    }

    #[must_use]
    pub fn open_maker_btc(&self) -> f64 {
        self.state.lock().ledger.open()
    }

    /// Whether `order_id` is still counted as open exposure.
    #[must_use]
    pub fn is_tracked(&self, order_id: &OrderId) -> bool {
        self.state.lock().ledger.contains(order_id)
    }

    #[must_use]
    pub fn tick_size(&self) -> f64 {
        self.tick
    }

    /// Bid and ask quote prices around `mid`, rounded to the tick.
    #[must_use]
    pub fn quote_prices(&self, mid: f64, deepen: bool) -> (f64, f64) {
        let offset = if deepen {
            self.config.offset_ticks_deep
        } else {
            self.config.offset_ticks_normal
        };
        (
            round_to_tick(mid - offset * self.tick, self.tick),
            round_to_tick(mid + offset * self.tick, self.tick),
        )
    }

    /// Place post-only iceberg orders around `mid`.
    ///
    /// Returns the ids of the orders that were accepted.
    pub async fn place_two_sided(&self, mid: f64, total: f64, deepen: bool) -> Vec<OrderId> {
        let mut placed = Vec::new();
        if !(total > 0.0) {
            return placed;
        }

        let (bid, ask) = self.quote_prices(mid, deepen);
        let splits = self.config.splits.max(1);
        let child_total = total / splits as f64;
        let display = (child_total * self.config.display_ratio)
            .max(self.config.min_display_btc)
            .min(child_total);

        for &side in self.config.side_mode.sides() {
            let price = match side {
                Side::Buy => bid,
                Side::Sell => ask,
            };

            if self.in_cooldown(side) {
                self.emit(self.order_event(OrderEventKind::Skip).side(side).reason("cooldown"));
                continue;
            }

            for _ in 0..splits {
                let exceeds = self
                    .state
                    .lock()
                    .ledger
                    .would_exceed(child_total, self.config.max_exposure_btc);
                if exceeds {
                    self.emit(self.order_event(OrderEventKind::Skip).side(side).reason("exposure"));
                    break;
                }

                let request = OrderRequest::maker(
                    self.symbol.clone(),
                    side,
                    price,
                    child_total,
                    display,
                    self.config.order_ttl_ms,
                );
                match self.gateway.place_order(&request).await {
                    Ok(order_id) => {
                        self.state.lock().ledger.track(order_id.clone(), child_total);
                        self.emit(
                            self.order_event(OrderEventKind::Submitted)
                                .side(side)
                                .price(price)
                                .size(child_total)
                                .display(display)
                                .order_id(order_id.clone()),
                        );
                        placed.push(order_id);
                    }
                    Err(e) => {
                        warn!(error = %e, side = %side, price, "Order placement failed");
                        self.emit(
                            self.order_event(OrderEventKind::Reject)
                                .side(side)
                                .price(price)
                                .size(child_total)
                                .reason(e.to_string()),
                        );
                    }
                }
            }
        }

        placed
    }

    /// Wait out the TTL, then cancel every order and release its exposure.
    ///
    /// Shutdown cuts the wait short. If this future is dropped before
    /// completing, the remaining ledger entries are still released.
    pub async fn wait_fill_or_ttl(
        &self,
        order_ids: &[OrderId],
        timeout: Duration,
        mut shutdown_rx: ShutdownRx,
    ) {
        if order_ids.is_empty() {
            return;
        }
        let guard = LedgerReleaseGuard {
            state: &self.state,
            order_ids,
        };

        tokio::select! {
            () = tokio::time::sleep(timeout) => {}
            () = shutdown::signalled(&mut shutdown_rx) => {
                debug!(orders = order_ids.len(), "TTL wait interrupted by shutdown");
            }
        }

        for order_id in order_ids {
            if let Err(e) = self.gateway.cancel_order(&self.symbol, order_id).await {
                debug!(order_id = %order_id, error = %e, "Cancel after TTL failed");
            }
            self.state.lock().ledger.release(order_id);
            self.emit(self.order_event(OrderEventKind::Cancel).order_id(order_id.clone()));
        }

        drop(guard);
    }

    /// Start the cooldown for `side` after a fill.
    pub fn register_fill(&self, side: Side) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let until = now + self.config.cooldown_factor * state.period_hint;
        state.cooldown_until.insert(side, until);
        debug!(side = %side, until, "Cooldown started");
    }

    /// Release the exposure of a filled child order. Returns the size released.
    pub fn register_child_fill(&self, order_id: &OrderId) -> f64 {
        self.state.lock().ledger.release(order_id)
    }

    #[must_use]
    pub fn in_cooldown(&self, side: Side) -> bool {
        let now = self.clock.now();
        self.state
            .lock()
            .cooldown_until
            .get(&side)
            .is_some_and(|until| now < *until)
    }

    /// Submit a reduce-only stop on the opposite side of a fill.
    pub async fn place_reverse_stop(
        &self,
        fill_side: Side,
        ref_mid: f64,
        stop_ticks: f64,
    ) -> Option<OrderId> {
        let offset = stop_ticks * self.tick;
        let raw = match fill_side {
            Side::Buy => ref_mid - offset,
            Side::Sell => ref_mid + offset,
        };
        let price = round_to_tick(raw, self.tick);
        let size = self.config.max_exposure_btc.min(MAX_STOP_SIZE_BTC);
        let request =
            OrderRequest::reduce_only_stop(self.symbol.clone(), fill_side.opposite(), price, size);

        match self.gateway.place_order(&request).await {
            Ok(order_id) => {
                debug!(order_id = %order_id, side = %request.side, price, "Reverse stop placed");
                Some(order_id)
            }
            Err(e) => {
                warn!(error = %e, side = %request.side, price, "Reverse stop failed");
                None
            }
        }
    }

    /// Cancel one order, ignoring failures.
    ///
    /// Exposure is released only when the cancel is acknowledged.
    pub async fn cancel_order_safely(&self, order_id: &OrderId) {
        match self.gateway.cancel_order(&self.symbol, order_id).await {
            Ok(()) => {
                self.state.lock().ledger.release(order_id);
                self.emit(self.order_event(OrderEventKind::Cancel).order_id(order_id.clone()));
            }
            Err(e) => debug!(order_id = %order_id, error = %e, "Cancel ignored"),
        }
    }

    /// Close the position with an immediate-or-cancel order. Returns false on failure.
    pub async fn flatten_ioc(&self) -> bool {
        match self.gateway.flatten_ioc(&self.symbol).await {
            Ok(()) => {
                info!(symbol = %self.symbol, gateway = self.gateway.name(), "Flattened");
                true
            }
            Err(e) => {
                warn!(error = %e, "Flatten failed");
                false
            }
        }
    }

    /// After `ms`, flatten regardless of PnL. Returns false if shutdown came first.
    pub async fn time_stop_after(&self, ms: u64, mut shutdown_rx: ShutdownRx) -> bool {
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(ms)) => {
                self.flatten_ioc().await;
                true
            }
            () = shutdown::signalled(&mut shutdown_rx) => false,
        }
    }

    fn order_event(&self, kind: OrderEventKind) -> OrderEvent {
        let state = self.state.lock();
        OrderEvent::new(kind, state.ledger.open(), state.trace_id.clone())
    }

    fn emit(&self, event: OrderEvent) {
        self.notifiers.notify_all(Event::Order(event));
    }
}

/// Releases ledger entries if the TTL wait is abandoned mid-flight.
struct LedgerReleaseGuard<'a> {
    state: &'a Mutex<EngineState>,
    order_ids: &'a [OrderId],
}

impl Drop for LedgerReleaseGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        for order_id in self.order_ids {
            state.ledger.release(order_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::PaperGateway;
    use crate::testkit::{ManualClock, RecordingNotifier};

    fn engine_with(exec: ExecConfig) -> (ExecutionEngine, Arc<ManualClock>, RecordingNotifier) {
        let clock = Arc::new(ManualClock::new(0.0));
        let recorder = RecordingNotifier::new();
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(recorder.clone()));
        let engine = ExecutionEngine::new(
            &SymbolConfig::default(),
            exec,
            Arc::new(PaperGateway::new()),
            clock.clone(),
            Arc::new(registry),
        );
        (engine, clock, recorder)
    }

    #[test]
    fn test_quote_prices_on_tick() {
        let (engine, _, _) = engine_with(ExecConfig::default());
        let (bid, ask) = engine.quote_prices(70_000.3, false);
        assert_eq!(ask - bid, 0.5);
        let (bid, ask) = engine.quote_prices(70_000.3, true);
        assert_eq!(ask - bid, 1.5);
    }

    #[tokio::test]
    async fn test_zero_total_places_nothing() {
        let (engine, _, recorder) = engine_with(ExecConfig::default());
        assert!(engine.place_two_sided(100.0, 0.0, false).await.is_empty());
        assert!(recorder.events().is_empty());
    }

    #[tokio::test]
    async fn test_places_both_sides_and_tracks_exposure() {
        let (engine, _, recorder) = engine_with(ExecConfig::default());
        let ids = engine.place_two_sided(100.0, 0.2, false).await;
        assert_eq!(ids.len(), 2);
        assert!((engine.open_maker_btc() - 0.4).abs() < 1e-12);
        assert_eq!(recorder.order_kinds(), vec!["submitted", "submitted"]);
    }

    #[tokio::test]
    async fn test_splits_stop_at_exposure_limit() {
        let exec = ExecConfig {
            splits: 4,
            max_exposure_btc: 0.25,
            side_mode: crate::domain::SideMode::Buy,
            ..ExecConfig::default()
        };
        let (engine, _, recorder) = engine_with(exec);
        let ids = engine.place_two_sided(100.0, 0.4, false).await;
        assert_eq!(ids.len(), 2);
        assert_eq!(recorder.order_kinds(), vec!["submitted", "submitted", "skip"]);
    }

    #[tokio::test]
    async fn test_cooldown_expires_with_clock() {
        let (engine, clock, _) = engine_with(ExecConfig::default());
        engine.set_period_hint(1.5);
        engine.register_fill(Side::Sell);
        assert!(engine.in_cooldown(Side::Sell));
        assert!(!engine.in_cooldown(Side::Buy));
        clock.advance(2.9);
        assert!(engine.in_cooldown(Side::Sell));
        clock.advance(0.2);
        assert!(!engine.in_cooldown(Side::Sell));
    }

    #[tokio::test]
    async fn test_reverse_stop_price() {
        let (engine, _, _) = engine_with(ExecConfig::default());
        assert!(engine.place_reverse_stop(Side::Buy, 100.0, 3.0).await.is_some());
        assert_eq!(engine.open_maker_btc(), 0.0);
    }

    #[test]
    fn test_period_hint_ignores_invalid() {
        let (engine, _, _) = engine_with(ExecConfig::default());
        engine.set_period_hint(-1.0);
        engine.set_period_hint(f64::NAN);
        assert_eq!(engine.period_hint(), 1.0);
    }
}
