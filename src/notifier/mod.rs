//! Event notification.
//!
//! Notifiers must return quickly and must not fail: observability never
//! affects control flow.

mod event;

pub use event::{Event, OrderEvent, OrderEventKind};

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sink for pipeline events.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    ///
    /// This method should return quickly. Slow sinks should hand the event
    /// off to a task.
    fn notify(&self, event: Event);
}

/// Registry of notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// Logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::Order(e) => {
                info!(
                    kind = %e.kind,
                    side = ?e.side,
                    price = ?e.price,
                    size = ?e.size,
                    display = ?e.display,
                    order_id = ?e.order_id.as_ref().map(|id| id.as_str()),
                    reason = ?e.reason,
                    open_maker_btc = e.open_maker_btc,
                    trace_id = ?e.trace_id.as_ref().map(|id| id.as_str()),
                    "Order event"
                );
            }
            Event::Gate(e) => {
                debug!(
                    t = e.t,
                    phase = ?e.phase,
                    phase_ok = e.phase_ok,
                    dob_thin = e.dob_thin,
                    spread_ok = e.spread_ok,
                    obi_ok = e.obi_ok,
                    "Gate evaluated"
                );
            }
            Event::Signal(s) => {
                info!(t = s.t, mid = s.mid, trace_id = %s.trace_id, "Signal");
            }
            Event::Fill {
                fill,
                slip_ticks,
                trace_id,
            } => {
                info!(
                    side = %fill.side,
                    price = fill.price,
                    size = fill.size,
                    order_id = ?fill.order_id.as_ref().map(|id| id.as_str()),
                    slip_ticks,
                    trace_id = ?trace_id.as_ref().map(|id| id.as_str()),
                    "Fill"
                );
            }
            Event::Risk { reason } => {
                info!(reason = %reason, "Risk advice");
            }
            Event::Killswitch { reason } => {
                warn!(reason = %reason, "Killswitch");
            }
            Event::Exit { reason, trace_id } => {
                info!(
                    reason = %reason,
                    trace_id = ?trace_id.as_ref().map(|id| id.as_str()),
                    "Exit"
                );
            }
            Event::StaleFeature { staleness_ms } => {
                debug!(staleness_ms, "Stale feature dropped");
            }
        }
    }
}

/// Forwards events into a bounded channel.
///
/// Uses `try_send`: when the receiver lags or is gone the event is dropped
/// and counted.
pub struct ChannelNotifier {
    tx: mpsc::Sender<Event>,
    dropped: AtomicU64,
}

impl ChannelNotifier {
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: Event) {
        if self.tx.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct CountingNotifier {
        count: Arc<AtomicUsize>,
    }

    impl Notifier for CountingNotifier {
        fn notify(&self, _event: Event) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn risk_event() -> Event {
        Event::Risk {
            reason: "ok".into(),
        }
    }

    #[test]
    fn test_registry_notify_all() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = NotifierRegistry::new();

        registry.register(Box::new(CountingNotifier {
            count: count.clone(),
        }));
        registry.register(Box::new(CountingNotifier {
            count: count.clone(),
        }));

        registry.notify_all(risk_event());

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_registry_len_and_is_empty() {
        let mut registry = NotifierRegistry::new();
        assert!(registry.is_empty());

        registry.register(Box::new(NullNotifier));
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_channel_notifier_drops_when_full() {
        let (notifier, mut rx) = ChannelNotifier::new(1);
        notifier.notify(risk_event());
        notifier.notify(risk_event());
        assert_eq!(notifier.dropped(), 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::new(4);
        drop(rx);
        notifier.notify(risk_event());
        assert_eq!(notifier.dropped(), 1);
    }

    #[test]
    fn test_log_notifier_accepts_all_events() {
        let notifier = LogNotifier;
        notifier.notify(risk_event());
        notifier.notify(Event::StaleFeature { staleness_ms: 500.0 });
        notifier.notify(Event::Exit {
            reason: "time_stop".into(),
            trace_id: None,
        });
    }
}
