//! Observability events.

use std::fmt;

use serde::Serialize;

use crate::domain::{Fill, GateEvaluation, OrderId, Side, Signal, TraceId};

/// Events emitted at every decision point of the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Order(OrderEvent),
    Gate(GateEvaluation),
    Signal(Signal),
    Fill {
        fill: Fill,
        slip_ticks: f64,
        trace_id: Option<TraceId>,
    },
    /// Non-ok risk advice observed before placement.
    Risk { reason: String },
    Killswitch { reason: String },
    /// Position exit (spread collapse, time stop, flatten).
    Exit {
        reason: String,
        trace_id: Option<TraceId>,
    },
    StaleFeature { staleness_ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    Skip,
    Submitted,
    Reject,
    Cancel,
}

impl OrderEventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Submitted => "submitted",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle event from the execution engine.
#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub side: Option<Side>,
    pub price: Option<f64>,
    pub size: Option<f64>,
    pub display: Option<f64>,
    pub order_id: Option<OrderId>,
    pub reason: Option<String>,
    pub open_maker_btc: f64,
    pub trace_id: Option<TraceId>,
}

impl OrderEvent {
    #[must_use]
    pub fn new(kind: OrderEventKind, open_maker_btc: f64, trace_id: Option<TraceId>) -> Self {
        Self {
            kind,
            side: None,
            price: None,
            size: None,
            display: None,
            order_id: None,
            reason: None,
            open_maker_btc,
            trace_id,
        }
    }

    #[must_use]
    pub fn side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    #[must_use]
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn display(mut self, display: f64) -> Self {
        self.display = Some(display);
        self
    }

    #[must_use]
    pub fn order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl Event {
    /// Short kind tag, e.g. `"skip"` or `"killswitch"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Order(e) => e.kind.as_str(),
            Self::Gate(_) => "gate",
            Self::Signal(_) => "signal",
            Self::Fill { .. } => "fill",
            Self::Risk { .. } => "risk",
            Self::Killswitch { .. } => "killswitch",
            Self::Exit { .. } => "exit",
            Self::StaleFeature { .. } => "stale_feature",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_event_builder() {
        let event = OrderEvent::new(OrderEventKind::Skip, 0.4, None)
            .side(Side::Buy)
            .reason("cooldown");
        assert_eq!(event.side, Some(Side::Buy));
        assert_eq!(event.reason.as_deref(), Some("cooldown"));
        assert_eq!(Event::Order(event).kind(), "skip");
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = Event::Killswitch {
            reason: "block interval".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "killswitch");
        assert_eq!(json["reason"], "block interval");
    }
}
