//! Order, fill and block event types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which sides the engine quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideMode {
    #[default]
    Both,
    Buy,
    Sell,
}

impl SideMode {
    /// Sides in quoting order (bid first).
    #[must_use]
    pub fn sides(self) -> &'static [Side] {
        match self {
            Self::Both => &[Side::Buy, Side::Sell],
            Self::Buy => &[Side::Buy],
            Self::Sell => &[Side::Sell],
        }
    }
}

/// Exchange order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Post-only iceberg limit.
    Limit,
    /// Reduce-only protective stop.
    Stop,
}

/// Order submission request handed to a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub kind: OrderKind,
    pub price: f64,
    pub size: f64,
    pub display_size: Option<f64>,
    pub post_only: bool,
    pub ttl_ms: Option<u64>,
    pub reduce_only: bool,
}

impl OrderRequest {
    /// Post-only iceberg limit order.
    pub fn maker(
        symbol: impl Into<String>,
        side: Side,
        price: f64,
        size: f64,
        display_size: f64,
        ttl_ms: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            kind: OrderKind::Limit,
            price,
            size,
            display_size: Some(display_size),
            post_only: true,
            ttl_ms: Some(ttl_ms),
            reduce_only: false,
        }
    }

    /// Reduce-only stop order.
    pub fn reduce_only_stop(symbol: impl Into<String>, side: Side, price: f64, size: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            kind: OrderKind::Stop,
            price,
            size,
            display_size: None,
            post_only: false,
            ttl_ms: None,
            reduce_only: true,
        }
    }
}

/// Execution report for one of our orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: Option<OrderId>,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    /// Mid at the time the order was priced, for slippage.
    pub ref_mid: Option<f64>,
    pub ts: f64,
}

/// Observation of a block (rotation boundary) on the venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockEvent {
    pub ts: f64,
    /// Seconds since the previous block, if the source measured it.
    pub interval_s: Option<f64>,
}
