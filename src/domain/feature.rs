//! Market feature snapshots derived from the top of book.

use serde::{Deserialize, Serialize};

const OBI_EPSILON: f64 = 1e-9;

/// Best bid/ask with displayed sizes, as delivered by a feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level1Quote {
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub bid_size: f64,
    pub ask_size: f64,
}

impl Level1Quote {
    #[must_use]
    pub fn new(best_bid: f64, best_ask: f64, bid_size: f64, ask_size: f64) -> Self {
        Self {
            best_bid: Some(best_bid),
            best_ask: Some(best_ask),
            bid_size,
            ask_size,
        }
    }
}

/// 100ms market feature record.
///
/// Immutable: attaching a phase yields a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    /// Seconds.
    pub t: f64,
    pub mid: f64,
    pub spread_ticks: f64,
    /// Depth of book: best bid size plus best ask size.
    pub dob: f64,
    /// Order book imbalance in [-1, 1].
    pub obi: f64,
    pub block_phase: Option<f64>,
}

impl FeatureSnapshot {
    #[must_use]
    pub fn new(t: f64, mid: f64, spread_ticks: f64, dob: f64, obi: f64) -> Self {
        Self {
            t,
            mid,
            spread_ticks,
            dob,
            obi,
            block_phase: None,
        }
    }

    /// Derive features from a level 1 quote.
    ///
    /// A missing side yields a zero spread; the mid falls back to whichever
    /// side is present.
    #[must_use]
    pub fn from_quote(t: f64, quote: &Level1Quote, tick_size: f64) -> Self {
        let (mid, spread_ticks) = match (quote.best_bid, quote.best_ask) {
            (Some(bid), Some(ask)) => {
                let spread = if tick_size > 0.0 {
                    ((ask - bid) / tick_size).max(0.0)
                } else {
                    0.0
                };
                ((bid + ask) / 2.0, spread)
            }
            (Some(bid), None) => (bid, 0.0),
            (None, Some(ask)) => (ask, 0.0),
            (None, None) => (0.0, 0.0),
        };
        let dob = quote.bid_size + quote.ask_size;
        let obi = (quote.bid_size - quote.ask_size) / dob.max(OBI_EPSILON);
        Self::new(t, mid, spread_ticks, dob, obi)
    }

    #[must_use]
    pub fn with_phase(self, phase: f64) -> Self {
        Self {
            block_phase: Some(phase),
            ..self
        }
    }
}

/// Round a price to the nearest multiple of `tick`.
///
/// Identity when `tick` is not positive.
#[must_use]
pub fn round_to_tick(x: f64, tick: f64) -> f64 {
    if tick <= 0.0 {
        return x;
    }
    round_half_even(x / tick) * tick
}

fn round_half_even(v: f64) -> f64 {
    if (v - v.trunc()).abs() == 0.5 {
        2.0 * (v / 2.0).round()
    } else {
        v.round()
    }
}
