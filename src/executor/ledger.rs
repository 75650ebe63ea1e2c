use std::collections::BTreeMap;

use tracing::warn;

use crate::domain::OrderId;

/// Open maker exposure, keyed by order.
///
/// Each order's size is released at most once, whether by cancel, TTL
/// expiry or fill.
#[derive(Debug, Default)]
pub struct ExposureLedger {
    sizes: BTreeMap<OrderId, f64>,
    open: f64,
}

impl ExposureLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of live maker order sizes.
    #[must_use]
    pub fn open(&self) -> f64 {
        self.open
    }

    #[must_use]
    pub fn would_exceed(&self, additional: f64, limit: f64) -> bool {
        self.open + additional > limit
    }

    /// Count `size` against `order_id`. A repeated id adds to the
    /// existing entry rather than replacing it.
    pub fn track(&mut self, order_id: OrderId, size: f64) {
        if let Some(existing) = self.sizes.get_mut(&order_id) {
            warn!(order_id = %order_id, existing = *existing, size, "Duplicate order id, summing exposure");
            *existing += size;
        } else {
            self.sizes.insert(order_id, size);
        }
        self.recompute();
    }

    /// Remove an order and return the size released (0 if already gone).
    pub fn release(&mut self, order_id: &OrderId) -> f64 {
        match self.sizes.remove(order_id) {
            Some(size) => {
                self.recompute();
                size
            }
            None => 0.0,
        }
    }

    #[must_use]
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.sizes.contains_key(order_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    // Summed in key order so the total is a pure function of the live set.
    fn recompute(&mut self) {
        self.open = self.sizes.values().sum::<f64>().max(0.0);
    }
}
