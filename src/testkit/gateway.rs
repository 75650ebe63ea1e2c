//! Scripted order gateway.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{OrderId, OrderRequest};
use crate::error::ExecutionError;
use crate::exchange::OrderGateway;

/// Gateway that records every call and can be told to fail.
#[derive(Default)]
pub struct ScriptedGateway {
    next_id: AtomicU64,
    fail_places: AtomicUsize,
    fail_cancels: AtomicUsize,
    placed: Mutex<Vec<OrderRequest>>,
    cancelled: Mutex<Vec<OrderId>>,
    flattens: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` placements.
    pub fn fail_next_places(&self, n: usize) {
        self.fail_places.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` cancels.
    pub fn fail_next_cancels(&self, n: usize) {
        self.fail_cancels.store(n, Ordering::SeqCst);
    }

    pub fn placed(&self) -> Vec<OrderRequest> {
        self.placed.lock().clone()
    }

    pub fn cancelled(&self) -> Vec<OrderId> {
        self.cancelled.lock().clone()
    }

    pub fn flattens(&self) -> usize {
        self.flattens.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl OrderGateway for ScriptedGateway {
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderId, ExecutionError> {
        if Self::take_failure(&self.fail_places) {
            return Err(ExecutionError::OrderRejected("scripted rejection".into()));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.placed.lock().push(request.clone());
        Ok(OrderId::new(format!("scripted-{n}")))
    }

    async fn cancel_order(&self, _symbol: &str, order_id: &OrderId) -> Result<(), ExecutionError> {
        if Self::take_failure(&self.fail_cancels) {
            return Err(ExecutionError::CancelFailed {
                order_id: order_id.to_string(),
                reason: "scripted failure".into(),
            });
        }
        self.cancelled.lock().push(order_id.clone());
        Ok(())
    }

    async fn flatten_ioc(&self, _symbol: &str) -> Result<(), ExecutionError> {
        self.flattens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
