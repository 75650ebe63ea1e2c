//! Paper trading gateway.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::OrderGateway;
use crate::domain::{OrderId, OrderRequest};
use crate::error::ExecutionError;

/// Gateway that acknowledges every request synthetically.
#[derive(Debug, Default)]
pub struct PaperGateway {
    next_id: AtomicU64,
}

impl PaperGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders acknowledged so far.
    #[must_use]
    pub fn orders_placed(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderId, ExecutionError> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = OrderId::new(format!(
            "paper-{}-{n}",
            request.side.as_str().to_ascii_lowercase()
        ));
        debug!(
            order_id = %id,
            side = %request.side,
            price = request.price,
            size = request.size,
            reduce_only = request.reduce_only,
            "Paper order accepted"
        );
        Ok(id)
    }

    async fn cancel_order(&self, _symbol: &str, order_id: &OrderId) -> Result<(), ExecutionError> {
        debug!(order_id = %order_id, "Paper order cancelled");
        Ok(())
    }

    async fn flatten_ioc(&self, symbol: &str) -> Result<(), ExecutionError> {
        debug!(symbol, "Paper flatten");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "paper"
    }
}
