use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{BlockEvent, Fill, Level1Quote, OrderId, OrderRequest};
use crate::error::ExecutionError;

/// Order transmission.
///
/// Every call may fail; callers treat failures as non-fatal.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit an order and return the exchange id.
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderId, ExecutionError>;

    async fn cancel_order(&self, symbol: &str, order_id: &OrderId) -> Result<(), ExecutionError>;

    /// Close any open position with an immediate-or-cancel order.
    async fn flatten_ioc(&self, symbol: &str) -> Result<(), ExecutionError>;

    fn name(&self) -> &'static str;
}

/// Producer of top-of-book quotes.
///
/// `next_quote` must be cancel-safe; it is polled inside `select!`.
#[async_trait]
pub trait FeatureSource: Send {
    /// Next quote, or `None` once the stream has ended.
    async fn next_quote(&mut self) -> Option<Level1Quote>;
}

/// Producer of execution reports for our orders.
#[async_trait]
pub trait FillSource: Send {
    async fn next_fill(&mut self) -> Option<Fill>;
}

/// Producer of block (rotation boundary) observations.
#[async_trait]
pub trait BlockSource: Send {
    async fn next_block(&mut self) -> Option<BlockEvent>;
}

#[async_trait]
impl FeatureSource for mpsc::Receiver<Level1Quote> {
    async fn next_quote(&mut self) -> Option<Level1Quote> {
        self.recv().await
    }
}

#[async_trait]
impl FillSource for mpsc::Receiver<Fill> {
    async fn next_fill(&mut self) -> Option<Fill> {
        self.recv().await
    }
}

#[async_trait]
impl BlockSource for mpsc::Receiver<BlockEvent> {
    async fn next_block(&mut self) -> Option<BlockEvent> {
        self.recv().await
    }
}
