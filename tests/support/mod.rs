//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use vrlg::app::Strategy;
use vrlg::clock::Clock;
use vrlg::config::{Config, ExecConfig, SymbolConfig};
use vrlg::exchange::OrderGateway;
use vrlg::executor::ExecutionEngine;
use vrlg::notifier::NotifierRegistry;
use vrlg::testkit::RecordingNotifier;

/// Poll `condition` every 5ms until it holds or `timeout` passes.
pub async fn eventually(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn recording_registry() -> (NotifierRegistry, RecordingNotifier) {
    let recorder = RecordingNotifier::new();
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(recorder.clone()));
    (registry, recorder)
}

pub fn engine(
    exec: ExecConfig,
    gateway: Arc<dyn OrderGateway>,
    clock: Arc<dyn Clock>,
) -> (ExecutionEngine, RecordingNotifier) {
    let (registry, recorder) = recording_registry();
    let engine = ExecutionEngine::new(
        &SymbolConfig::default(),
        exec,
        gateway,
        clock,
        Arc::new(registry),
    );
    (engine, recorder)
}

pub fn strategy(
    config: Config,
    gateway: Arc<dyn OrderGateway>,
    clock: Arc<dyn Clock>,
) -> (Strategy, RecordingNotifier) {
    let (registry, recorder) = recording_registry();
    (Strategy::new(config, gateway, clock, registry), recorder)
}
