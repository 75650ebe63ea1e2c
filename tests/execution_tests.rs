//! Execution engine: pricing, cooldown, exposure ledger and exits.

mod support;

use std::sync::Arc;
use std::time::Duration;

use vrlg::config::{ExecConfig, SymbolConfig};
use vrlg::domain::{OrderKind, Side, SideMode};
use vrlg::executor::ExecutionEngine;
use vrlg::notifier::{Event, NotifierRegistry, OrderEventKind};
use vrlg::shutdown;
use vrlg::testkit::{ManualClock, RecordingNotifier, ScriptedGateway};

fn scripted(exec: ExecConfig) -> (ExecutionEngine, Arc<ScriptedGateway>, Arc<ManualClock>, RecordingNotifier) {
    let gateway = Arc::new(ScriptedGateway::new());
    let clock = Arc::new(ManualClock::new(1_000.0));
    let (engine, recorder) = support::engine(exec, gateway.clone(), clock.clone());
    (engine, gateway, clock, recorder)
}

#[test]
fn quote_prices_are_tick_multiples() {
    for tick in [0.01, 0.1, 0.5, 1.0, 5.0] {
        let symbol = SymbolConfig {
            tick_size: tick,
            ..SymbolConfig::default()
        };
        let engine = ExecutionEngine::new(
            &symbol,
            ExecConfig::default(),
            Arc::new(ScriptedGateway::new()),
            Arc::new(ManualClock::new(0.0)),
            Arc::new(NotifierRegistry::new()),
        );
        for i in 0..200_u32 {
            let mid = 100.0 + f64::from(i) * 0.37;
            for deepen in [false, true] {
                let (bid, ask) = engine.quote_prices(mid, deepen);
                for price in [bid, ask] {
                    let units = price / tick;
                    assert!(
                        (units - units.round()).abs() < 1e-6,
                        "price {price} is not a multiple of {tick}"
                    );
                }
                assert!(bid <= ask);
            }
        }
    }
}

#[tokio::test]
async fn normal_quotes_are_one_tick_apart_and_deep_three() {
    let (engine, gateway, _, _) = scripted(ExecConfig::default());

    let ids = engine.place_two_sided(70_000.25, 0.2, false).await;
    assert_eq!(ids.len(), 2);
    let placed = gateway.placed();
    let bid = placed.iter().find(|o| o.side == Side::Buy).unwrap().price;
    let ask = placed.iter().find(|o| o.side == Side::Sell).unwrap().price;
    assert_eq!(bid, 70_000.0);
    assert_eq!(ask, 70_000.5);
    assert_eq!(ask - bid, 0.5);

    let (engine, gateway, _, _) = scripted(ExecConfig::default());
    engine.place_two_sided(70_000.25, 0.2, true).await;
    let placed = gateway.placed();
    let bid = placed.iter().find(|o| o.side == Side::Buy).unwrap().price;
    let ask = placed.iter().find(|o| o.side == Side::Sell).unwrap().price;
    assert_eq!(ask - bid, 1.5);
}

#[tokio::test]
async fn maker_orders_are_post_only_icebergs() {
    let (engine, gateway, _, _) = scripted(ExecConfig::default());
    engine.place_two_sided(100.0, 0.2, false).await;

    for order in gateway.placed() {
        assert_eq!(order.kind, OrderKind::Limit);
        assert!(order.post_only);
        assert!(!order.reduce_only);
        assert_eq!(order.size, 0.2);
        // 0.2 * 0.25
        assert_eq!(order.display_size, Some(0.05));
        assert_eq!(order.ttl_ms, Some(1_000));
    }
}

#[tokio::test]
async fn display_is_clamped_between_min_and_child() {
    let exec = ExecConfig {
        display_ratio: 0.01,
        min_display_btc: 0.01,
        side_mode: SideMode::Buy,
        ..ExecConfig::default()
    };
    let (engine, gateway, _, _) = scripted(exec);
    engine.place_two_sided(100.0, 0.005, false).await;
    assert_eq!(gateway.placed()[0].display_size, Some(0.005));
}

#[tokio::test]
async fn cooldown_suppresses_filled_side_until_expiry() {
    let (engine, gateway, clock, recorder) = scripted(ExecConfig::default());

    engine.register_fill(Side::Buy);
    let ids = engine.place_two_sided(100.0, 0.1, false).await;
    assert_eq!(ids.len(), 1);
    assert_eq!(gateway.placed()[0].side, Side::Sell);

    let skip = recorder
        .events()
        .into_iter()
        .find_map(|e| match e {
            Event::Order(o) if o.kind == OrderEventKind::Skip => Some(o),
            _ => None,
        })
        .expect("cooldown skip event");
    assert_eq!(skip.side, Some(Side::Buy));
    assert_eq!(skip.reason.as_deref(), Some("cooldown"));

    // cooldown_factor 2.0 x default period hint 1.0
    clock.advance(1.9);
    assert!(engine.in_cooldown(Side::Buy));
    clock.advance(0.2);
    assert!(!engine.in_cooldown(Side::Buy));

    let ids = engine.place_two_sided(100.0, 0.1, false).await;
    assert_eq!(ids.len(), 2);
    assert_eq!(gateway.placed().len(), 3);
}

#[tokio::test]
async fn cooldown_scales_with_period_hint() {
    let (engine, _, clock, _) = scripted(ExecConfig::default());
    engine.set_period_hint(2.0);
    engine.register_fill(Side::Sell);
    clock.advance(3.9);
    assert!(engine.in_cooldown(Side::Sell));
    clock.advance(0.2);
    assert!(!engine.in_cooldown(Side::Sell));
}

#[tokio::test]
async fn ttl_expiry_returns_exposure_to_baseline() {
    let (engine, gateway, _, recorder) = scripted(ExecConfig::default());
    let (_tx, rx) = shutdown::channel();

    let ids = engine.place_two_sided(100.0, 0.2, false).await;
    assert!((engine.open_maker_btc() - 0.4).abs() < 1e-12);

    engine
        .wait_fill_or_ttl(&ids, Duration::from_millis(10), rx.clone())
        .await;
    assert_eq!(engine.open_maker_btc(), 0.0);
    assert_eq!(gateway.cancelled().len(), 2);
    assert_eq!(recorder.count("cancel"), 2);

    // Cancelling again contributes nothing.
    engine.cancel_order_safely(&ids[0]).await;
    engine.cancel_order_safely(&ids[0]).await;
    assert_eq!(engine.open_maker_btc(), 0.0);
}

#[tokio::test]
async fn double_cancel_releases_once() {
    let (engine, _, _, _) = scripted(ExecConfig::default());
    let ids = engine.place_two_sided(100.0, 0.2, false).await;

    engine.cancel_order_safely(&ids[0]).await;
    engine.cancel_order_safely(&ids[0]).await;
    assert!((engine.open_maker_btc() - 0.2).abs() < 1e-12);
    assert!(!engine.is_tracked(&ids[0]));
    assert!(engine.is_tracked(&ids[1]));

    assert!((engine.register_child_fill(&ids[1]) - 0.2).abs() < 1e-12);
    assert_eq!(engine.register_child_fill(&ids[1]), 0.0);
    assert_eq!(engine.open_maker_btc(), 0.0);
}

#[tokio::test]
async fn failed_cancel_keeps_exposure() {
    let (engine, gateway, _, _) = scripted(ExecConfig::default());
    let ids = engine.place_two_sided(100.0, 0.2, false).await;

    gateway.fail_next_cancels(1);
    engine.cancel_order_safely(&ids[0]).await;
    assert!(engine.is_tracked(&ids[0]));

    engine.cancel_order_safely(&ids[0]).await;
    assert!(!engine.is_tracked(&ids[0]));
}

#[tokio::test]
async fn ttl_wait_releases_even_when_cancel_fails() {
    let (engine, gateway, _, _) = scripted(ExecConfig::default());
    let ids = engine.place_two_sided(100.0, 0.2, false).await;

    gateway.fail_next_cancels(2);
    engine
        .wait_fill_or_ttl(&ids, Duration::ZERO, shutdown::channel().1)
        .await;
    assert_eq!(engine.open_maker_btc(), 0.0);
}

#[tokio::test]
async fn dropped_ttl_wait_still_releases_exposure() {
    let (engine, _, _, _) = scripted(ExecConfig::default());
    let (_tx, rx) = shutdown::channel();
    let ids = engine.place_two_sided(100.0, 0.2, false).await;

    let wait = engine.wait_fill_or_ttl(&ids, Duration::from_secs(30), rx);
    let timed_out = tokio::time::timeout(Duration::from_millis(20), wait).await;
    assert!(timed_out.is_err());
    assert_eq!(engine.open_maker_btc(), 0.0);
}

#[tokio::test]
async fn shutdown_cuts_ttl_wait_short() {
    let (engine, gateway, _, _) = scripted(ExecConfig::default());
    let (tx, rx) = shutdown::channel();
    let ids = engine.place_two_sided(100.0, 0.2, false).await;

    tx.send_replace(true);
    tokio::time::timeout(
        Duration::from_secs(1),
        engine.wait_fill_or_ttl(&ids, Duration::from_secs(30), rx),
    )
    .await
    .expect("shutdown should end the wait");
    assert_eq!(engine.open_maker_btc(), 0.0);
    assert_eq!(gateway.cancelled().len(), 2);
}

#[tokio::test]
async fn rejected_order_is_reported_and_not_tracked() {
    let (engine, gateway, _, recorder) = scripted(ExecConfig::default());
    gateway.fail_next_places(1);

    let ids = engine.place_two_sided(100.0, 0.2, false).await;
    assert_eq!(ids.len(), 1);
    assert_eq!(recorder.order_kinds(), vec!["reject", "submitted"]);
    assert!((engine.open_maker_btc() - 0.2).abs() < 1e-12);
}

#[tokio::test]
async fn exposure_limit_skips_remaining_children() {
    let exec = ExecConfig {
        max_exposure_btc: 0.3,
        ..ExecConfig::default()
    };
    let (engine, _, _, recorder) = scripted(exec);

    let ids = engine.place_two_sided(100.0, 0.2, false).await;
    assert_eq!(ids.len(), 1);
    assert_eq!(recorder.order_kinds(), vec!["submitted", "skip"]);
    assert!(engine.open_maker_btc() <= 0.3);
}

#[tokio::test]
async fn side_mode_restricts_sides() {
    let exec = ExecConfig {
        side_mode: SideMode::Sell,
        ..ExecConfig::default()
    };
    let (engine, gateway, _, _) = scripted(exec);
    engine.place_two_sided(100.0, 0.1, false).await;
    let sides: Vec<Side> = gateway.placed().iter().map(|o| o.side).collect();
    assert_eq!(sides, vec![Side::Sell]);
}

#[tokio::test]
async fn events_carry_trace_id() {
    let (engine, _, _, recorder) = scripted(ExecConfig::default());
    engine.set_trace_id(Some("abc123def456".into()));
    engine.place_two_sided(100.0, 0.1, false).await;

    for event in recorder.events() {
        let Event::Order(order) = event else { continue };
        assert_eq!(order.trace_id.as_ref().map(|t| t.as_str()), Some("abc123def456"));
    }
}

#[tokio::test]
async fn reverse_stop_sits_on_the_opposite_side() {
    let (engine, gateway, _, _) = scripted(ExecConfig::default());

    engine.place_reverse_stop(Side::Buy, 100.0, 3.0).await.unwrap();
    engine.place_reverse_stop(Side::Sell, 100.0, 3.0).await.unwrap();

    let placed = gateway.placed();
    assert_eq!(placed[0].side, Side::Sell);
    assert_eq!(placed[0].price, 98.5);
    assert_eq!(placed[1].side, Side::Buy);
    assert_eq!(placed[1].price, 101.5);
    for stop in &placed {
        assert_eq!(stop.kind, OrderKind::Stop);
        assert!(stop.reduce_only);
        assert_eq!(stop.size, 0.8);
    }
    assert_eq!(engine.open_maker_btc(), 0.0);
}

#[tokio::test]
async fn failed_reverse_stop_returns_none() {
    let (engine, gateway, _, _) = scripted(ExecConfig::default());
    gateway.fail_next_places(1);
    assert!(engine.place_reverse_stop(Side::Buy, 100.0, 3.0).await.is_none());
}

#[tokio::test]
async fn time_stop_flattens_after_delay() {
    let (engine, gateway, _, _) = scripted(ExecConfig::default());
    let (_tx, rx) = shutdown::channel();
    assert!(engine.time_stop_after(5, rx).await);
    assert_eq!(gateway.flattens(), 1);
}

#[tokio::test]
async fn time_stop_yields_to_shutdown() {
    let (engine, gateway, _, _) = scripted(ExecConfig::default());
    let (tx, rx) = shutdown::channel();
    tx.send_replace(true);
    assert!(!engine.time_stop_after(60_000, rx).await);
    assert_eq!(gateway.flattens(), 0);
}
