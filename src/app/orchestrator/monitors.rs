//! Fill and block monitors.

use std::sync::Arc;

use tracing::{debug, trace};

use super::Context;
use crate::domain::Fill;
use crate::exchange::{BlockSource, FillSource};
use crate::notifier::Event;
use crate::shutdown::{self, ShutdownRx};

/// Release exposure, record slippage and start the side's cooldown for
/// every fill.
pub(super) async fn fills(
    ctx: Arc<Context>,
    mut source: Box<dyn FillSource>,
    mut shutdown_rx: ShutdownRx,
) {
    loop {
        let fill = tokio::select! {
            () = shutdown::signalled(&mut shutdown_rx) => break,
            fill = source.next_fill() => match fill {
                Some(fill) => fill,
                None => {
                    debug!("Fill source ended");
                    break;
                }
            },
        };
        handle_fill(&ctx, fill);
    }
}

fn handle_fill(ctx: &Context, fill: Fill) {
    let tick_size = ctx.config.symbol.tick_size;

    let trace_id = fill
        .order_id
        .as_ref()
        .and_then(|id| ctx.order_traces.lock().get(id).cloned());
    if let Some(id) = &fill.order_id {
        let released = ctx.engine.register_child_fill(id);
        trace!(order_id = %id, released, "Child fill");
    }

    let ref_mid = fill
        .ref_mid
        .or_else(|| ctx.latest_feature().map(|f| f.mid))
        .unwrap_or(fill.price);
    let slip_ticks = if tick_size > 0.0 {
        (fill.price - ref_mid).abs() / tick_size
    } else {
        0.0
    };

    ctx.risk.register_fill(fill.price, ref_mid, tick_size);
    ctx.engine.register_fill(fill.side);
    ctx.notify(Event::Fill {
        fill,
        slip_ticks,
        trace_id,
    });
}

/// Feed block intervals to risk; halts everything if the killswitch trips.
pub(super) async fn blocks(
    ctx: Arc<Context>,
    mut source: Box<dyn BlockSource>,
    mut shutdown_rx: ShutdownRx,
) {
    let mut prev_ts: Option<f64> = None;
    loop {
        let block = tokio::select! {
            () = shutdown::signalled(&mut shutdown_rx) => break,
            block = source.next_block() => match block {
                Some(block) => block,
                None => {
                    debug!("Block source ended");
                    break;
                }
            },
        };

        let interval = block.interval_s.or_else(|| prev_ts.map(|prev| block.ts - prev));
        prev_ts = Some(block.ts);
        let Some(interval) = interval else {
            continue;
        };

        ctx.risk.update_block_interval(interval);
        trace!(interval_s = interval, "Block interval");

        let advice = ctx.risk.advice();
        if advice.killswitch {
            ctx.trigger_killswitch(&advice.reason).await;
            break;
        }
    }
}
