//! Handler for the `check` command.

use crate::cli::ConfigPathArg;
use crate::config::Config;
use crate::error::Result;

/// Validate the configuration and print what the strategy would run with.
pub fn execute(args: &ConfigPathArg) -> Result<()> {
    let config = Config::load(&args.config)?;
    println!("Configuration OK: {}", args.config.display());
    println!();
    print!("{}", summary(&config));
    Ok(())
}

/// Human-readable summary of the effective configuration.
#[must_use]
pub fn summary(config: &Config) -> String {
    let signal = &config.signal;
    let exec = &config.exec;
    let risk = &config.risk;
    let mode = if config.paper { "paper" } else { "live" };

    format!(
        "Summary:\n  \
         Symbol: {} (tick {})\n  \
         Mode: {mode}\n  \
         Signal: N={} x={} y={} z={} obi_limit={}\n  \
         Rotation: T_roll={}s period=[{}, {}]s p_thresh={}\n  \
         Exec: ttl={}ms side_mode={:?} splits={} max_exposure={} BTC\n  \
         Risk: stop_ticks={} time_stop={}ms block_interval_stop={}s\n",
        config.symbol.name,
        config.symbol.tick_size,
        signal.n,
        signal.x,
        signal.y,
        signal.phase_halfwidth(),
        signal.obi_limit,
        signal.t_roll,
        signal.period_min_s,
        signal.period_max_s,
        signal.p_thresh,
        exec.order_ttl_ms,
        exec.side_mode,
        exec.splits,
        exec.max_exposure_btc,
        risk.stop_ticks,
        risk.time_stop_ms,
        risk.block_interval_stop_s,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_symbol_and_mode() {
        let text = summary(&Config::default());
        assert!(text.contains("BTCUSD-PERP"));
        assert!(text.contains("Mode: paper"));
        assert!(text.contains("z=0.45"));
    }
}
