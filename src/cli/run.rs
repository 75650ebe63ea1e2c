//! Handler for the `run` command.

use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};

use crate::app::{Sources, Strategy};
use crate::cli::RunArgs;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::exchange::{PaperGateway, SyntheticFeed};
use crate::notifier::{LogNotifier, NotifierRegistry};

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;

    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if args.live {
        config.paper = false;
    }

    config.init_logging();

    if !config.paper {
        return Err(ConfigError::InvalidValue {
            field: "paper",
            reason: "live trading needs an exchange gateway and none is built in".into(),
        }
        .into());
    }

    let mut notifiers = NotifierRegistry::new();
    notifiers.register(Box::new(LogNotifier));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let feed = SyntheticFeed::with_tick_size(config.symbol.tick_size, Arc::clone(&clock));
    let strategy = Strategy::new(config, Arc::new(PaperGateway::new()), clock, notifiers);
    strategy.start(Sources {
        features: Some(Box::new(feed)),
        ..Sources::default()
    });

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Shutdown signal received");
        }
        () = strategy.halted() => {
            warn!("Strategy halted");
        }
    }

    strategy.shutdown().await;
    Ok(())
}
