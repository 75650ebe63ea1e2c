//! Application configuration loading and validation.
//!
//! Configuration is loaded once from a TOML file and is read-only afterwards.
//! Every section and every field has a default, so partial files are accepted.

use serde::Deserialize;
use std::path::Path;

use crate::error::{ConfigError, Result};

mod logging;
mod strategy;

pub use logging::LoggingConfig;
pub use strategy::{
    clamp_phase_halfwidth, ExecConfig, LatencyConfig, RiskConfig, SignalConfig, SymbolConfig,
};

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub symbol: SymbolConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub exec: ExecConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub latency: LatencyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Paper mode: orders are acknowledged synthetically, nothing reaches an exchange.
    #[serde(default = "default_paper")]
    pub paper: bool,
}

const fn default_paper() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol: SymbolConfig::default(),
            signal: SignalConfig::default(),
            exec: ExecConfig::default(),
            risk: RiskConfig::default(),
            latency: LatencyConfig::default(),
            logging: LoggingConfig::default(),
            paper: default_paper(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    #[allow(clippy::result_large_err)]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.symbol.name.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "symbol.name" }.into());
        }
        for (field, value) in self.numeric_fields() {
            if !value.is_finite() {
                return Err(invalid(field, "must be finite"));
            }
        }
        if !(self.symbol.tick_size > 0.0) {
            return Err(invalid("tick_size", "must be positive"));
        }
        if !(self.signal.t_roll > 0.0) {
            return Err(invalid("T_roll", "must be positive"));
        }
        if self.signal.n == 0 {
            return Err(invalid("N", "must be at least 1"));
        }
        if !(self.signal.period_min_s > 0.0 && self.signal.period_min_s < self.signal.period_max_s)
        {
            return Err(invalid(
                "period_min_s",
                "must be positive and below period_max_s",
            ));
        }
        if !(self.signal.p_thresh > 0.0 && self.signal.p_thresh < 1.0) {
            return Err(invalid("p_thresh", "must be within (0, 1)"));
        }
        if self.exec.splits == 0 {
            return Err(invalid("splits", "must be at least 1"));
        }
        if self.exec.percent_min < 0.0 || self.exec.percent_min > self.exec.percent_max {
            return Err(invalid(
                "percent_min",
                "must be non-negative and not above percent_max",
            ));
        }
        if self.exec.max_exposure_btc < 0.0 {
            return Err(invalid("max_exposure_btc", "must not be negative"));
        }
        Ok(())
    }

    fn numeric_fields(&self) -> [(&'static str, f64); 24] {
        let (signal, exec, risk) = (&self.signal, &self.exec, &self.risk);
        [
            ("tick_size", self.symbol.tick_size),
            ("x", signal.x),
            ("y", signal.y),
            ("z", signal.z),
            ("obi_limit", signal.obi_limit),
            ("T_roll", signal.t_roll),
            ("p_thresh", signal.p_thresh),
            ("period_min_s", signal.period_min_s),
            ("period_max_s", signal.period_max_s),
            ("display_ratio", exec.display_ratio),
            ("min_display_btc", exec.min_display_btc),
            ("max_exposure_btc", exec.max_exposure_btc),
            ("cooldown_factor", exec.cooldown_factor),
            ("offset_ticks_normal", exec.offset_ticks_normal),
            ("offset_ticks_deep", exec.offset_ticks_deep),
            ("spread_collapse_ticks", exec.spread_collapse_ticks),
            ("percent_min", exec.percent_min),
            ("percent_max", exec.percent_max),
            ("min_clip_btc", exec.min_clip_btc),
            ("equity_usd", exec.equity_usd),
            ("max_slippage_ticks", risk.max_slippage_ticks),
            ("max_book_impact", risk.max_book_impact),
            ("stop_ticks", risk.stop_ticks),
            ("block_interval_stop_s", risk.block_interval_stop_s),
        ]
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}
