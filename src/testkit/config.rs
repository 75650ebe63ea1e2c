//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::config::{Config, ExecConfig, SignalConfig};

/// Signal config tuned for 120s of synthetic data at z = 0.15.
pub fn signal() -> SignalConfig {
    SignalConfig {
        n: 20,
        z: 0.15,
        t_roll: 120.0,
        ..SignalConfig::default()
    }
}

/// Exec config with a short TTL so tests do not wait long.
pub fn exec() -> ExecConfig {
    ExecConfig {
        order_ttl_ms: 50,
        ..ExecConfig::default()
    }
}

pub fn config() -> Config {
    Config {
        signal: signal(),
        exec: exec(),
        ..Config::default()
    }
}
