//! Strategy configuration sections.
//!
//! Every field carries its own serde default so a config file may set any
//! subset of keys and the rest fall back field by field.

use serde::Deserialize;

use crate::domain::SideMode;

/// Traded instrument.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolConfig {
    #[serde(default = "default_symbol_name")]
    pub name: String,
    /// Minimum price increment.
    #[serde(default = "default_tick_size")]
    pub tick_size: f64,
}

fn default_symbol_name() -> String {
    "BTCUSD-PERP".into()
}

const fn default_tick_size() -> f64 {
    0.5
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            name: default_symbol_name(),
            tick_size: default_tick_size(),
        }
    }
}

/// Rotation detection and four-condition gate parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Depth median window length in samples.
    #[serde(default = "default_n", rename = "N", alias = "n")]
    pub n: usize,
    /// Required depth thinning versus the median (0.25 = 25% below).
    #[serde(default = "default_x")]
    pub x: f64,
    /// Minimum spread in ticks.
    #[serde(default = "default_y")]
    pub y: f64,
    /// Phase half-width around the boundary. Clamped into (0.01, 0.45] by consumers.
    #[serde(default = "default_z")]
    pub z: f64,
    #[serde(default = "default_obi_limit")]
    pub obi_limit: f64,
    /// Rolling window for period estimation, in seconds.
    #[serde(default = "default_t_roll", rename = "T_roll", alias = "t_roll")]
    pub t_roll: f64,
    #[serde(default = "default_p_thresh")]
    pub p_thresh: f64,
    #[serde(default = "default_period_min_s")]
    pub period_min_s: f64,
    #[serde(default = "default_period_max_s")]
    pub period_max_s: f64,
    #[serde(default = "default_min_boundary_samples")]
    pub min_boundary_samples: usize,
    #[serde(default = "default_min_off_samples")]
    pub min_off_samples: usize,
}

const fn default_n() -> usize {
    80
}

const fn default_x() -> f64 {
    0.25
}

const fn default_y() -> f64 {
    2.0
}

const fn default_z() -> f64 {
    0.6
}

const fn default_obi_limit() -> f64 {
    0.6
}

const fn default_t_roll() -> f64 {
    30.0
}

const fn default_p_thresh() -> f64 {
    0.01
}

const fn default_period_min_s() -> f64 {
    0.8
}

const fn default_period_max_s() -> f64 {
    5.0
}

const fn default_min_boundary_samples() -> usize {
    200
}

const fn default_min_off_samples() -> usize {
    50
}

impl SignalConfig {
    /// Phase half-width clamped into (0.01, 0.45].
    #[must_use]
    pub fn phase_halfwidth(&self) -> f64 {
        clamp_phase_halfwidth(self.z)
    }
}

/// Clamp a phase half-width so boundary and off-boundary partitions stay non-empty.
#[must_use]
pub fn clamp_phase_halfwidth(z: f64) -> f64 {
    if z.is_nan() {
        return 0.45;
    }
    z.clamp(0.01, 0.45)
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            n: default_n(),
            x: default_x(),
            y: default_y(),
            z: default_z(),
            obi_limit: default_obi_limit(),
            t_roll: default_t_roll(),
            p_thresh: default_p_thresh(),
            period_min_s: default_period_min_s(),
            period_max_s: default_period_max_s(),
            min_boundary_samples: default_min_boundary_samples(),
            min_off_samples: default_min_off_samples(),
        }
    }
}

/// Order placement, lifetime and sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecConfig {
    #[serde(default = "default_order_ttl_ms")]
    pub order_ttl_ms: u64,
    /// Visible fraction of each iceberg child.
    #[serde(default = "default_display_ratio")]
    pub display_ratio: f64,
    #[serde(default = "default_min_display_btc")]
    pub min_display_btc: f64,
    /// Hard ceiling on the sum of live maker order sizes.
    #[serde(default = "default_max_exposure_btc")]
    pub max_exposure_btc: f64,
    /// Cooldown length as a multiple of the estimated period.
    #[serde(default = "default_cooldown_factor")]
    pub cooldown_factor: f64,
    #[serde(default = "default_offset_ticks_normal")]
    pub offset_ticks_normal: f64,
    #[serde(default = "default_offset_ticks_deep")]
    pub offset_ticks_deep: f64,
    #[serde(default)]
    pub side_mode: SideMode,
    /// Child orders per side.
    #[serde(default = "default_splits")]
    pub splits: usize,
    /// Spread (ticks) at or below which resting orders exit early.
    #[serde(default = "default_spread_collapse_ticks")]
    pub spread_collapse_ticks: f64,
    #[serde(default = "default_percent_min")]
    pub percent_min: f64,
    #[serde(default = "default_percent_max")]
    pub percent_max: f64,
    #[serde(default = "default_min_clip_btc")]
    pub min_clip_btc: f64,
    #[serde(default = "default_equity_usd")]
    pub equity_usd: f64,
}

const fn default_order_ttl_ms() -> u64 {
    1000
}

const fn default_display_ratio() -> f64 {
    0.25
}

const fn default_min_display_btc() -> f64 {
    0.01
}

const fn default_max_exposure_btc() -> f64 {
    0.8
}

const fn default_cooldown_factor() -> f64 {
    2.0
}

const fn default_offset_ticks_normal() -> f64 {
    0.5
}

const fn default_offset_ticks_deep() -> f64 {
    1.5
}

const fn default_splits() -> usize {
    1
}

const fn default_spread_collapse_ticks() -> f64 {
    1.0
}

const fn default_percent_min() -> f64 {
    0.002
}

const fn default_percent_max() -> f64 {
    0.005
}

const fn default_min_clip_btc() -> f64 {
    0.001
}

const fn default_equity_usd() -> f64 {
    10_000.0
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            order_ttl_ms: default_order_ttl_ms(),
            display_ratio: default_display_ratio(),
            min_display_btc: default_min_display_btc(),
            max_exposure_btc: default_max_exposure_btc(),
            cooldown_factor: default_cooldown_factor(),
            offset_ticks_normal: default_offset_ticks_normal(),
            offset_ticks_deep: default_offset_ticks_deep(),
            side_mode: SideMode::default(),
            splits: default_splits(),
            spread_collapse_ticks: default_spread_collapse_ticks(),
            percent_min: default_percent_min(),
            percent_max: default_percent_max(),
            min_clip_btc: default_min_clip_btc(),
            equity_usd: default_equity_usd(),
        }
    }
}

/// Rule-based risk thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Ceiling on the 60s average fill slippage.
    #[serde(default = "default_max_slippage_ticks")]
    pub max_slippage_ticks: f64,
    /// Ceiling on the 5s sum of display/top-of-book ratios.
    #[serde(default = "default_max_book_impact")]
    pub max_book_impact: f64,
    #[serde(default = "default_time_stop_ms")]
    pub time_stop_ms: u64,
    #[serde(default = "default_stop_ticks")]
    pub stop_ticks: f64,
    /// Block interval median that trips the killswitch.
    #[serde(default = "default_block_interval_stop_s")]
    pub block_interval_stop_s: f64,
}

const fn default_max_slippage_ticks() -> f64 {
    1.0
}

const fn default_max_book_impact() -> f64 {
    0.02
}

const fn default_time_stop_ms() -> u64 {
    1200
}

const fn default_stop_ticks() -> f64 {
    3.0
}

const fn default_block_interval_stop_s() -> f64 {
    4.0
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_slippage_ticks: default_max_slippage_ticks(),
            max_book_impact: default_max_book_impact(),
            time_stop_ms: default_time_stop_ms(),
            stop_ticks: default_stop_ticks(),
            block_interval_stop_s: default_block_interval_stop_s(),
        }
    }
}

/// Latency assumptions.
#[derive(Debug, Clone, Deserialize)]
pub struct LatencyConfig {
    #[serde(default = "default_ingest_ms")]
    pub ingest_ms: u64,
    #[serde(default = "default_order_rt_ms")]
    pub order_rt_ms: u64,
    /// Features older than this are excluded from trading decisions.
    #[serde(default = "default_max_staleness_ms")]
    pub max_staleness_ms: u64,
}

const fn default_ingest_ms() -> u64 {
    10
}

const fn default_order_rt_ms() -> u64 {
    60
}

const fn default_max_staleness_ms() -> u64 {
    300
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            ingest_ms: default_ingest_ms(),
            order_rt_ms: default_order_rt_ms(),
            max_staleness_ms: default_max_staleness_ms(),
        }
    }
}
