use crate::config::ExecConfig;

/// Turns account equity and a risk multiplier into a clip size in BTC.
#[derive(Debug, Clone)]
pub struct SizeAllocator {
    percent_min: f64,
    percent_max: f64,
    min_clip_btc: f64,
    max_exposure_btc: f64,
    equity_usd: f64,
}

impl SizeAllocator {
    #[must_use]
    pub fn new(cfg: &ExecConfig) -> Self {
        Self {
            percent_min: cfg.percent_min,
            percent_max: cfg.percent_max,
            min_clip_btc: cfg.min_clip_btc,
            max_exposure_btc: cfg.max_exposure_btc,
            equity_usd: cfg.equity_usd,
        }
    }

    /// Replace the equity figure, e.g. after an account refresh.
    pub fn set_equity(&mut self, equity_usd: f64) {
        self.equity_usd = equity_usd;
    }

    /// Clip size for the given mid and risk multiplier.
    ///
    /// Returns 0 when the clip would be below `min_clip_btc`, which callers
    /// treat as "skip".
    #[must_use]
    pub fn next_size(&self, mid: f64, risk_mult: f64) -> f64 {
        if !(mid > 0.0) || !(self.equity_usd > 0.0) {
            return 0.0;
        }
        let risk_mult = if risk_mult.is_finite() { risk_mult } else { 0.0 };
        let pct = (self.percent_max * risk_mult).clamp(self.percent_min, self.percent_max);
        let size = self.equity_usd * pct / mid;
        if !size.is_finite() || size < self.min_clip_btc {
            return 0.0;
        }
        let size = size.min(self.max_exposure_btc);
        (size * 1e6).round() / 1e6
    }
}
