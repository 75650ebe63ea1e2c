//! Synthetic observation series.

use crate::domain::FeatureSnapshot;

/// One (t, dob, spread) observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub dob: f64,
    pub spread_ticks: f64,
}

/// Periodic series sampled every 100ms.
///
/// Boundary membership is decided on the integer sample index so it does
/// not depend on floating-point phase.
#[derive(Debug, Clone)]
pub struct PeriodicSeries {
    pub period_samples: usize,
    /// Samples at each end of the period counted as boundary.
    pub boundary_samples: usize,
    pub boundary_dob: f64,
    pub off_dob: f64,
    pub boundary_spread: f64,
    pub off_spread: f64,
}

impl Default for PeriodicSeries {
    /// 2.0s period, boundary phase within 0.15 of the wrap.
    fn default() -> Self {
        Self {
            period_samples: 20,
            boundary_samples: 3,
            boundary_dob: 600.0,
            off_dob: 1_200.0,
            boundary_spread: 3.0,
            off_spread: 1.0,
        }
    }
}

impl PeriodicSeries {
    pub fn is_boundary(&self, i: usize) -> bool {
        let k = i % self.period_samples;
        k < self.boundary_samples || k + self.boundary_samples > self.period_samples
    }

    pub fn sample(&self, i: usize) -> Sample {
        let (dob, spread_ticks) = if self.is_boundary(i) {
            (self.boundary_dob, self.boundary_spread)
        } else {
            (self.off_dob, self.off_spread)
        };
        Sample {
            t: i as f64 * 0.1,
            dob,
            spread_ticks,
        }
    }

    pub fn samples(&self, seconds: usize) -> Vec<Sample> {
        (0..seconds * 10).map(|i| self.sample(i)).collect()
    }

    /// Feature snapshot for sample `i` with a balanced book at `mid`.
    pub fn snapshot(&self, i: usize, mid: f64) -> FeatureSnapshot {
        let s = self.sample(i);
        FeatureSnapshot::new(s.t, mid, s.spread_ticks, s.dob, 0.0)
    }
}

/// Constant series.
pub fn flat(seconds: usize, dob: f64, spread_ticks: f64) -> Vec<Sample> {
    (0..seconds * 10)
        .map(|i| Sample {
            t: i as f64 * 0.1,
            dob,
            spread_ticks,
        })
        .collect()
}
