//! Streaming statistics helpers.
//!
//! Small, dependency-free routines used by the rotation detector and the
//! risk windows.

use std::f64::consts::SQRT_2;

/// Variances below this are treated as this value.
pub const VARIANCE_FLOOR: f64 = 1e-12;

/// Arithmetic mean, 0 for an empty slice.
#[must_use]
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Unbiased sample variance, floored at [`VARIANCE_FLOOR`].
#[must_use]
pub fn variance(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return VARIANCE_FLOOR;
    }
    let mu = mean(xs);
    let s2 = xs.iter().map(|x| (x - mu) * (x - mu)).sum::<f64>() / (n - 1) as f64;
    s2.max(VARIANCE_FLOOR)
}

/// Median of the values, `None` when empty.
#[must_use]
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted: Vec<f64> = values.into_iter().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Pearson correlation of two equal-length series.
///
/// Returns 0 when either series has zero variance or fewer than two points.
#[must_use]
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return 0.0;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x > 0.0 && var_y > 0.0 {
        cov / (var_x.sqrt() * var_y.sqrt())
    } else {
        0.0
    }
}

/// Correlation between a series and itself shifted by `lag` samples.
#[must_use]
pub fn lag_correlation(xs: &[f64], lag: usize) -> f64 {
    if lag == 0 || lag >= xs.len() {
        return 0.0;
    }
    pearson_correlation(&xs[lag..], &xs[..xs.len() - lag])
}

/// Complementary error function (Chebyshev fit, |error| < 1.2e-7).
#[must_use]
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Upper tail of the standard normal: `P(Z > z)`.
#[must_use]
pub fn normal_sf(z: f64) -> f64 {
    (0.5 * erfc(z / SQRT_2)).clamp(0.0, 1.0)
}

/// Alternative hypothesis for a one-sided two-sample test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    /// `mean(a) < mean(b)`.
    Less,
    /// `mean(a) > mean(b)`.
    Greater,
}

/// One-sided Welch test with a normal approximation.
///
/// Returns 1.0 (not significant) when either sample has fewer than two
/// points or the standard error is degenerate.
#[must_use]
pub fn welch_one_sided_p(a: &[f64], b: &[f64], tail: Tail) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return 1.0;
    }
    let se = (variance(a) / a.len() as f64 + variance(b) / b.len() as f64).sqrt();
    if !se.is_finite() || se <= 0.0 {
        return 1.0;
    }
    let diff = mean(a) - mean(b);
    let z = match tail {
        Tail::Less => -diff / se,
        Tail::Greater => diff / se,
    };
    if z.is_nan() {
        return 1.0;
    }
    normal_sf(z)
}
