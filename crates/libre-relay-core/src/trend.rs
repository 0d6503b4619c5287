//! Short-term trend derivation.
//!
//! The trend is the sign of an ordinary least-squares slope fitted over the
//! trailing window of a graph series, with each sample's position in the
//! window as its x-coordinate.

use thiserror::Error;

use crate::models::{GlucoseSample, TrendLabel};

/// Number of most recent samples the slope is fitted over
pub const TREND_WINDOW: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrendError {
    #[error("Insufficient data: cannot compute a trend from an empty series")]
    InsufficientData,
}

/// Trailing window of at most `TREND_WINDOW` samples.
pub fn trend_window<T>(series: &[T]) -> &[T] {
    &series[series.len().saturating_sub(TREND_WINDOW)..]
}

/// Compute the trend label for a graph series ordered oldest first.
pub fn compute_trend(series: &[GlucoseSample]) -> Result<TrendLabel, TrendError> {
    let values: Vec<f64> = series.iter().map(GlucoseSample::value_f64).collect();
    classify_values(&values)
}

/// Compute the trend label for raw values ordered oldest first.
pub fn classify_values(values: &[f64]) -> Result<TrendLabel, TrendError> {
    if values.is_empty() {
        return Err(TrendError::InsufficientData);
    }
    Ok(classify(slope(trend_window(values))))
}

/// Least-squares slope of `values` against their indices.
///
/// Returns 0.0 for fewer than two points. Covariance is summed over mirrored
/// pairs `(i, n-1-i)`, so each term has the sign of `y[n-1-i] - y[i]` and a
/// constant window yields exactly 0.0.
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mean_x = (n as f64 - 1.0) / 2.0;

    let mut covariance = 0.0;
    for i in 0..n / 2 {
        let j = n - 1 - i;
        covariance += (j as f64 - mean_x) * (values[j] - values[i]);
    }

    let variance: f64 = (0..n).map(|i| (i as f64 - mean_x).powi(2)).sum();

    covariance / variance
}

/// Map a slope to its label. Exact comparison against zero: NaN is steady.
pub fn classify(slope: f64) -> TrendLabel {
    if slope > 0.0 {
        TrendLabel::Up
    } else if slope < 0.0 {
        TrendLabel::Down
    } else {
        TrendLabel::Steady
    }
}
