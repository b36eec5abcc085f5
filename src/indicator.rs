pub mod ma;
pub mod macd;

use error_stack::Report;

use crate::error::IndicatorError;
use crate::model::PricePoint;

/// A technical analysis indicator that operates on a slice of price bars.
///
/// Bars must be in ascending chronological order (oldest first).
pub trait Indicator {
    /// Unique name of this indicator (e.g., "sma", "macd").
    fn name(&self) -> &str;

    /// Minimum number of bars required to produce at least one output value.
    fn required_points(&self) -> usize;

    /// Calculate indicator values from price bars.
    ///
    /// Returns one value per output point, aligned to the last bars of the
    /// input. The output is shorter than the input by the lookback.
    fn calculate(&self, points: &[PricePoint]) -> Result<Vec<f64>, Report<IndicatorError>>;
}

/// Extract adjusted close prices from a slice of price bars.
pub fn adjusted_closes(points: &[PricePoint]) -> Vec<f64> {
    points.iter().map(|p| p.adj_close).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::model::PricePoint;

    /// Consecutive daily bars whose prices all equal the given close.
    pub fn points_from_closes(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                adj_close: c,
                volume: 1.0,
            })
            .collect()
    }
}
