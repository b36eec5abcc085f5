use error_stack::{Report, bail};
use tracing::debug;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, adjusted_closes};
use crate::model::{MovingAveragePoint, PricePoint};

/// Simple Moving Average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Calculate SMA values from a price slice.
    pub fn calculate_prices(&self, prices: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        if prices.len() < self.period {
            bail!(IndicatorError::InsufficientData {
                required: self.period,
                available: prices.len(),
            });
        }
        Ok(prices
            .windows(self.period)
            .map(|w| w.iter().sum::<f64>() / self.period as f64)
            .collect())
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn required_points(&self) -> usize {
        self.period
    }

    fn calculate(&self, points: &[PricePoint]) -> Result<Vec<f64>, Report<IndicatorError>> {
        self.calculate_prices(&adjusted_closes(points))
    }
}

/// Exponential Moving Average, seeded with the SMA of the first `period` values.
///
/// Nothing is emitted before the seed, so the first value lines up with the
/// first SMA value of the same period.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Smoothing factor `2 / (period + 1)`.
    pub fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Calculate EMA values from a price slice.
    pub fn calculate_prices(&self, prices: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        if prices.len() < self.period {
            bail!(IndicatorError::InsufficientData {
                required: self.period,
                available: prices.len(),
            });
        }

        let k = self.alpha();
        let seed: f64 = prices[..self.period].iter().sum::<f64>() / self.period as f64;
        let mut ema = seed;
        let mut results = Vec::with_capacity(prices.len() - self.period + 1);
        results.push(ema);

        for &price in &prices[self.period..] {
            ema = price * k + ema * (1.0 - k);
            results.push(ema);
        }

        Ok(results)
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        "ema"
    }

    fn required_points(&self) -> usize {
        self.period
    }

    fn calculate(&self, points: &[PricePoint]) -> Result<Vec<f64>, Report<IndicatorError>> {
        self.calculate_prices(&adjusted_closes(points))
    }
}

/// Tag every bar from index `window_size - 1` onward with its SMA and EMA.
///
/// The output has `series.len() - window_size + 1` entries.
pub fn compute_moving_averages(
    series: &[PricePoint],
    window_size: usize,
) -> Result<Vec<MovingAveragePoint>, Report<IndicatorError>> {
    let sma = Sma::new(window_size)?;
    let ema = Ema::new(window_size)?;

    let sma_values = sma.calculate(series)?;
    let ema_values = ema.calculate(series)?;

    let points: Vec<MovingAveragePoint> = series[window_size - 1..]
        .iter()
        .zip(sma_values.iter().zip(ema_values.iter()))
        .map(|(price, (&sma, &ema))| MovingAveragePoint {
            price: *price,
            sma,
            ema,
        })
        .collect();

    debug!(
        window_size,
        input = series.len(),
        output = points.len(),
        "moving averages computed"
    );

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::fixtures::points_from_closes;

    fn is_insufficient(report: &Report<IndicatorError>) -> bool {
        matches!(
            report.current_context(),
            IndicatorError::InsufficientData { .. }
        )
    }

    #[test]
    fn sma_period_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_insufficient_data() {
        let sma = Sma::new(5).unwrap();
        assert!(sma.calculate(&points_from_closes(&[1.0; 4])).is_err());
    }

    #[test]
    fn sma_known_value() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate(&points_from_closes(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        // (1+2+3)/3 = 2.0, (2+3+4)/3 = 3.0
        assert!((values[0] - 2.0).abs() < 1e-9);
        assert!((values[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn sma_uses_adjusted_close() {
        let mut points = points_from_closes(&[10.0, 10.0]);
        points[0].adj_close = 4.0;
        points[1].adj_close = 6.0;
        let values = Sma::new(2).unwrap().calculate(&points).unwrap();
        assert_eq!(values, vec![5.0]);
    }

    #[test]
    fn ema_period_zero_invalid() {
        assert!(Ema::new(0).is_err());
    }

    #[test]
    fn ema_insufficient_data() {
        let ema = Ema::new(5).unwrap();
        assert!(ema.calculate(&points_from_closes(&[1.0; 4])).is_err());
    }

    #[test]
    fn ema_flat_prices() {
        let ema = Ema::new(3).unwrap();
        let values = ema.calculate(&points_from_closes(&[10.0; 6])).unwrap();
        assert_eq!(values.len(), 4);
        for v in &values {
            assert!((v - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn ema_seed_equals_sma() {
        let ema = Ema::new(3).unwrap();
        let values = ema.calculate(&points_from_closes(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        // seed = (1+2+3)/3 = 2.0, then 0.5*4 + 0.5*2 = 3.0
        assert!((values[0] - 2.0).abs() < 1e-9);
        assert!((values[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn moving_averages_output_length() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let series = points_from_closes(&closes);
        for window in [1, 5, 20, 50] {
            let out = compute_moving_averages(&series, window).unwrap();
            assert_eq!(out.len(), series.len() - window + 1);
        }
    }

    #[test]
    fn moving_averages_first_row() {
        let series = points_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let out = compute_moving_averages(&series, 3).unwrap();
        assert_eq!(out.len(), 4);
        // First row is aligned to index 2 of the input
        assert_eq!(out[0].price.date, series[2].date);
        assert!((out[0].sma - 11.0).abs() < 1e-12);
        assert!((out[0].ema - 11.0).abs() < 1e-12);
        // 0.5*13 + 0.5*11
        assert!((out[1].ema - 12.0).abs() < 1e-12);
        assert!((out[1].sma - 12.0).abs() < 1e-12);
        assert_eq!(out.last().unwrap().price.date, series[5].date);
    }

    #[test]
    fn moving_averages_insufficient_data() {
        let series = points_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        let err = compute_moving_averages(&series, 5).unwrap_err();
        assert!(is_insufficient(&err));
        assert!(matches!(
            err.current_context(),
            IndicatorError::InsufficientData {
                required: 5,
                available: 4
            }
        ));
    }

    #[test]
    fn moving_averages_empty_series() {
        let err = compute_moving_averages(&[], 1).unwrap_err();
        assert!(is_insufficient(&err));
    }

    #[test]
    fn moving_averages_window_zero_invalid() {
        let series = points_from_closes(&[1.0, 2.0]);
        let err = compute_moving_averages(&series, 0).unwrap_err();
        assert!(matches!(
            err.current_context(),
            IndicatorError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn ema_bounded_on_monotonic_closes() {
        let rising: Vec<f64> = (0..40).map(|i| 50.0 + 1.5 * i as f64).collect();
        let out = compute_moving_averages(&points_from_closes(&rising), 10).unwrap();
        let mut prev = f64::MIN;
        for (i, row) in out.iter().enumerate() {
            let seen = &rising[..i + 10];
            let lo = seen.iter().copied().fold(f64::MAX, f64::min);
            let hi = seen.iter().copied().fold(f64::MIN, f64::max);
            assert!(row.ema >= lo && row.ema <= hi);
            assert!(row.ema > prev);
            prev = row.ema;
        }

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        let out = compute_moving_averages(&points_from_closes(&falling), 10).unwrap();
        for (i, row) in out.iter().enumerate() {
            let seen = &falling[..i + 10];
            let lo = seen.iter().copied().fold(f64::MAX, f64::min);
            let hi = seen.iter().copied().fold(f64::MIN, f64::max);
            assert!(row.ema >= lo && row.ema <= hi);
        }
    }

    #[test]
    fn moving_averages_idempotent() {
        let closes: Vec<f64> = (0..30).map(|i| (i as f64 * 0.7).sin() * 5.0 + 20.0).collect();
        let series = points_from_closes(&closes);
        let snapshot = series.clone();
        let a = compute_moving_averages(&series, 7).unwrap();
        let b = compute_moving_averages(&series, 7).unwrap();
        assert_eq!(series, snapshot);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.sma.to_bits(), y.sma.to_bits());
            assert_eq!(x.ema.to_bits(), y.ema.to_bits());
        }
    }
}
