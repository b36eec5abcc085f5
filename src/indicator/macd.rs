use error_stack::{Report, bail};
use tracing::debug;

use crate::error::IndicatorError;
use crate::indicator::ma::Ema;
use crate::indicator::{Indicator, adjusted_closes};
use crate::model::{MacdPoint, PricePoint};

/// Periods for the fast, slow and signal exponential averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    pub fn new(params: MacdParams) -> Result<Self, Report<IndicatorError>> {
        let MacdParams {
            fast_period,
            slow_period,
            signal_period,
        } = params;
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all periods must be > 0".into(),
            });
        }
        if fast_period >= slow_period {
            bail!(IndicatorError::InvalidParameter {
                name: "fast_period must be < slow_period".into(),
            });
        }
        Ok(Self {
            fast_period,
            slow_period,
            signal_period,
        })
    }

    /// Index of the first bar with a defined signal value.
    fn first_index(&self) -> usize {
        self.slow_period + self.signal_period - 2
    }

    /// Calculate (ema_fast, ema_slow, macd_line, signal_line) tuples, one per
    /// bar from `first_index()` onward.
    pub fn calculate_full(
        &self,
        points: &[PricePoint],
    ) -> Result<Vec<(f64, f64, f64, f64)>, Report<IndicatorError>> {
        let prices = adjusted_closes(points);
        if prices.len() < self.required_points() {
            bail!(IndicatorError::InsufficientData {
                required: self.required_points(),
                available: prices.len(),
            });
        }

        let fast_ema = Ema::new(self.fast_period)?.calculate_prices(&prices)?;
        let slow_ema = Ema::new(self.slow_period)?.calculate_prices(&prices)?;

        // Align: slow_ema is shorter by (slow_period - fast_period) elements
        let offset = self.slow_period - self.fast_period;
        let fast_aligned = &fast_ema[offset..];
        let macd_line: Vec<f64> = fast_aligned
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = Ema::new(self.signal_period)?.calculate_prices(&macd_line)?;
        // Signal is shorter by (signal_period - 1)
        let signal_offset = self.signal_period - 1;

        let result = fast_aligned[signal_offset..]
            .iter()
            .zip(slow_ema[signal_offset..].iter())
            .zip(macd_line[signal_offset..].iter())
            .zip(signal_line.iter())
            .map(|(((&f, &s), &m), &sig)| (f, s, m, sig))
            .collect();

        Ok(result)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn required_points(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    /// Returns MACD line values only.
    fn calculate(&self, points: &[PricePoint]) -> Result<Vec<f64>, Report<IndicatorError>> {
        Ok(self
            .calculate_full(points)?
            .into_iter()
            .map(|(_, _, m, _)| m)
            .collect())
    }
}

/// Tag every bar from the first defined signal value onward with its MACD
/// components. Earlier bars are dropped.
pub fn compute_macd(
    series: &[PricePoint],
    params: MacdParams,
) -> Result<Vec<MacdPoint>, Report<IndicatorError>> {
    let macd = Macd::new(params)?;
    let rows = macd.calculate_full(series)?;

    let points: Vec<MacdPoint> = series[macd.first_index()..]
        .iter()
        .zip(rows)
        .map(|(price, (ema_fast, ema_slow, macd, signal))| MacdPoint {
            price: *price,
            ema_fast,
            ema_slow,
            macd,
            signal,
        })
        .collect();

    debug!(
        fast = params.fast_period,
        slow = params.slow_period,
        signal = params.signal_period,
        input = series.len(),
        output = points.len(),
        "macd computed"
    );

    Ok(points)
}
