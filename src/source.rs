pub mod csv_file;

use chrono::{Duration, NaiveDate};
use error_stack::Report;

use crate::error::SourceError;
use crate::model::PricePoint;

/// Days per look-back year, as the period selector counts them.
const DAYS_PER_YEAR: i64 = 365;

/// Somewhere ascending daily price bars can be loaded from.
pub trait PriceSource {
    /// Short description of where the bars come from, for logs.
    fn describe(&self) -> String;

    /// Load the full series, ascending by date with no duplicate dates.
    fn load(&self) -> Result<Vec<PricePoint>, Report<SourceError>>;
}

/// Sort bars ascending by date and reject duplicate dates.
pub fn normalize(mut points: Vec<PricePoint>) -> Result<Vec<PricePoint>, Report<SourceError>> {
    if points.is_empty() {
        return Err(Report::new(SourceError::Empty));
    }

    points.sort_by_key(|p| p.date);

    if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(Report::new(SourceError::DuplicateDate {
            date: pair[0].date.to_string(),
        }));
    }

    Ok(points)
}

/// The suffix of `series` dated within `years` years up to and including `end`.
///
/// `series` must be ascending by date.
pub fn trailing_years(series: &[PricePoint], end: NaiveDate, years: u32) -> &[PricePoint] {
    let start = end - Duration::days(i64::from(years) * DAYS_PER_YEAR);
    let from = series.partition_point(|p| p.date < start);
    let to = series.partition_point(|p| p.date <= end);
    &series[from..to.max(from)]
}
