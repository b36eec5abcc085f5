use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use error_stack::{Report, ResultExt};
use tracing::{debug, info};

use crate::error::SourceError;
use crate::model::PricePoint;
use crate::source::{PriceSource, normalize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily bars from a CSV file in the historical-download layout:
/// `Date,Open,High,Low,Close,Adj Close,Volume`.
///
/// Header names are matched case-insensitively and column order does not
/// matter. Without an `Adj Close` column the close is used.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceSource for CsvFileSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn load(&self) -> Result<Vec<PricePoint>, Report<SourceError>> {
        let file = std::fs::File::open(&self.path).change_context(SourceError::Read {
            path: self.path.display().to_string(),
        })?;

        let points = parse_reader(file)
            .attach_with(|| format!("path: {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            bars = points.len(),
            first = %points[0].date,
            last = %points[points.len() - 1].date,
            "price data loaded"
        );

        Ok(points)
    }
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: Option<usize>,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, Report<SourceError>> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                Report::new(SourceError::Parse {
                    reason: format!("missing column \"{name}\""),
                })
            })
        };

        Ok(Self {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            adj_close: find("adj close"),
            volume: require("volume")?,
        })
    }
}

/// Parse bars from any reader holding the CSV layout, then sort and check
/// them for duplicate dates.
pub fn parse_reader<R: io::Read>(reader: R) -> Result<Vec<PricePoint>, Report<SourceError>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .change_context(SourceError::Parse {
            reason: "unreadable header row".into(),
        })?
        .clone();
    let columns = Columns::from_headers(&headers)?;

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result.change_context(SourceError::Parse {
            reason: "malformed row".into(),
        })?;
        let line = record.position().map_or(0, |p| p.line());

        match parse_record(&record, &columns).attach_with(|| format!("line {line}"))? {
            Some(point) => points.push(point),
            None => {
                debug!(line, "skipping row without prices");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "rows without prices skipped");
    }

    normalize(points)
}

/// `Ok(None)` for rows whose price fields are blank or `null`.
fn parse_record(
    record: &StringRecord,
    columns: &Columns,
) -> Result<Option<PricePoint>, Report<SourceError>> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let raw_date = field(columns.date);
    let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).change_context(
        SourceError::Parse {
            reason: format!("invalid date \"{raw_date}\""),
        },
    )?;

    let mut prices = [columns.open, columns.high, columns.low, columns.close, columns.volume]
        .into_iter()
        .chain(columns.adj_close)
        .map(field);
    if prices.any(is_missing) {
        return Ok(None);
    }

    let number = |idx: usize| -> Result<f64, Report<SourceError>> {
        let raw = field(idx);
        raw.parse::<f64>().change_context(SourceError::Parse {
            reason: format!("invalid number \"{raw}\""),
        })
    };

    let close = number(columns.close)?;
    let adj_close = match columns.adj_close {
        Some(idx) => number(idx)?,
        None => close,
    };

    Ok(Some(PricePoint {
        date,
        open: number(columns.open)?,
        high: number(columns.high)?,
        low: number(columns.low)?,
        close,
        adj_close,
        volume: number(columns.volume)?,
    }))
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("null")
}
