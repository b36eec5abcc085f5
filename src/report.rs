use std::io::Write;

use chrono::NaiveDate;
use error_stack::{Report, ResultExt};
use serde::Serialize;

use crate::error::ReportError;
use crate::model::{MacdPoint, MovingAveragePoint, OutputFormat};

#[derive(Serialize)]
struct MovingAverageRow {
    date: NaiveDate,
    adj_close: f64,
    sma: f64,
    ema: f64,
}

impl From<&MovingAveragePoint> for MovingAverageRow {
    fn from(p: &MovingAveragePoint) -> Self {
        Self {
            date: p.price.date,
            adj_close: p.price.adj_close,
            sma: p.sma,
            ema: p.ema,
        }
    }
}

#[derive(Serialize)]
struct MacdRow {
    date: NaiveDate,
    adj_close: f64,
    ema_fast: f64,
    ema_slow: f64,
    macd: f64,
    signal: f64,
}

impl From<&MacdPoint> for MacdRow {
    fn from(p: &MacdPoint) -> Self {
        Self {
            date: p.price.date,
            adj_close: p.price.adj_close,
            ema_fast: p.ema_fast,
            ema_slow: p.ema_slow,
            macd: p.macd,
            signal: p.signal,
        }
    }
}

/// Write a moving-average series as a JSON array or as CSV rows.
pub fn write_moving_averages<W: Write>(
    writer: W,
    format: OutputFormat,
    points: &[MovingAveragePoint],
) -> Result<(), Report<ReportError>> {
    match format {
        OutputFormat::Json => write_json(writer, points),
        OutputFormat::Csv => write_csv(writer, points.iter().map(MovingAverageRow::from)),
    }
}

/// Write a MACD series as a JSON array or as CSV rows.
pub fn write_macd<W: Write>(
    writer: W,
    format: OutputFormat,
    points: &[MacdPoint],
) -> Result<(), Report<ReportError>> {
    match format {
        OutputFormat::Json => write_json(writer, points),
        OutputFormat::Csv => write_csv(writer, points.iter().map(MacdRow::from)),
    }
}

fn write_json<W: Write, T: Serialize>(mut writer: W, points: &[T]) -> Result<(), Report<ReportError>> {
    let context = || ReportError::Write {
        format: OutputFormat::Json.to_string(),
    };
    serde_json::to_writer_pretty(&mut writer, points).change_context_lazy(context)?;
    writeln!(writer).change_context_lazy(context)?;
    writer.flush().change_context_lazy(context)?;
    Ok(())
}

fn write_csv<W: Write, T: Serialize>(
    writer: W,
    rows: impl Iterator<Item = T>,
) -> Result<(), Report<ReportError>> {
    let context = || ReportError::Write {
        format: OutputFormat::Csv.to_string(),
    };
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).change_context_lazy(context)?;
    }
    wtr.flush().change_context_lazy(context)?;
    Ok(())
}
