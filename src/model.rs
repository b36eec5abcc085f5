use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily price bar.
///
/// Series of these are ascending by `date` with no duplicate dates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

/// A price bar tagged with its simple and exponential moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingAveragePoint {
    #[serde(flatten)]
    pub price: PricePoint,
    pub sma: f64,
    pub ema: f64,
}

/// A price bar tagged with its MACD components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdPoint {
    #[serde(flatten)]
    pub price: PricePoint,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub signal: f64,
}

/// Serialization format for derived series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    /// Parse a config-format string into an `OutputFormat`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parses_known_names() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_str("xml"), None);
        assert_eq!(OutputFormat::from_str(""), None);
    }

    #[test]
    fn output_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn moving_average_point_flattens_price_fields() {
        let point = MovingAveragePoint {
            price: PricePoint {
                date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                adj_close: 1.25,
                volume: 100.0,
            },
            sma: 1.1,
            ema: 1.2,
        };
        let value = serde_json::to_value(point).unwrap();
        assert_eq!(value["date"], "2021-03-01");
        assert_eq!(value["adj_close"], 1.25);
        assert_eq!(value["sma"], 1.1);
        assert!(value.get("price").is_none());
    }
}
