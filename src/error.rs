use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum SourceError {
    #[display("failed to read price data from {path}")]
    Read { path: String },
    #[display("failed to parse price data: {reason}")]
    Parse { reason: String },
    #[display("duplicate price bar for {date}")]
    DuplicateDate { date: String },
    #[display("price data contains no usable rows")]
    Empty,
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum ReportError {
    #[display("failed to write {format} report")]
    Write { format: String },
}
