use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::indicator::macd::MacdParams;
use crate::model::OutputFormat;

pub const WINDOW_SIZE_RANGE: (usize, usize) = (5, 500);
pub const YEARS_RANGE: (u32, u32) = (1, 10);

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_window_size() -> usize {
    20
}

fn default_years() -> u32 {
    2
}

fn default_output_format() -> String {
    "json".into()
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub technicals: TechnicalsConfig,
    #[serde(default)]
    pub macd: MacdConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Moving-average window and look-back period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TechnicalsConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_years")]
    pub years: u32,
}

impl Default for TechnicalsConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            years: default_years(),
        }
    }
}

impl TechnicalsConfig {
    /// Apply command-line overrides and re-validate the result.
    pub fn with_overrides(
        self,
        window_size: Option<usize>,
        years: Option<u32>,
    ) -> Result<Self, Report<ConfigError>> {
        let merged = Self {
            window_size: window_size.unwrap_or(self.window_size),
            years: years.unwrap_or(self.years),
        };
        validate_technicals(&merged)?;
        Ok(merged)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MacdConfig {
    #[serde(default = "MacdConfig::default_fast")]
    pub fast_period: usize,
    #[serde(default = "MacdConfig::default_slow")]
    pub slow_period: usize,
    #[serde(default = "MacdConfig::default_signal")]
    pub signal_period: usize,
}

impl MacdConfig {
    fn default_fast() -> usize {
        MacdParams::default().fast_period
    }

    fn default_slow() -> usize {
        MacdParams::default().slow_period
    }

    fn default_signal() -> usize {
        MacdParams::default().signal_period
    }

    pub fn params(&self) -> MacdParams {
        MacdParams {
            fast_period: self.fast_period,
            slow_period: self.slow_period,
            signal_period: self.signal_period,
        }
    }
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: Self::default_fast(),
            slow_period: Self::default_slow(),
            signal_period: Self::default_signal(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Accepted values: `"json"` | `"csv"`
    #[serde(default = "default_output_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
        }
    }
}

impl OutputConfig {
    /// Resolve the configured format, preferring `override_format` when given.
    pub fn resolve(&self, override_format: Option<&str>) -> Result<OutputFormat, Report<ConfigError>> {
        let name = override_format.unwrap_or(self.format.as_str());
        OutputFormat::from_str(name).ok_or_else(|| {
            Report::new(ConfigError::Validation {
                field: format!("output.format \"{name}\" is not one of json, csv"),
            })
        })
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`, or use
/// defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<AppConfig, Report<ConfigError>> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config = parse(&content)?;
    validate(&config)?;

    Ok(config)
}

fn parse(content: &str) -> Result<AppConfig, Report<ConfigError>> {
    toml::from_str(content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })
}

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_log_format(config)?;
    validate_technicals(&config.technicals)?;
    validate_macd(&config.macd)?;
    config.output.resolve(None)?;
    Ok(())
}

fn validate_log_format(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&config.general.log_format.as_str()) {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "general.log_format \"{}\" is not one of text, json",
                config.general.log_format
            ),
        }));
    }
    Ok(())
}

fn validate_technicals(technicals: &TechnicalsConfig) -> Result<(), Report<ConfigError>> {
    let (min_window, max_window) = WINDOW_SIZE_RANGE;
    if !(min_window..=max_window).contains(&technicals.window_size) {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "technicals.window_size {} is outside {min_window}..={max_window}",
                technicals.window_size
            ),
        }));
    }

    let (min_years, max_years) = YEARS_RANGE;
    if !(min_years..=max_years).contains(&technicals.years) {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "technicals.years {} is outside {min_years}..={max_years}",
                technicals.years
            ),
        }));
    }
    Ok(())
}

fn validate_macd(macd: &MacdConfig) -> Result<(), Report<ConfigError>> {
    if macd.fast_period == 0 || macd.slow_period == 0 || macd.signal_period == 0 {
        return Err(Report::new(ConfigError::Validation {
            field: "macd periods must be > 0".into(),
        }));
    }
    if macd.fast_period >= macd.slow_period {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "macd.fast_period {} must be < macd.slow_period {}",
                macd.fast_period, macd.slow_period
            ),
        }));
    }
    Ok(())
}
