use chrono::NaiveDate;
use thiserror::Error;

pub const READING_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("reading value must be a finite number, got {0}")]
    NonFiniteValue(f64),
    #[error("meter {0} does not exist")]
    UnknownMeter(i64),
    #[error("no meter with serial number '{0}'")]
    UnknownMeterSerial(String),
    #[error("window start {from} is after window end {to}")]
    InvertedWindow { from: NaiveDate, to: NaiveDate },
    #[error("unknown {field} '{value}'")]
    UnknownLabel { field: &'static str, value: String },
}

pub fn parse_reading_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), READING_DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

pub fn ensure_finite(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFiniteValue(value))
    }
}

/// Inclusive date window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, ValidationError> {
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(ValidationError::InvertedWindow { from, to });
        }

        Ok(Self { from, to })
    }

    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, ValidationError> {
        let from = from.map(parse_reading_date).transpose()?;
        let to = to.map(parse_reading_date).transpose()?;
        Self::new(from, to)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}
