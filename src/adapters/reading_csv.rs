use std::fs::File;
use std::io::Read;

use csv::StringRecord;
use thiserror::Error;

/// One reading line from an import file.
///
/// Expected header columns (by name, any order):
/// - serial_number
/// - date (YYYY-MM-DD)
/// - value
/// - notes (optional)
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRow {
    pub line: u64,
    pub serial_number: String,
    pub date: String,
    pub value: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Error)]
pub enum ReadingCsvError {
    #[error("failed to open import file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column '{0}' in CSV header")]
    MissingColumn(&'static str),
    #[error("line {line}: invalid value '{raw}'")]
    InvalidValue { line: u64, raw: String },
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    serial_number: usize,
    date: usize,
    value: usize,
    notes: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, ReadingCsvError> {
        let position = |name: &str| headers.iter().position(|header| header.trim() == name);
        let required = |name: &'static str| position(name).ok_or(ReadingCsvError::MissingColumn(name));

        Ok(Self {
            serial_number: required("serial_number")?,
            date: required("date")?,
            value: required("value")?,
            notes: position("notes"),
        })
    }
}

pub fn read_file(path: &str) -> Result<Vec<Result<ReadingRow, ReadingCsvError>>, ReadingCsvError> {
    let file = File::open(path)?;
    read_rows(file)
}

/// Header problems abort the whole file; a bad line only fails its own entry.
pub fn read_rows<R: Read>(
    reader: R,
) -> Result<Vec<Result<ReadingRow, ReadingCsvError>>, ReadingCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let rows = reader
        .records()
        .map(|record| {
            let record = record?;
            record_to_row(&record, columns)
        })
        .collect();

    Ok(rows)
}

fn record_to_row(record: &StringRecord, columns: ColumnIndex) -> Result<ReadingRow, ReadingCsvError> {
    let line = record.position().map_or(0, |position| position.line());
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let raw_value = field(columns.value);
    let value = raw_value
        .parse::<f64>()
        .map_err(|_| ReadingCsvError::InvalidValue {
            line,
            raw: raw_value.to_string(),
        })?;

    Ok(ReadingRow {
        line,
        serial_number: field(columns.serial_number).to_string(),
        date: field(columns.date).to_string(),
        value,
        notes: columns
            .notes
            .map(field)
            .filter(|notes| !notes.is_empty())
            .map(ToString::to_string),
    })
}
