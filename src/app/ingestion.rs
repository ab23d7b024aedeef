use chrono::NaiveDate;
use thiserror::Error;

use crate::app::services::{MeterQueryHandler, ReadingCommandHandler, ServiceError};
use crate::domain::models::{Meter, NewReading};
use crate::domain::validation::{ValidationError, ensure_finite, parse_reading_date};

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("reading store failed: {0}")]
    Store(#[from] ServiceError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpsertOutcome {
    Inserted {
        reading_id: i64,
    },
    Updated {
        reading_id: i64,
        previous_value: Option<f64>,
    },
}

impl UpsertOutcome {
    pub fn reading_id(&self) -> i64 {
        match self {
            Self::Inserted { reading_id } | Self::Updated { reading_id, .. } => *reading_id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Inserted { .. } => "inserted",
            Self::Updated { .. } => "updated",
        }
    }
}

/// Inserts the reading for (meter, date) or overwrites the value of the one
/// already stored. Notes are only written on insert.
///
/// The existence check and the write are two store calls; a concurrent writer
/// for the same pair hits the unique constraint and surfaces as a store error.
pub fn upsert_reading<S>(
    store: &S,
    meter_id: i64,
    date: &str,
    value: f64,
    notes: Option<&str>,
) -> Result<UpsertOutcome, IngestionError>
where
    S: MeterQueryHandler + ReadingCommandHandler + ?Sized,
{
    let date = parse_reading_date(date)?;
    let value = ensure_finite(value)?;

    if store.get_meter(meter_id)?.is_none() {
        return Err(ValidationError::UnknownMeter(meter_id).into());
    }

    write_reading(store, meter_id, date, value, notes)
}

pub fn upsert_reading_by_serial<S>(
    store: &S,
    serial_number: &str,
    date: &str,
    value: f64,
    notes: Option<&str>,
) -> Result<(Meter, UpsertOutcome), IngestionError>
where
    S: MeterQueryHandler + ReadingCommandHandler + ?Sized,
{
    let date = parse_reading_date(date)?;
    let value = ensure_finite(value)?;

    let serial_number = serial_number.trim();
    let meter = store
        .get_meter_by_serial(serial_number)?
        .ok_or_else(|| ValidationError::UnknownMeterSerial(serial_number.to_string()))?;

    let outcome = write_reading(store, meter.id, date, value, notes)?;
    Ok((meter, outcome))
}

fn write_reading<S>(
    store: &S,
    meter_id: i64,
    date: NaiveDate,
    value: f64,
    notes: Option<&str>,
) -> Result<UpsertOutcome, IngestionError>
where
    S: MeterQueryHandler + ReadingCommandHandler + ?Sized,
{
    let outcome = match store.find_reading(meter_id, date)? {
        Some(existing) => {
            store.update_reading_value(existing.id, value)?;
            UpsertOutcome::Updated {
                reading_id: existing.id,
                previous_value: existing.value,
            }
        }
        None => {
            let reading_id = store.insert_reading(&NewReading {
                meter_id,
                date,
                value,
                notes: notes.map(ToString::to_string),
            })?;
            UpsertOutcome::Inserted { reading_id }
        }
    };

    tracing::debug!(
        meter_id,
        date = %date,
        value,
        outcome = outcome.label(),
        "reading upserted"
    );

    Ok(outcome)
}
