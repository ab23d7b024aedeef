use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use crate::domain::models::{
    Facility, MaintenanceRecord, Meter, MeterStatus, MeterType, NewFacility,
    NewMaintenanceRecord, NewMeter, NewReading, Reading,
};
use crate::domain::validation::ValidationError;

pub const LATEST_SCHEMA_VERSION: u32 = 2;

const MIGRATIONS: &[(u32, &str)] = &[
    (
        1,
        r#"
CREATE TABLE IF NOT EXISTS facilities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    location TEXT,
    status TEXT NOT NULL DEFAULT 'Active',
    area REAL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS meters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    facility_id INTEGER NOT NULL REFERENCES facilities (id),
    serial_number TEXT NOT NULL UNIQUE,
    type TEXT NOT NULL CHECK (type IN ('electric', 'gas', 'water', 'heating')),
    location TEXT,
    installation_date TEXT,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive', 'broken')),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS readings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    meter_id INTEGER NOT NULL REFERENCES meters (id) ON DELETE CASCADE,
    value REAL,
    date TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (meter_id, date)
);

CREATE INDEX IF NOT EXISTS idx_meters_facility_id
ON meters (facility_id);
"#,
    ),
    (
        2,
        r#"
CREATE TABLE IF NOT EXISTS maintenance_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    facility_id INTEGER NOT NULL REFERENCES facilities (id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'scheduled',
    cost REAL,
    scheduled_date TEXT NOT NULL,
    next_maintenance TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_maintenance_next_maintenance
ON maintenance_records (next_maintenance);
"#,
    ),
];

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
    #[error("column {column} holds an unrecognised value: {source}")]
    InvalidColumn {
        column: usize,
        source: ValidationError,
    },
}

impl From<rusqlite::Error> for DbError {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::FromSqlConversionFailure(column, column_type, source) => {
                match source.downcast::<ValidationError>() {
                    Ok(source) => DbError::InvalidColumn {
                        column,
                        source: *source,
                    },
                    Err(source) => DbError::Sqlite(rusqlite::Error::FromSqlConversionFailure(
                        column,
                        column_type,
                        source,
                    )),
                }
            }
            other => DbError::Sqlite(other),
        }
    }
}

pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    let connection = Connection::open(path)?;
    connection.pragma_update(None, "foreign_keys", true)?;
    Ok(connection)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Reads a closed-enum label, folding case at the store boundary.
fn label_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ValidationError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error)))
}

/// Status labels on facilities and maintenance work are unconstrained in the
/// schema; an unrecognised one reads as `None`.
fn lenient_label<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = ValidationError>,
{
    let raw: Option<String> = row.get(idx)?;
    Ok(raw.and_then(|raw| match raw.parse() {
        Ok(label) => Some(label),
        Err(error) => {
            tracing::warn!(column = idx, %error, "unrecognised label read as unknown");
            None
        }
    }))
}

/// SQLite keeps whatever was written into a REAL column, so seeded rows may
/// carry text. Anything that does not read as a number becomes `None`.
fn lenient_number(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Integer(number) => Some(number as f64),
        Value::Real(number) => Some(number),
        Value::Text(text) => text.trim().parse().ok(),
        Value::Null | Value::Blob(_) => None,
    })
}

fn facility_from_row(row: &Row<'_>) -> rusqlite::Result<Facility> {
    Ok(Facility {
        id: row.get(0)?,
        name: row.get(1)?,
        facility_type: row.get(2)?,
        location: row.get(3)?,
        status: lenient_label(row, 4)?,
        area: lenient_number(row, 5)?,
    })
}

fn meter_from_row(row: &Row<'_>) -> rusqlite::Result<Meter> {
    Ok(Meter {
        id: row.get(0)?,
        facility_id: row.get(1)?,
        serial_number: row.get(2)?,
        meter_type: label_column(row, 3)?,
        location: row.get(4)?,
        installation_date: row.get(5)?,
        status: label_column(row, 6)?,
    })
}

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<Reading> {
    Ok(Reading {
        id: row.get(0)?,
        meter_id: row.get(1)?,
        date: row.get(2)?,
        value: lenient_number(row, 3)?,
        notes: row.get(4)?,
    })
}

fn maintenance_from_row(row: &Row<'_>) -> rusqlite::Result<MaintenanceRecord> {
    Ok(MaintenanceRecord {
        id: row.get(0)?,
        facility_id: row.get(1)?,
        description: row.get(2)?,
        status: lenient_label(row, 3)?,
        cost: lenient_number(row, 4)?,
        scheduled_date: row.get(5)?,
        next_maintenance: row.get(6)?,
    })
}

const METER_COLUMNS: &str =
    "id, facility_id, serial_number, type, location, installation_date, status";

pub fn insert_facility(connection: &Connection, facility: &NewFacility) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO facilities (name, type, location, status, area) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            facility.name,
            facility.facility_type,
            facility.location,
            facility.status.as_str(),
            facility.area,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn list_facilities(connection: &Connection) -> Result<Vec<Facility>, DbError> {
    let mut statement = connection.prepare(
        "SELECT id, name, type, location, status, area
         FROM facilities
         ORDER BY name, id",
    )?;

    let rows = statement.query_map([], facility_from_row)?;
    let mut facilities = Vec::new();
    for row in rows {
        facilities.push(row?);
    }

    Ok(facilities)
}

pub fn insert_meter(connection: &Connection, meter: &NewMeter) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO meters (facility_id, serial_number, type, location, installation_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            meter.facility_id,
            meter.serial_number,
            meter.meter_type.as_str(),
            meter.location,
            meter.installation_date,
            meter.status.as_str(),
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn get_meter(connection: &Connection, meter_id: i64) -> Result<Option<Meter>, DbError> {
    let meter = connection
        .query_row(
            &format!("SELECT {METER_COLUMNS} FROM meters WHERE id = ?1"),
            params![meter_id],
            meter_from_row,
        )
        .optional()?;

    Ok(meter)
}

pub fn get_meter_by_serial(
    connection: &Connection,
    serial_number: &str,
) -> Result<Option<Meter>, DbError> {
    let meter = connection
        .query_row(
            &format!("SELECT {METER_COLUMNS} FROM meters WHERE serial_number = ?1"),
            params![serial_number],
            meter_from_row,
        )
        .optional()?;

    Ok(meter)
}

pub fn list_meters(connection: &Connection) -> Result<Vec<Meter>, DbError> {
    let mut statement =
        connection.prepare(&format!("SELECT {METER_COLUMNS} FROM meters ORDER BY id"))?;

    let rows = statement.query_map([], meter_from_row)?;
    let mut meters = Vec::new();
    for row in rows {
        meters.push(row?);
    }

    Ok(meters)
}

pub fn list_meters_page(
    connection: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<Meter>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {METER_COLUMNS} FROM meters ORDER BY id LIMIT ?1 OFFSET ?2"
    ))?;

    let rows = statement.query_map(params![limit, offset], meter_from_row)?;
    let mut meters = Vec::new();
    for row in rows {
        meters.push(row?);
    }

    Ok(meters)
}

/// Returns `false` when no meter with that id exists.
pub fn update_meter_status(
    connection: &Connection,
    meter_id: i64,
    status: MeterStatus,
) -> Result<bool, DbError> {
    let changed = connection.execute(
        "UPDATE meters SET status = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
        params![status.as_str(), meter_id],
    )?;

    Ok(changed > 0)
}

pub fn delete_meter(connection: &Connection, meter_id: i64) -> Result<bool, DbError> {
    let changed = connection.execute("DELETE FROM meters WHERE id = ?1", params![meter_id])?;
    Ok(changed > 0)
}

pub fn insert_reading(connection: &Connection, reading: &NewReading) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO readings (meter_id, value, date, notes) VALUES (?1, ?2, ?3, ?4)",
        params![reading.meter_id, reading.value, reading.date, reading.notes],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn find_reading(
    connection: &Connection,
    meter_id: i64,
    date: NaiveDate,
) -> Result<Option<Reading>, DbError> {
    let reading = connection
        .query_row(
            "SELECT id, meter_id, date, value, notes
             FROM readings
             WHERE meter_id = ?1 AND date = ?2",
            params![meter_id, date],
            reading_from_row,
        )
        .optional()?;

    Ok(reading)
}

pub fn update_reading_value(
    connection: &Connection,
    reading_id: i64,
    value: f64,
) -> Result<(), DbError> {
    connection.execute(
        "UPDATE readings SET value = ?1 WHERE id = ?2",
        params![value, reading_id],
    )?;

    Ok(())
}

pub fn list_readings_for_meter(
    connection: &Connection,
    meter_id: i64,
) -> Result<Vec<Reading>, DbError> {
    let mut statement = connection.prepare(
        "SELECT id, meter_id, date, value, notes
         FROM readings
         WHERE meter_id = ?1
         ORDER BY date, id",
    )?;

    let rows = statement.query_map(params![meter_id], reading_from_row)?;
    let mut readings = Vec::new();
    for row in rows {
        readings.push(row?);
    }

    Ok(readings)
}

pub fn count_readings_by_meter_type(
    connection: &Connection,
    meter_type: MeterType,
) -> Result<i64, DbError> {
    let count = connection.query_row(
        "SELECT COUNT(*)
         FROM readings r
         JOIN meters m ON m.id = r.meter_id
         WHERE m.type = ?1",
        params![meter_type.as_str()],
        |row| row.get(0),
    )?;

    Ok(count)
}

pub fn count_facilities(connection: &Connection) -> Result<i64, DbError> {
    let count = connection.query_row("SELECT COUNT(*) FROM facilities", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_meters(connection: &Connection) -> Result<i64, DbError> {
    let count = connection.query_row("SELECT COUNT(*) FROM meters", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_readings(connection: &Connection) -> Result<i64, DbError> {
    let count = connection.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
    Ok(count)
}

pub fn insert_maintenance_record(
    connection: &Connection,
    record: &NewMaintenanceRecord,
) -> Result<i64, DbError> {
    connection.execute(
        "INSERT INTO maintenance_records
            (facility_id, description, status, cost, scheduled_date, next_maintenance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.facility_id,
            record.description,
            record.status.as_str(),
            record.cost,
            record.scheduled_date,
            record.next_maintenance,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn list_maintenance_records(
    connection: &Connection,
) -> Result<Vec<MaintenanceRecord>, DbError> {
    let mut statement = connection.prepare(
        "SELECT id, facility_id, description, status, cost, scheduled_date, next_maintenance
         FROM maintenance_records
         ORDER BY scheduled_date DESC, id DESC",
    )?;

    let rows = statement.query_map([], maintenance_from_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }

    Ok(records)
}
