use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::adapters::db::{insert_facility, insert_meter, open_connection, run_migrations};
use crate::app::services::{MeterQueryHandler, ReadingCommandHandler, ServiceError};
use crate::domain::models::{
    FacilityStatus, Meter, MeterStatus, MeterType, NewFacility, NewMeter, NewReading, Reading,
};

static TEST_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn open_test_connection(test_name: &str) -> Connection {
    let template = ensure_template_db();
    let test_db_path = unique_test_db_path(test_name);

    if let Some(parent) = test_db_path.parent() {
        std::fs::create_dir_all(parent).expect("test db dir should be creatable");
    }

    std::fs::copy(&template, &test_db_path).expect("template db should be copied");
    open_connection(test_db_path.to_string_lossy().as_ref()).expect("test db should open")
}

/// Inserts a facility plus one active meter and returns the meter id.
pub fn seed_meter(connection: &Connection, serial_number: &str, meter_type: MeterType) -> i64 {
    let facility_id = insert_facility(
        connection,
        &NewFacility {
            name: format!("Facility {serial_number}"),
            facility_type: "Office".to_string(),
            location: None,
            status: FacilityStatus::Active,
            area: Some(500.0),
        },
    )
    .expect("facility insert should succeed");

    insert_meter(
        connection,
        &NewMeter {
            facility_id,
            serial_number: serial_number.to_string(),
            meter_type,
            location: None,
            installation_date: None,
            status: MeterStatus::Active,
        },
    )
    .expect("meter insert should succeed")
}

fn ensure_template_db() -> PathBuf {
    static TEMPLATE_PATH: OnceLock<PathBuf> = OnceLock::new();

    TEMPLATE_PATH
        .get_or_init(|| {
            let template_path = std::env::var("TEST_DB_TEMPLATE_PATH")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_template_path);

            if let Some(parent) = template_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).expect("template parent dir should be creatable");
            }

            let mut connection = open_connection(template_path.to_string_lossy().as_ref())
                .expect("template db opens");
            run_migrations(&mut connection).expect("template migrations should succeed");

            template_path
        })
        .clone()
}

fn default_template_path() -> PathBuf {
    Path::new("./target/testdb/facility_template.db").to_path_buf()
}

fn unique_test_db_path(test_name: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let counter = TEST_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    Path::new("./target/testdb")
        .join(format!("{test_name}-{now}-{counter}.sqlite"))
        .to_path_buf()
}

/// Store fake for ingestion and report tests. Flip `set_unavailable` to make
/// every call fail the way a poisoned connection does.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    meters: RefCell<Vec<Meter>>,
    readings: RefCell<Vec<Reading>>,
    unavailable: Cell<bool>,
}

impl InMemoryStore {
    pub fn with_meter(meter_id: i64, serial_number: &str, meter_type: MeterType) -> Self {
        let store = Self::default();
        store.add_meter(meter_id, serial_number, meter_type);
        store
    }

    pub fn add_meter(&self, meter_id: i64, serial_number: &str, meter_type: MeterType) {
        self.meters.borrow_mut().push(Meter {
            id: meter_id,
            facility_id: 1,
            serial_number: serial_number.to_string(),
            meter_type,
            location: None,
            installation_date: None,
            status: MeterStatus::Active,
        });
    }

    /// Adds a raw row, including null values ingestion would never write.
    pub fn add_raw_reading(&self, meter_id: i64, date: &str, value: Option<f64>) {
        let mut readings = self.readings.borrow_mut();
        let id = readings.len() as i64 + 1;
        readings.push(Reading {
            id,
            meter_id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("test date should parse"),
            value,
            notes: None,
        });
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    fn check_available(&self) -> Result<(), ServiceError> {
        if self.unavailable.get() {
            return Err(ServiceError::DbLockPoisoned);
        }
        Ok(())
    }
}

impl MeterQueryHandler for InMemoryStore {
    fn get_meter(&self, meter_id: i64) -> Result<Option<Meter>, ServiceError> {
        self.check_available()?;
        Ok(self
            .meters
            .borrow()
            .iter()
            .find(|meter| meter.id == meter_id)
            .cloned())
    }

    fn get_meter_by_serial(&self, serial_number: &str) -> Result<Option<Meter>, ServiceError> {
        self.check_available()?;
        Ok(self
            .meters
            .borrow()
            .iter()
            .find(|meter| meter.serial_number == serial_number)
            .cloned())
    }

    fn list_meters(&self) -> Result<Vec<Meter>, ServiceError> {
        self.check_available()?;
        Ok(self.meters.borrow().clone())
    }

    fn list_readings(&self, meter_id: i64) -> Result<Vec<Reading>, ServiceError> {
        self.check_available()?;
        let mut readings: Vec<Reading> = self
            .readings
            .borrow()
            .iter()
            .filter(|reading| reading.meter_id == meter_id)
            .cloned()
            .collect();
        readings.sort_by_key(|reading| reading.date);
        Ok(readings)
    }

    fn find_reading(
        &self,
        meter_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Reading>, ServiceError> {
        self.check_available()?;
        Ok(self
            .readings
            .borrow()
            .iter()
            .find(|reading| reading.meter_id == meter_id && reading.date == date)
            .cloned())
    }

    fn count_readings_by_meter_type(&self, meter_type: MeterType) -> Result<i64, ServiceError> {
        self.check_available()?;
        let meters = self.meters.borrow();
        let count = self
            .readings
            .borrow()
            .iter()
            .filter(|reading| {
                meters
                    .iter()
                    .any(|meter| meter.id == reading.meter_id && meter.meter_type == meter_type)
            })
            .count();
        Ok(count as i64)
    }
}

impl ReadingCommandHandler for InMemoryStore {
    fn insert_reading(&self, new_reading: &NewReading) -> Result<i64, ServiceError> {
        self.check_available()?;
        let mut readings = self.readings.borrow_mut();
        let id = readings.len() as i64 + 1;
        readings.push(Reading {
            id,
            meter_id: new_reading.meter_id,
            date: new_reading.date,
            value: Some(new_reading.value),
            notes: new_reading.notes.clone(),
        });
        Ok(id)
    }

    fn update_reading_value(&self, reading_id: i64, value: f64) -> Result<(), ServiceError> {
        self.check_available()?;
        if let Some(reading) = self
            .readings
            .borrow_mut()
            .iter_mut()
            .find(|reading| reading.id == reading_id)
        {
            reading.value = Some(value);
        }
        Ok(())
    }
}
