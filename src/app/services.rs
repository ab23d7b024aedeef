use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rusqlite::Connection;
use thiserror::Error;

use crate::adapters::db;
use crate::adapters::db::DbError;
use crate::domain::models::{
    Facility, MaintenanceRecord, Meter, MeterStatus, MeterType, NewFacility,
    NewMaintenanceRecord, NewMeter, NewReading, Reading,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database lock poisoned")]
    DbLockPoisoned,
    #[error("database operation failed: {0}")]
    Database(#[from] DbError),
}

pub trait MeterQueryHandler {
    fn get_meter(&self, meter_id: i64) -> Result<Option<Meter>, ServiceError>;
    fn get_meter_by_serial(&self, serial_number: &str) -> Result<Option<Meter>, ServiceError>;
    fn list_meters(&self) -> Result<Vec<Meter>, ServiceError>;
    fn list_readings(&self, meter_id: i64) -> Result<Vec<Reading>, ServiceError>;
    fn find_reading(
        &self,
        meter_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Reading>, ServiceError>;
    fn count_readings_by_meter_type(&self, meter_type: MeterType) -> Result<i64, ServiceError>;
}

pub trait ReadingCommandHandler {
    fn insert_reading(&self, new_reading: &NewReading) -> Result<i64, ServiceError>;
    fn update_reading_value(&self, reading_id: i64, value: f64) -> Result<(), ServiceError>;
}

pub trait RegistryQueryHandler {
    fn list_meters_page(&self, limit: u32, offset: u32) -> Result<Vec<Meter>, ServiceError>;
    fn list_facilities(&self) -> Result<Vec<Facility>, ServiceError>;
    fn list_maintenance_records(&self) -> Result<Vec<MaintenanceRecord>, ServiceError>;
    fn get_schema_version(&self) -> Result<u32, ServiceError>;
    fn count_facilities(&self) -> Result<i64, ServiceError>;
    fn count_meters(&self) -> Result<i64, ServiceError>;
    fn count_readings(&self) -> Result<i64, ServiceError>;
}

pub trait RegistryCommandHandler {
    fn insert_facility(&self, new_facility: &NewFacility) -> Result<i64, ServiceError>;
    fn insert_meter(&self, new_meter: &NewMeter) -> Result<i64, ServiceError>;
    fn update_meter_status(&self, meter_id: i64, status: MeterStatus)
    -> Result<bool, ServiceError>;
    fn insert_maintenance_record(
        &self,
        new_record: &NewMaintenanceRecord,
    ) -> Result<i64, ServiceError>;
}

#[derive(Clone)]
pub struct SqliteFacilityService {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteFacilityService {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> Result<T, ServiceError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| ServiceError::DbLockPoisoned)?;
        op(&connection).map_err(ServiceError::from)
    }
}

impl MeterQueryHandler for SqliteFacilityService {
    fn get_meter(&self, meter_id: i64) -> Result<Option<Meter>, ServiceError> {
        self.with_connection(|connection| db::get_meter(connection, meter_id))
    }

    fn get_meter_by_serial(&self, serial_number: &str) -> Result<Option<Meter>, ServiceError> {
        self.with_connection(|connection| db::get_meter_by_serial(connection, serial_number))
    }

    fn list_meters(&self) -> Result<Vec<Meter>, ServiceError> {
        self.with_connection(db::list_meters)
    }

    fn list_readings(&self, meter_id: i64) -> Result<Vec<Reading>, ServiceError> {
        self.with_connection(|connection| db::list_readings_for_meter(connection, meter_id))
    }

    fn find_reading(
        &self,
        meter_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Reading>, ServiceError> {
        self.with_connection(|connection| db::find_reading(connection, meter_id, date))
    }

    fn count_readings_by_meter_type(&self, meter_type: MeterType) -> Result<i64, ServiceError> {
        self.with_connection(|connection| db::count_readings_by_meter_type(connection, meter_type))
    }
}

impl ReadingCommandHandler for SqliteFacilityService {
    fn insert_reading(&self, new_reading: &NewReading) -> Result<i64, ServiceError> {
        self.with_connection(|connection| db::insert_reading(connection, new_reading))
    }

    fn update_reading_value(&self, reading_id: i64, value: f64) -> Result<(), ServiceError> {
        self.with_connection(|connection| db::update_reading_value(connection, reading_id, value))
    }
}

impl RegistryQueryHandler for SqliteFacilityService {
    fn list_meters_page(&self, limit: u32, offset: u32) -> Result<Vec<Meter>, ServiceError> {
        self.with_connection(|connection| db::list_meters_page(connection, limit, offset))
    }

    fn list_facilities(&self) -> Result<Vec<Facility>, ServiceError> {
        self.with_connection(db::list_facilities)
    }

    fn list_maintenance_records(&self) -> Result<Vec<MaintenanceRecord>, ServiceError> {
        self.with_connection(db::list_maintenance_records)
    }

    fn get_schema_version(&self) -> Result<u32, ServiceError> {
        self.with_connection(db::schema_version)
    }

    fn count_facilities(&self) -> Result<i64, ServiceError> {
        self.with_connection(db::count_facilities)
    }

    fn count_meters(&self) -> Result<i64, ServiceError> {
        self.with_connection(db::count_meters)
    }

    fn count_readings(&self) -> Result<i64, ServiceError> {
        self.with_connection(db::count_readings)
    }
}

impl RegistryCommandHandler for SqliteFacilityService {
    fn insert_facility(&self, new_facility: &NewFacility) -> Result<i64, ServiceError> {
        self.with_connection(|connection| db::insert_facility(connection, new_facility))
    }

    fn insert_meter(&self, new_meter: &NewMeter) -> Result<i64, ServiceError> {
        self.with_connection(|connection| db::insert_meter(connection, new_meter))
    }

    fn update_meter_status(
        &self,
        meter_id: i64,
        status: MeterStatus,
    ) -> Result<bool, ServiceError> {
        self.with_connection(|connection| db::update_meter_status(connection, meter_id, status))
    }

    fn insert_maintenance_record(
        &self,
        new_record: &NewMaintenanceRecord,
    ) -> Result<i64, ServiceError> {
        self.with_connection(|connection| db::insert_maintenance_record(connection, new_record))
    }
}
