use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::app::services::{MeterQueryHandler, RegistryQueryHandler, ServiceError};
use crate::domain::consumption::{ConsumptionReport, build_report};
use crate::domain::models::MeterType;
use crate::domain::statistics::{
    FacilityStats, MaintenanceStats, MeterStats, facility_stats, maintenance_stats, meter_stats,
};
use crate::domain::validation::{DateWindow, ValidationError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("reading store failed: {0}")]
    Store(#[from] ServiceError),
}

pub fn meter_consumption_report<S>(
    store: &S,
    meter_id: i64,
    window: DateWindow,
) -> Result<ConsumptionReport, ReportError>
where
    S: MeterQueryHandler + ?Sized,
{
    let meter = store
        .get_meter(meter_id)?
        .ok_or(ValidationError::UnknownMeter(meter_id))?;
    let readings = store.list_readings(meter.id)?;

    let report = build_report(meter.id, meter.meter_type, &readings, window);

    let clamped = report.periods.iter().filter(|line| line.clamped).count();
    if clamped > 0 {
        tracing::warn!(
            meter_id = meter.id,
            serial_number = %meter.serial_number,
            clamped,
            "negative consumption clamped to zero; meter reset or replacement suspected"
        );
    }

    Ok(report)
}

pub fn facility_overview<S>(store: &S) -> Result<FacilityStats, ServiceError>
where
    S: RegistryQueryHandler + ?Sized,
{
    let facilities = store.list_facilities()?;
    Ok(facility_stats(&facilities))
}

pub fn maintenance_overview<S>(store: &S, today: NaiveDate) -> Result<MaintenanceStats, ServiceError>
where
    S: RegistryQueryHandler + ?Sized,
{
    let records = store.list_maintenance_records()?;
    Ok(maintenance_stats(&records, today))
}

pub fn meter_overview<S>(store: &S) -> Result<MeterStats, ServiceError>
where
    S: MeterQueryHandler + ?Sized,
{
    let meters = store.list_meters()?;
    Ok(meter_stats(&meters))
}

pub fn readings_by_meter_type<S>(store: &S) -> Result<BTreeMap<MeterType, i64>, ServiceError>
where
    S: MeterQueryHandler + ?Sized,
{
    let mut counts = BTreeMap::new();
    for meter_type in MeterType::ALL {
        counts.insert(meter_type, store.count_readings_by_meter_type(meter_type)?);
    }
    Ok(counts)
}
