use chrono::NaiveDate;

use crate::app::ingestion::{IngestionError, upsert_reading};
use crate::app::services::{
    MeterQueryHandler, ReadingCommandHandler, RegistryCommandHandler, RegistryQueryHandler,
};
use crate::domain::models::{
    FacilityStatus, MaintenanceStatus, MeterStatus, MeterType, NewFacility,
    NewMaintenanceRecord, NewMeter,
};
use crate::domain::validation::parse_reading_date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub facilities: usize,
    pub meters: usize,
    pub readings: usize,
    pub maintenance_records: usize,
}

struct DemoMeter {
    facility: usize,
    serial_number: &'static str,
    meter_type: MeterType,
    location: &'static str,
    status: MeterStatus,
    readings: &'static [(&'static str, f64)],
}

const DEMO_FACILITIES: &[(&str, &str, &str, FacilityStatus, Option<f64>)] = &[
    (
        "Headquarters",
        "Office",
        "Main Street 1",
        FacilityStatus::Active,
        Some(4200.0),
    ),
    (
        "North Warehouse",
        "Storage",
        "Harbour Road 12",
        FacilityStatus::UnderRenovation,
        Some(1800.0),
    ),
    (
        "Training Center",
        "Education",
        "Campus West",
        FacilityStatus::UnderConstruction,
        None,
    ),
];

const DEMO_METERS: &[DemoMeter] = &[
    DemoMeter {
        facility: 0,
        serial_number: "E-1001",
        meter_type: MeterType::Electric,
        location: "Basement switch room",
        status: MeterStatus::Active,
        readings: &[
            ("2025-01-02", 4657.0),
            ("2025-01-05", 4728.0),
            ("2025-01-06", 4754.0),
            ("2025-01-31", 5390.0),
            ("2025-02-14", 5702.0),
            ("2025-02-28", 6011.0),
        ],
    },
    DemoMeter {
        facility: 0,
        serial_number: "G-2001",
        meter_type: MeterType::Gas,
        location: "Boiler room",
        status: MeterStatus::Active,
        readings: &[
            ("2025-01-01", 2500.0),
            ("2025-01-15", 2980.0),
            ("2025-01-31", 3500.0),
            ("2025-02-15", 3910.0),
        ],
    },
    DemoMeter {
        facility: 1,
        serial_number: "W-3001",
        meter_type: MeterType::Water,
        location: "Loading bay",
        status: MeterStatus::Active,
        readings: &[("2025-01-01", 118.0), ("2025-02-01", 131.5)],
    },
    DemoMeter {
        facility: 2,
        serial_number: "H-4001",
        meter_type: MeterType::Heating,
        location: "Plant room",
        status: MeterStatus::Inactive,
        readings: &[],
    },
];

/// Fills an empty store with a small demo estate. A store that already has
/// meters is left alone.
pub fn seed_demo_data<S>(store: &S) -> Result<SeedSummary, IngestionError>
where
    S: MeterQueryHandler
        + ReadingCommandHandler
        + RegistryQueryHandler
        + RegistryCommandHandler
        + ?Sized,
{
    let mut summary = SeedSummary::default();

    if store.count_meters()? > 0 {
        tracing::info!("store already holds meters; demo seed skipped");
        return Ok(summary);
    }

    let mut facility_ids = Vec::with_capacity(DEMO_FACILITIES.len());
    for (name, facility_type, location, status, area) in DEMO_FACILITIES {
        let facility_id = store.insert_facility(&NewFacility {
            name: (*name).to_string(),
            facility_type: (*facility_type).to_string(),
            location: Some((*location).to_string()),
            status: *status,
            area: *area,
        })?;
        facility_ids.push(facility_id);
        summary.facilities += 1;
    }

    for demo in DEMO_METERS {
        let meter_id = store.insert_meter(&NewMeter {
            facility_id: facility_ids[demo.facility],
            serial_number: demo.serial_number.to_string(),
            meter_type: demo.meter_type,
            location: Some(demo.location.to_string()),
            installation_date: NaiveDate::from_ymd_opt(2024, 12, 1),
            status: demo.status,
        })?;
        summary.meters += 1;

        for (date, value) in demo.readings {
            upsert_reading(store, meter_id, date, *value, None)?;
            summary.readings += 1;
        }
    }

    let maintenance = [
        (
            0,
            "Boiler service",
            MaintenanceStatus::Completed,
            Some(480.0),
            "2025-01-10",
            Some("2026-01-10"),
        ),
        (
            0,
            "Fire alarm test",
            MaintenanceStatus::Scheduled,
            Some(150.0),
            "2025-02-01",
            Some("2025-03-01"),
        ),
        (
            1,
            "Roof repair",
            MaintenanceStatus::InProgress,
            None,
            "2025-01-20",
            Some("2025-02-20"),
        ),
    ];
    for (facility, description, status, cost, scheduled, next) in maintenance {
        store.insert_maintenance_record(&NewMaintenanceRecord {
            facility_id: facility_ids[facility],
            description: description.to_string(),
            status,
            cost,
            scheduled_date: parse_reading_date(scheduled)?,
            next_maintenance: next.map(parse_reading_date).transpose()?,
        })?;
        summary.maintenance_records += 1;
    }

    tracing::info!(
        facilities = summary.facilities,
        meters = summary.meters,
        readings = summary.readings,
        maintenance_records = summary.maintenance_records,
        "demo data seeded"
    );

    Ok(summary)
}
