use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::models::{
    Facility, FacilityStatus, MaintenanceRecord, MaintenanceStatus, Meter, MeterStatus, MeterType,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityStats {
    pub total: usize,
    pub active: usize,
    pub under_renovation: usize,
    pub under_construction: usize,
    pub inactive: usize,
    pub decommissioned: usize,
    pub total_area: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStats {
    pub total: usize,
    pub scheduled: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub overdue: usize,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterStats {
    pub total: usize,
    pub electric: usize,
    pub gas: usize,
    pub water: usize,
    pub heating: usize,
    pub active: usize,
    pub inactive: usize,
    pub broken: usize,
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(0.0)
}

pub fn facility_stats(facilities: &[Facility]) -> FacilityStats {
    let mut stats = FacilityStats {
        total: facilities.len(),
        ..FacilityStats::default()
    };

    for facility in facilities {
        match facility.status {
            Some(FacilityStatus::Active) => stats.active += 1,
            Some(FacilityStatus::UnderRenovation) => stats.under_renovation += 1,
            Some(FacilityStatus::UnderConstruction) => stats.under_construction += 1,
            Some(FacilityStatus::Inactive) => stats.inactive += 1,
            Some(FacilityStatus::Decommissioned) => stats.decommissioned += 1,
            None => {}
        }
        stats.total_area += finite_or_zero(facility.area);
    }

    stats
}

pub fn is_overdue(record: &MaintenanceRecord, today: NaiveDate) -> bool {
    record.status != Some(MaintenanceStatus::Completed)
        && record.next_maintenance.is_some_and(|due| due < today)
}

pub fn maintenance_stats(records: &[MaintenanceRecord], today: NaiveDate) -> MaintenanceStats {
    let mut stats = MaintenanceStats {
        total: records.len(),
        ..MaintenanceStats::default()
    };

    for record in records {
        match record.status {
            Some(MaintenanceStatus::Scheduled) => stats.scheduled += 1,
            Some(MaintenanceStatus::InProgress) => stats.in_progress += 1,
            Some(MaintenanceStatus::Completed) => stats.completed += 1,
            Some(MaintenanceStatus::Cancelled) => stats.cancelled += 1,
            None => {}
        }
        if is_overdue(record, today) {
            stats.overdue += 1;
        }
        stats.total_cost += finite_or_zero(record.cost);
    }

    stats
}

pub fn meter_stats(meters: &[Meter]) -> MeterStats {
    let mut stats = MeterStats {
        total: meters.len(),
        ..MeterStats::default()
    };

    for meter in meters {
        match meter.meter_type {
            MeterType::Electric => stats.electric += 1,
            MeterType::Gas => stats.gas += 1,
            MeterType::Water => stats.water += 1,
            MeterType::Heating => stats.heating += 1,
        }
        match meter.status {
            MeterStatus::Active => stats.active += 1,
            MeterStatus::Inactive => stats.inactive += 1,
            MeterStatus::Broken => stats.broken += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{facility_stats, maintenance_stats, meter_stats};
    use crate::domain::models::{
        Facility, FacilityStatus, MaintenanceRecord, MaintenanceStatus, Meter, MeterStatus,
        MeterType,
    };

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("test date should parse")
    }

    fn facility(status: Option<FacilityStatus>, area: Option<f64>) -> Facility {
        Facility {
            id: 1,
            name: "Depot".to_string(),
            facility_type: "Warehouse".to_string(),
            location: None,
            status,
            area,
        }
    }

    fn maintenance(
        status: Option<MaintenanceStatus>,
        cost: Option<f64>,
        next_maintenance: Option<&str>,
    ) -> MaintenanceRecord {
        MaintenanceRecord {
            id: 1,
            facility_id: 1,
            description: "Boiler inspection".to_string(),
            status,
            cost,
            scheduled_date: date("2025-01-01"),
            next_maintenance: next_maintenance.map(date),
        }
    }

    #[test]
    fn counts_facilities_by_status_and_sums_area() {
        let stats = facility_stats(&[
            facility(Some(FacilityStatus::Active), Some(1200.5)),
            facility(Some(FacilityStatus::Active), None),
            facility(Some(FacilityStatus::UnderRenovation), Some(300.0)),
            facility(Some(FacilityStatus::Decommissioned), Some(f64::NAN)),
        ]);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.under_renovation, 1);
        assert_eq!(stats.decommissioned, 1);
        assert_eq!(stats.under_construction, 0);
        assert!((stats.total_area - 1500.5).abs() < 1e-9);
    }

    #[test]
    fn empty_inputs_yield_zero_counts() {
        assert_eq!(facility_stats(&[]).total, 0);
        assert_eq!(maintenance_stats(&[], date("2025-01-01")).total_cost, 0.0);
        assert_eq!(meter_stats(&[]).total, 0);
    }

    #[test]
    fn overdue_excludes_completed_and_future_work() {
        let today = date("2025-06-15");
        let stats = maintenance_stats(
            &[
                maintenance(
                    Some(MaintenanceStatus::Scheduled),
                    Some(250.0),
                    Some("2025-06-01"),
                ),
                maintenance(Some(MaintenanceStatus::InProgress), None, Some("2025-06-14")),
                maintenance(
                    Some(MaintenanceStatus::Completed),
                    Some(100.0),
                    Some("2025-01-01"),
                ),
                maintenance(Some(MaintenanceStatus::Scheduled), Some(50.0), Some("2025-06-15")),
                maintenance(Some(MaintenanceStatus::Cancelled), None, None),
            ],
            today,
        );

        assert_eq!(stats.total, 5);
        assert_eq!(stats.scheduled, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.overdue, 2);
        assert!((stats.total_cost - 400.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_statuses_count_in_total_only() {
        let facilities = facility_stats(&[
            facility(Some(FacilityStatus::Active), Some(100.0)),
            facility(None, Some(50.0)),
        ]);
        assert_eq!(facilities.total, 2);
        assert_eq!(facilities.active, 1);
        assert_eq!(
            facilities.under_renovation
                + facilities.under_construction
                + facilities.inactive
                + facilities.decommissioned,
            0
        );
        assert!((facilities.total_area - 150.0).abs() < 1e-9);

        let records = maintenance_stats(
            &[maintenance(None, Some(80.0), Some("2025-01-01"))],
            date("2025-06-15"),
        );
        assert_eq!(records.total, 1);
        assert_eq!(
            records.scheduled + records.in_progress + records.completed + records.cancelled,
            0
        );
        assert_eq!(records.overdue, 1);
    }

    #[test]
    fn counts_meters_by_type_and_status() {
        let meter = |meter_type, status| Meter {
            id: 1,
            facility_id: 1,
            serial_number: "E-1".to_string(),
            meter_type,
            location: None,
            installation_date: None,
            status,
        };

        let stats = meter_stats(&[
            meter(MeterType::Electric, MeterStatus::Active),
            meter(MeterType::Electric, MeterStatus::Broken),
            meter(MeterType::Gas, MeterStatus::Active),
            meter(MeterType::Heating, MeterStatus::Inactive),
        ]);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.electric, 2);
        assert_eq!(stats.gas, 1);
        assert_eq!(stats.water, 0);
        assert_eq!(stats.heating, 1);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.broken, 1);
        assert_eq!(stats.inactive, 1);
    }
}
