use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::models::{MeterType, Reading};
use crate::domain::units::{Unit, UnitConversion};
use crate::domain::validation::DateWindow;

/// Consumption inferred for one reading against the nearest earlier reading
/// that carries a value. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionPeriod {
    pub meter_id: i64,
    pub date: NaiveDate,
    pub current_value: Option<f64>,
    pub previous_value: Option<f64>,
    pub delta: f64,
    /// The raw difference was negative (meter replaced or reset) and got
    /// reported as zero.
    pub clamped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowTotal {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodLine {
    pub date: NaiveDate,
    pub delta: f64,
    pub converted_delta: f64,
    pub clamped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionReport {
    pub meter_id: i64,
    pub meter_type: MeterType,
    pub native_unit: Unit,
    pub reporting_unit: Unit,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub periods: Vec<PeriodLine>,
    pub monthly: BTreeMap<String, f64>,
    pub total_raw: f64,
    pub total_converted: f64,
}

fn ordered_by_date(readings: &[Reading]) -> Vec<&Reading> {
    let mut ordered: Vec<&Reading> = readings.iter().collect();
    ordered.sort_by_key(|reading| reading.date);
    ordered
}

/// Pairwise deltas for every reading after the first.
///
/// Null values never serve as the previous value; a null current value yields
/// a zero delta. Negative differences are clamped to zero.
pub fn consumption_periods(readings: &[Reading]) -> Vec<ConsumptionPeriod> {
    let ordered = ordered_by_date(readings);
    let Some((first, rest)) = ordered.split_first() else {
        return Vec::new();
    };

    let mut previous_value = first.value;
    let mut periods = Vec::with_capacity(rest.len());

    for reading in rest {
        let (delta, clamped) = match (reading.value, previous_value) {
            (Some(current), Some(previous)) => {
                let raw_delta = current - previous;
                if raw_delta < 0.0 {
                    (0.0, true)
                } else {
                    (raw_delta, false)
                }
            }
            _ => (0.0, false),
        };

        periods.push(ConsumptionPeriod {
            meter_id: reading.meter_id,
            date: reading.date,
            current_value: reading.value,
            previous_value,
            delta,
            clamped,
        });

        if reading.value.is_some() {
            previous_value = reading.value;
        }
    }

    periods
}

/// Boundary difference between the first and the last reading inside the
/// window. Interior deltas (and any reset between them) are ignored.
pub fn window_total(readings: &[Reading], window: &DateWindow) -> WindowTotal {
    let ordered = ordered_by_date(readings);
    let mut inside = ordered
        .into_iter()
        .filter(|reading| window.contains(reading.date));

    let Some(first) = inside.next() else {
        return WindowTotal {
            first_date: None,
            last_date: None,
            total: 0.0,
        };
    };
    let last = inside.last().unwrap_or(first);

    WindowTotal {
        first_date: Some(first.date),
        last_date: Some(last.date),
        total: last.value.unwrap_or(0.0) - first.value.unwrap_or(0.0),
    }
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Sums converted deltas per `YYYY-MM`; the map iterates chronologically.
pub fn monthly_rollup(
    periods: &[ConsumptionPeriod],
    conversion: &UnitConversion,
) -> BTreeMap<String, f64> {
    let mut months = BTreeMap::new();
    for period in periods {
        *months.entry(month_key(period.date)).or_insert(0.0) += conversion.apply(period.delta);
    }
    months
}

/// Daily lines and monthly sums use clamped deltas; the totals use boundary
/// differencing. The two are reported side by side and can disagree when a
/// meter was replaced inside the window.
///
/// Deltas are computed over the whole history before the window is applied,
/// so the first line in the window is differenced against the reading just
/// before it.
pub fn build_report(
    meter_id: i64,
    meter_type: MeterType,
    readings: &[Reading],
    window: DateWindow,
) -> ConsumptionReport {
    let conversion = UnitConversion::for_meter_type(meter_type);

    let periods: Vec<ConsumptionPeriod> = consumption_periods(readings)
        .into_iter()
        .filter(|period| window.contains(period.date))
        .collect();
    let monthly = monthly_rollup(&periods, &conversion);
    let total = window_total(readings, &window);

    ConsumptionReport {
        meter_id,
        meter_type,
        native_unit: conversion.native,
        reporting_unit: conversion.reporting,
        from: window.from,
        to: window.to,
        periods: periods
            .iter()
            .map(|period| PeriodLine {
                date: period.date,
                delta: period.delta,
                converted_delta: conversion.apply(period.delta),
                clamped: period.clamped,
            })
            .collect(),
        monthly,
        total_raw: total.total,
        total_converted: conversion.apply(total.total),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{build_report, consumption_periods, month_key, monthly_rollup, window_total};
    use crate::domain::models::{MeterType, Reading};
    use crate::domain::units::UnitConversion;
    use crate::domain::validation::DateWindow;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("test date should parse")
    }

    fn readings(values: &[(&str, Option<f64>)]) -> Vec<Reading> {
        values
            .iter()
            .enumerate()
            .map(|(idx, (day, value))| Reading {
                id: idx as i64 + 1,
                meter_id: 7,
                date: date(day),
                value: *value,
                notes: None,
            })
            .collect()
    }

    #[test]
    fn computes_pairwise_deltas_and_boundary_total() {
        let series = readings(&[
            ("2025-01-02", Some(4657.0)),
            ("2025-01-05", Some(4728.0)),
            ("2025-01-06", Some(4754.0)),
        ]);

        let periods = consumption_periods(&series);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].date, date("2025-01-05"));
        assert_eq!(periods[0].delta, 71.0);
        assert_eq!(periods[0].previous_value, Some(4657.0));
        assert_eq!(periods[1].delta, 26.0);

        let window = DateWindow::parse(Some("2025-01-02"), Some("2025-01-06"))
            .expect("window should be valid");
        let total = window_total(&series, &window);
        assert_eq!(total.total, 97.0);
        assert_eq!(total.first_date, Some(date("2025-01-02")));
        assert_eq!(total.last_date, Some(date("2025-01-06")));
    }

    #[test]
    fn orders_by_date_not_by_insertion() {
        let series = readings(&[
            ("2025-01-06", Some(4754.0)),
            ("2025-01-02", Some(4657.0)),
            ("2025-01-05", Some(4728.0)),
        ]);

        let deltas: Vec<f64> = consumption_periods(&series)
            .iter()
            .map(|period| period.delta)
            .collect();
        assert_eq!(deltas, vec![71.0, 26.0]);
    }

    #[test]
    fn clamps_meter_reset_to_zero() {
        let series = readings(&[
            ("2025-03-01", Some(9800.0)),
            ("2025-03-02", Some(9850.0)),
            ("2025-03-03", Some(12.0)),
            ("2025-03-04", Some(40.0)),
        ]);

        let periods = consumption_periods(&series);
        assert!(periods.iter().all(|period| period.delta >= 0.0));
        assert_eq!(periods[1].delta, 0.0);
        assert!(periods[1].clamped);
        assert_eq!(periods[2].delta, 28.0);
        assert!(!periods[2].clamped);
    }

    #[test]
    fn total_ignores_interior_resets() {
        let series = readings(&[
            ("2025-03-01", Some(9800.0)),
            ("2025-03-03", Some(12.0)),
            ("2025-03-04", Some(9900.0)),
        ]);

        let total = window_total(&series, &DateWindow::default());
        assert_eq!(total.total, 100.0);
    }

    #[test]
    fn null_values_are_skipped_as_previous_and_zero_in_sums() {
        let series = readings(&[
            ("2025-01-01", Some(100.0)),
            ("2025-01-02", None),
            ("2025-01-03", Some(130.0)),
        ]);

        let periods = consumption_periods(&series);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].delta, 0.0);
        assert_eq!(periods[0].current_value, None);
        assert_eq!(periods[1].previous_value, Some(100.0));
        assert_eq!(periods[1].delta, 30.0);

        let summed: f64 = periods.iter().map(|period| period.delta).sum();
        assert_eq!(summed, 30.0);
    }

    #[test]
    fn null_boundary_counts_as_zero_in_total() {
        let series = readings(&[("2025-01-01", None), ("2025-01-03", Some(130.0))]);
        let total = window_total(&series, &DateWindow::default());
        assert_eq!(total.total, 130.0);
    }

    #[test]
    fn empty_and_single_reading_series_do_not_fail() {
        let empty: Vec<Reading> = Vec::new();
        assert!(consumption_periods(&empty).is_empty());
        assert_eq!(window_total(&empty, &DateWindow::default()).total, 0.0);

        let single = readings(&[("2025-01-01", Some(500.0))]);
        assert!(consumption_periods(&single).is_empty());
        assert_eq!(window_total(&single, &DateWindow::default()).total, 0.0);

        let report = build_report(7, MeterType::Electric, &empty, DateWindow::default());
        assert!(report.periods.is_empty());
        assert!(report.monthly.is_empty());
        assert_eq!(report.total_converted, 0.0);
    }

    #[test]
    fn monthly_rollup_matches_daily_sums() {
        let series = readings(&[
            ("2025-01-30", Some(1000.0)),
            ("2025-01-31", Some(1010.0)),
            ("2025-02-01", Some(1030.0)),
            ("2025-02-15", Some(1100.0)),
            ("2024-12-31", Some(990.0)),
        ]);
        let conversion = UnitConversion::for_meter_type(MeterType::Gas);
        let periods = consumption_periods(&series);
        let months = monthly_rollup(&periods, &conversion);

        let keys: Vec<&str> = months.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2025-01", "2025-02"]);
        assert!((months["2025-01"] - 0.2).abs() < 1e-9);
        assert!((months["2025-02"] - 0.9).abs() < 1e-9);

        let all_converted: f64 = periods
            .iter()
            .map(|period| conversion.apply(period.delta))
            .sum();
        let rolled_up: f64 = months.values().sum();
        assert!((all_converted - rolled_up).abs() < 1e-9);
    }

    #[test]
    fn month_key_is_first_seven_characters_of_the_date() {
        assert_eq!(month_key(date("2025-01-05")), "2025-01");
        assert_eq!(month_key(date("2025-11-30")), "2025-11");
    }

    #[test]
    fn gas_report_converts_total_to_megawatt_hours() {
        let series = readings(&[("2025-01-01", Some(2500.0)), ("2025-01-31", Some(3500.0))]);

        let report = build_report(7, MeterType::Gas, &series, DateWindow::default());

        assert_eq!(report.total_raw, 1000.0);
        assert!((report.total_converted - 10.0).abs() < 1e-9);
        assert_eq!(report.native_unit.symbol(), "m³");
        assert_eq!(report.reporting_unit.symbol(), "MWh");
    }

    #[test]
    fn report_window_keeps_delta_against_reading_before_window() {
        let series = readings(&[
            ("2025-01-02", Some(4657.0)),
            ("2025-01-05", Some(4728.0)),
            ("2025-01-06", Some(4754.0)),
        ]);
        let window =
            DateWindow::parse(Some("2025-01-05"), None).expect("window should be valid");

        let report = build_report(7, MeterType::Electric, &series, window);

        assert_eq!(report.periods.len(), 2);
        assert_eq!(report.periods[0].delta, 71.0);
        // Boundary differencing only sees readings inside the window.
        assert_eq!(report.total_raw, 26.0);
        assert!((report.periods[0].converted_delta - 0.071).abs() < 1e-12);
    }
}
