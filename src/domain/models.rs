use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterType {
    Electric,
    Gas,
    Water,
    Heating,
}

impl MeterType {
    pub const ALL: [Self; 4] = [Self::Electric, Self::Gas, Self::Water, Self::Heating];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Electric => "electric",
            Self::Gas => "gas",
            Self::Water => "water",
            Self::Heating => "heating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterStatus {
    Active,
    Inactive,
    Broken,
}

impl MeterStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Inactive, Self::Broken];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Broken => "broken",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FacilityStatus {
    #[serde(rename = "Active")]
    Active,
    #[serde(rename = "Under Renovation")]
    UnderRenovation,
    #[serde(rename = "Under Construction")]
    UnderConstruction,
    #[serde(rename = "Inactive")]
    Inactive,
    #[serde(rename = "Decommissioned")]
    Decommissioned,
}

impl FacilityStatus {
    pub const ALL: [Self; 5] = [
        Self::Active,
        Self::UnderRenovation,
        Self::UnderConstruction,
        Self::Inactive,
        Self::Decommissioned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::UnderRenovation => "Under Renovation",
            Self::UnderConstruction => "Under Construction",
            Self::Inactive => "Inactive",
            Self::Decommissioned => "Decommissioned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub const ALL: [Self; 4] = [
        Self::Scheduled,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Folds case, spaces and dashes so `Under Renovation`, `under-renovation`
/// and `UNDER_RENOVATION` all land on the same label.
fn normalize_label(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

fn parse_label<T: Copy>(
    field: &'static str,
    raw: &str,
    candidates: &[T],
    label: impl Fn(T) -> &'static str,
) -> Result<T, ValidationError> {
    let wanted = normalize_label(raw);
    candidates
        .iter()
        .copied()
        .find(|candidate| normalize_label(label(*candidate)) == wanted)
        .ok_or_else(|| ValidationError::UnknownLabel {
            field,
            value: raw.to_string(),
        })
}

impl FromStr for MeterType {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_label("meter type", raw, &Self::ALL, Self::as_str)
    }
}

impl FromStr for MeterStatus {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_label("meter status", raw, &Self::ALL, Self::as_str)
    }
}

impl FromStr for FacilityStatus {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_label("facility status", raw, &Self::ALL, Self::as_str)
    }
}

impl FromStr for MaintenanceStatus {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_label("maintenance status", raw, &Self::ALL, Self::as_str)
    }
}

impl fmt::Display for MeterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MeterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    pub id: i64,
    pub name: String,
    pub facility_type: String,
    pub location: Option<String>,
    /// `None` when the stored label is not a known status.
    pub status: Option<FacilityStatus>,
    pub area: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFacility {
    pub name: String,
    pub facility_type: String,
    pub location: Option<String>,
    pub status: FacilityStatus,
    pub area: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Meter {
    pub id: i64,
    pub facility_id: i64,
    pub serial_number: String,
    pub meter_type: MeterType,
    pub location: Option<String>,
    pub installation_date: Option<NaiveDate>,
    pub status: MeterStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMeter {
    pub facility_id: i64,
    pub serial_number: String,
    pub meter_type: MeterType,
    pub location: Option<String>,
    pub installation_date: Option<NaiveDate>,
    pub status: MeterStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub id: i64,
    pub meter_id: i64,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub meter_id: i64,
    pub date: NaiveDate,
    pub value: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceRecord {
    pub id: i64,
    pub facility_id: i64,
    pub description: String,
    pub status: Option<MaintenanceStatus>,
    pub cost: Option<f64>,
    pub scheduled_date: NaiveDate,
    pub next_maintenance: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMaintenanceRecord {
    pub facility_id: i64,
    pub description: String,
    pub status: MaintenanceStatus,
    pub cost: Option<f64>,
    pub scheduled_date: NaiveDate,
    pub next_maintenance: Option<NaiveDate>,
}
