use serde::Serialize;

use crate::domain::models::MeterType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "kWh")]
    KilowattHours,
    #[serde(rename = "MWh")]
    MegawattHours,
    #[serde(rename = "m³")]
    CubicMeters,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::KilowattHours => "kWh",
            Self::MegawattHours => "MWh",
            Self::CubicMeters => "m³",
        }
    }
}

/// Fixed conversion from a meter's native unit to the unit reports use.
///
/// Stored readings always stay in the native unit; conversion happens only
/// when a figure leaves the calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    pub native: Unit,
    pub reporting: Unit,
    pub factor: f64,
}

impl UnitConversion {
    pub fn for_meter_type(meter_type: MeterType) -> Self {
        match meter_type {
            MeterType::Electric | MeterType::Heating => Self {
                native: Unit::KilowattHours,
                reporting: Unit::MegawattHours,
                factor: 0.001,
            },
            // 1 m³ of gas is booked as 0.01 MWh.
            MeterType::Gas => Self {
                native: Unit::CubicMeters,
                reporting: Unit::MegawattHours,
                factor: 0.01,
            },
            MeterType::Water => Self {
                native: Unit::CubicMeters,
                reporting: Unit::CubicMeters,
                factor: 1.0,
            },
        }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.factor
    }
}

#[cfg(test)]
mod tests {
    use super::{Unit, UnitConversion};
    use crate::domain::models::MeterType;

    #[test]
    fn converts_gas_cubic_meters_to_megawatt_hours() {
        let conversion = UnitConversion::for_meter_type(MeterType::Gas);

        assert_eq!(conversion.native, Unit::CubicMeters);
        assert_eq!(conversion.reporting, Unit::MegawattHours);
        assert!((conversion.apply(1000.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn converts_electric_kilowatt_hours_to_megawatt_hours() {
        let conversion = UnitConversion::for_meter_type(MeterType::Electric);
        assert!((conversion.apply(97.0) - 0.097).abs() < 1e-12);
    }

    #[test]
    fn leaves_water_volumes_unchanged() {
        let conversion = UnitConversion::for_meter_type(MeterType::Water);
        assert_eq!(conversion.apply(42.5), 42.5);
        assert_eq!(conversion.reporting.symbol(), "m³");
    }
}
