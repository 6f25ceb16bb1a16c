//! Temperature risk bands

use super::{RiskComponent, VitalField, VitalRule};
use crate::record::RawPatientRecord;
use crate::validation::{parse_temperature, Temperature, Validated};

/// Lower bound of the low-grade fever band, in °F
pub const LOW_FEVER_F: f64 = 99.6;

/// Lower bound of the high fever band, in °F
pub const HIGH_FEVER_F: f64 = 101.0;

/// Score a validated temperature (0-2)
pub fn temperature_risk(reading: &Validated<Temperature>) -> RiskComponent {
    RiskComponent::from_validated(reading, |temperature| {
        let fahrenheit = temperature.fahrenheit;
        if fahrenheit >= HIGH_FEVER_F {
            2
        } else if fahrenheit >= LOW_FEVER_F {
            1
        } else {
            0
        }
    })
}

/// Rule scoring the `temperature` field
#[derive(Debug, Default, Clone, Copy)]
pub struct TemperatureRule;

impl TemperatureRule {
    pub fn new() -> Self {
        Self
    }
}

impl VitalRule for TemperatureRule {
    fn id(&self) -> &str {
        "temperature_bands"
    }

    fn field(&self) -> VitalField {
        VitalField::Temperature
    }

    fn max_score(&self) -> u8 {
        2
    }

    fn evaluate(&self, record: &RawPatientRecord) -> RiskComponent {
        temperature_risk(&parse_temperature(record.temperature()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(fahrenheit: f64) -> u8 {
        temperature_risk(&Validated::Valid(Temperature::new(fahrenheit))).score()
    }

    #[test]
    fn test_bands() {
        assert_eq!(score(97.0), 0);
        assert_eq!(score(99.5), 0);
        assert_eq!(score(99.55), 0);
        assert_eq!(score(99.6), 1);
        assert_eq!(score(100.9), 1);
        assert_eq!(score(101.0), 2);
        assert_eq!(score(104.2), 2);
    }

    #[test]
    fn test_invalid_reading() {
        assert_eq!(temperature_risk(&Validated::Invalid), RiskComponent::INVALID);
    }

    #[test]
    fn test_rule_reads_record() {
        let rule = TemperatureRule::new();

        let record = RawPatientRecord::from(json!({"patient_id": "p1", "temperature": "99.9"}));
        assert_eq!(rule.evaluate(&record), RiskComponent::scored(1));

        let record = RawPatientRecord::from(json!({"patient_id": "p1", "temperature": 102}));
        assert_eq!(rule.evaluate(&record), RiskComponent::scored(2));

        let record = RawPatientRecord::from(json!({"patient_id": "p1", "temperature": "TEMP_ERROR"}));
        assert_eq!(rule.evaluate(&record), RiskComponent::INVALID);
    }
}
