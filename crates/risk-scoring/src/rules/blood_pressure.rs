//! Blood pressure risk bands
//!
//! Bands are tested in a fixed order and the first match wins, so a reading
//! whose systolic and diastolic values fall in different bands takes the
//! higher one.

use super::{RiskComponent, VitalField, VitalRule};
use crate::record::RawPatientRecord;
use crate::validation::{parse_blood_pressure, BloodPressure, Validated};

/// Score a validated blood pressure reading (0-3)
pub fn blood_pressure_risk(reading: &Validated<BloodPressure>) -> RiskComponent {
    RiskComponent::from_validated(reading, |bp| {
        let BloodPressure {
            systolic,
            diastolic,
        } = *bp;

        if systolic >= 140 || diastolic >= 90 {
            // Stage 2
            3
        } else if (130..=139).contains(&systolic) || (80..=89).contains(&diastolic) {
            // Stage 1
            2
        } else if (120..=129).contains(&systolic) && diastolic < 80 {
            // Elevated
            1
        } else {
            0
        }
    })
}

/// Rule scoring the `blood_pressure` field
#[derive(Debug, Default, Clone, Copy)]
pub struct BloodPressureRule;

impl BloodPressureRule {
    pub fn new() -> Self {
        Self
    }
}

impl VitalRule for BloodPressureRule {
    fn id(&self) -> &str {
        "blood_pressure_bands"
    }

    fn field(&self) -> VitalField {
        VitalField::BloodPressure
    }

    fn max_score(&self) -> u8 {
        3
    }

    fn evaluate(&self, record: &RawPatientRecord) -> RiskComponent {
        blood_pressure_risk(&parse_blood_pressure(record.blood_pressure()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(systolic: u32, diastolic: u32) -> u8 {
        blood_pressure_risk(&Validated::Valid(BloodPressure::new(systolic, diastolic))).score()
    }

    #[test]
    fn test_normal() {
        assert_eq!(score(110, 70), 0);
        assert_eq!(score(119, 79), 0);
    }

    #[test]
    fn test_elevated() {
        assert_eq!(score(120, 79), 1);
        assert_eq!(score(129, 60), 1);
    }

    #[test]
    fn test_stage_one() {
        assert_eq!(score(130, 70), 2);
        assert_eq!(score(139, 79), 2);
        assert_eq!(score(115, 80), 2);
        assert_eq!(score(110, 89), 2);
    }

    #[test]
    fn test_stage_two() {
        assert_eq!(score(140, 70), 3);
        assert_eq!(score(110, 90), 3);
        assert_eq!(score(200, 120), 3);
    }

    #[test]
    fn test_mixed_bands_take_first_match() {
        // Elevated systolic with stage 1 diastolic
        assert_eq!(score(125, 85), 2);
        // Normal systolic with stage 2 diastolic
        assert_eq!(score(100, 95), 3);
        // Stage 1 systolic with stage 2 diastolic
        assert_eq!(score(135, 92), 3);
    }

    #[test]
    fn test_invalid_reading() {
        let component = blood_pressure_risk(&Validated::Invalid);
        assert!(component.is_invalid());
        assert_eq!(component.score(), 0);
    }

    #[test]
    fn test_rule_reads_record() {
        let rule = BloodPressureRule::new();
        assert_eq!(rule.field(), VitalField::BloodPressure);

        let record = RawPatientRecord::from(json!({"patient_id": "p1", "blood_pressure": "145/95"}));
        assert_eq!(rule.evaluate(&record), RiskComponent::scored(3));

        let record = RawPatientRecord::from(json!({"patient_id": "p1", "blood_pressure": "150/"}));
        assert_eq!(rule.evaluate(&record), RiskComponent::INVALID);

        let record = RawPatientRecord::from(json!({"patient_id": "p1"}));
        assert_eq!(rule.evaluate(&record), RiskComponent::INVALID);
    }
}
