//! Age risk bands

use super::{RiskComponent, VitalField, VitalRule};
use crate::record::RawPatientRecord;
use crate::validation::{parse_age, Age, Validated};

/// Score a validated age (0-2)
pub fn age_risk(age: &Validated<Age>) -> RiskComponent {
    RiskComponent::from_validated(age, |age| match age.years {
        years if years > 65 => 2,
        40..=65 => 1,
        _ => 0,
    })
}

/// Rule scoring the `age` field
#[derive(Debug, Default, Clone, Copy)]
pub struct AgeRule;

impl AgeRule {
    pub fn new() -> Self {
        Self
    }
}

impl VitalRule for AgeRule {
    fn id(&self) -> &str {
        "age_bands"
    }

    fn field(&self) -> VitalField {
        VitalField::Age
    }

    fn max_score(&self) -> u8 {
        2
    }

    fn evaluate(&self, record: &RawPatientRecord) -> RiskComponent {
        age_risk(&parse_age(record.age()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(years: u32) -> u8 {
        age_risk(&Validated::Valid(Age::new(years))).score()
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(score(39), 0);
        assert_eq!(score(40), 1);
        assert_eq!(score(65), 1);
        assert_eq!(score(66), 2);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(score(1), 0);
        assert_eq!(score(120), 2);
    }

    #[test]
    fn test_rule_reads_record() {
        let rule = AgeRule::new();

        let record = RawPatientRecord::from(json!({"patient_id": "p1", "age": "70"}));
        assert_eq!(rule.evaluate(&record), RiskComponent::scored(2));

        let record = RawPatientRecord::from(json!({"patient_id": "p1", "age": "unknown"}));
        assert_eq!(rule.evaluate(&record), RiskComponent::INVALID);
    }
}
