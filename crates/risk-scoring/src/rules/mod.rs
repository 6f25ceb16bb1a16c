//! Risk rule framework
//!
//! Each vital sign has a pure band function (`blood_pressure_risk`,
//! `temperature_risk`, `age_risk`) mapping a [`Validated`] value to a
//! [`RiskComponent`], and a [`VitalRule`] wrapper the engine registers.

pub mod age;
pub mod blood_pressure;
pub mod temperature;

pub use age::{age_risk, AgeRule};
pub use blood_pressure::{blood_pressure_risk, BloodPressureRule};
pub use temperature::{temperature_risk, TemperatureRule};

use crate::record::RawPatientRecord;
use crate::validation::Validated;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The vital signs a rule can score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalField {
    BloodPressure,
    Temperature,
    Age,
}

impl VitalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalField::BloodPressure => "blood_pressure",
            VitalField::Temperature => "temperature",
            VitalField::Age => "age",
        }
    }
}

impl fmt::Display for VitalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score contributed by one vital sign.
///
/// An invalid component always scores zero. A valid component may also score
/// zero when the reading falls in the normal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RiskComponentRepr")]
pub struct RiskComponent {
    score: u8,
    invalid: bool,
}

impl RiskComponent {
    /// Component for a field that failed validation
    pub const INVALID: RiskComponent = RiskComponent {
        score: 0,
        invalid: true,
    };

    /// Component for a successfully validated field
    pub fn scored(score: u8) -> Self {
        Self {
            score,
            invalid: false,
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Apply `band` to a valid value, or produce [`RiskComponent::INVALID`]
    pub fn from_validated<T>(field: &Validated<T>, band: impl FnOnce(&T) -> u8) -> Self {
        match field {
            Validated::Valid(value) => Self::scored(band(value)),
            Validated::Invalid => Self::INVALID,
        }
    }
}

#[derive(Deserialize)]
struct RiskComponentRepr {
    score: u8,
    invalid: bool,
}

impl TryFrom<RiskComponentRepr> for RiskComponent {
    type Error = String;

    fn try_from(repr: RiskComponentRepr) -> Result<Self, Self::Error> {
        if repr.invalid && repr.score != 0 {
            return Err(format!("invalid component must score 0, got {}", repr.score));
        }
        Ok(if repr.invalid {
            Self::INVALID
        } else {
            Self::scored(repr.score)
        })
    }
}

/// A scoring rule for one vital sign.
///
/// Rules are deterministic and never fail: a field that cannot be validated
/// produces [`RiskComponent::INVALID`].
pub trait VitalRule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &str;

    /// The vital sign this rule reads
    fn field(&self) -> VitalField;

    /// Highest score this rule can produce
    fn max_score(&self) -> u8;

    /// Validate and score the rule's field on `record`
    fn evaluate(&self, record: &RawPatientRecord) -> RiskComponent;
}
