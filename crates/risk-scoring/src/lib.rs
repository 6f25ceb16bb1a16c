//! Risk Scoring
//!
//! Deterministic clinical risk scoring for raw patient records.
//!
//! ## Architecture
//!
//! 1. **Records** (`record`): opaque JSON patient records as received from the API.
//!
//! 2. **Validation** (`validation`): parses one raw vital (blood pressure,
//!    temperature, age) into a typed value or an `Invalid` marker.
//!
//! 3. **Rules** (`rules`): maps a validated vital to a banded [`RiskComponent`].
//!
//! 4. **Engine** (`engine`): runs the registered rules over a record sequence and
//!    aggregates the high-risk, fever and data-quality alert lists.
//!
//! Nothing in this crate performs I/O. Given the same records, the engine always
//! produces the same [`AssessmentResult`].
//!
//! ## Example
//!
//! ```rust
//! use risk_scoring::{RawPatientRecord, ScoringEngine};
//! use serde_json::json;
//!
//! let records = vec![RawPatientRecord::from(json!({
//!     "patient_id": "DEMO001",
//!     "blood_pressure": "145/95",
//!     "temperature": "99.9",
//!     "age": "70",
//! }))];
//!
//! let result = ScoringEngine::new().score(&records);
//! assert_eq!(result.high_risk_patients, vec!["DEMO001"]);
//! assert_eq!(result.fever_patients, vec!["DEMO001"]);
//! assert!(result.data_quality_issues.is_empty());
//! ```

pub mod engine;
pub mod record;
pub mod rules;
pub mod validation;

pub use engine::{
    AssessmentResult, FieldScore, PatientAssessment, ScoringEngine, FEVER_THRESHOLD_F,
    HIGH_RISK_THRESHOLD,
};
pub use record::RawPatientRecord;
pub use rules::{
    age_risk, blood_pressure_risk, temperature_risk, AgeRule, BloodPressureRule,
    RiskComponent, TemperatureRule, VitalField, VitalRule,
};
pub use validation::{
    parse_age, parse_blood_pressure, parse_numeric_prefix, parse_temperature, Age,
    BloodPressure, Temperature, Validated,
};
