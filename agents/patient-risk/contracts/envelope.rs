//! Page envelopes
//!
//! The patient API wraps a page of records in one of several shapes. Shapes are
//! tried in a fixed order and the first match wins:
//!
//! 1. `{"data": [...]}`
//! 2. `{"patients": [...]}`
//! 3. `[...]`
//!
//! Anything else, including a body that is not JSON at all, is
//! [`EnvelopeShape::Unrecognized`] and carries zero records.

use risk_scoring::RawPatientRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which envelope a page arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeShape {
    Data,
    Patients,
    BareArray,
    Unrecognized,
}

impl EnvelopeShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeShape::Data => "data",
            EnvelopeShape::Patients => "patients",
            EnvelopeShape::BareArray => "bare_array",
            EnvelopeShape::Unrecognized => "unrecognized",
        }
    }
}

type ShapeMatcher = fn(&Value) -> Option<&Vec<Value>>;

fn data_field(value: &Value) -> Option<&Vec<Value>> {
    value.get("data")?.as_array()
}

fn patients_field(value: &Value) -> Option<&Vec<Value>> {
    value.get("patients")?.as_array()
}

fn bare_array(value: &Value) -> Option<&Vec<Value>> {
    value.as_array()
}

const MATCHERS: [(EnvelopeShape, ShapeMatcher); 3] = [
    (EnvelopeShape::Data, data_field),
    (EnvelopeShape::Patients, patients_field),
    (EnvelopeShape::BareArray, bare_array),
];

/// One page of records, unwrapped from its envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientPage {
    pub shape: EnvelopeShape,
    pub records: Vec<RawPatientRecord>,
}

impl PatientPage {
    /// An unrecognized page with no records
    pub fn unrecognized() -> Self {
        Self {
            shape: EnvelopeShape::Unrecognized,
            records: Vec::new(),
        }
    }

    /// Unwrap a parsed JSON payload
    pub fn from_value(value: &Value) -> Self {
        MATCHERS
            .iter()
            .find_map(|(shape, matcher)| {
                matcher(value).map(|items| Self {
                    shape: *shape,
                    records: items.iter().cloned().map(RawPatientRecord::from).collect(),
                })
            })
            .unwrap_or_else(Self::unrecognized)
    }

    /// Unwrap a raw response body. Non-JSON bodies are unrecognized.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                tracing::debug!(error = %e, "Page body is not JSON");
                Self::unrecognized()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<RawPatientRecord> {
        self.records
    }
}
