//! Raw patient records
//!
//! Records are kept as the JSON the API returned. Nothing is coerced at fetch
//! time; each vital is interpreted only when a rule asks for it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field name of the patient identifier
pub const PATIENT_ID_FIELD: &str = "patient_id";
/// Field name of the blood pressure reading
pub const BLOOD_PRESSURE_FIELD: &str = "blood_pressure";
/// Field name of the temperature reading
pub const TEMPERATURE_FIELD: &str = "temperature";
/// Field name of the patient age
pub const AGE_FIELD: &str = "age";

/// A patient record exactly as fetched from the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPatientRecord(Value);

impl RawPatientRecord {
    /// Look up a top-level field. JSON `null` counts as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    /// The patient identifier, if the record carries a usable one.
    ///
    /// Strings are returned as-is and numbers in their decimal form. Empty
    /// strings and any other JSON type are treated as missing.
    pub fn patient_id(&self) -> Option<String> {
        match self.field(PATIENT_ID_FIELD)? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn blood_pressure(&self) -> Option<&Value> {
        self.field(BLOOD_PRESSURE_FIELD)
    }

    pub fn temperature(&self) -> Option<&Value> {
        self.field(TEMPERATURE_FIELD)
    }

    pub fn age(&self) -> Option<&Value> {
        self.field(AGE_FIELD)
    }

    /// Borrow the underlying JSON
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the record and return the underlying JSON
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for RawPatientRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
