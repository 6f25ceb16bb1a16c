//! Run report
//!
//! Every assessment run produces an [`AssessmentReport`], whether or not the
//! result was submitted. The report carries a SHA-256 hash of the fetched
//! records so two runs over identical data can be matched up.

use chrono::{DateTime, Utc};
use risk_scoring::{AssessmentResult, PatientAssessment, RawPatientRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Record and alert counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    /// Records returned by the API across all pages
    pub records_fetched: usize,

    /// Records that carried a patient id and were scored
    pub patients_assessed: usize,

    /// Records dropped for lack of a patient id
    pub records_skipped: usize,

    pub high_risk: usize,
    pub fever: usize,
    pub data_issues: usize,
}

impl ReportCounts {
    pub fn new(records_fetched: usize, patients_assessed: usize, result: &AssessmentResult) -> Self {
        Self {
            records_fetched,
            patients_assessed,
            records_skipped: records_fetched.saturating_sub(patients_assessed),
            high_risk: result.high_risk_patients.len(),
            fever: result.fever_patients.len(),
            data_issues: result.data_quality_issues.len(),
        }
    }
}

/// Outcome of one fetch, score and submit run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub run_id: Uuid,

    /// Agent version (semantic versioning)
    pub agent_version: String,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// SHA-256 over the fetched records, hex encoded
    pub inputs_hash: String,

    pub counts: ReportCounts,

    /// Whether the result was accepted by the submission endpoint
    pub submitted: bool,

    pub result: AssessmentResult,

    /// Response body from the submission endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<Value>,

    /// Per-patient breakdown, omitted unless requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assessments: Vec<PatientAssessment>,
}

impl AssessmentReport {
    /// Build an unsubmitted report; `completed_at` is set to now
    pub fn new(
        started_at: DateTime<Utc>,
        records: &[RawPatientRecord],
        assessments: Vec<PatientAssessment>,
    ) -> Self {
        let result: AssessmentResult = assessments.iter().collect();
        let counts = ReportCounts::new(records.len(), assessments.len(), &result);

        Self {
            run_id: Uuid::new_v4(),
            agent_version: crate::AGENT_VERSION.to_string(),
            started_at,
            completed_at: Utc::now(),
            inputs_hash: compute_inputs_hash(records),
            counts,
            submitted: false,
            result,
            submission: None,
            assessments,
        }
    }

    /// Record the submission endpoint's response
    pub fn with_submission(mut self, response: Value) -> Self {
        self.submitted = true;
        self.submission = Some(response);
        self.completed_at = Utc::now();
        self
    }

    /// Drop the per-patient breakdown
    pub fn without_assessments(mut self) -> Self {
        self.assessments.clear();
        self
    }

    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }
}

/// Hash a record sequence. Order matters; each record is separated by a newline.
pub fn compute_inputs_hash(records: &[RawPatientRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(record.as_value().to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
