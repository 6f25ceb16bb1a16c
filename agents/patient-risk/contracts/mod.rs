//! Wire contracts for the Patient Risk Agent
//!
//! - `envelope` - the page payload shapes the patient API is known to return
//! - `report` - the run report produced after every assessment
//!
//! Both are plain serde types with no I/O, shared by the HTTP client, the CLI
//! and the integration tests.

pub mod envelope;
pub mod report;

pub use envelope::{EnvelopeShape, PatientPage};
pub use report::{compute_inputs_hash, AssessmentReport, ReportCounts};
