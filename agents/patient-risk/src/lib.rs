//! Patient Risk Agent
//!
//! Pulls patient vitals from a paginated, unreliable patient API, scores every
//! patient with the [`risk_scoring`] engine, and submits three alert lists:
//! high-risk patients, patients with fever, and records with data-quality
//! issues.
//!
//! ## Architecture
//!
//! 1. **Client** (`client/`): `reqwest` client for the patient API, the
//!    two-counter retry policy, and sequential pagination that skips pages
//!    whose retries run out.
//!
//! 2. **Contracts** (`contracts/`): page envelopes and the run report.
//!
//! 3. **Runner** (`runner`): fetch, score and submit as one run.
//!
//! 4. **Telemetry** (`telemetry/`): `tracing` setup and Prometheus metrics.
//!
//! 5. **CLI** (`cli/`): the `patient-risk` command line.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Fetch, score and submit
//! PATIENT_API_KEY=... patient-risk run
//!
//! # Score without submitting, with a per-patient breakdown
//! patient-risk --api-key ... run --dry-run --details --format json
//!
//! # Score a local file offline
//! patient-risk score --input patients.json
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use patient_risk::{AgentConfig, AssessmentRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), patient_risk::AssessmentError> {
//!     let config = AgentConfig::builder()
//!         .base_url("http://localhost:8080")
//!         .api_key("secret")
//!         .build()?;
//!
//!     let report = AssessmentRunner::new(&config)?.run(false).await?;
//!     println!("{} high-risk patients", report.counts.high_risk);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod runner;
pub mod telemetry;

// Contracts module - located at ../contracts relative to src/
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use cli::{ExitCode, OutputFormat, PatientRiskCli, PatientRiskCommands};
pub use client::{ClientError, PageSource, PaginatedFetcher, PatientApiClient};
pub use config::{AgentConfig, AgentConfigBuilder, ApiClientConfig, RetryConfig};
pub use contracts::{compute_inputs_hash, AssessmentReport, EnvelopeShape, PatientPage};
pub use error::AssessmentError;
pub use runner::AssessmentRunner;
pub use telemetry::{AssessmentMetrics, AssessmentMetricsRegistry, LogFormat, TelemetryError};

/// Agent version (from Cargo.toml)
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Agent identifier
pub const AGENT_ID: &str = "patient-risk-agent";

/// Run the CLI application
///
/// This is the main entry point for the CLI binary.
pub async fn run_cli(cli: PatientRiskCli) -> ExitCode {
    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, agent = AGENT_ID, "Run failed");
            eprintln!("Error: {}", e);
            ExitCode::from(&e)
        }
    }
}
