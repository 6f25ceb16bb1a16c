//! Patient Risk Agent CLI
//!
//! # Usage
//!
//! ```bash
//! # Fetch, score and submit
//! patient-risk --base-url http://localhost:8080 --api-key $KEY run
//!
//! # Dry run with JSON report and a metrics textfile
//! patient-risk run --dry-run --format json --metrics-out /var/lib/node_exporter/patient_risk.prom
//!
//! # Dump the raw records
//! patient-risk fetch --output records.json
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Submission failed
//! - 2: No records fetched, nothing submitted
//! - 3: Invalid input, arguments or configuration
//! - 4: File not found or inaccessible
//! - 10: Internal error

use clap::Parser;
use patient_risk::{run_cli, telemetry, PatientRiskCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = PatientRiskCli::parse();

    telemetry::init_tracing(cli.log_format, cli.verbose)?;

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
