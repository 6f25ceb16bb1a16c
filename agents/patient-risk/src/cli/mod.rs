//! CLI module for the Patient Risk Agent
//!
//! Provides the `run`, `score` and `fetch` commands and maps run failures to
//! process exit codes.

pub mod commands;
pub mod output;

pub use commands::{ApiArgs, PatientRiskCli, PatientRiskCommands};
pub use output::{format_report, render_report, OutputFormat};

use crate::error::AssessmentError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Assessment completed (and was submitted, unless a dry run)
    Success = 0,
    /// Submission failed after retries
    SubmitFailed = 1,
    /// No records were fetched, nothing was submitted
    NoRecords = 2,
    /// Invalid input, arguments or configuration
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&AssessmentError> for ExitCode {
    fn from(err: &AssessmentError) -> Self {
        match err {
            AssessmentError::NoRecords => ExitCode::NoRecords,
            AssessmentError::Submit(_) => ExitCode::SubmitFailed,
            AssessmentError::Config(_) | AssessmentError::Parse(_) => ExitCode::InvalidInput,
            AssessmentError::File(_) => ExitCode::FileError,
            AssessmentError::Serialization(_)
            | AssessmentError::Telemetry(_)
            | AssessmentError::Internal(_) => ExitCode::InternalError,
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub async fn run(cli: PatientRiskCli) -> Result<ExitCode, AssessmentError> {
    match cli.command {
        PatientRiskCommands::Run {
            dry_run,
            format,
            details,
            metrics_out,
        } => commands::execute_run(&cli.api, dry_run, format, details, metrics_out).await,
        PatientRiskCommands::Score {
            input,
            format,
            details,
        } => commands::execute_score(&input, format, details),
        PatientRiskCommands::Fetch { output } => commands::execute_fetch(&cli.api, output).await,
    }
}
