//! CLI command definitions for the Patient Risk Agent
//!
//! Provides Clap-based commands for a full assessment run, offline scoring of
//! a local record file, and a fetch-only dump of the patient API.

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use risk_scoring::{RawPatientRecord, ScoringEngine};
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::output::{render_report, OutputFormat};
use super::ExitCode;
use crate::config::{AgentConfig, AgentConfigBuilder};
use crate::contracts::{EnvelopeShape, PatientPage};
use crate::error::{AssessmentError, Result};
use crate::runner::{score_records, AssessmentRunner};
use crate::telemetry::{AssessmentMetricsRegistry, LogFormat};

/// Patient Risk Agent CLI
///
/// Fetch patient vitals from the patient API, score each patient, and submit
/// the high-risk, fever and data-quality alert lists.
#[derive(Parser, Debug)]
#[command(name = "patient-risk")]
#[command(about = "Patient Risk Agent - Score patient vitals and submit risk alerts", long_about = None)]
#[command(version)]
pub struct PatientRiskCli {
    /// Output verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: PatientRiskCommands,
}

/// Connection overrides. Unset flags fall back to the environment, then defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ApiArgs {
    /// Base URL of the patient API
    #[arg(long, env = "PATIENT_API_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// API key sent as x-api-key
    #[arg(long, env = "PATIENT_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "PATIENT_API_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Pause between pages in milliseconds
    #[arg(long, env = "PATIENT_API_PAGE_DELAY_MS", global = true)]
    pub page_delay_ms: Option<u64>,

    /// Retry budget for server and network errors
    #[arg(long, env = "PATIENT_API_MAX_RETRIES", global = true)]
    pub max_retries: Option<u32>,
}

impl ApiArgs {
    /// Apply the flags on top of `base` and validate the result
    pub fn apply(&self, base: AgentConfig) -> Result<AgentConfig> {
        let mut builder = AgentConfigBuilder::from(base);
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.clone());
        }
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key.clone());
        }
        if let Some(timeout) = self.timeout_ms {
            builder = builder.timeout_ms(timeout);
        }
        if let Some(delay) = self.page_delay_ms {
            builder = builder.page_delay_ms(delay);
        }
        if let Some(retries) = self.max_retries {
            builder = builder.max_retries(retries);
        }
        Ok(builder.build()?)
    }

    /// Environment config with the flags applied
    pub fn to_config(&self) -> Result<AgentConfig> {
        self.apply(AgentConfig::from_env())
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum PatientRiskCommands {
    /// Fetch all pages, score every patient and submit the alert lists
    Run {
        /// Score but do not submit
        #[arg(long)]
        dry_run: bool,

        /// Output format for the run report
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Include the per-patient breakdown in the report
        #[arg(long)]
        details: bool,

        /// Write Prometheus metrics to this file when the run ends
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },

    /// Score a local JSON or YAML record file without touching the network
    ///
    /// The file may hold `{"data": [...]}`, `{"patients": [...]}` or a bare
    /// array of records.
    Score {
        /// Path to the record file
        #[arg(short, long)]
        input: PathBuf,

        /// Output format for the report
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Include the per-patient breakdown in the report
        #[arg(long)]
        details: bool,
    },

    /// Fetch all pages and print the raw records as JSON
    Fetch {
        /// Write the records to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Execute the run command
pub async fn execute_run(
    api: &ApiArgs,
    dry_run: bool,
    format: OutputFormat,
    details: bool,
    metrics_out: Option<PathBuf>,
) -> Result<ExitCode> {
    let config = api.to_config()?;
    let registry = AssessmentMetricsRegistry::new()?;
    let runner = AssessmentRunner::new(&config)?
        .with_metrics(registry.metrics())
        .include_assessments(details);

    let outcome = runner.run(dry_run).await;

    if let Some(path) = metrics_out {
        registry.write_textfile(&path)?;
        tracing::info!(path = %path.display(), "Wrote metrics");
    }

    let report = outcome?;
    render_report(&report, format)?;
    Ok(ExitCode::Success)
}

/// Execute the score command
pub fn execute_score(input: &Path, format: OutputFormat, details: bool) -> Result<ExitCode> {
    let records = load_records(input)?;
    let report = score_records(&ScoringEngine::new(), Utc::now(), &records, details)?;
    render_report(&report, format)?;
    Ok(ExitCode::Success)
}

/// Execute the fetch command
pub async fn execute_fetch(api: &ApiArgs, output: Option<PathBuf>) -> Result<ExitCode> {
    let config = api.to_config()?;
    let records = AssessmentRunner::new(&config)?.fetch().await;
    if records.is_empty() {
        return Err(AssessmentError::NoRecords);
    }

    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| AssessmentError::Serialization(e.to_string()))?;

    match output {
        Some(path) => {
            std::fs::write(&path, json).map_err(|e| {
                AssessmentError::file(format!("Failed to write '{}': {}", path.display(), e))
            })?;
            tracing::info!(path = %path.display(), records = records.len(), "Wrote records");
        }
        None => println!("{}", json),
    }
    Ok(ExitCode::Success)
}

/// Load records from a JSON or YAML file holding any known envelope
pub fn load_records(path: &Path) -> Result<Vec<RawPatientRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AssessmentError::file(format!("Failed to read '{}': {}", path.display(), e))
    })?;

    let value = parse_record_file(path, &content)?;
    let page = PatientPage::from_value(&value);
    if page.shape == EnvelopeShape::Unrecognized {
        return Err(AssessmentError::parse(format!(
            "'{}' does not hold a data, patients or array envelope",
            path.display()
        )));
    }
    Ok(page.into_records())
}

/// Parse by extension; unknown extensions are tried as JSON, then YAML
fn parse_record_file(path: &Path, content: &str) -> Result<Value> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => Ok(serde_json::from_str(content)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(content)?),
        _ => serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(AssessmentError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = PatientRiskCli::try_parse_from([
            "patient-risk",
            "--base-url",
            "http://localhost:9999",
            "--api-key",
            "secret",
            "run",
            "--dry-run",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.api.base_url.as_deref(), Some("http://localhost:9999"));
        match cli.command {
            PatientRiskCommands::Run {
                dry_run, format, ..
            } => {
                assert!(dry_run);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = PatientRiskCli::try_parse_from([
            "patient-risk",
            "score",
            "--input",
            "records.json",
            "-vv",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_api_args_override_base_config() {
        let args = ApiArgs {
            base_url: Some("http://override:1".to_string()),
            api_key: Some("flag-key".to_string()),
            page_delay_ms: Some(0),
            ..ApiArgs::default()
        };
        let config = args.apply(AgentConfig::default()).unwrap();

        assert_eq!(config.api.base_url, "http://override:1");
        assert_eq!(config.api.api_key, "flag-key");
        assert_eq!(config.api.page_delay_ms, 0);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_api_args_without_key_is_config_error() {
        let err = ApiArgs::default().apply(AgentConfig::default()).unwrap_err();
        assert!(matches!(err, AssessmentError::Config(_)));
    }

    #[test]
    fn test_load_records_json_envelope() {
        let file = write_temp(".json", r#"{"patients": [{"patient_id": "p1"}, {"patient_id": "p2"}]}"#);
        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_records_yaml_array() {
        let file = write_temp(
            ".yaml",
            "- patient_id: p1\n  blood_pressure: 145/95\n  temperature: 99.9\n  age: 70\n",
        );
        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].patient_id().as_deref(), Some("p1"));
    }

    #[test]
    fn test_load_records_rejects_unknown_envelope() {
        let file = write_temp(".json", r#"{"results": []}"#);
        let err = load_records(file.path()).unwrap_err();
        assert!(matches!(err, AssessmentError::Parse(_)));
    }

    #[test]
    fn test_load_records_missing_file() {
        let err = load_records(Path::new("/nonexistent/records.json")).unwrap_err();
        assert!(matches!(err, AssessmentError::File(_)));
    }

    #[test]
    fn test_execute_score_empty_array_has_no_records() {
        let file = write_temp(".json", "[]");
        let err = execute_score(file.path(), OutputFormat::Json, false).unwrap_err();
        assert!(matches!(err, AssessmentError::NoRecords));
    }
}
