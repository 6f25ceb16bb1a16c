//! Output formatting for the Patient Risk Agent CLI
//!
//! Reports render as JSON, YAML, or a colored summary table.

use clap::ValueEnum;
use colored::Colorize;
use std::io::{self, Write};

use risk_scoring::PatientAssessment;

use crate::contracts::AssessmentReport;
use crate::error::AssessmentError;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Render `report` to a string in `format`
pub fn format_report(report: &AssessmentReport, format: OutputFormat) -> Result<String, AssessmentError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| AssessmentError::Serialization(e.to_string())),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| AssessmentError::Serialization(e.to_string()))
        }
        OutputFormat::Table => Ok(report_table(report)),
    }
}

/// Print `report` to stdout in `format`
pub fn render_report(report: &AssessmentReport, format: OutputFormat) -> Result<(), AssessmentError> {
    let text = format_report(report, format)?;
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", text.trim_end())?;
    stdout.flush()?;
    Ok(())
}

fn report_table(report: &AssessmentReport) -> String {
    let mut out = String::new();
    let counts = &report.counts;

    out.push('\n');
    out.push_str(&format!("{}\n", "Patient Risk Assessment".cyan().bold()));
    out.push_str(&format!("{}\n\n", "=".repeat(60)));

    out.push_str(&format!("  {} {}\n", "Run:".dimmed(), report.run_id));
    out.push_str(&format!("  {} {}\n", "Inputs:".dimmed(), &report.inputs_hash[..16.min(report.inputs_hash.len())]));
    out.push_str(&format!(
        "  {} {} fetched, {} assessed, {} skipped\n\n",
        "Records:".dimmed(),
        counts.records_fetched,
        counts.patients_assessed,
        counts.records_skipped
    ));

    out.push_str(&format!("{}\n", "Alerts:".cyan().bold()));
    push_alert_line(&mut out, "!".red(), "High risk", &report.result.high_risk_patients);
    push_alert_line(&mut out, "!".yellow(), "Fever", &report.result.fever_patients);
    push_alert_line(&mut out, "?".blue(), "Data quality", &report.result.data_quality_issues);

    if !report.assessments.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Patients:".cyan().bold()));
        out.push_str(&format!("{}\n", "-".repeat(60)));
        for assessment in &report.assessments {
            push_assessment_row(&mut out, assessment);
        }
    }

    out.push('\n');
    let status = if report.submitted {
        format!("{} Submitted", "+".green())
    } else {
        format!("{} Not submitted", "-".yellow())
    };
    out.push_str(&format!(
        "{} in {} ms\n",
        status,
        report.duration_ms().to_string().dimmed()
    ));
    out
}

fn push_alert_line(out: &mut String, icon: colored::ColoredString, label: &str, ids: &[String]) {
    let listed = if ids.is_empty() {
        "none".dimmed().to_string()
    } else {
        ids.join(", ")
    };
    out.push_str(&format!("  {} {:<13} {:>3}  {}\n", icon, label, ids.len(), listed));
}

fn push_assessment_row(out: &mut String, assessment: &PatientAssessment) {
    let score = assessment.total_score.to_string();
    let score = if assessment.is_high_risk {
        score.red().bold()
    } else {
        score.normal()
    };

    let mut flags = Vec::new();
    if assessment.is_fever {
        flags.push("fever".yellow().to_string());
    }
    for field in assessment.invalid_fields() {
        flags.push(format!("invalid {}", field).blue().to_string());
    }

    out.push_str(&format!(
        "  {:<12} score {:>2}  {}\n",
        assessment.patient_id,
        score,
        flags.join(", ")
    ));
}
