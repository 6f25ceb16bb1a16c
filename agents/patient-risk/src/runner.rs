//! Fetch, score and submit
//!
//! [`AssessmentRunner`] ties the API client, the paginated fetcher and the
//! scoring engine together into one run that ends in an [`AssessmentReport`].

use chrono::{DateTime, Utc};
use risk_scoring::{RawPatientRecord, ScoringEngine};
use std::sync::Arc;

use crate::client::{PaginatedFetcher, PatientApiClient};
use crate::config::AgentConfig;
use crate::contracts::AssessmentReport;
use crate::error::{AssessmentError, Result};
use crate::telemetry::AssessmentMetrics;

/// One configured assessment pipeline
pub struct AssessmentRunner {
    client: PatientApiClient,
    engine: ScoringEngine,
    metrics: Option<Arc<AssessmentMetrics>>,
    include_assessments: bool,
}

impl AssessmentRunner {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        Ok(Self {
            client: PatientApiClient::new(config)?,
            engine: ScoringEngine::new(),
            metrics: None,
            include_assessments: false,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<AssessmentMetrics>) -> Self {
        self.client = self.client.with_metrics(Arc::clone(&metrics));
        self.metrics = Some(metrics);
        self
    }

    /// Keep the per-patient breakdown in the report
    pub fn include_assessments(mut self, include: bool) -> Self {
        self.include_assessments = include;
        self
    }

    /// Fetch every page. Failed pages are skipped, so this never errors.
    pub async fn fetch(&self) -> Vec<RawPatientRecord> {
        let mut fetcher = PaginatedFetcher::new(&self.client, self.client.config());
        if let Some(metrics) = &self.metrics {
            fetcher = fetcher.with_metrics(Arc::clone(metrics));
        }
        fetcher.fetch_all().await
    }

    /// Score already-fetched records into an unsubmitted report
    pub fn score(&self, started_at: DateTime<Utc>, records: &[RawPatientRecord]) -> Result<AssessmentReport> {
        let report = score_records(&self.engine, started_at, records, self.include_assessments)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_classification(&report.result);
        }
        Ok(report)
    }

    /// Run the full pipeline. With `dry_run` the result is not submitted.
    pub async fn run(&self, dry_run: bool) -> Result<AssessmentReport> {
        let started_at = Utc::now();
        let records = self.fetch().await;
        let report = self.score(started_at, &records)?;

        if dry_run {
            tracing::info!("Dry run, skipping submission");
            return Ok(report);
        }

        let response = self
            .client
            .submit(&report.result)
            .await
            .map_err(AssessmentError::Submit)?;
        Ok(report.with_submission(response))
    }
}

/// Score `records` with `engine`. An empty input is [`AssessmentError::NoRecords`].
pub fn score_records(
    engine: &ScoringEngine,
    started_at: DateTime<Utc>,
    records: &[RawPatientRecord],
    include_assessments: bool,
) -> Result<AssessmentReport> {
    if records.is_empty() {
        return Err(AssessmentError::NoRecords);
    }

    let assessments = engine.assess_all(records);
    let report = AssessmentReport::new(started_at, records, assessments);
    tracing::info!(
        records = report.counts.records_fetched,
        assessed = report.counts.patients_assessed,
        skipped = report.counts.records_skipped,
        high_risk = report.counts.high_risk,
        fever = report.counts.fever,
        data_issues = report.counts.data_issues,
        "Scored patient records"
    );

    Ok(if include_assessments {
        report
    } else {
        report.without_assessments()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_records_rejects_empty_input() {
        let err = score_records(&ScoringEngine::new(), Utc::now(), &[], false).unwrap_err();
        assert!(matches!(err, AssessmentError::NoRecords));
    }

    #[test]
    fn test_score_records_details() {
        let records = vec![RawPatientRecord::from(json!({
            "patient_id": "p1",
            "blood_pressure": "145/95",
            "temperature": "99.9",
            "age": "70",
        }))];
        let engine = ScoringEngine::new();

        let brief = score_records(&engine, Utc::now(), &records, false).unwrap();
        assert!(brief.assessments.is_empty());
        assert_eq!(brief.result.high_risk_patients, vec!["p1"]);

        let detailed = score_records(&engine, Utc::now(), &records, true).unwrap();
        assert_eq!(detailed.assessments.len(), 1);
        assert_eq!(detailed.assessments[0].total_score, 6);
    }

    #[test]
    fn test_runner_requires_valid_config() {
        assert!(matches!(
            AssessmentRunner::new(&AgentConfig::default()),
            Err(AssessmentError::Config(_))
        ));
    }
}
