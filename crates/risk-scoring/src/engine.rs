//! Scoring engine
//!
//! Runs the registered [`VitalRule`]s over each record and sorts patients into
//! the high-risk, fever and data-quality alert lists.

use crate::record::RawPatientRecord;
use crate::rules::{self, RiskComponent, VitalField, VitalRule};
use crate::validation::parse_numeric_prefix;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Total score at or above which a patient is high risk
pub const HIGH_RISK_THRESHOLD: u8 = 4;

/// Temperature at or above which a patient is flagged for fever, in °F
pub const FEVER_THRESHOLD_F: f64 = 99.6;

/// Score produced by one rule for one patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldScore {
    pub field: VitalField,
    pub component: RiskComponent,
}

/// Full assessment of a single patient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientAssessment {
    pub patient_id: String,
    /// Sum of all component scores
    pub total_score: u8,
    pub is_high_risk: bool,
    pub is_fever: bool,
    /// At least one field failed validation
    pub has_data_issue: bool,
    /// Per-field breakdown in rule registration order
    pub components: Vec<FieldScore>,
}

impl PatientAssessment {
    /// Fields that failed validation
    pub fn invalid_fields(&self) -> Vec<VitalField> {
        self.components
            .iter()
            .filter(|score| score.component.is_invalid())
            .map(|score| score.field)
            .collect()
    }

    /// Component for `field`, if a rule for it ran
    pub fn component(&self, field: VitalField) -> Option<RiskComponent> {
        self.components
            .iter()
            .find(|score| score.field == field)
            .map(|score| score.component)
    }
}

/// Alert lists submitted to the assessment endpoint.
///
/// Every list preserves fetch order and keeps duplicate ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub high_risk_patients: Vec<String>,
    pub fever_patients: Vec<String>,
    pub data_quality_issues: Vec<String>,
}

impl AssessmentResult {
    /// Append one patient to every list it qualifies for
    pub fn record(&mut self, assessment: &PatientAssessment) {
        if assessment.is_high_risk {
            self.high_risk_patients.push(assessment.patient_id.clone());
        }
        if assessment.is_fever {
            self.fever_patients.push(assessment.patient_id.clone());
        }
        if assessment.has_data_issue {
            self.data_quality_issues.push(assessment.patient_id.clone());
        }
    }

    /// True when no patient raised any alert
    pub fn is_empty(&self) -> bool {
        self.high_risk_patients.is_empty()
            && self.fever_patients.is_empty()
            && self.data_quality_issues.is_empty()
    }
}

impl<'a> FromIterator<&'a PatientAssessment> for AssessmentResult {
    fn from_iter<I: IntoIterator<Item = &'a PatientAssessment>>(iter: I) -> Self {
        let mut result = AssessmentResult::default();
        for assessment in iter {
            result.record(assessment);
        }
        result
    }
}

/// The core scoring engine
pub struct ScoringEngine {
    rules: Vec<Arc<dyn VitalRule>>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringEngine {
    /// Create an engine with the blood pressure, temperature and age rules
    pub fn new() -> Self {
        let mut engine = Self::empty();
        engine.register_default_rules();
        engine
    }

    /// Create an engine with no rules
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    fn register_default_rules(&mut self) {
        self.register(Arc::new(rules::BloodPressureRule::new()));
        self.register(Arc::new(rules::TemperatureRule::new()));
        self.register(Arc::new(rules::AgeRule::new()));
    }

    /// Register a scoring rule
    pub fn register(&mut self, rule: Arc<dyn VitalRule>) {
        self.rules.push(rule);
    }

    /// Get all registered rules
    pub fn rules(&self) -> &[Arc<dyn VitalRule>] {
        &self.rules
    }

    /// Highest total score the registered rules can produce
    pub fn max_total_score(&self) -> u8 {
        self.rules
            .iter()
            .fold(0u8, |total, rule| total.saturating_add(rule.max_score()))
    }

    /// Assess one record. Records without a patient id yield `None`.
    pub fn assess(&self, record: &RawPatientRecord) -> Option<PatientAssessment> {
        let Some(patient_id) = record.patient_id() else {
            tracing::debug!("Skipping record without patient_id");
            return None;
        };

        let components: Vec<FieldScore> = self
            .rules
            .iter()
            .map(|rule| {
                let component = rule.evaluate(record);
                tracing::trace!(
                    patient_id = %patient_id,
                    rule = rule.id(),
                    score = component.score(),
                    invalid = component.is_invalid(),
                    "Evaluated rule"
                );
                FieldScore {
                    field: rule.field(),
                    component,
                }
            })
            .collect();

        let total_score = components
            .iter()
            .fold(0u8, |total, score| total.saturating_add(score.component.score()));
        let has_data_issue = components.iter().any(|score| score.component.is_invalid());

        // Fever reads the raw value, so it can fire even when validation failed
        let is_fever = parse_numeric_prefix(record.temperature())
            .is_some_and(|fahrenheit| fahrenheit >= FEVER_THRESHOLD_F);

        Some(PatientAssessment {
            patient_id,
            total_score,
            is_high_risk: total_score >= HIGH_RISK_THRESHOLD,
            is_fever,
            has_data_issue,
            components,
        })
    }

    /// Assess every record in order, dropping those without a patient id
    pub fn assess_all(&self, records: &[RawPatientRecord]) -> Vec<PatientAssessment> {
        records.iter().filter_map(|record| self.assess(record)).collect()
    }

    /// Score a record sequence into the three alert lists
    pub fn score(&self, records: &[RawPatientRecord]) -> AssessmentResult {
        self.assess_all(records).iter().collect()
    }
}
