//! Prometheus metrics for the Patient Risk Agent
//!
//! - `patient_risk_pages_fetched_total` (counter) - pages that returned a payload
//! - `patient_risk_pages_failed_total` (counter) - pages skipped after retries ran out
//! - `patient_risk_records_fetched_total` (counter) - records across all pages
//! - `patient_risk_retries_total` (counter) - retries by reason
//! - `patient_risk_requests_total` (counter) - logical requests by endpoint and result
//! - `patient_risk_patients_classified_total` (counter) - alerts by category
//! - `patient_risk_fetch_duration_seconds` (histogram) - full pagination runs
//!
//! # Example
//!
//! ```rust
//! use patient_risk::telemetry::AssessmentMetricsRegistry;
//!
//! let registry = AssessmentMetricsRegistry::new().unwrap();
//! let metrics = registry.metrics();
//!
//! metrics.record_page_fetched(5);
//! metrics.record_retry("rate_limited");
//!
//! let text = registry.encode_text().unwrap();
//! assert!(text.contains("patient_risk_pages_fetched_total 1"));
//! ```

use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use risk_scoring::AssessmentResult;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "patient_risk";

/// Metrics for one agent process
pub struct AssessmentMetrics {
    pages_fetched_total: Counter,
    pages_failed_total: Counter,
    records_fetched_total: Counter,

    /// Retries by reason (rate_limited, server_error, transient)
    retries_total: CounterVec,

    /// Logical requests by endpoint and result (success, failure)
    requests_total: CounterVec,

    /// Classified patients by category (high_risk, fever, data_quality)
    patients_classified_total: CounterVec,

    fetch_duration_seconds: Histogram,
}

impl AssessmentMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        let pages_fetched_total = Counter::with_opts(
            Opts::new("pages_fetched_total", "Pages fetched from the patient API")
                .namespace(NAMESPACE),
        )?;

        let pages_failed_total = Counter::with_opts(
            Opts::new(
                "pages_failed_total",
                "Pages skipped after every retry failed",
            )
            .namespace(NAMESPACE),
        )?;

        let records_fetched_total = Counter::with_opts(
            Opts::new("records_fetched_total", "Patient records fetched").namespace(NAMESPACE),
        )?;

        let retries_total = CounterVec::new(
            Opts::new("retries_total", "Request retries by reason").namespace(NAMESPACE),
            &["reason"],
        )?;

        let requests_total = CounterVec::new(
            Opts::new("requests_total", "Logical API requests by endpoint and result")
                .namespace(NAMESPACE),
            &["endpoint", "result"],
        )?;

        let patients_classified_total = CounterVec::new(
            Opts::new(
                "patients_classified_total",
                "Patients placed on an alert list, by category",
            )
            .namespace(NAMESPACE),
            &["category"],
        )?;

        let fetch_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "fetch_duration_seconds",
                "Duration of a full paginated fetch in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        )?;

        registry.register(Box::new(pages_fetched_total.clone()))?;
        registry.register(Box::new(pages_failed_total.clone()))?;
        registry.register(Box::new(records_fetched_total.clone()))?;
        registry.register(Box::new(retries_total.clone()))?;
        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(patients_classified_total.clone()))?;
        registry.register(Box::new(fetch_duration_seconds.clone()))?;

        Ok(Self {
            pages_fetched_total,
            pages_failed_total,
            records_fetched_total,
            retries_total,
            requests_total,
            patients_classified_total,
            fetch_duration_seconds,
        })
    }

    /// Record a page that came back with `records` records
    pub fn record_page_fetched(&self, records: usize) {
        self.pages_fetched_total.inc();
        self.records_fetched_total.inc_by(records as f64);
    }

    /// Record a page given up on
    pub fn record_page_failed(&self) {
        self.pages_failed_total.inc();
    }

    pub fn record_retry(&self, reason: &str) {
        self.retries_total.with_label_values(&[reason]).inc();
    }

    pub fn record_request(&self, endpoint: &str, result: &str) {
        self.requests_total.with_label_values(&[endpoint, result]).inc();
    }

    /// Count every entry of each alert list
    pub fn record_classification(&self, result: &AssessmentResult) {
        for (category, ids) in [
            ("high_risk", &result.high_risk_patients),
            ("fever", &result.fever_patients),
            ("data_quality", &result.data_quality_issues),
        ] {
            self.patients_classified_total
                .with_label_values(&[category])
                .inc_by(ids.len() as f64);
        }
    }

    pub fn observe_fetch_duration(&self, duration_secs: f64) {
        self.fetch_duration_seconds.observe(duration_secs);
    }

    /// Start a fetch timer (records the duration on drop)
    pub fn start_fetch_timer(&self) -> FetchTimer<'_> {
        FetchTimer {
            start: Instant::now(),
            metrics: self,
        }
    }
}

/// RAII guard timing a paginated fetch
pub struct FetchTimer<'a> {
    start: Instant,
    metrics: &'a AssessmentMetrics,
}

impl FetchTimer<'_> {
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for FetchTimer<'_> {
    fn drop(&mut self) {
        self.metrics.observe_fetch_duration(self.elapsed_secs());
    }
}

/// Owns the Prometheus registry and the agent's metrics
pub struct AssessmentMetricsRegistry {
    registry: Arc<Registry>,
    metrics: Arc<AssessmentMetrics>,
}

impl AssessmentMetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create with an existing Prometheus registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let metrics = Arc::new(AssessmentMetrics::new(&registry)?);
        Ok(Self { registry, metrics })
    }

    /// Shared handle for the client and fetcher
    pub fn metrics(&self) -> Arc<AssessmentMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Encode metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| TelemetryError::MetricsError(prometheus::Error::Msg(e.to_string())))
    }

    /// Write the text format to `path`, for a textfile collector
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.encode_text()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_counters() {
        let registry = AssessmentMetricsRegistry::new().unwrap();
        let metrics = registry.metrics();

        metrics.record_page_fetched(5);
        metrics.record_page_fetched(2);
        metrics.record_page_failed();

        let text = registry.encode_text().unwrap();
        assert!(text.contains("patient_risk_pages_fetched_total 2"));
        assert!(text.contains("patient_risk_records_fetched_total 7"));
        assert!(text.contains("patient_risk_pages_failed_total 1"));
    }

    #[test]
    fn test_labelled_counters() {
        let registry = AssessmentMetricsRegistry::new().unwrap();
        let metrics = registry.metrics();

        metrics.record_retry("rate_limited");
        metrics.record_retry("rate_limited");
        metrics.record_request("patients", "success");

        let text = registry.encode_text().unwrap();
        assert!(text.contains(r#"patient_risk_retries_total{reason="rate_limited"} 2"#));
        assert!(text.contains(r#"patient_risk_requests_total{endpoint="patients",result="success"} 1"#));
    }

    #[test]
    fn test_classification_counts() {
        let registry = AssessmentMetricsRegistry::new().unwrap();
        let result = AssessmentResult {
            high_risk_patients: vec!["a".to_string(), "b".to_string()],
            fever_patients: vec!["a".to_string()],
            data_quality_issues: vec![],
        };

        registry.metrics().record_classification(&result);

        let text = registry.encode_text().unwrap();
        assert!(text.contains(r#"patient_risk_patients_classified_total{category="high_risk"} 2"#));
        assert!(text.contains(r#"patient_risk_patients_classified_total{category="fever"} 1"#));
    }

    #[test]
    fn test_fetch_timer() {
        let registry = AssessmentMetricsRegistry::new().unwrap();
        let metrics = registry.metrics();
        {
            let _timer = metrics.start_fetch_timer();
        }
        let text = registry.encode_text().unwrap();
        assert!(text.contains("patient_risk_fetch_duration_seconds_count 1"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Registry::new();
        AssessmentMetrics::new(&registry).unwrap();
        assert!(AssessmentMetrics::new(&registry).is_err());
    }

    #[test]
    fn test_with_shared_registry() {
        let shared = Arc::new(Registry::new());
        let registry = AssessmentMetricsRegistry::with_registry(Arc::clone(&shared)).unwrap();
        registry.metrics().record_page_failed();

        assert!(shared
            .gather()
            .iter()
            .any(|family| family.get_name() == "patient_risk_pages_failed_total"));
        assert!(AssessmentMetricsRegistry::with_registry(shared).is_err());
    }

    #[test]
    fn test_write_textfile() {
        let registry = AssessmentMetricsRegistry::new().unwrap();
        registry.metrics().record_page_fetched(1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patient_risk.prom");
        registry.write_textfile(&path).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("patient_risk_pages_fetched_total 1"));
    }
}
