//! Sequential pagination
//!
//! Pages are requested one at a time starting from page 1. A page whose retries
//! run out is logged and skipped; the fetch carries on with the next page, so
//! [`PaginatedFetcher::fetch_all`] always returns whatever it managed to collect.
//!
//! Pagination stops when a page comes back empty, when it holds fewer records
//! than the page size, or once the page ceiling has been requested.

use std::future::Future;
use std::sync::Arc;
use tokio::time::sleep;

use risk_scoring::RawPatientRecord;

use super::ClientError;
use crate::config::ApiClientConfig;
use crate::contracts::{EnvelopeShape, PatientPage};
use crate::telemetry::AssessmentMetrics;

/// Anything that can serve a page of patient records
pub trait PageSource: Sync {
    /// Fetch page `page` (1-based) holding at most `limit` records.
    /// Retries are the source's responsibility.
    fn fetch_page(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<PatientPage, ClientError>> + Send;
}

/// Walks a [`PageSource`] from page 1 until the data runs out
pub struct PaginatedFetcher<'a, S> {
    source: &'a S,
    config: ApiClientConfig,
    metrics: Option<Arc<AssessmentMetrics>>,
}

impl<'a, S: PageSource> PaginatedFetcher<'a, S> {
    pub fn new(source: &'a S, config: &ApiClientConfig) -> Self {
        Self {
            source,
            config: config.clone(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<AssessmentMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Fetch every page and concatenate the records in page order
    pub async fn fetch_all(&self) -> Vec<RawPatientRecord> {
        let _timer = self.metrics.as_deref().map(AssessmentMetrics::start_fetch_timer);
        let page_size = self.config.page_size;
        let mut records = Vec::new();

        for page in 1..=self.config.max_pages {
            let fetched = match self.source.fetch_page(page, page_size).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    tracing::error!(page, error = %e, "Skipping page after retries ran out");
                    if let Some(metrics) = &self.metrics {
                        metrics.record_page_failed();
                    }
                    continue;
                }
            };

            let count = fetched.len();
            if fetched.shape == EnvelopeShape::Unrecognized {
                tracing::warn!(page, "Unrecognized page payload, treating as empty");
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_page_fetched(count);
            }
            tracing::info!(page, records = count, shape = fetched.shape.as_str(), "Fetched page");

            records.extend(fetched.into_records());

            if count == 0 {
                tracing::info!(page, "Empty page, no more records");
                break;
            }
            if count < page_size as usize {
                tracing::info!(page, records = count, "Short page, no more records");
                break;
            }
            if page < self.config.max_pages {
                sleep(self.config.page_delay()).await;
            }
        }

        tracing::info!(records = records.len(), "Pagination complete");
        records
    }
}
