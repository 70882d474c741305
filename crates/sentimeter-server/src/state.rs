//! Shared application state

use crate::config::ServiceConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use sentimeter_classifiers::{BatchProcessor, Classifier};
use std::sync::Arc;

/// State handed to every request handler
#[derive(Clone)]
pub struct AppState {
    /// Batch processor wrapping the process-wide classifier
    pub processor: BatchProcessor,

    pub config: Arc<ServiceConfig>,

    /// Prometheus handle for rendering `/metrics`
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>, config: ServiceConfig) -> Self {
        let processor = BatchProcessor::new(classifier).with_top_k(config.limits.top_k_words);

        Self {
            processor,
            config: Arc::new(config),
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
