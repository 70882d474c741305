//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sentimeter_core::types::TEXTS_FORMAT_ERROR;
use sentimeter_core::{PredictionRequest, PredictionResponse};
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin when the list is empty, otherwise only the listed ones
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let allowed = origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| warn!(origin = %origin, "Ignoring invalid CORS origin"))
                .ok()
        });
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

/// Batch prediction handler
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    metrics::counter!("sentimeter_requests_total").increment(1);

    let Json(body) = payload?;
    let request = PredictionRequest::from_json(&body)?;

    let limit = state.config.limits.max_batch_size;
    if request.texts.len() > limit {
        return Err(AppError::BatchTooLarge {
            size: request.texts.len(),
            limit,
        });
    }

    info!(
        items = request.texts.len(),
        classifier = state.processor.classifier_name(),
        "Received prediction request"
    );

    // Inference is CPU-bound, so the batch runs on the blocking pool
    let processor = state.processor.clone();
    let runtime = tokio::runtime::Handle::current();
    let outcome = tokio::task::spawn_blocking(move || {
        runtime.block_on(processor.process(request.texts.as_slice()))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Batch task failed: {e}")))?;

    metrics::counter!("sentimeter_items_total", "outcome" => "success")
        .increment(outcome.successes() as u64);
    metrics::counter!("sentimeter_items_total", "outcome" => "failure")
        .increment(outcome.failures() as u64);
    metrics::histogram!("sentimeter_batch_latency_us").record(outcome.latency_us as f64);

    Ok(Json(outcome.into_response(state.processor.top_k())))
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Request errors, rendered as `{"error": "<message>"}`
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Batch of {size} texts exceeds the limit of {limit}.")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("Request body exceeds the configured size limit.")]
    PayloadTooLarge,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BatchTooLarge { .. } | AppError::PayloadTooLarge => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::BatchTooLarge { .. } => "batch_too_large",
            AppError::PayloadTooLarge => "payload_too_large",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected request body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::InvalidRequest(TEXTS_FORMAT_ERROR.to_string())
        }
    }
}

impl From<sentimeter_core::Error> for AppError {
    fn from(err: sentimeter_core::Error) -> Self {
        match err {
            sentimeter_core::Error::InvalidInput(msg) => AppError::InvalidRequest(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::counter!("sentimeter_errors_total", "kind" => self.kind()).increment(1);

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_keeps_message() {
        let err: AppError = sentimeter_core::Error::invalid_input("texts[2] is not a string").into();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "texts[2] is not a string");
    }

    #[test]
    fn test_other_core_errors_are_internal() {
        let err: AppError = sentimeter_core::Error::internal("boom").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_batch_too_large_status() {
        let err = AppError::BatchTooLarge { size: 5, limit: 2 };

        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_string(), "Batch of 5 texts exceeds the limit of 2.");
    }

    #[test]
    fn test_cors_layer_accepts_lists() {
        let _ = cors_layer(&[]);
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
    }
}
