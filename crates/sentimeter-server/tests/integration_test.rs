//! Integration tests for the Sentimeter HTTP service

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sentimeter_classifiers::{ClassificationResult, Classifier, LexiconClassifier};
use sentimeter_core::{
    Error, PredictedSentiment, PredictionResponse, Result, SentimentClass, SummaryCounts,
};
use sentimeter_server::{create_router, AppState, ServiceConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const FORMAT_ERROR: &str = "No texts provided or wrong format (should be list).";

/// Picks a class from keywords; fails on texts containing "crash"
struct KeywordClassifier;

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        if text.contains("crash") {
            return Err(Error::classifier("tokenizer rejected input"));
        }
        let probabilities = if text.contains("great") {
            vec![0.05, 0.15, 0.8]
        } else if text.contains("bad") {
            vec![0.7, 0.2, 0.1]
        } else {
            vec![0.2, 0.6, 0.2]
        };
        Ok(ClassificationResult::new(probabilities))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

fn app_with(config: ServiceConfig) -> Router {
    create_router(AppState::new(Arc::new(KeywordClassifier), config))
}

fn app() -> Router {
    app_with(ServiceConfig::default())
}

fn post_predict(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn predict(app: Router, body: Value) -> (StatusCode, PredictionResponse) {
    let (status, bytes) = send(app, post_predict(body.to_string())).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let request = Request::get("/health").body(Body::empty()).unwrap();

    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() {
    let request = Request::get("/metrics").body(Body::empty()).unwrap();

    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_unknown_route() {
    let request = Request::get("/nope").body(Body::empty()).unwrap();

    let (status, _) = send(app(), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_list() {
    let (status, body) = send_json(app(), post_predict(r#"{"texts": []}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "results": [],
            "summary": {"Negative": 0, "Netral": 0, "Positive": 0},
            "word_freq": {}
        })
    );
}

#[tokio::test]
async fn test_wrong_shapes_rejected() {
    let bodies = [
        r#"{}"#,
        r#"{"texts": null}"#,
        r#"{"texts": ""}"#,
        r#"{"texts": "great product"}"#,
        r#"{"texts": 42}"#,
        r#"{"texts": {"a": "b"}}"#,
        r#"{"text": ["great"]}"#,
        r#"["great product"]"#,
    ];

    for body in bodies {
        let (status, json) = send_json(app(), post_predict(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json, json!({ "error": FORMAT_ERROR }), "body: {body}");
    }
}

#[tokio::test]
async fn test_invalid_json_rejected() {
    let (status, json) = send_json(app(), post_predict("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], FORMAT_ERROR);
}

#[tokio::test]
async fn test_non_string_element_rejected() {
    let (status, json) = send_json(app(), post_predict(r#"{"texts": ["fine", 3]}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "texts[1] is not a string");
}

#[tokio::test]
async fn test_three_class_scenario() {
    let (status, response) = predict(
        app(),
        json!({"texts": ["great product", "bad service", "ok fine"]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let predicted: Vec<_> = response
        .results
        .iter()
        .map(|r| r.predicted_sentiment())
        .collect();
    assert_eq!(
        predicted,
        vec![
            Some(PredictedSentiment::Known(SentimentClass::Positive)),
            Some(PredictedSentiment::Known(SentimentClass::Negative)),
            Some(PredictedSentiment::Known(SentimentClass::Neutral)),
        ]
    );
    assert_eq!(
        response.summary,
        SummaryCounts {
            negative: 1,
            neutral: 1,
            positive: 1
        }
    );
    assert_eq!(
        response.word_freq.words(),
        vec!["great", "product", "bad", "service", "ok", "fine"]
    );
}

#[tokio::test]
async fn test_success_item_wire_shape() {
    let (_, body) = send_json(app(), post_predict(r#"{"texts": ["great product"]}"#)).await;

    assert_eq!(
        body["results"][0],
        json!({
            "text": "great product",
            "predicted_sentiment": "Positive",
            "negative": 5.0,
            "netral": 15.0,
            "positive": 80.0
        })
    );
}

#[tokio::test]
async fn test_failed_item_reported_inline() {
    let (status, body) = send_json(
        app(),
        post_predict(r#"{"texts": ["great day", "crash now", "bad day"]}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["results"][1],
        json!({
            "text": "crash now",
            "error": "classifier error: tokenizer rejected input"
        })
    );
    assert_eq!(
        body["summary"],
        json!({"Negative": 1, "Netral": 0, "Positive": 1})
    );
    assert_eq!(body["word_freq"]["crash"], 1);
    assert_eq!(body["word_freq"]["day"], 3);
}

#[tokio::test]
async fn test_word_freq_order_in_body() {
    let (_, bytes) = send(
        app(),
        post_predict(r#"{"texts": ["Zeta alpha", "alpha ZETA beta", "zeta"]}"#),
    )
    .await;
    let raw = String::from_utf8(bytes).unwrap();

    assert!(raw.contains(r#""word_freq":{"zeta":3,"alpha":2,"beta":1}"#), "{raw}");
}

#[tokio::test]
async fn test_batch_limit() {
    let mut config = ServiceConfig::default();
    config.limits.max_batch_size = 2;

    let (status, body) =
        send_json(app_with(config), post_predict(r#"{"texts": ["a", "b", "c"]}"#)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "Batch of 3 texts exceeds the limit of 2.");
}

#[tokio::test]
async fn test_body_size_limit() {
    let mut config = ServiceConfig::default();
    config.server.max_body_bytes = 64;
    let body = json!({ "texts": ["x".repeat(200)] }).to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send_json(app_with(config), request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body,
        json!({ "error": "Request body exceeds the configured size limit." })
    );
}

#[tokio::test]
async fn test_chunked_body_size_limit() {
    let mut config = ServiceConfig::default();
    config.server.max_body_bytes = 64;
    let body = json!({ "texts": ["x".repeat(200)] }).to_string();

    let (status, json) = send_json(app_with(config), post_predict(body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"], "Request body exceeds the configured size limit.");
}

/// Panics inside inference, the way a broken backend would
struct PanickingClassifier;

#[async_trait]
impl Classifier for PanickingClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassificationResult> {
        panic!("inference backend crashed");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

#[tokio::test]
async fn test_batch_task_failure_is_internal_error() {
    let app = create_router(AppState::new(
        Arc::new(PanickingClassifier),
        ServiceConfig::default(),
    ));

    let (status, body) = send_json(app, post_predict(r#"{"texts": ["hello"]}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .is_some_and(|msg| msg.starts_with("Batch task failed")));
}

#[tokio::test]
async fn test_custom_top_k() {
    let mut config = ServiceConfig::default();
    config.limits.top_k_words = 2;

    let (_, response) = predict(app_with(config), json!({"texts": ["a b c", "c"]})).await;

    assert_eq!(response.word_freq.words(), vec!["c", "a"]);
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let request = Request::get("/health")
        .header(header::ORIGIN, "http://dashboard.local")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_restricted_origins() {
    let mut config = ServiceConfig::default();
    config.server.cors_origins = vec!["http://localhost:3000".to_string()];

    let allowed = Request::get("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app_with(config.clone()).oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );

    let denied = Request::get("/health")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app_with(config).oneshot(denied).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_lexicon_backend_is_idempotent() {
    let state = AppState::new(
        Arc::new(LexiconClassifier::new().unwrap()),
        ServiceConfig::default(),
    );
    let app = create_router(state);
    let body = json!({"texts": ["Great product, love it", "   ", "terrible service"]});

    let (status, first) = predict(app.clone(), body.clone()).await;
    let (_, second) = predict(app, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first.results.len(), 3);
    assert!(first.results[1].error().is_some());
    assert_eq!(first.summary.total(), 2);
}
