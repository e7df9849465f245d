//! HTTP endpoints.
//!
//! - GET  /health
//! - POST /parse_receipt/      multipart upload, field `file`
//! - POST /parse_text          raw OCR text in the body
//! - GET  /vocabulary
//! - POST /vocabulary/learn    receipt text whose item names are learned

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tillroll_ocr::{learnable_names, RawText, ReceiptRecord};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct VocabularyResponse {
    pub version: u64,
    pub items: Vec<String>,
}

#[derive(Serialize)]
pub struct LearnResponse {
    pub version: u64,
    pub size: usize,
    pub added: usize,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/parse_receipt/", post(parse_receipt))
        .route("/parse_receipt", post(parse_receipt))
        .route("/parse_text", post(parse_text))
        .route("/vocabulary", get(vocabulary))
        .route("/vocabulary/learn", post(learn))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Receipt parser API is running",
    })
}

async fn parse_receipt(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ReceiptRecord>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let ext = field
            .file_name()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if data.is_empty() {
            return Err(AppError::BadRequest("uploaded file is empty".into()));
        }

        let corrector = state.corrector();
        let outcome = state.pipeline.process_bytes(&data, &ext, corrector.as_ref()).await?;
        return Ok(Json(outcome.record));
    }
    Err(AppError::BadRequest("missing `file` field".into()))
}

async fn parse_text(State(state): State<AppState>, body: String) -> Json<ReceiptRecord> {
    let corrector = state.corrector();
    Json(state.pipeline.interpret(body, corrector.as_ref()).record)
}

async fn vocabulary(State(state): State<AppState>) -> Json<VocabularyResponse> {
    let snapshot = state.vocabulary.snapshot();
    Json(VocabularyResponse {
        version: snapshot.version,
        items: snapshot.items().map(str::to_string).collect(),
    })
}

async fn learn(State(state): State<AppState>, body: String) -> Result<Json<LearnResponse>> {
    let names = learnable_names(&RawText::from_ocr(&body));
    let outcome = state.vocabulary.commit(names).await?;
    Ok(Json(LearnResponse {
        version: outcome.vocabulary.version,
        size: outcome.vocabulary.len(),
        added: outcome.added,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VocabularyConfig;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tempfile::TempDir;
    use tillroll_ocr::{MockRecognizer, OcrBackend, OcrError, ReceiptAssembler, ReceiptPipeline};
    use tillroll_storage::VocabularyStore;
    use tower::ServiceExt;

    const WALMART: &str =
        "WALMART\n2024-01-15\nMILK 3.50\nBREAD 2.25\nSUBTOTAL 5.75\nTAX 0.40\nBALANCE DUE 6.15\n";
    const BOUNDARY: &str = "tillroll-test-boundary";

    struct DownRecognizer;

    #[async_trait]
    impl OcrBackend for DownRecognizer {
        async fn recognize(&self, _image_bytes: &[u8]) -> std::result::Result<String, OcrError> {
            Err(OcrError::Provider("E500: service unavailable".into()))
        }

        fn provider_name(&self) -> &'static str {
            "down"
        }
    }

    async fn app_with(recognizer: Box<dyn OcrBackend>) -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ReceiptPipeline::new(
            recognizer,
            ReceiptAssembler::default(),
            dir.path().join("uploads"),
        );
        let vocabulary = VocabularyStore::open(dir.path().join("items.txt")).await.unwrap();
        let state = AppState::new(pipeline, vocabulary, VocabularyConfig::default());
        (router(state, 1024 * 1024), dir)
    }

    async fn app() -> (Router, TempDir) {
        app_with(Box::new(MockRecognizer::new(WALMART))).await
    }

    fn multipart_request(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/parse_receipt/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn text_request(uri: &str, text: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(text.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health() {
        let (app, _dir) = app().await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn parse_receipt_returns_record() {
        let (app, dir) = app().await;
        let response = app
            .oneshot(multipart_request("file", "receipt.jpg", b"jpeg bytes"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["store"], "WALMART");
        assert_eq!(json["date"], "2024-01-15");
        assert_eq!(json["items"][0]["name"], "MILK");
        assert_eq!(json["items"][0]["price"], 3.5);
        assert_eq!(json["items"][1]["name"], "BREAD");
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert_eq!(json["total"], 6.15);

        let uploads = dir.path().join("uploads");
        assert!(std::fs::read_dir(uploads).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn parse_receipt_without_file_field_is_bad_request() {
        let (app, _dir) = app().await;
        let response = app
            .oneshot(multipart_request("image", "receipt.jpg", b"jpeg bytes"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("file"));
    }

    #[tokio::test]
    async fn ocr_outage_is_bad_gateway() {
        let (app, _dir) = app_with(Box::new(DownRecognizer)).await;
        let response = app
            .oneshot(multipart_request("file", "receipt.jpg", b"jpeg bytes"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("E500"));
    }

    #[tokio::test]
    async fn parse_text_skips_ocr() {
        let (app, _dir) = app().await;
        let response = app
            .oneshot(text_request("/parse_text", "SAFEWAY\nEGGS 4.99\nTOTAL 4.99\n"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["store"], "SAFEWAY");
        assert_eq!(json["date"], Value::Null);
        assert_eq!(json["items"][0]["name"], "EGGS");
        assert_eq!(json["total"], 4.99);
    }

    #[tokio::test]
    async fn learned_names_feed_correction() {
        let (app, dir) = app().await;

        let response = app
            .clone()
            .oneshot(text_request("/vocabulary/learn", "BREAD 2.25\nMILK WHOLE 3.50\n"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["version"], 1);
        assert_eq!(json["size"], 2);
        assert_eq!(json["added"], 2);

        let response = app
            .clone()
            .oneshot(Request::get("/vocabulary").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["items"], serde_json::json!(["BREAD", "MILK WHOLE"]));

        let response = app
            .oneshot(text_request("/parse_text", "8READ 2.25\n"))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["items"][0]["name"], "BREAD");

        let on_disk = std::fs::read_to_string(dir.path().join("items.txt")).unwrap();
        assert!(on_disk.contains("MILK WHOLE"));
    }

    #[tokio::test]
    async fn relearning_known_names_keeps_version() {
        let (app, _dir) = app().await;
        for expected_added in [1, 0] {
            let response = app
                .clone()
                .oneshot(text_request("/vocabulary/learn", "BREAD 2.25"))
                .await
                .unwrap();
            let json = json_body(response).await;
            assert_eq!(json["version"], 1);
            assert_eq!(json["added"], expected_added);
        }
    }
}
