//! HTTP front end: `POST /classify_file` behind a bearer token.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | short HTML pointer to the API |
//! | `GET /health` | `{"status": "healthy", "version": …}` |
//! | `POST /classify_file` | multipart field `file` → classification JSON |
//!
//! Request checks run in a fixed order: authorization (`401` when the
//! `Authorization: Bearer …` header is missing or malformed, `403` when the
//! token is wrong), then the upload (`400` for a missing `file` part, an empty
//! filename, or an extension outside the allow-list). Only then is the
//! classifier called. A failed classification answers `422` when the document
//! is at fault and `502` when the model provider is, with the same
//! `cost_in_microdollars` / `time_in_seconds` fields as a success.

use crate::classify::DocumentClassifier;
use crate::extract::allowed_file;
use crate::output::{ClassificationResult, UploadedDocument};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Environment variable holding the bearer token clients must present.
pub const API_TOKEN_ENV: &str = "API_TOKEN";

/// Default cap on the request body.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for every request.
#[derive(Clone)]
pub struct AppState {
    classifier: Arc<DocumentClassifier>,
    api_token: Arc<str>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct FailureBody {
    error: String,
    cost_in_microdollars: u64,
    time_in_seconds: f64,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    version: &'static str,
}

/// Rejections produced before the classifier runs.
#[derive(Debug)]
enum ApiError {
    MissingToken,
    WrongToken,
    BadRequest(String),
    Upload(StatusCode, String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Missing or invalid token").into_response()
            }
            ApiError::WrongToken => (StatusCode::FORBIDDEN, "Unauthorized").into_response(),
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
            }
            ApiError::Upload(status, error) => (status, Json(ErrorBody { error })).into_response(),
        }
    }
}

fn check_token(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::MissingToken)?;
    let token = token.split(' ').next().unwrap_or_default();
    if token != expected {
        return Err(ApiError::WrongToken);
    }
    Ok(())
}

/// First `file` part of the form, validated.
async fn read_upload(multipart: &mut Multipart) -> Result<UploadedDocument, ApiError> {
    let upload_error = |e: axum::extract::multipart::MultipartError| {
        ApiError::Upload(e.status(), e.body_text())
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ApiError::BadRequest("No selected file".into()));
        }
        if !allowed_file(&filename) {
            return Err(ApiError::BadRequest("File type not allowed".into()));
        }
        let bytes = field.bytes().await.map_err(upload_error)?;
        return Ok(UploadedDocument::new(filename, bytes.to_vec()));
    }
    Err(ApiError::BadRequest("No file part in the request".into()))
}

/// POST /classify_file
async fn classify_file_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    if let Err(e) = check_token(&headers, &state.api_token) {
        return e.into_response();
    }

    let mut multipart = match multipart {
        Ok(m) => m,
        Err(_) => {
            return ApiError::BadRequest("No file part in the request".into()).into_response()
        }
    };

    let document = match read_upload(&mut multipart).await {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };

    match state.classifier.classify(document).await {
        Ok(result) => (StatusCode::OK, Json::<ClassificationResult>(result)).into_response(),
        Err(failure) => {
            let status = if failure.error.is_document_error() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::BAD_GATEWAY
            };
            let body = FailureBody {
                error: failure.error.to_string(),
                cost_in_microdollars: failure.cost_microdollars,
                time_in_seconds: failure.elapsed_seconds,
            };
            (status, Json(body)).into_response()
        }
    }
}

/// GET /
async fn index_handler() -> Html<&'static str> {
    Html("<h2>POST a document as multipart field <code>file</code> to <code>/classify_file</code> \
          with an <code>Authorization: Bearer &lt;token&gt;</code> header.</h2>")
}

/// GET /health
async fn health_handler() -> Json<HealthBody> {
    Json(HealthBody {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn create_router(classifier: Arc<DocumentClassifier>, api_token: impl Into<String>) -> Router {
    create_router_with_limit(classifier, api_token, DEFAULT_MAX_UPLOAD_BYTES)
}

pub fn create_router_with_limit(
    classifier: Arc<DocumentClassifier>,
    api_token: impl Into<String>,
    max_upload_bytes: usize,
) -> Router {
    let state = AppState {
        classifier,
        api_token: Arc::from(api_token.into()),
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/classify_file", post(classify_file_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(
    addr: SocketAddr,
    classifier: Arc<DocumentClassifier>,
    api_token: impl Into<String>,
) -> std::io::Result<()> {
    let api_token = api_token.into();
    if api_token.is_empty() {
        warn!("Serving with an empty API token");
    }
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(classifier, api_token)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use crate::error::ModelInvocationError;
    use crate::output::UsageReport;
    use crate::pipeline::llm::{Completion, CompletionBackend, CompletionRequest};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const TOKEN: &str = "s3cret";
    const BOUNDARY: &str = "docclass-test-boundary";

    struct Scripted {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CompletionBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn complete(&self, _: &CompletionRequest) -> Result<Completion, ModelInvocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ModelInvocationError::new("rate limited"));
            }
            Ok(Completion {
                text: " Invoice \n".into(),
                usage: UsageReport {
                    input_tokens: 100,
                    output_tokens: 20,
                },
            })
        }
    }

    fn app(fail: bool) -> (Router, Arc<Scripted>) {
        let backend = Arc::new(Scripted {
            calls: AtomicUsize::new(0),
            fail,
        });
        let classifier =
            DocumentClassifier::with_backend(ClassifierConfig::default(), backend.clone()).unwrap();
        (create_router(Arc::new(classifier), TOKEN), backend)
    }

    fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(auth: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri("/classify_file")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
        if let Some(auth) = auth {
            req = req.header("authorization", auth);
        }
        req.body(Body::from(body)).unwrap()
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        serde_json::from_str(&body_string(resp).await).unwrap()
    }

    #[tokio::test]
    async fn missing_or_malformed_token_is_401() {
        let (app, backend) = app(false);
        for auth in [None, Some("Token s3cret"), Some("bearer s3cret")] {
            let resp = app
                .clone()
                .oneshot(upload(auth, multipart_body("file", "a.txt", b"hi")))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "auth {auth:?}");
            assert_eq!(body_string(resp).await, "Missing or invalid token");
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_token_is_403() {
        let (app, _) = app(false);
        let resp = app
            .oneshot(upload(Some("Bearer nope"), multipart_body("file", "a.txt", b"hi")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_string(resp).await, "Unauthorized");
    }

    #[tokio::test]
    async fn upload_validation_errors_are_400() {
        let (app, backend) = app(false);
        let cases = [
            (multipart_body("attachment", "a.txt", b"hi"), "No file part in the request"),
            (multipart_body("file", "", b"hi"), "No selected file"),
            (multipart_body("file", "notes.doc", b"hi"), "File type not allowed"),
            (multipart_body("file", "README", b"hi"), "File type not allowed"),
        ];
        for (body, expected) in cases {
            let resp = app
                .clone()
                .oneshot(upload(Some("Bearer s3cret"), body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(resp).await["error"], expected);
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_multipart_body_is_missing_file_part() {
        let (app, _) = app(false);
        let req = Request::builder()
            .method("POST")
            .uri("/classify_file")
            .header("authorization", "Bearer s3cret")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "No file part in the request");
    }

    #[tokio::test]
    async fn classifies_upload() {
        let (app, backend) = app(false);
        let resp = app
            .oneshot(upload(
                Some("Bearer s3cret"),
                multipart_body("file", "INV-001.TXT", b"INVOICE\nTotal: 42 EUR"),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["file_class"], "Invoice");
        assert_eq!(json["cost_in_microdollars"], 80);
        assert!(json["time_in_seconds"].as_f64().unwrap() >= 0.0);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_document_is_422_with_zero_cost() {
        let (app, backend) = app(false);
        let resp = app
            .oneshot(upload(Some("Bearer s3cret"), multipart_body("file", "blank.txt", b"  \n ")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "No extractable text found in the file.");
        assert_eq!(json["cost_in_microdollars"], 0);
        assert!(json["time_in_seconds"].is_number());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_failure_is_502() {
        let (app, _) = app(true);
        let resp = app
            .oneshot(upload(Some("Bearer s3cret"), multipart_body("file", "a.csv", b"a,b\n1,2")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("rate limited"));
        assert_eq!(json["cost_in_microdollars"], 0);
    }

    #[tokio::test]
    async fn health_and_index_need_no_token() {
        let (app, _) = app(false);
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("/classify_file"));
    }
}
