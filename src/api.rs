//! HTTP binding: router, multipart extraction and error mapping.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Error;
use crate::generate::{generate_document, GenerateRequest, Layout};
use crate::input::Upload;

/// Largest accepted request body. Attachments over 5 MB are recompressed
/// during generation, so the transport limit sits well above that.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared handler context
#[derive(Debug, Clone)]
pub struct AppState {
    pub template_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/generate-pdf/", post(generate_pdf))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Generate(#[from] Error),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Generate(Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::Generate(Error::MissingTemplate(path)) => {
                tracing::error!("Template not found: {}", path.display());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Template not found: {}", path.display()),
                )
            }
            ApiError::Generate(e) => {
                tracing::error!("Generation failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PDF generation failed".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("{}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn generate_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, [(String, String); 2], Vec<u8>), ApiError> {
    let request = read_request(multipart).await?;
    info!(
        "Generating {:?} document with {} attachment parts",
        request.layout,
        request.multi_page_pdf.len()
    );

    let template_dir = state.template_dir.clone();
    let generated =
        tokio::task::spawn_blocking(move || generate_document(&request, &template_dir))
            .await
            .map_err(|e| ApiError::Internal(format!("Generation task failed: {}", e)))??;

    Ok((
        StatusCode::OK,
        [
            ("Content-Type".to_string(), "application/pdf".to_string()),
            (
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{}\"", generated.filename),
            ),
        ],
        generated.bytes,
    ))
}

/// Fold multipart fields into a request. Text fields keep whatever the
/// client sent, including empty strings; defaults apply only to absent
/// fields. Empty file parts count as absent.
async fn read_request(mut multipart: Multipart) -> Result<GenerateRequest, ApiError> {
    let mut request = GenerateRequest {
        document_type: "Default Document Type".to_string(),
        customer_name: "CUSTOMER NAME REQ.".to_string(),
        qr_text: "QR TEXT".to_string(),
        ..Default::default()
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "front_image" => request.front_image = file_part(field).await?,
            "back_image" => request.back_image = file_part(field).await?,
            "front_image2" => request.front_image2 = file_part(field).await?,
            "back_image2" => request.back_image2 = file_part(field).await?,
            "multi_page_pdf" => {
                if let Some(upload) = file_part(field).await? {
                    request.multi_page_pdf.push(upload);
                }
            }
            "document_type" => request.document_type = text_part(field).await?,
            "customer_name" => request.customer_name = text_part(field).await?,
            "qr_text" => request.qr_text = text_part(field).await?,
            "schedule_date" => request.schedule_date = Some(text_part(field).await?),
            "layout" => request.layout = Layout::from_name(&text_part(field).await?),
            _ => {}
        }
    }

    Ok(request)
}

async fn file_part(field: Field<'_>) -> Result<Option<Upload>, ApiError> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let bytes = field.bytes().await.map_err(bad_multipart)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(Upload::new(filename, bytes.to_vec())))
}

async fn text_part(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(bad_multipart)
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Malformed multipart request: {}", err))
}
