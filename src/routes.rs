//! HTTP routing and request handlers.
//!
//! Thin plumbing around the render engine and the delivery adapter: every
//! handler validates its payload first (HTTP 400, no side effects), then
//! dispatches the blocking render/SMTP work through `spawn_blocking`.
//! Failures surface as `{ "success": false, "error": <message> }`.

use crate::payload::{
    DownloadQuery, GenerateDocumentRequest, GenerateDocumentResponse, GeneratePdfRequest,
    GeneratePdfResponse, HealthResponse, MISSING_EMAIL_FIELDS, SendEmailRequest,
    SendEmailResponse, has_string_field, parse_document, sanitize_component,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use billkit_config::Branding;
use billkit_render::{Document, DocumentKind};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Mirrors the 10 MB JSON body limit of the original service.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn router(state: AppState) -> axum::Router {
    let static_dir = state.config.storage.output_dir.clone();
    axum::Router::new()
        .route("/health", get(health))
        .route("/api/pdf/generate", post(generate_pdf))
        .route("/api/pdf/download/{id}", get(download_pdf))
        .route("/generate-document", post(generate_document))
        .route("/api/email/send", post(send_email))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// A request failure already shaped for the JSON envelope.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", message: "Backend API is running" })
}

async fn generate_pdf(
    State(state): State<AppState>,
    Json(request): Json<GeneratePdfRequest>,
) -> Result<Json<GeneratePdfResponse>, ApiError> {
    let document = parse_document(request.document).map_err(ApiError::bad_request)?;
    let branding = state.config.branding.with_company(request.module_name.as_deref());
    let filename = format!("{}_{}.pdf", document.kind, document.document_number);
    let pdf = render_blocking(&state, document, branding).await?;

    let document_id = new_document_id();
    // The link embeds URL-safe base64 so it needs no percent-encoding;
    // the response field keeps the standard alphabet for client use.
    let download_link = format!(
        "{}/api/pdf/download/{}?base64={}",
        state.config.server.public_base(),
        document_id,
        URL_SAFE_NO_PAD.encode(&pdf),
    );
    Ok(Json(GeneratePdfResponse {
        success: true,
        document_id,
        pdf_base64: STANDARD.encode(&pdf),
        download_link,
        filename,
    }))
}

async fn download_pdf(
    Path(_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let payload = query.base64.ok_or_else(|| ApiError::bad_request("PDF data not found"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.as_bytes())
        .or_else(|_| STANDARD.decode(payload.as_bytes()))
        .map_err(|_| ApiError::bad_request("PDF data is not valid base64"))?;
    let headers = [
        (header::CONTENT_TYPE, "application/pdf"),
        (header::CONTENT_DISPOSITION, "inline; filename=\"document.pdf\""),
        (header::CACHE_CONTROL, "public, max-age=3600"),
    ];
    Ok((headers, bytes).into_response())
}

async fn generate_document(
    State(state): State<AppState>,
    Json(request): Json<GenerateDocumentRequest>,
) -> Result<Json<GenerateDocumentResponse>, ApiError> {
    let kind = request
        .document_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("documentType is required"))?
        .parse::<DocumentKind>()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    let value = request.document.ok_or_else(|| ApiError::bad_request("document is required"))?;
    if !has_string_field(&value, "documentNumber") {
        return Err(ApiError::bad_request("document.documentNumber is required"));
    }
    let document = parse_document(Some(value)).map_err(ApiError::bad_request)?;
    if document.kind != kind {
        return Err(ApiError::bad_request(format!(
            "documentType \"{kind}\" does not match document.type \"{}\"",
            document.kind
        )));
    }

    let branding = state.config.branding.with_company(request.module_name.as_deref());
    let filename = stored_filename(&document);
    let pdf = render_blocking(&state, document, branding).await?;

    let output_dir = state.config.storage.output_dir.clone();
    let target = output_dir.join(&filename);
    if let Err(err) = tokio::fs::create_dir_all(&output_dir).await {
        tracing::error!(error = %err, dir = %output_dir.display(), "could not create output directory");
        return Err(ApiError::internal("Failed to store PDF"));
    }
    if let Err(err) = tokio::fs::write(&target, &pdf).await {
        tracing::error!(error = %err, path = %target.display(), "could not persist PDF");
        return Err(ApiError::internal("Failed to store PDF"));
    }
    tracing::info!(path = %target.display(), bytes = pdf.len(), "document stored");

    let url = format!("{}/static/{}", state.config.server.public_base(), filename);
    Ok(Json(GenerateDocumentResponse { success: true, filename, url }))
}

async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let recipient_email = non_empty(request.recipient_email);
    let recipient_name = non_empty(request.recipient_name);
    let (recipient_email, recipient_name) = match (recipient_email, recipient_name, &request.document)
    {
        (Some(email), Some(name), Some(_)) => (email, name),
        _ => return Err(ApiError::bad_request(MISSING_EMAIL_FIELDS)),
    };
    let document = parse_document(request.document).map_err(ApiError::bad_request)?;
    let mailer = state.mailer.clone().ok_or_else(|| {
        ApiError::internal(billkit_mailer::error::ErrorKind::MissingCredentials.to_string())
    })?;

    let branding = state.config.branding.with_company(request.module_name.as_deref());
    let engine = state.engine.clone();
    let kind = document.kind;
    let download_link = non_empty(request.pdf_download_link);
    let task = tokio::task::spawn_blocking(move || {
        let pdf = engine
            .render_document(&document, &branding)
            .map_err(|err| format!("Failed to generate PDF: {err}"))?;
        mailer
            .send_document(
                &recipient_email,
                &recipient_name,
                kind,
                &branding,
                pdf,
                download_link.as_deref(),
            )
            .map_err(|err| err.to_string())
    })
    .await;
    match task {
        Ok(Ok(receipt)) => Ok(Json(SendEmailResponse {
            success: true,
            message: "Email sent successfully".to_string(),
            recipient: receipt.recipient,
            filename: receipt.filename,
        })),
        Ok(Err(message)) => {
            tracing::error!(error = %message, "email delivery failed");
            Err(ApiError::internal(message))
        }
        Err(err) => {
            tracing::error!(error = %err, "email task panicked");
            Err(ApiError::internal("Failed to send email"))
        }
    }
}

/// Runs the blocking render on the dedicated thread pool. Each in-flight
/// request owns a full browser process; there is deliberately no pool or
/// concurrency cap here.
async fn render_blocking(
    state: &AppState,
    document: Document,
    branding: Branding,
) -> Result<Vec<u8>, ApiError> {
    let engine = state.engine.clone();
    let task =
        tokio::task::spawn_blocking(move || engine.render_document(&document, &branding)).await;
    match task {
        Ok(Ok(pdf)) => Ok(pdf),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "pdf generation failed");
            Err(ApiError::internal(format!("Failed to generate PDF: {err}")))
        }
        Err(err) => {
            tracing::error!(error = %err, "render task panicked");
            Err(ApiError::internal("Failed to generate PDF"))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// `<millis>-<random>`, mirroring the original id shape.
fn new_document_id() -> String {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let noise = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis}-{}", &noise[..9])
}

/// `<type>_<number>_<timestamp>_<random>.pdf` — collision-resistant and
/// filesystem-safe regardless of what the document number contains.
fn stored_filename(document: &Document) -> String {
    let noise = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}_{}.pdf",
        document.kind,
        sanitize_component(&document.document_number),
        time::OffsetDateTime::now_utc().unix_timestamp(),
        &noise[..8],
    )
}
