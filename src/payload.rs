//! Request/response payloads and request validation.
//!
//! Inbound documents arrive as loose JSON so that missing-field errors
//! can be reported with the API's own messages (HTTP 400 + `{ success:
//! false, error }`) instead of a generic deserialization rejection; the
//! typed [`Document`] is only constructed once the required fields are
//! known to be present.

use billkit_render::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MISSING_DOCUMENT_FIELDS: &str =
    "Invalid document data. Document, type, and documentNumber are required.";
pub const MISSING_EMAIL_FIELDS: &str =
    "Missing required fields: document, recipientEmail, or recipientName";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePdfRequest {
    pub document: Option<Value>,
    pub module_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePdfResponse {
    pub success: bool,
    pub document_id: String,
    pub pdf_base64: String,
    pub download_link: String,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub base64: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentRequest {
    pub document_type: Option<String>,
    pub document: Option<Value>,
    pub module_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentResponse {
    pub success: bool,
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub document: Option<Value>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub module_name: Option<String>,
    /// Optional hosted download link, echoed into the email body.
    pub pdf_download_link: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub recipient: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Returns `true` when `value` has a non-empty string at `key`.
pub fn has_string_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_str).map(str::trim).is_some_and(|s| !s.is_empty())
}

/// Validates presence of the required fields, then builds the typed
/// [`Document`]. Both failure modes are caller-facing messages.
pub fn parse_document(value: Option<Value>) -> Result<Document, String> {
    let value = value.ok_or_else(|| MISSING_DOCUMENT_FIELDS.to_string())?;
    if !has_string_field(&value, "type") || !has_string_field(&value, "documentNumber") {
        return Err(MISSING_DOCUMENT_FIELDS.to_string());
    }
    serde_json::from_value(value).map_err(|err| format!("Invalid document data: {err}"))
}

/// Replaces anything outside `[A-Za-z0-9_-]` so user-supplied identifiers
/// are safe as filename components.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    if cleaned.is_empty() { "document".to_string() } else { cleaned }
}
