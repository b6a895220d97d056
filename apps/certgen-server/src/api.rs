//! API handlers for the certificate server
//!
//! Provides REST endpoints for:
//! - CSV name preview
//! - Certificate bundle generation

use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use certgen_core::{
    fit_to_container, generate_certificates, names::summary, parse_csv_names, CertGenError,
    FieldConfig, GenerationRequest, NameList, Size, TemplatePage, DEFAULT_OUTPUT_FILENAME,
};

use crate::error::ServerError;
use crate::AppState;

/// Shown when the template or the name list is missing
pub const MISSING_INPUTS: &str = "Please upload both a PDF template and a CSV with names.";

pub const CERTIFICATE_COUNT_HEADER: HeaderName = HeaderName::from_static("x-certificate-count");
pub const FONT_FALLBACK_HEADER: HeaderName = HeaderName::from_static("x-font-fallback");

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "certgen-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Name preview response
#[derive(Serialize)]
pub struct NamesPreviewResponse {
    pub success: bool,
    pub count: usize,
    pub names: Vec<String>,
    pub summary: String,
}

/// Handler: POST /api/names/preview
///
/// Body is the raw CSV text.
pub async fn handle_names_preview(body: String) -> Json<NamesPreviewResponse> {
    let names = parse_csv_names(&body);
    debug!("CSV preview: {} names", names.len());

    Json(NamesPreviewResponse {
        success: true,
        count: names.len(),
        summary: summary(&names),
        names,
    })
}

/// Certificate request body
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateApiRequest {
    /// Base64-encoded template PDF, optionally as a data URL
    #[serde(default)]
    pub template: Option<String>,

    /// Names, one page each. Takes precedence over `csv`.
    #[serde(default)]
    pub names: Option<Vec<String>>,

    /// Raw CSV text; the first column holds the names
    #[serde(default)]
    pub csv: Option<String>,

    #[serde(default)]
    pub field: FieldConfig,

    /// Size the template was rendered at in the editor
    #[serde(default)]
    pub viewport: Option<Size>,

    /// Editor container size, used to derive the viewport when it is absent
    #[serde(default)]
    pub container: Option<Size>,
}

/// Handler: POST /api/certificates
pub async fn handle_generate_certificates(
    State(state): State<AppState>,
    Json(req): Json<CertificateApiRequest>,
) -> Result<Response, ServerError> {
    let request_id = Uuid::new_v4();

    let template = match req.template.as_deref().map(str::trim) {
        Some(encoded) if !encoded.is_empty() => decode_template(encoded)?,
        _ => Vec::new(),
    };
    let names = match (req.names, req.csv) {
        (Some(names), _) if !names.is_empty() => names,
        (_, Some(csv)) => parse_csv_names(&csv),
        _ => Vec::new(),
    };
    if template.is_empty() || names.is_empty() {
        return Err(CertGenError::InputMissing(MISSING_INPUTS.to_string()).into());
    }
    let names = NameList::new(names)?;

    let viewport = match (req.viewport, req.container) {
        (Some(viewport), _) => viewport,
        (None, Some(container)) => {
            let page = TemplatePage::load(template.clone())?.size();
            fit_to_container(page, container).ok_or_else(|| {
                CertGenError::InputMissing("Editor container has not been measured".into())
            })?
        }
        (None, None) => {
            return Err(ServerError::InvalidRequest(
                "either viewport or container is required".into(),
            ))
        }
    };

    info!(
        %request_id,
        "Certificate request: {} names, font={}, viewport={}x{}",
        names.len(),
        req.field.font_family,
        viewport.width,
        viewport.height
    );

    let request = GenerationRequest::new(template, names, req.field, viewport);
    let batch = generate_certificates(request, state.fonts.as_ref()).await?;

    info!(
        %request_id,
        "Generated {} pages ({} bytes)",
        batch.page_count(),
        batch.pdf.len()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DEFAULT_OUTPUT_FILENAME),
            ),
            (CERTIFICATE_COUNT_HEADER, batch.page_count().to_string()),
            (FONT_FALLBACK_HEADER, batch.font_fallback.to_string()),
        ],
        batch.pdf,
    )
        .into_response())
}

/// Accepts plain base64 or a `data:...;base64,` URL
fn decode_template(encoded: &str) -> Result<Vec<u8>, ServerError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    STANDARD
        .decode(payload)
        .map_err(|e| ServerError::InvalidRequest(format!("template is not valid base64: {}", e)))
}
