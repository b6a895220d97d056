//! Error types for the certificate server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use certgen_core::CertGenError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Generation(#[from] CertGenError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Generation(err) => match err {
                CertGenError::InputMissing(_) | CertGenError::InvalidField(_) => {
                    StatusCode::BAD_REQUEST
                }
                CertGenError::TemplateCorrupt(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CertGenError::FontEmbed(_) | CertGenError::Generation(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "INVALID_REQUEST",
            ServerError::Generation(err) => err.kind(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            success: false,
            code: self.code().to_string(),
            error: match &self {
                // The user-facing sentence only, without the error class prefix
                ServerError::Generation(CertGenError::InputMissing(msg)) => msg.clone(),
                other => other.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
