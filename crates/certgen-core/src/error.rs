use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertGenError {
    #[error("Missing input: {0}")]
    InputMissing(String),

    #[error("Invalid field configuration: {0}")]
    InvalidField(String),

    #[error("PDF template has been corrupted. Please re-upload the template. ({0})")]
    TemplateCorrupt(String),

    /// Only raised on the decorative font path, where it is logged and
    /// replaced by the standard fallback font.
    #[error("Failed to embed font: {0}")]
    FontEmbed(String),

    #[error("Certificate generation failed: {0}")]
    Generation(String),
}

impl CertGenError {
    /// Stable machine-readable code for the error class
    pub fn kind(&self) -> &'static str {
        match self {
            CertGenError::InputMissing(_) => "INPUT_MISSING",
            CertGenError::InvalidField(_) => "INVALID_FIELD",
            CertGenError::TemplateCorrupt(_) => "TEMPLATE_CORRUPT",
            CertGenError::FontEmbed(_) => "FONT_EMBED_FAILURE",
            CertGenError::Generation(_) => "GENERATION_FAILURE",
        }
    }
}

impl From<lopdf::Error> for CertGenError {
    fn from(err: lopdf::Error) -> Self {
        CertGenError::Generation(err.to_string())
    }
}
