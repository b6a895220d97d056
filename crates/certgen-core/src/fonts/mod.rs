//! Font resolution
//!
//! Maps the editor's font family identifier to a font registered in one
//! output document: either a standard 14 font or, for the decorative
//! script family, an embedded font program fetched from a [`FontSource`].

mod embedded;
mod standard;

use std::sync::Arc;

use lopdf::ObjectId;
use tracing::{debug, warn};

pub use embedded::{FontProgram, FontProgramKind};
pub use standard::{encode_win_ansi, win_ansi_code, StandardFont};

use crate::document::OutputDocument;
use crate::error::CertGenError;
use crate::field::{FontWeight, DECORATIVE_FONT_ID};
use crate::source::FontSource;

/// Relative path of the decorative font asset
pub const DECORATIVE_FONT_PATH: &str = "fonts/GreatVibes-Regular.ttf";

/// Font used whenever the decorative font cannot be embedded
pub const FALLBACK_FONT: StandardFont = StandardFont::Helvetica;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    SansSerif,
    Serif,
    Monospace,
    /// Script font shipped as a font file; has no bold variant
    Decorative,
}

impl FontFamily {
    /// Unknown identifiers resolve to sans-serif
    pub fn from_identifier(id: &str) -> Self {
        let trimmed = id.trim();
        if trimmed == DECORATIVE_FONT_ID {
            return FontFamily::Decorative;
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "times-roman" | "times" | "times new roman" | "serif" => FontFamily::Serif,
            "courier" | "courier new" | "monospace" => FontFamily::Monospace,
            "great vibes" | "greatvibes" | "great-vibes" => FontFamily::Decorative,
            _ => FontFamily::SansSerif,
        }
    }

    /// Standard font for this family and weight; `None` for the decorative
    /// family, which is never a standard font.
    pub fn standard(&self, weight: FontWeight) -> Option<StandardFont> {
        let regular = match self {
            FontFamily::SansSerif => StandardFont::Helvetica,
            FontFamily::Serif => StandardFont::TimesRoman,
            FontFamily::Monospace => StandardFont::Courier,
            FontFamily::Decorative => return None,
        };
        Some(match weight {
            FontWeight::Bold => regular.bold(),
            FontWeight::Normal => regular,
        })
    }
}

#[derive(Debug, Clone)]
pub enum FontFace {
    Standard(StandardFont),
    Embedded(Arc<FontProgram>),
}

/// A font registered inside one specific [`OutputDocument`].
///
/// The handle remembers which document it belongs to; drawing it into any
/// other document fails.
#[derive(Debug, Clone)]
pub struct FontHandle {
    pub(crate) document: u64,
    pub(crate) resource_id: ObjectId,
    /// Key under the page's /Font resources
    pub(crate) resource_name: String,
    pub(crate) face: FontFace,
}

impl FontHandle {
    /// Width of `text` drawn at `size` points
    pub fn width_of(&self, text: &str, size: f64) -> Result<f64, CertGenError> {
        match &self.face {
            FontFace::Standard(font) => font.width_of(text, size).map_err(|c| {
                CertGenError::Generation(format!(
                    "{} cannot encode character {:?}",
                    font.base_font(),
                    c
                ))
            }),
            FontFace::Embedded(program) => Ok(program.width_of(text, size)),
        }
    }

    pub fn name(&self) -> &str {
        match &self.face {
            FontFace::Standard(font) => font.base_font(),
            FontFace::Embedded(program) => program.name(),
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.face, FontFace::Embedded(_))
    }
}

/// Resolve and register the font for a generation call.
///
/// The decorative family is fetched and embedded; any failure on that path
/// is logged and replaced by [`FALLBACK_FONT`]. This never fails.
pub async fn resolve_font(
    doc: &mut OutputDocument,
    family_id: &str,
    weight: FontWeight,
    source: &dyn FontSource,
) -> FontHandle {
    let family = FontFamily::from_identifier(family_id);

    let Some(standard) = family.standard(weight) else {
        let fetched = source.fetch(DECORATIVE_FONT_PATH).await;
        return embed_or_fallback(doc, fetched);
    };

    debug!("Resolved font family {:?} to {}", family_id, standard.base_font());
    doc.register_standard_font(standard)
}

/// Second half of the decorative path, once the fetch has completed
pub fn embed_or_fallback(
    doc: &mut OutputDocument,
    fetched: Result<Vec<u8>, CertGenError>,
) -> FontHandle {
    let embedded = fetched
        .and_then(|bytes| FontProgram::parse(bytes, stem(DECORATIVE_FONT_PATH)))
        .map(|program| doc.register_embedded_font(program));

    match embedded {
        Ok(handle) => {
            debug!("Embedded decorative font {}", handle.name());
            handle
        }
        Err(e) => {
            warn!(
                "Failed to load decorative font, falling back to {}: {}",
                FALLBACK_FONT.base_font(),
                e
            );
            doc.register_standard_font(FALLBACK_FONT)
        }
    }
}

fn stem(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.split('.').next().unwrap_or(file)
}
