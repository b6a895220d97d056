//! Batch certificate generation
//!
//! One call turns a template, a field and a list of names into a single
//! PDF with one page per name. Everything that does not depend on the name
//! (scale, font size, field box, font) is computed once up front; the page
//! loop only measures, places and draws.

use serde::Serialize;
use tracing::{debug, info};

use crate::document::{OutputDocument, TextRun};
use crate::error::CertGenError;
use crate::field::{Alignment, FieldConfig, Rgb};
use crate::fonts::{resolve_font, FontFamily, FontHandle};
use crate::geometry::{PageGeometry, PdfBox, Point, Size};
use crate::names::NameList;
use crate::serialize::serialize;
use crate::source::FontSource;
use crate::template::TemplatePage;

/// Fraction of the font size the baseline sits above the field's vertical
/// centre. Approximates centring for typical Latin cap heights and keeps
/// output aligned with the editor preview.
pub const BASELINE_OFFSET_RATIO: f64 = 0.3;

/// Everything one generation call needs. The template bytes are owned by
/// the request and moved into the pipeline.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub template: Vec<u8>,
    pub names: Vec<String>,
    pub field: FieldConfig,
    /// Size the template was rendered at when the field was placed
    pub viewport: Size,
}

impl GenerationRequest {
    pub fn new(template: Vec<u8>, names: NameList, field: FieldConfig, viewport: Size) -> Self {
        Self {
            template,
            names: names.into_vec(),
            field,
            viewport,
        }
    }

    fn validate(&self) -> Result<(), CertGenError> {
        if self.template.is_empty() {
            return Err(CertGenError::InputMissing("No PDF template provided".into()));
        }
        if self.names.is_empty() {
            return Err(CertGenError::InputMissing("No names provided".into()));
        }
        if !self.viewport.is_measured() {
            return Err(CertGenError::InputMissing(
                "Template preview has not been measured".into(),
            ));
        }
        self.field.validate()
    }
}

/// Where one name ended up, in PDF points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StampedPage {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub text_width: f64,
}

#[derive(Debug, Clone)]
pub struct CertificateBatch {
    pub pdf: Vec<u8>,
    pub pages: Vec<StampedPage>,
    /// Name of the font the text was drawn with
    pub font: String,
    /// The decorative font was requested but could not be embedded
    pub font_fallback: bool,
}

impl CertificateBatch {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Values fixed for the whole batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub scale: f64,
    /// Font size in points
    pub font_size: f64,
    pub field: PdfBox,
    pub alignment: Alignment,
    pub color: Rgb,
}

impl Layout {
    pub fn new(field: &FieldConfig, geometry: &PageGeometry) -> Self {
        let scale = geometry.scale();
        Self {
            scale,
            font_size: field.font_size * scale,
            field: geometry.to_pdf(field.rect()),
            alignment: field.alignment,
            color: field.color,
        }
    }

    /// Text origin for a run of the given width
    pub fn position(&self, text_width: f64) -> Point {
        place_text(self.field, text_width, self.font_size, self.alignment)
    }
}

/// Baseline origin of a text run inside the field box.
///
/// Text wider than the box is not clipped or shrunk; it overflows according
/// to the alignment.
pub fn place_text(field: PdfBox, text_width: f64, font_size: f64, alignment: Alignment) -> Point {
    let x = match alignment {
        Alignment::Left => field.x,
        Alignment::Center => field.center_x() - text_width / 2.0,
        Alignment::Right => field.right() - text_width,
    };
    Point {
        x,
        y: field.center_y() + font_size * BASELINE_OFFSET_RATIO,
    }
}

/// Generate one certificate page per name and serialize the result
pub async fn generate_certificates(
    request: GenerationRequest,
    source: &dyn FontSource,
) -> Result<CertificateBatch, CertGenError> {
    request.validate()?;
    let GenerationRequest {
        template,
        names,
        field,
        viewport,
    } = request;

    let template = TemplatePage::load(template)?;
    let geometry = PageGeometry::new(template.size(), viewport);
    let layout = Layout::new(&field, &geometry);

    info!(
        "Generating {} certificates on a {}x{} template (scale {:.4})",
        names.len(),
        geometry.true_size.width,
        geometry.true_size.height,
        layout.scale
    );

    let mut doc = OutputDocument::new(template);
    let font = resolve_font(&mut doc, &field.font_family, field.font_weight, source).await;
    let font_fallback =
        FontFamily::from_identifier(&field.font_family) == FontFamily::Decorative
            && !font.is_embedded();

    let mut pages = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        pages.push(stamp_page(&mut doc, &font, &layout, index, name)?);
    }

    let pdf = serialize(doc)?;
    info!(
        "Generated {} certificates ({} bytes) with {}",
        pages.len(),
        pdf.len(),
        font.name()
    );

    Ok(CertificateBatch {
        pdf,
        pages,
        font: font.name().to_string(),
        font_fallback,
    })
}

fn stamp_page(
    doc: &mut OutputDocument,
    font: &FontHandle,
    layout: &Layout,
    index: usize,
    name: &str,
) -> Result<StampedPage, CertGenError> {
    if name.trim().is_empty() {
        return Err(CertGenError::InputMissing(format!(
            "Name at position {} is empty",
            index + 1
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(CertGenError::Generation(format!(
            "Name at position {} contains control characters",
            index + 1
        )));
    }

    let page = doc.add_template_page()?;
    let text_width = font.width_of(name, layout.font_size)?;
    let origin = layout.position(text_width);

    doc.draw_text(
        page,
        font,
        &TextRun {
            text: name,
            x: origin.x,
            y: origin.y,
            size: layout.font_size,
            color: layout.color,
        },
    )?;

    debug!(
        "Page {}: {:?} at ({:.2}, {:.2}), width {:.2}",
        index + 1,
        name,
        origin.x,
        origin.y,
        text_width
    );

    Ok(StampedPage {
        name: name.to_string(),
        x: origin.x,
        y: origin.y,
        font_size: layout.font_size,
        text_width,
    })
}
