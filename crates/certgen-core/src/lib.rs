//! Certificate batch stamping
//!
//! Takes a one-page PDF template, a text field placed on a scaled preview of
//! that template, and a list of names, and produces one PDF with a page per
//! name. Field positions are given in viewport pixels and mapped onto the
//! page with a single uniform scale factor.

pub mod document;
pub mod error;
pub mod field;
pub mod fonts;
pub mod geometry;
pub mod names;
pub mod serialize;
pub mod source;
pub mod stamper;
pub mod template;

pub use document::{OutputDocument, PageRef, TextRun};
pub use error::CertGenError;
pub use field::{Alignment, FieldConfig, FontWeight, Rgb};
pub use fonts::{resolve_font, FontFamily, FontHandle, StandardFont};
pub use geometry::{dom_to_pdf, fit_to_container, pdf_to_dom, resolve_scale, PageGeometry, Size};
pub use names::{parse_csv_names, NameList};
pub use serialize::serialize;
pub use source::{DirFontSource, FontSource, NoFontSource, StaticFontSource};
#[cfg(feature = "http")]
pub use source::HttpFontSource;
pub use stamper::{generate_certificates, CertificateBatch, GenerationRequest, StampedPage};
pub use template::TemplatePage;

/// File name offered for the generated bundle
pub const DEFAULT_OUTPUT_FILENAME: &str = "certificates_bundle.pdf";
