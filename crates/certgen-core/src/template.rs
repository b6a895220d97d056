//! Template loading
//!
//! The template is a single-page PDF. Only the first page is used; its
//! MediaBox gives the true page size every field position is mapped onto.

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::warn;

use crate::error::CertGenError;
use crate::geometry::Size;

/// US Letter, used when a page tree declares no MediaBox at all
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Page attributes that may be inherited from ancestor page tree nodes
pub(crate) const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic /Parent chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug)]
pub struct TemplatePage {
    pub(crate) doc: Document,
    pub(crate) page_id: ObjectId,
    size: Size,
}

impl TemplatePage {
    /// Parse template bytes. The bytes are owned by the template from here on.
    pub fn load(bytes: Vec<u8>) -> Result<Self, CertGenError> {
        if bytes.is_empty() {
            return Err(CertGenError::TemplateCorrupt("template is empty".into()));
        }

        let doc = Document::load_mem(&bytes)
            .map_err(|e| CertGenError::TemplateCorrupt(format!("Failed to parse PDF: {}", e)))?;

        let pages = doc.get_pages();
        let (&first, &page_id) = pages
            .iter()
            .next()
            .ok_or_else(|| CertGenError::TemplateCorrupt("PDF has no pages".into()))?;
        if pages.len() > 1 {
            warn!(
                "Template has {} pages; only page {} is used",
                pages.len(),
                first
            );
        }

        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|_| CertGenError::TemplateCorrupt("Page is not a dictionary".into()))?;

        let media_box = match inherited_attribute(&doc, page, b"MediaBox") {
            Some(obj) => parse_box_array(&doc, obj)?,
            None => DEFAULT_MEDIA_BOX,
        };
        let size = Size::new(media_box[2] - media_box[0], media_box[3] - media_box[1]);
        if !size.is_measured() {
            return Err(CertGenError::TemplateCorrupt(format!(
                "Page has an empty MediaBox ({} x {})",
                size.width, size.height
            )));
        }

        Ok(Self { doc, page_id, size })
    }

    /// True page size in points
    pub fn size(&self) -> Size {
        self.size
    }

    pub(crate) fn page_dict(&self) -> Result<&Dictionary, CertGenError> {
        self.doc
            .get_object(self.page_id)
            .and_then(Object::as_dict)
            .map_err(|e| CertGenError::Generation(format!("Template page unreadable: {}", e)))
    }

    /// Value of an inheritable page attribute, looked up through the page tree
    pub(crate) fn inherited(&self, key: &[u8]) -> Option<&Object> {
        let page = self.page_dict().ok()?;
        inherited_attribute(&self.doc, page, key)
    }
}

/// Look up `key` on the page, then on each ancestor
fn inherited_attribute<'a>(
    doc: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_object(parent_id).and_then(Object::as_dict).ok()?;
    }
    None
}

/// Parse a box array [x1, y1, x2, y2], following references
fn parse_box_array(doc: &Document, obj: &Object) -> Result<[f64; 4], CertGenError> {
    let array = resolve(doc, obj)
        .as_array()
        .map_err(|_| CertGenError::TemplateCorrupt("MediaBox is not an array".into()))?;
    if array.len() != 4 {
        return Err(CertGenError::TemplateCorrupt(
            "MediaBox must have 4 elements".into(),
        ));
    }

    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = match resolve(doc, obj) {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => *n as f64,
            _ => {
                return Err(CertGenError::TemplateCorrupt(format!(
                    "MediaBox element {} is not a number",
                    i
                )))
            }
        };
    }

    Ok(result)
}

/// Follow a reference chain to the underlying object
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    let mut current = obj;
    for _ in 0..MAX_TREE_DEPTH {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => current = target,
                Err(_) => return &Object::Null,
            },
            _ => return current,
        }
    }
    &Object::Null
}
