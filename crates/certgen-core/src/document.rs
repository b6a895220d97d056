//! Output document assembly
//!
//! Every page of the output is a fresh copy of the template page. The
//! template's object graph (content streams, images, fonts) is imported
//! once and shared by all copies; each copy gets its own page dictionary,
//! its own resource dictionary and its own text stream.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::error::CertGenError;
use crate::field::Rgb;
use crate::fonts::{encode_win_ansi, FontFace, FontHandle, FontProgram, StandardFont};
use crate::template::{resolve, TemplatePage, INHERITABLE};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

const FONT_KEY_PREFIX: &str = "CertF";

/// Page dictionary entries that are rebuilt for every copy
const REBUILT_PAGE_KEYS: [&[u8]; 7] = [
    b"Parent",
    b"Contents",
    b"Resources",
    b"Annots",
    b"B",
    b"StructParents",
    b"Thumb",
];

/// A page added to a specific [`OutputDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef {
    document: u64,
    index: usize,
    id: ObjectId,
}

impl PageRef {
    /// Zero-based position in the output
    pub fn index(&self) -> usize {
        self.index
    }
}

/// One line of text to draw. Coordinates are PDF points, origin bottom-left.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: Rgb,
}

/// An embedded font whose PDF objects are written at serialization time,
/// once the set of used glyphs is known.
#[derive(Debug)]
pub(crate) struct EmbeddedFont {
    pub(crate) resource_id: ObjectId,
    pub(crate) program: Arc<FontProgram>,
    pub(crate) used: BTreeMap<u16, char>,
}

#[derive(Debug, Default)]
struct ImportMap {
    copied: BTreeMap<ObjectId, ObjectId>,
    /// Template page tree nodes and catalog; references to them become null
    excluded: BTreeSet<ObjectId>,
}

#[derive(Debug)]
pub struct OutputDocument {
    id: u64,
    pub(crate) doc: Document,
    pub(crate) pages_id: ObjectId,
    pub(crate) page_ids: Vec<ObjectId>,
    pub(crate) embedded: Vec<EmbeddedFont>,
    template: TemplatePage,
    imports: ImportMap,
    /// Shared `q` / `Q` streams that isolate template graphics state
    state_streams: Option<(ObjectId, ObjectId)>,
    /// Font keys already used by the template's resources
    reserved_keys: BTreeSet<Vec<u8>>,
    font_count: usize,
}

impl OutputDocument {
    pub fn new(template: TemplatePage) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let imports = ImportMap {
            copied: BTreeMap::new(),
            excluded: page_tree_nodes(&template.doc),
        };
        let reserved_keys = template_font_keys(&template);

        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            doc,
            pages_id,
            page_ids: Vec::new(),
            embedded: Vec::new(),
            template,
            imports,
            state_streams: None,
            reserved_keys,
            font_count: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Register a standard 14 font. Its dictionary is written immediately.
    pub fn register_standard_font(&mut self, font: StandardFont) -> FontHandle {
        let resource_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        self.handle(resource_id, FontFace::Standard(font))
    }

    /// Register an embedded font. Only the object id is reserved here; the
    /// font objects are written by the serializer.
    pub fn register_embedded_font(&mut self, program: FontProgram) -> FontHandle {
        let resource_id = self.doc.new_object_id();
        let program = Arc::new(program);
        self.embedded.push(EmbeddedFont {
            resource_id,
            program: Arc::clone(&program),
            used: BTreeMap::new(),
        });
        self.handle(resource_id, FontFace::Embedded(program))
    }

    fn handle(&mut self, resource_id: ObjectId, face: FontFace) -> FontHandle {
        let resource_name = self.next_font_key();
        FontHandle {
            document: self.id,
            resource_id,
            resource_name,
            face,
        }
    }

    fn next_font_key(&mut self) -> String {
        loop {
            self.font_count += 1;
            let key = format!("{}{}", FONT_KEY_PREFIX, self.font_count);
            if !self.reserved_keys.contains(key.as_bytes()) {
                return key;
            }
        }
    }

    fn state_streams(&mut self) -> (ObjectId, ObjectId) {
        if let Some(ids) = self.state_streams {
            return ids;
        }
        let open = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let close = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        self.state_streams = Some((open, close));
        (open, close)
    }

    /// Append a copy of the template page to the end of the document
    pub fn add_template_page(&mut self) -> Result<PageRef, CertGenError> {
        let page_id = self.doc.new_object_id();
        let (open, close) = self.state_streams();

        let src = &self.template.doc;
        let dst = &mut self.doc;
        let imports = &mut self.imports;
        let source = self.template.page_dict()?;

        let mut page = Dictionary::new();
        for (key, value) in source.iter() {
            if REBUILT_PAGE_KEYS.contains(&key.as_slice()) {
                continue;
            }
            page.set(key.clone(), import_object(src, dst, imports, value));
        }

        for key in INHERITABLE {
            if key == b"Resources".as_slice() || page.has(key) {
                continue;
            }
            if let Some(value) = self.template.inherited(key) {
                page.set(key.to_vec(), import_object(src, dst, imports, value));
            }
        }

        let mut resources = Dictionary::new();
        if let Some(value) = self.template.inherited(b"Resources") {
            if let Ok(dict) = resolve(src, value).as_dict() {
                for (key, value) in dict.iter() {
                    let copied = if key.as_slice() == b"Font" {
                        // Inlined so each page can take its own font entry
                        match resolve(src, value) {
                            Object::Dictionary(fonts) => {
                                Object::Dictionary(import_dict(src, dst, imports, fonts))
                            }
                            _ => continue,
                        }
                    } else {
                        import_object(src, dst, imports, value)
                    };
                    resources.set(key.clone(), copied);
                }
            }
        }

        let mut contents = vec![Object::Reference(open)];
        if let Ok(value) = source.get(b"Contents") {
            match resolve(src, value) {
                Object::Array(items) => {
                    for item in items {
                        if let Some(id) = import_stream(src, dst, imports, item) {
                            contents.push(Object::Reference(id));
                        }
                    }
                }
                Object::Stream(_) => {
                    if let Some(id) = import_stream(src, dst, imports, value) {
                        contents.push(Object::Reference(id));
                    }
                }
                _ => {}
            }
        }
        contents.push(Object::Reference(close));

        let mut annots = Vec::new();
        if let Ok(value) = source.get(b"Annots") {
            if let Ok(items) = resolve(src, value).as_array() {
                for item in items {
                    let Ok(annot) = resolve(src, item).as_dict() else {
                        continue;
                    };
                    let mut copy = Dictionary::new();
                    for (key, value) in annot.iter() {
                        if matches!(key.as_slice(), b"P" | b"Parent" | b"Popup") {
                            continue;
                        }
                        copy.set(key.clone(), import_object(src, dst, imports, value));
                    }
                    copy.set("P", page_id);
                    annots.push(Object::Reference(dst.add_object(copy)));
                }
            }
        }

        page.set("Type", "Page");
        page.set("Parent", self.pages_id);
        page.set("Resources", resources);
        page.set("Contents", contents);
        if !annots.is_empty() {
            page.set("Annots", annots);
        }

        dst.objects.insert(page_id, Object::Dictionary(page));
        self.page_ids.push(page_id);

        debug!("Added page {} as {:?}", self.page_ids.len(), page_id);
        Ok(PageRef {
            document: self.id,
            index: self.page_ids.len() - 1,
            id: page_id,
        })
    }

    /// Draw one line of text onto a page of this document
    pub fn draw_text(
        &mut self,
        page: PageRef,
        font: &FontHandle,
        run: &TextRun<'_>,
    ) -> Result<(), CertGenError> {
        if font.document != self.id {
            return Err(CertGenError::Generation(format!(
                "font {} belongs to another document",
                font.name()
            )));
        }
        if page.document != self.id || self.page_ids.get(page.index) != Some(&page.id) {
            return Err(CertGenError::Generation(format!(
                "page {} does not belong to this document",
                page.index + 1
            )));
        }

        let string = match &font.face {
            FontFace::Standard(standard) => {
                let bytes = encode_win_ansi(run.text).map_err(|c| {
                    CertGenError::Generation(format!(
                        "{} cannot encode character {:?}",
                        standard.base_font(),
                        c
                    ))
                })?;
                Object::String(bytes, StringFormat::Literal)
            }
            FontFace::Embedded(program) => {
                let (bytes, used) = program.encode(run.text);
                let entry = self
                    .embedded
                    .iter_mut()
                    .find(|e| e.resource_id == font.resource_id)
                    .ok_or_else(|| {
                        CertGenError::Generation(format!("font {} is not registered", font.name()))
                    })?;
                entry.used.extend(used);
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        };

        let color = run.color.clamped();
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(font.resource_name.as_bytes().to_vec()),
                        Object::Real(run.size as f32),
                    ],
                ),
                Operation::new(
                    "rg",
                    vec![
                        Object::Real(color.r as f32),
                        Object::Real(color.g as f32),
                        Object::Real(color.b as f32),
                    ],
                ),
                Operation::new(
                    "Td",
                    vec![Object::Real(run.x as f32), Object::Real(run.y as f32)],
                ),
                Operation::new("Tj", vec![string]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        };
        let stream_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let page_dict = self
            .doc
            .get_object_mut(page.id)
            .and_then(Object::as_dict_mut)?;
        page_dict
            .get_mut(b"Contents")
            .and_then(Object::as_array_mut)?
            .push(Object::Reference(stream_id));

        let resources = page_dict
            .get_mut(b"Resources")
            .and_then(Object::as_dict_mut)?;
        if !resources.has(b"Font") {
            resources.set("Font", Dictionary::new());
        }
        resources
            .get_mut(b"Font")
            .and_then(Object::as_dict_mut)?
            .set(font.resource_name.clone(), font.resource_id);

        Ok(())
    }
}

/// Catalog plus every node on a path from the root to a page
fn page_tree_nodes(doc: &Document) -> BTreeSet<ObjectId> {
    let mut nodes = BTreeSet::new();
    if let Ok(root) = doc.trailer.get(b"Root").and_then(Object::as_reference) {
        nodes.insert(root);
    }
    for page_id in doc.get_pages().into_values() {
        let mut current = Some(page_id);
        while let Some(id) = current {
            if !nodes.insert(id) {
                break;
            }
            current = doc
                .get_object(id)
                .and_then(Object::as_dict)
                .and_then(|d| d.get(b"Parent"))
                .and_then(Object::as_reference)
                .ok();
        }
    }
    nodes
}

fn template_font_keys(template: &TemplatePage) -> BTreeSet<Vec<u8>> {
    let doc = &template.doc;
    template
        .inherited(b"Resources")
        .and_then(|r| resolve(doc, r).as_dict().ok())
        .and_then(|r| r.get(b"Font").ok())
        .and_then(|f| resolve(doc, f).as_dict().ok())
        .map(|fonts| fonts.iter().map(|(key, _)| key.clone()).collect())
        .unwrap_or_default()
}

/// Deep-copy a template object into the output. Indirect objects are copied
/// once and shared; references into the template page tree become null.
fn import_object(
    src: &Document,
    dst: &mut Document,
    imports: &mut ImportMap,
    obj: &Object,
) -> Object {
    match obj {
        Object::Reference(id) => import_reference(src, dst, imports, *id)
            .map(Object::Reference)
            .unwrap_or(Object::Null),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| import_object(src, dst, imports, item))
                .collect(),
        ),
        Object::Dictionary(dict) => Object::Dictionary(import_dict(src, dst, imports, dict)),
        Object::Stream(stream) => {
            let mut copy = stream.clone();
            copy.dict = import_dict(src, dst, imports, &stream.dict);
            Object::Stream(copy)
        }
        other => other.clone(),
    }
}

fn import_dict(
    src: &Document,
    dst: &mut Document,
    imports: &mut ImportMap,
    dict: &Dictionary,
) -> Dictionary {
    let mut copy = Dictionary::new();
    for (key, value) in dict.iter() {
        copy.set(key.clone(), import_object(src, dst, imports, value));
    }
    copy
}

fn import_reference(
    src: &Document,
    dst: &mut Document,
    imports: &mut ImportMap,
    id: ObjectId,
) -> Option<ObjectId> {
    if imports.excluded.contains(&id) {
        return None;
    }
    if let Some(copied) = imports.copied.get(&id) {
        return Some(*copied);
    }
    let source = src.get_object(id).ok()?;

    // Reserve first so cycles resolve to the new id
    let new_id = dst.new_object_id();
    imports.copied.insert(id, new_id);
    let copied = import_object(src, dst, imports, source);
    dst.objects.insert(new_id, copied);
    Some(new_id)
}

/// Import a content stream entry, which must end up indirect
fn import_stream(
    src: &Document,
    dst: &mut Document,
    imports: &mut ImportMap,
    obj: &Object,
) -> Option<ObjectId> {
    match obj {
        Object::Reference(id) => import_reference(src, dst, imports, *id),
        Object::Stream(_) => {
            let copied = import_object(src, dst, imports, obj);
            Some(dst.add_object(copied))
        }
        _ => None,
    }
}
