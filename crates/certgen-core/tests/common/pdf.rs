//! Template builder and output inspection

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub const TEMPLATE_HEADLINE: &str = "Certificate of Completion";

/// Template with `num_pages` pages of `width` x `height` points, each
/// carrying a headline drawn with Times-Roman under the key /F1.
pub fn create_template(width: i64, height: i64, num_pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });

    let mut kids = Vec::new();
    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(18)],
                ),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(height - 72)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("{} {}", TEMPLATE_HEADLINE, i + 1).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => num_pages as i64,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// One text draw found in a content stream
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub font_key: Vec<u8>,
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    pub color: [f64; 3],
    pub bytes: Vec<u8>,
    pub hex: bool,
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(n) => *n as f64,
        Object::Real(n) => *n as f64,
        other => panic!("expected a number, got {:?}", other),
    }
}

pub fn stream_content(doc: &Document, id: ObjectId) -> Vec<u8> {
    let stream = doc.get_object(id).unwrap().as_stream().unwrap();
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

/// All text draws of a content stream
pub fn text_draws(content: &[u8]) -> Vec<TextDraw> {
    let ops = Content::decode(content).unwrap().operations;
    let mut draws = Vec::new();
    let mut font_key = Vec::new();
    let mut font_size = 0.0;
    let mut color = [0.0; 3];
    let mut origin = (0.0, 0.0);

    for op in ops {
        match op.operator.as_str() {
            "Tf" => {
                font_key = op.operands[0].as_name().unwrap().to_vec();
                font_size = number(&op.operands[1]);
            }
            "rg" => {
                color = [
                    number(&op.operands[0]),
                    number(&op.operands[1]),
                    number(&op.operands[2]),
                ];
            }
            "Td" => origin = (number(&op.operands[0]), number(&op.operands[1])),
            "Tj" => {
                let (bytes, hex) = match &op.operands[0] {
                    Object::String(bytes, format) => {
                        (bytes.clone(), *format == StringFormat::Hexadecimal)
                    }
                    other => panic!("expected a string, got {:?}", other),
                };
                draws.push(TextDraw {
                    font_key: font_key.clone(),
                    font_size,
                    x: origin.0,
                    y: origin.1,
                    color,
                    bytes,
                    hex,
                });
            }
            _ => {}
        }
    }
    draws
}

/// Page ids of an output document in page order
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// The stamped name on a page: the single draw in its last content stream
pub fn stamped_draw(doc: &Document, page_id: ObjectId) -> TextDraw {
    let contents = doc.get_page_contents(page_id);
    let last = *contents.last().unwrap();
    let mut draws = text_draws(&stream_content(doc, last));
    assert_eq!(draws.len(), 1, "expected exactly one stamped text run");
    draws.remove(0)
}

/// Font dictionary behind a page's font resource key
pub fn page_font<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> &'a Dictionary {
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let resources = match page.get(b"Resources").unwrap() {
        Object::Reference(id) => doc.get_object(*id).unwrap().as_dict().unwrap(),
        Object::Dictionary(dict) => dict,
        other => panic!("unexpected resources {:?}", other),
    };
    let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
    let font_id = fonts.get(key).unwrap().as_reference().unwrap();
    doc.get_object(font_id).unwrap().as_dict().unwrap()
}

pub fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> &'a [u8] {
    dict.get(key).unwrap().as_name().unwrap()
}

/// Concatenated text of every content stream on a page
pub fn page_text(doc: &Document, page_id: ObjectId) -> Vec<Vec<u8>> {
    doc.get_page_contents(page_id)
        .into_iter()
        .flat_map(|id| text_draws(&stream_content(doc, id)))
        .map(|draw| draw.bytes)
        .collect()
}
