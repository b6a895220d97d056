//! Writing the finished document
//!
//! Embedded fonts are written here rather than at registration, so the
//! width array and ToUnicode map only cover glyphs that were drawn.

use std::collections::BTreeMap;

use chrono::Utc;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use tracing::debug;

use crate::document::{EmbeddedFont, OutputDocument};
use crate::error::CertGenError;
use crate::fonts::FontProgramKind;

pub const PRODUCER: &str = concat!("certgen ", env!("CARGO_PKG_VERSION"));

/// Font descriptor flags (PDF 32000-1, table 123)
const FLAG_FIXED_PITCH: i64 = 1;
const FLAG_SYMBOLIC: i64 = 1 << 2;
const FLAG_ITALIC: i64 = 1 << 6;

/// bfchar entries per block; the CMap format caps blocks at 100
const BFCHAR_BLOCK: usize = 100;

/// Finish the document and return its bytes
pub fn serialize(output: OutputDocument) -> Result<Vec<u8>, CertGenError> {
    if output.page_ids.is_empty() {
        return Err(CertGenError::Generation("document has no pages".into()));
    }

    let mut doc = output.doc;
    for font in &output.embedded {
        write_embedded_font(&mut doc, font);
    }

    let kids: Vec<Object> = output
        .page_ids
        .iter()
        .map(|id| Object::Reference(*id))
        .collect();
    let count = kids.len() as i64;
    doc.objects.insert(
        output.pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => output.pages_id,
    });
    let created = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(created),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| CertGenError::Generation(format!("Failed to save PDF: {}", e)))?;

    debug!("Serialized {} pages into {} bytes", count, buffer.len());
    Ok(buffer)
}

/// Type0 font with one CID descendant, Identity-H encoded
fn write_embedded_font(doc: &mut Document, font: &EmbeddedFont) {
    let program = &font.program;
    let name = Object::Name(program.name().as_bytes().to_vec());

    let (file_key, file_dict, descendant) = match program.kind {
        FontProgramKind::TrueType => (
            "FontFile2",
            dictionary! { "Length1" => program.data.len() as i64 },
            "CIDFontType2",
        ),
        FontProgramKind::OpenTypeCff => (
            "FontFile3",
            dictionary! { "Subtype" => "OpenType" },
            "CIDFontType0",
        ),
    };
    let file_id = doc.add_object(Stream::new(file_dict, program.data.clone()));

    let mut flags = FLAG_SYMBOLIC;
    if program.fixed_pitch {
        flags |= FLAG_FIXED_PITCH;
    }
    if program.italic_angle != 0 {
        flags |= FLAG_ITALIC;
    }
    let (x_min, y_min, x_max, y_max) = program.bbox;
    let mut descriptor = dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => name.clone(),
        "Flags" => flags,
        "FontBBox" => vec![
            Object::Integer(x_min as i64),
            Object::Integer(y_min as i64),
            Object::Integer(x_max as i64),
            Object::Integer(y_max as i64),
        ],
        "ItalicAngle" => program.italic_angle as i64,
        "Ascent" => program.ascent as i64,
        "Descent" => program.descent as i64,
        "CapHeight" => program.cap_height as i64,
        "StemV" => 80,
    };
    descriptor.set(file_key, file_id);
    let descriptor_id = doc.add_object(descriptor);

    let mut cid_font = dictionary! {
        "Type" => "Font",
        "Subtype" => descendant,
        "BaseFont" => name.clone(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => width_array(font),
    };
    if program.kind == FontProgramKind::TrueType {
        cid_font.set("CIDToGIDMap", "Identity");
    }
    let cid_id = doc.add_object(cid_font);

    let to_unicode_id = doc.add_object(Stream::new(
        Dictionary::new(),
        to_unicode_cmap(&font.used).into_bytes(),
    ));

    doc.objects.insert(
        font.resource_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => name,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_id)],
            "ToUnicode" => to_unicode_id,
        }),
    );

    debug!(
        "Wrote embedded font {} with {} glyphs",
        program.name(),
        font.used.len()
    );
}

/// `[gid [w] gid [w] ...]` for the glyphs that were drawn
fn width_array(font: &EmbeddedFont) -> Vec<Object> {
    let mut widths = Vec::with_capacity(font.used.len() * 2);
    for gid in font.used.keys() {
        widths.push(Object::Integer(*gid as i64));
        widths.push(Object::Array(vec![Object::Integer(
            font.program.advance(*gid) as i64,
        )]));
    }
    widths
}

fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let entries: Vec<(&u16, &char)> = used.iter().collect();

    let mut out = String::new();
    out.push_str("/CIDInit /ProcSet findresource begin\n");
    out.push_str("12 dict begin\n");
    out.push_str("begincmap\n");
    out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n");
    out.push_str("/CMapType 2 def\n");
    out.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    for block in entries.chunks(BFCHAR_BLOCK) {
        out.push_str(&format!("{} beginbfchar\n", block.len()));
        for (gid, ch) in block {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            out.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str("endcmap\n");
    out.push_str("CMapName currentdict /CMap defineresource pop\n");
    out.push_str("end\nend\n");
    out
}
