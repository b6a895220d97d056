//! TrueType/OpenType programs embedded as composite (Type0) fonts
//!
//! Text drawn with an embedded font is encoded as two-byte glyph ids
//! (Identity-H), so every glyph the font maps is reachable regardless of
//! WinAnsi coverage.

use std::collections::HashMap;

use ttf_parser::{name_id, Face, GlyphId};

use crate::error::CertGenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontProgramKind {
    TrueType,
    OpenTypeCff,
}

/// A parsed font program plus everything needed to measure, encode and
/// later write its PDF objects. Metrics are stored in 1/1000 em.
#[derive(Debug)]
pub struct FontProgram {
    pub(crate) postscript_name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) kind: FontProgramKind,
    pub(crate) ascent: i16,
    pub(crate) descent: i16,
    pub(crate) cap_height: i16,
    pub(crate) italic_angle: i16,
    pub(crate) bbox: (i16, i16, i16, i16),
    pub(crate) fixed_pitch: bool,
    glyphs: HashMap<char, u16>,
    /// Advance per glyph id, already scaled to 1/1000 em
    advances: Vec<u16>,
}

impl FontProgram {
    /// Parse a font file. `fallback_name` is used when the font carries no
    /// PostScript name.
    pub fn parse(data: Vec<u8>, fallback_name: &str) -> Result<Self, CertGenError> {
        if data.is_empty() {
            return Err(CertGenError::FontEmbed("font file is empty".into()));
        }

        let face = Face::parse(&data, 0)
            .map_err(|e| CertGenError::FontEmbed(format!("invalid font data: {}", e)))?;

        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let to_em = |v: i16| (v as f32 * scale).round() as i16;

        let advances: Vec<u16> = (0..face.number_of_glyphs())
            .map(|gid| {
                let adv = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0);
                (adv as f32 * scale).round() as u16
            })
            .collect();

        let mut glyphs = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|cp| {
                    let Some(ch) = char::from_u32(cp) else {
                        return;
                    };
                    if let Some(gid) = subtable.glyph_index(cp) {
                        glyphs.entry(ch).or_insert(gid.0);
                    }
                });
            }
        }
        if glyphs.is_empty() {
            return Err(CertGenError::FontEmbed(
                "font has no unicode character map".into(),
            ));
        }

        let ascent = to_em(face.ascender());
        let bbox = face.global_bounding_box();
        let kind = if face.tables().cff.is_some() {
            FontProgramKind::OpenTypeCff
        } else {
            FontProgramKind::TrueType
        };

        let postscript_name = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string())
            .map(|n| sanitize_font_name(&n))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| sanitize_font_name(fallback_name));

        Ok(Self {
            postscript_name,
            kind,
            ascent,
            descent: to_em(face.descender()),
            cap_height: face.capital_height().map(to_em).unwrap_or(ascent),
            italic_angle: face.italic_angle().map(|a| a.round() as i16).unwrap_or(0),
            bbox: (
                to_em(bbox.x_min),
                to_em(bbox.y_min),
                to_em(bbox.x_max),
                to_em(bbox.y_max),
            ),
            fixed_pitch: face.is_monospaced(),
            glyphs,
            advances,
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.postscript_name
    }

    /// Glyph id for a character, `.notdef` (0) when the font lacks it
    pub fn glyph_id(&self, c: char) -> u16 {
        self.glyphs.get(&c).copied().unwrap_or(0)
    }

    /// Advance of a glyph in 1/1000 em
    pub fn advance(&self, gid: u16) -> u16 {
        self.advances.get(gid as usize).copied().unwrap_or(0)
    }

    pub fn width_of(&self, text: &str, size: f64) -> f64 {
        let total: u32 = text
            .chars()
            .map(|c| self.advance(self.glyph_id(c)) as u32)
            .sum();
        total as f64 * size / 1000.0
    }

    /// Identity-H encoding: big-endian glyph ids, plus the (gid, char)
    /// pairs that were used.
    pub fn encode(&self, text: &str) -> (Vec<u8>, Vec<(u16, char)>) {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        let mut used = Vec::new();
        for c in text.chars() {
            let gid = self.glyph_id(c);
            bytes.extend_from_slice(&gid.to_be_bytes());
            used.push((gid, c));
        }
        (bytes, used)
    }
}

/// Keep only characters that are legal in a PDF name and meaningful in a
/// BaseFont entry.
fn sanitize_font_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .collect()
}
