//! Minimal TrueType font builder
//!
//! Produces a font with only the tables a parser needs to measure and map
//! text: cmap, head, hhea, hmtx, maxp. No outlines.

/// Printable ASCII ' '..='~' maps to glyph ids 1..=95
pub const FIRST_CHAR: u32 = 0x20;
pub const LAST_CHAR: u32 = 0x7E;
pub const NUM_GLYPHS: u16 = (LAST_CHAR - FIRST_CHAR + 2) as u16;

pub const UNITS_PER_EM: u16 = 1000;
pub const GLYPH_ADVANCE: u16 = 500;
pub const SPACE_ADVANCE: u16 = 250;

/// Glyph id the test font assigns to an ASCII character
pub fn glyph_id(c: char) -> u16 {
    (c as u32 - FIRST_CHAR + 1) as u16
}

pub fn build_test_font() -> Vec<u8> {
    let tables: [(&[u8; 4], Vec<u8>); 5] = [
        (b"cmap", cmap()),
        (b"head", head()),
        (b"hhea", hhea()),
        (b"hmtx", hmtx()),
        (b"maxp", maxp()),
    ];

    let mut font = Vec::new();
    font.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    font.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    font.extend_from_slice(&64u16.to_be_bytes()); // searchRange
    font.extend_from_slice(&2u16.to_be_bytes()); // entrySelector
    font.extend_from_slice(&16u16.to_be_bytes()); // rangeShift

    let header_len = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        font.extend_from_slice(&tag[..]);
        font.extend_from_slice(&0u32.to_be_bytes()); // checksum
        font.extend_from_slice(&((header_len + body.len()) as u32).to_be_bytes());
        font.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
    }
    font.extend_from_slice(&body);
    font
}

/// Format 12 subtable, Windows full repertoire encoding
fn cmap() -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0u16.to_be_bytes()); // version
    t.extend_from_slice(&1u16.to_be_bytes()); // numTables
    t.extend_from_slice(&3u16.to_be_bytes()); // platform: Windows
    t.extend_from_slice(&10u16.to_be_bytes()); // encoding: UCS-4
    t.extend_from_slice(&12u32.to_be_bytes()); // subtable offset

    t.extend_from_slice(&12u16.to_be_bytes()); // format
    t.extend_from_slice(&0u16.to_be_bytes()); // reserved
    t.extend_from_slice(&28u32.to_be_bytes()); // length
    t.extend_from_slice(&0u32.to_be_bytes()); // language
    t.extend_from_slice(&1u32.to_be_bytes()); // numGroups
    t.extend_from_slice(&FIRST_CHAR.to_be_bytes());
    t.extend_from_slice(&LAST_CHAR.to_be_bytes());
    t.extend_from_slice(&1u32.to_be_bytes()); // startGlyphID
    t
}

fn head() -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    t.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // fontRevision
    t.extend_from_slice(&0u32.to_be_bytes()); // checksumAdjustment
    t.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    t.extend_from_slice(&0u16.to_be_bytes()); // flags
    t.extend_from_slice(&UNITS_PER_EM.to_be_bytes());
    t.extend_from_slice(&0u64.to_be_bytes()); // created
    t.extend_from_slice(&0u64.to_be_bytes()); // modified
    t.extend_from_slice(&0i16.to_be_bytes()); // xMin
    t.extend_from_slice(&(-200i16).to_be_bytes()); // yMin
    t.extend_from_slice(&1000i16.to_be_bytes()); // xMax
    t.extend_from_slice(&800i16.to_be_bytes()); // yMax
    t.extend_from_slice(&0u16.to_be_bytes()); // macStyle
    t.extend_from_slice(&8u16.to_be_bytes()); // lowestRecPPEM
    t.extend_from_slice(&2i16.to_be_bytes()); // fontDirectionHint
    t.extend_from_slice(&0i16.to_be_bytes()); // indexToLocFormat
    t.extend_from_slice(&0i16.to_be_bytes()); // glyphDataFormat
    assert_eq!(t.len(), 54);
    t
}

fn hhea() -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    t.extend_from_slice(&800i16.to_be_bytes()); // ascender
    t.extend_from_slice(&(-200i16).to_be_bytes()); // descender
    t.extend_from_slice(&0i16.to_be_bytes()); // lineGap
    t.extend_from_slice(&GLYPH_ADVANCE.to_be_bytes()); // advanceWidthMax
    t.extend_from_slice(&0i16.to_be_bytes()); // minLeftSideBearing
    t.extend_from_slice(&0i16.to_be_bytes()); // minRightSideBearing
    t.extend_from_slice(&1000i16.to_be_bytes()); // xMaxExtent
    t.extend_from_slice(&1i16.to_be_bytes()); // caretSlopeRise
    t.extend_from_slice(&0i16.to_be_bytes()); // caretSlopeRun
    t.extend_from_slice(&0i16.to_be_bytes()); // caretOffset
    t.extend_from_slice(&[0u8; 8]); // reserved
    t.extend_from_slice(&0i16.to_be_bytes()); // metricDataFormat
    t.extend_from_slice(&NUM_GLYPHS.to_be_bytes()); // numberOfHMetrics
    assert_eq!(t.len(), 36);
    t
}

fn hmtx() -> Vec<u8> {
    let mut t = Vec::new();
    for gid in 0..NUM_GLYPHS {
        let advance = if gid == glyph_id(' ') {
            SPACE_ADVANCE
        } else {
            GLYPH_ADVANCE
        };
        t.extend_from_slice(&advance.to_be_bytes());
        t.extend_from_slice(&0i16.to_be_bytes()); // lsb
    }
    t
}

fn maxp() -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0000_5000u32.to_be_bytes()); // version 0.5
    t.extend_from_slice(&NUM_GLYPHS.to_be_bytes());
    t
}
