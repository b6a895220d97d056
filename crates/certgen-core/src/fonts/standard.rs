//! Standard 14 font metrics and WinAnsi encoding
//!
//! Widths are the Adobe AFM advance widths (1/1000 em) for the printable
//! ASCII range. Latin-1 letters reuse the width of their base letter,
//! a handful of common punctuation marks carry their own width, everything
//! else falls back to the font's default width.

use unicode_normalization::UnicodeNormalization;

/// Standard fonts the resolver can hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// PDF BaseFont name
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
        }
    }

    /// Bold counterpart, if the family has one
    pub fn bold(&self) -> StandardFont {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaBold => StandardFont::HelveticaBold,
            StandardFont::TimesRoman | StandardFont::TimesBold => StandardFont::TimesBold,
            StandardFont::Courier | StandardFont::CourierBold => StandardFont::CourierBold,
        }
    }

    fn metrics(&self) -> &'static WidthTable {
        match self {
            StandardFont::Helvetica => &HELVETICA,
            StandardFont::HelveticaBold => &HELVETICA_BOLD,
            StandardFont::TimesRoman => &TIMES_ROMAN,
            StandardFont::TimesBold => &TIMES_BOLD,
            StandardFont::Courier | StandardFont::CourierBold => &COURIER,
        }
    }

    /// Advance width of one character in 1/1000 em
    pub fn char_width(&self, c: char) -> u16 {
        self.metrics().width(c)
    }

    /// Width of `text` at `size` points.
    ///
    /// Errors with the first character WinAnsi cannot encode.
    pub fn width_of(&self, text: &str, size: f64) -> Result<f64, char> {
        let mut total: u32 = 0;
        for c in text.chars() {
            if win_ansi_code(c).is_none() {
                return Err(c);
            }
            total += self.char_width(c) as u32;
        }
        Ok(total as f64 * size / 1000.0)
    }
}

struct WidthTable {
    /// U+0020 ..= U+007E
    ascii: [u16; 95],
    /// Widths for the entries of `PUNCTUATION`, same order
    punctuation: [u16; 9],
    default: u16,
}

const PUNCTUATION: [char; 9] = [
    '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2013}', '\u{2014}', '\u{2022}', '\u{2026}',
    '\u{20AC}',
];

impl WidthTable {
    fn width(&self, c: char) -> u16 {
        if let Some(w) = self.ascii_width(c) {
            return w;
        }
        if c == '\u{00A0}' {
            return self.ascii[0];
        }
        if let Some(i) = PUNCTUATION.iter().position(|p| *p == c) {
            return self.punctuation[i];
        }
        // Accented letters take their base letter's advance
        c.nfd()
            .next()
            .and_then(|base| self.ascii_width(base))
            .unwrap_or(self.default)
    }

    fn ascii_width(&self, c: char) -> Option<u16> {
        let code = c as u32;
        if (0x20..=0x7E).contains(&code) {
            Some(self.ascii[(code - 0x20) as usize])
        } else {
            None
        }
    }
}

/// Map a character to its WinAnsiEncoding byte
pub fn win_ansi_code(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        // Common control characters are passed through like pdf-lib does
        0x09 | 0x0A | 0x0D => Some(code as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(_, ch)| *ch == c)
            .map(|(byte, _)| *byte),
    }
}

/// Encode a string as WinAnsi bytes, or return the first unencodable char
pub fn encode_win_ansi(text: &str) -> Result<Vec<u8>, char> {
    text.chars().map(|c| win_ansi_code(c).ok_or(c)).collect()
}

const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

#[rustfmt::skip]
static HELVETICA: WidthTable = WidthTable {
    ascii: [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        278, 278, 584, 584, 584, 556, 1015,
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        278, 278, 278, 469, 556, 333,
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        334, 260, 334, 584,
    ],
    punctuation: [222, 222, 333, 333, 556, 1000, 350, 1000, 556],
    default: 556,
};

#[rustfmt::skip]
static HELVETICA_BOLD: WidthTable = WidthTable {
    ascii: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ],
    punctuation: [278, 278, 500, 500, 556, 1000, 350, 1000, 556],
    default: 556,
};

#[rustfmt::skip]
static TIMES_ROMAN: WidthTable = WidthTable {
    ascii: [
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        278, 278, 564, 564, 564, 444, 921,
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        333, 278, 333, 469, 500, 333,
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        480, 200, 480, 541,
    ],
    punctuation: [333, 333, 444, 444, 500, 1000, 350, 1000, 500],
    default: 500,
};

#[rustfmt::skip]
static TIMES_BOLD: WidthTable = WidthTable {
    ascii: [
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        333, 333, 570, 570, 570, 500, 930,
        722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
        722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
        333, 278, 333, 581, 500, 333,
        500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
        556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
        394, 220, 394, 520,
    ],
    punctuation: [333, 333, 500, 500, 500, 1000, 350, 1000, 500],
    default: 500,
};

// Courier is monospaced in both weights
static COURIER: WidthTable = WidthTable {
    ascii: [600; 95],
    punctuation: [600; 9],
    default: 600,
};
