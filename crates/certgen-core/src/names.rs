//! Name list ingestion
//!
//! Names usually arrive as a CSV export where the first column holds the
//! participant name. Everything else in the row is ignored. Spreadsheet
//! exports differ in separator, so the delimiter is picked from the first
//! line.

use csv::ReaderBuilder;

use crate::error::CertGenError;

/// Header token skipped during CSV ingestion (case-insensitive)
const HEADER_TOKEN: &str = "name";

/// Separators recognised in the first line, in tie-break order
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Ordered list of names; one output page per entry, duplicates allowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameList(Vec<String>);

impl NameList {
    /// Control characters (line breaks, tabs) become single spaces; a name
    /// left empty after that is rejected.
    pub fn new(names: Vec<String>) -> Result<Self, CertGenError> {
        if names.is_empty() {
            return Err(CertGenError::InputMissing("Name list is empty".into()));
        }
        let names: Vec<String> = names.iter().map(|n| clean_name(n)).collect();
        if let Some(index) = names.iter().position(String::is_empty) {
            return Err(CertGenError::InputMissing(format!(
                "Name at position {} is empty",
                index + 1
            )));
        }
        Ok(Self(names))
    }

    pub fn from_csv(text: &str) -> Result<Self, CertGenError> {
        Self::new(parse_csv_names(text))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Take the first column of every row, cleaned, dropping empty values and
/// the `name` header token.
pub fn parse_csv_names(text: &str) -> Vec<String> {
    first_column(text)
        .iter()
        .map(|cell| clean_name(cell))
        .filter(|cell| !cell.is_empty() && !cell.eq_ignore_ascii_case(HEADER_TOKEN))
        .collect()
}

/// Summary line shown after an upload
pub fn summary(names: &[String]) -> String {
    format!("Found {} names", names.len())
}

/// Collapse control characters and the whitespace around them to one space
fn clean_name(raw: &str) -> String {
    raw.split(char::is_control)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First field of each record
fn first_column(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(text))
        .from_reader(text.as_bytes());

    reader
        .records()
        .filter_map(Result::ok)
        .filter_map(|record| record.get(0).map(str::to_string))
        .collect()
}

/// Most frequent separator outside quotes on the first non-blank line.
/// Ties and lines without any separator fall back to a comma.
fn detect_delimiter(text: &str) -> u8 {
    let Some(line) = text.lines().find(|line| !line.trim().is_empty()) else {
        return b',';
    };

    let mut counts = [0usize; DELIMITERS.len()];
    let mut in_quotes = false;
    let mut field_start = true;
    let mut closed_quote = false;
    for byte in line.bytes() {
        if in_quotes {
            if byte == b'"' {
                in_quotes = false;
                closed_quote = true;
            }
            continue;
        }
        if byte == b'"' && (field_start || closed_quote) {
            // Opening quote, or the second half of an escaped `""`
            in_quotes = true;
        } else if let Some(i) = DELIMITERS.iter().position(|d| *d == byte) {
            counts[i] += 1;
            field_start = true;
            closed_quote = false;
            continue;
        }
        field_start = false;
        closed_quote = false;
    }

    let best = (1..DELIMITERS.len()).fold(0, |best, i| {
        if counts[i] > counts[best] {
            i
        } else {
            best
        }
    });
    DELIMITERS[best]
}
