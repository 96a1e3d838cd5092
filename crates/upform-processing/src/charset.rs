//! Text decoding for form values.
//!
//! Only the encodings browsers actually send for form fields are recognised.
//! Anything else falls back to UTF-8, replacing invalid sequences.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Latin1,
    Windows1252,
    Utf16Le,
    Utf16Be,
}

impl Charset {
    /// Look up a charset label, case-insensitively. Unknown labels give `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "us-ascii" | "ascii" => Some(Charset::Utf8),
            "iso-8859-1" | "latin1" | "l1" | "iso_8859-1" => Some(Charset::Latin1),
            "windows-1252" | "cp1252" | "x-cp1252" => Some(Charset::Windows1252),
            "utf-16le" | "utf-16" => Some(Charset::Utf16Le),
            "utf-16be" => Some(Charset::Utf16Be),
            _ => None,
        }
    }
}

/// Decode `bytes` using the declared charset.
///
/// A byte-order mark takes precedence over the declaration and is not part of
/// the result.
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }

    match charset.and_then(Charset::from_label) {
        Some(Charset::Latin1) => bytes.iter().map(|&b| char::from(b)).collect(),
        Some(Charset::Windows1252) => bytes.iter().map(|&b| windows_1252_char(b)).collect(),
        Some(Charset::Utf16Le) => decode_utf16(bytes, u16::from_le_bytes),
        Some(Charset::Utf16Be) => decode_utf16(bytes, u16::from_be_bytes),
        Some(Charset::Utf8) => String::from_utf8_lossy(bytes).into_owned(),
        None => {
            if let Some(label) = charset {
                tracing::debug!(charset = %label, "Unknown charset, decoding as UTF-8");
            }
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Code points of bytes 0x80..=0x9F in windows-1252. The five unassigned bytes
/// keep their Latin-1 value.
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

fn windows_1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks(2).map(|pair| match pair {
        [a, b] => to_unit([*a, *b]),
        _ => 0xFFFD,
    });
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
