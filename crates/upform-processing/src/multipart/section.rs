use percent_encoding::percent_decode_str;
use upform_core::IngestError;

use super::filename::sanitize_file_name;
use super::params::{param, parse_header_value};
use super::stream::SectionHeaders;
use crate::charset::decode_text;

/// What a multipart section carries, derived from its headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDescriptor {
    /// Form key from `Content-Disposition: form-data; name=...`
    pub name: String,
    /// Sanitized file name when the section is file-bearing
    pub file_name: Option<String>,
    /// Media type from `Content-Type`, lowercased, without parameters
    pub content_type: Option<String>,
    /// `charset` parameter of `Content-Type`
    pub charset: Option<String>,
}

impl SectionDescriptor {
    /// Interpret a section's headers.
    ///
    /// Returns `Ok(None)` for sections that are not form data (no
    /// `Content-Disposition`, or a disposition other than `form-data`); those are
    /// skipped. A form-data section without a `name` is malformed.
    ///
    /// A section is file-bearing when it has a non-empty `filename` or
    /// `filename*` parameter; the RFC 5987 `filename*` form wins when both are
    /// present.
    pub fn parse(headers: &SectionHeaders) -> Result<Option<Self>, IngestError> {
        let Some(disposition) = headers.get("content-disposition") else {
            tracing::debug!("Skipping multipart section without Content-Disposition");
            return Ok(None);
        };

        let (kind, params) = parse_header_value(disposition);
        if !kind.eq_ignore_ascii_case("form-data") {
            tracing::debug!(disposition = %kind, "Skipping non form-data section");
            return Ok(None);
        }

        let name = param(&params, "name")
            .filter(|n| !n.is_empty())
            .ok_or_else(|| IngestError::malformed("form-data section has no name"))?
            .to_string();

        let raw_file_name = param(&params, "filename*")
            .and_then(decode_ext_value)
            .or_else(|| param(&params, "filename").map(decode_plain_file_name))
            .filter(|f| !f.is_empty());

        let (content_type, charset) = match headers.get("content-type") {
            Some(value) => {
                let (media_type, ct_params) = parse_header_value(value);
                let media_type = Some(media_type.to_ascii_lowercase()).filter(|m| !m.is_empty());
                (media_type, param(&ct_params, "charset").map(str::to_string))
            }
            None => (None, None),
        };

        Ok(Some(Self {
            name,
            file_name: raw_file_name.as_deref().map(sanitize_file_name),
            content_type,
            charset,
        }))
    }

    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }
}

/// Decode an RFC 5987 `charset'language'percent-encoded` value
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    let bytes: Vec<u8> = percent_decode_str(encoded).collect();
    let charset = if charset.is_empty() { None } else { Some(charset) };
    Some(decode_text(&bytes, charset))
}

/// Browsers put raw UTF-8 in `filename`, some percent-encode it and some use HTML
/// entities for characters outside the form's charset.
fn decode_plain_file_name(value: &str) -> String {
    let decoded = percent_decode_str(value).decode_utf8_lossy();
    decode_html_entities(&decoded)
}

/// Decode `&#NNN;`, `&#xHH;` and the named entities browsers emit. Anything
/// else is kept as written.
fn decode_html_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start + 1..];
        let decoded = candidate
            .find(';')
            .and_then(|end| entity_char(&candidate[..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = candidate;
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity_char(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
