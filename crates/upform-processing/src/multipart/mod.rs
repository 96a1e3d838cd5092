//! Streaming `multipart/form-data` framing.
//!
//! [`boundary_from_content_type`] validates the request content type,
//! [`MultipartStream`] splits the body into sections without buffering their
//! payloads, and [`SectionDescriptor`] interprets a section's headers.

mod filename;
mod params;
mod section;
mod stream;

pub use filename::sanitize_file_name;
pub use section::SectionDescriptor;
pub use stream::{MultipartStream, SectionHeaders};

use upform_core::IngestError;

/// Longest boundary accepted, per RFC 2046
pub const MAX_BOUNDARY_LENGTH: usize = 70;

/// Extract the multipart boundary from a `Content-Type` header value.
///
/// Anything that is not `multipart/form-data` with a non-empty boundary is an
/// unsupported media type. A boundary longer than [`MAX_BOUNDARY_LENGTH`] is a
/// malformed request.
pub fn boundary_from_content_type(content_type: Option<&str>) -> Result<String, IngestError> {
    let content_type = content_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| IngestError::UnsupportedMediaType("missing content type".to_string()))?;

    let (media_type, parameters) = params::parse_header_value(content_type);
    if !media_type.eq_ignore_ascii_case("multipart/form-data") {
        return Err(IngestError::UnsupportedMediaType(format!(
            "expected multipart/form-data, got '{}'",
            media_type
        )));
    }

    let boundary = params::param(&parameters, "boundary")
        .map(|b| b.trim_matches('"'))
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| {
            IngestError::UnsupportedMediaType("missing multipart boundary".to_string())
        })?;

    if boundary.len() > MAX_BOUNDARY_LENGTH {
        return Err(IngestError::malformed(format!(
            "multipart boundary length limit {} exceeded",
            MAX_BOUNDARY_LENGTH
        )));
    }

    Ok(boundary.to_string())
}
