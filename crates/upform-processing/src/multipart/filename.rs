/// Longest file name kept, in UTF-8 bytes. Filesystems cap names at 255 bytes
/// and promotion may add a `.partial` suffix while copying.
const MAX_FILE_NAME_BYTES: usize = 240;

/// Longest suffix still treated as an extension when shortening a name
const MAX_EXTENSION_BYTES: usize = 16;

const FALLBACK_NAME: &str = "file";

/// Reduce a client-supplied file name to a plain name safe to use as a path
/// component.
///
/// Only the last path segment is kept. Control characters and characters
/// reserved on common filesystems are dropped, `..` sequences are removed,
/// leading dots and surrounding whitespace are trimmed and the result is
/// limited to 240 bytes, keeping its extension. An empty result becomes `file`.
pub fn sanitize_file_name(raw: &str) -> String {
    let last_segment = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let mut cleaned: String = last_segment
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*'))
        .collect();

    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", "");
    }

    let trimmed = cleaned.trim().trim_start_matches('.').trim();
    let limited = limit_bytes(trimmed);

    if limited.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        limited
    }
}

/// Shorten `name` to at most [`MAX_FILE_NAME_BYTES`], cutting the stem on a char
/// boundary so the extension survives
fn limit_bytes(name: &str) -> String {
    if name.len() <= MAX_FILE_NAME_BYTES {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES => name.split_at(dot),
        _ => (name, ""),
    };

    let mut end = MAX_FILE_NAME_BYTES - extension.len();
    while !stem.is_char_boundary(end) {
        end -= 1;
    }

    let stem = stem[..end].trim_end();
    format!("{}{}", stem, extension)
}
