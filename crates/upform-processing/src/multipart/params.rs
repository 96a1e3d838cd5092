//! Parsing of `value; name=param; name="quoted param"` header values.

/// Split a header value into its main token and its parameters.
///
/// Parameter names are lowercased. Quoted values are unquoted and backslash
/// escapes inside them are resolved. Separators inside quotes are not split on.
pub fn parse_header_value(value: &str) -> (String, Vec<(String, String)>) {
    let mut parts = split_unquoted(value).into_iter();
    let main = parts.next().unwrap_or_default().trim().to_string();

    let params = parts
        .filter_map(|part| {
            let (name, raw) = part.split_once('=')?;
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            Some((name, unquote(raw.trim())))
        })
        .collect();

    (main, params)
}

pub fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

fn split_unquoted(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

/// Strip surrounding double quotes and resolve `\x` escapes
pub fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_and_bare_params() {
        let (main, params) =
            parse_header_value(r#"form-data; name="File"; filename="a;b \"c\".txt"; size=10"#);
        assert_eq!(main, "form-data");
        assert_eq!(param(&params, "name"), Some("File"));
        assert_eq!(param(&params, "filename"), Some(r#"a;b "c".txt"#));
        assert_eq!(param(&params, "size"), Some("10"));
    }

    #[test]
    fn names_are_case_insensitive() {
        let (_, params) = parse_header_value("multipart/form-data; BOUNDARY=abc");
        assert_eq!(param(&params, "boundary"), Some("abc"));
    }

    #[test]
    fn unquote_leaves_bare_values() {
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\"quoted\""), "quoted");
        assert_eq!(unquote("\""), "\"");
    }
}
