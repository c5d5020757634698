//! Balanced object-literal extraction
//!
//! Finds a known assignment in a script buffer and cuts out the object
//! literal that follows it, counting nested braces so `params: { ... }`
//! sub-objects do not end the scan early.

use regex::Regex;

use crate::error::{ResolveError, Result};

/// Extracts the object literal following `marker` in `buffer`
///
/// The first occurrence of the marker followed by `=` or `:` is preferred
/// (comparisons such as `===` do not count); otherwise the first plain
/// occurrence is used. The scan starts at the first `{` after it and ends
/// where the brace depth returns to zero. Braces inside quoted strings and
/// comments are ignored.
///
/// # Returns
/// The substring from the opening `{` through the matching `}`, inclusive
///
/// # Errors
/// - `ScriptNotFound` if the marker (or any `{` after it) is absent
/// - `MalformedObject` if the buffer ends before the braces balance
pub fn extract_object<'a>(buffer: &'a str, marker: &str) -> Result<&'a str> {
    let start = find_marker(buffer, marker)
        .ok_or_else(|| ResolveError::ScriptNotFound(format!("marker `{marker}` not present")))?;

    let open = buffer[start..]
        .find('{')
        .map(|offset| start + offset)
        .ok_or_else(|| ResolveError::ScriptNotFound(format!("no object after `{marker}`")))?;

    let end = balanced_end(&buffer[open..]).ok_or_else(|| {
        ResolveError::MalformedObject(format!("object after `{marker}` never closes"))
    })?;

    Ok(&buffer[open..open + end])
}

/// Byte offset of the marker, preferring an assignment-like occurrence
fn find_marker(buffer: &str, marker: &str) -> Option<usize> {
    if marker.is_empty() {
        return None;
    }

    let pattern = format!(r#"{}\s*['"]?\s*(?::|=(?:[^=]|$))"#, regex::escape(marker));
    if let Ok(re) = Regex::new(&pattern)
        && let Some(m) = re.find(buffer)
    {
        return Some(m.start());
    }

    buffer.find(marker)
}

/// Length of the balanced object starting at `text[0] == '{'`
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                while chars.next_if(|&(_, c)| c != '\n').is_some() {}
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut prev = '\0';
                for (_, c) in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SCRIPT: &str = r#"
        window.video = {"id":9,"name":"Film"};
        window.streams = [{"name":"Server1","active":false,"url":"https:\/\/vixcloud.co\/playlist\/9?b=1"}];
        window.masterPlaylist = {
            params: {
                'token': 'Ab12_-xY',
                'expires': '1735689600',
                'asn': ''
            },
            url: 'https://vixcloud.co/playlist/9?b=1',
        }
        window.canPlayFHD = true
    "#;

    #[test]
    fn test_extract_nested_object() {
        let object = extract_object(SCRIPT, "masterPlaylist").unwrap();
        assert!(object.starts_with('{'));
        assert!(object.ends_with('}'));
        assert!(object.contains("params"));
        assert!(object.contains("url: 'https://vixcloud.co/playlist/9?b=1'"));
        assert!(!object.contains("canPlayFHD"));
    }

    #[test]
    fn test_extract_prefers_assignment_occurrence() {
        let buffer = "if (!window.masterPlaylist) { boot(); }\nwindow.masterPlaylist = { url: 'a' };";
        assert_eq!(extract_object(buffer, "masterPlaylist").unwrap(), "{ url: 'a' }");
    }

    #[test]
    fn test_extract_skips_comparisons() {
        let buffer = r#"if (window.masterPlaylist === undefined) { boot(); }
window.streams=[{"name":"Server1","url":"https:\/\/vixcloud.co\/playlist\/9?b=1&ub=1"}];
window.masterPlaylist = { params: { token: 'abc', expires: '99' }, url: 'https://vixcloud.co/playlist/9?b:1' }"#;
        assert_eq!(
            extract_object(buffer, "masterPlaylist").unwrap(),
            "{ params: { token: 'abc', expires: '99' }, url: 'https://vixcloud.co/playlist/9?b:1' }"
        );
    }

    #[test]
    fn test_extract_ignores_quotes_in_comments() {
        let buffer = "window.masterPlaylist = {\n // don't cache this\n params: { token: 'abc', expires: '99' },\n /* it's signed } */\n url: 'https://x/pl'\n}";
        let object = extract_object(buffer, "masterPlaylist").unwrap();
        assert!(object.starts_with('{'));
        assert!(object.ends_with('}'));
        assert!(object.contains("url: 'https://x/pl'"));
    }

    #[test]
    fn test_extract_minified() {
        let buffer = "window.masterPlaylist={params:{token:'t',expires:'1'},url:'u'};window.canPlayFHD=false;";
        assert_eq!(
            extract_object(buffer, "masterPlaylist").unwrap(),
            "{params:{token:'t',expires:'1'},url:'u'}"
        );
    }

    #[test]
    fn test_extract_ignores_braces_in_strings() {
        let buffer = r#"masterPlaylist: { note: "a } b", nested: { x: '{' }, url: 'u' } tail"#;
        assert_eq!(
            extract_object(buffer, "masterPlaylist").unwrap(),
            r#"{ note: "a } b", nested: { x: '{' }, url: 'u' }"#
        );
    }

    #[test]
    fn test_extract_handles_escaped_quotes() {
        let buffer = r#"masterPlaylist = { a: 'it\'s }', b: 1 }"#;
        assert_eq!(
            extract_object(buffer, "masterPlaylist").unwrap(),
            r#"{ a: 'it\'s }', b: 1 }"#
        );
    }

    #[test]
    fn test_extract_marker_absent() {
        let result = extract_object("window.video = {id: 1}", "masterPlaylist");
        assert!(matches!(result, Err(ResolveError::ScriptNotFound(_))));
    }

    #[test]
    fn test_extract_no_brace_after_marker() {
        let result = extract_object("window.masterPlaylist = null;", "masterPlaylist");
        assert!(matches!(result, Err(ResolveError::ScriptNotFound(_))));
    }

    #[test]
    fn test_extract_truncated_buffer() {
        let buffer = "window.masterPlaylist = { params: { token: 'abc', expires: '1'";
        let result = extract_object(buffer, "masterPlaylist");
        assert!(matches!(result, Err(ResolveError::MalformedObject(_))));
    }

    #[test]
    fn test_extract_unterminated_string() {
        let buffer = "window.masterPlaylist = { url: 'https://x/pl }";
        let result = extract_object(buffer, "masterPlaylist");
        assert!(matches!(result, Err(ResolveError::MalformedObject(_))));
    }

    #[test]
    fn test_extract_multibyte_content() {
        let buffer = "window.masterPlaylist = { title: 'Perché è così', url: 'u' };";
        assert_eq!(
            extract_object(buffer, "masterPlaylist").unwrap(),
            "{ title: 'Perché è così', url: 'u' }"
        );
    }

    #[test]
    fn test_extract_empty_marker() {
        assert!(extract_object("{a: 1}", "").is_err());
    }

    fn depth_is_balanced(object: &str) -> bool {
        let mut depth: i64 = 0;
        for c in object.chars() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0
    }

    /// Nested object literal with identifier keys and brace-free values
    fn arbitrary_object() -> impl Strategy<Value = String> {
        let leaf = "[a-z]{1,6}: '[a-zA-Z0-9:/._-]{0,12}'";
        leaf.prop_recursive(4, 32, 4, |inner| {
            (
                "[a-z]{1,6}",
                prop::collection::vec(inner, 1..4),
            )
                .prop_map(|(key, fields)| format!("{key}: {{ {} }}", fields.join(", ")))
        })
        .prop_map(|field| format!("{{ {field} }}"))
    }

    proptest! {
        #[test]
        fn property_extracted_object_is_balanced(
            object in arbitrary_object(),
            prefix in "[a-z =;\n]{0,20}",
            suffix in "[a-z =;{}\n]{0,20}",
        ) {
            let buffer = format!("{prefix}\nwindow.masterPlaylist = {object};{suffix}");
            let extracted = extract_object(&buffer, "masterPlaylist").unwrap();
            prop_assert!(extracted.starts_with('{'), "extracted should start with an opening brace");
            prop_assert!(extracted.ends_with('}'), "extracted should end with a closing brace");
            prop_assert!(depth_is_balanced(extracted));
            prop_assert_eq!(extracted, object.as_str());
        }
    }
}
