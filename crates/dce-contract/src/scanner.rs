//! Balanced-bracket extraction of JSON substrings from free text
//!
//! Tolerates string literals, backslash escapes and output that was cut off
//! mid-stream. All structural tokens are ASCII, so the scan runs over UTF-8
//! bytes without ever splitting a multi-byte character.

/// Extract every JSON-looking span from `text`, in order of appearance
///
/// At each `{` or `[` a balanced span is attempted. Text that ends with
/// unclosed brackets (outside a string literal) is recovered by appending
/// the missing closers. Text that ends inside a string literal yields nothing
/// for that start position. A successful span is consumed whole, so
/// candidates never overlap.
#[must_use]
pub fn extract_candidates(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut candidates = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if matches!(bytes[pos], b'{' | b'[') {
            if let Some(span) = balanced_from(text, pos) {
                pos = span.end;
                candidates.push(span.text);
                continue;
            }
        }
        pos += 1;
    }

    candidates
}

/// Extracted span and the byte offset scanning resumes from
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    text: String,
    end: usize,
}

fn balanced_from(text: &str, start: usize) -> Option<Span> {
    let bytes = text.as_bytes();
    let mut closers: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => closers.push(b'}'),
            b'[' => closers.push(b']'),
            b'}' | b']' => {
                if closers.pop() != Some(byte) {
                    return None;
                }
                if closers.is_empty() {
                    return Some(Span {
                        text: text[start..=i].to_string(),
                        end: i + 1,
                    });
                }
            }
            _ => {}
        }
    }

    // Cut off inside a string: where the literal ends is unknowable.
    if in_string {
        return None;
    }

    let mut recovered = String::with_capacity(bytes.len() - start + closers.len());
    recovered.push_str(&text[start..]);
    recovered.extend(closers.iter().rev().map(|&c| char::from(c)));
    Some(Span {
        text: recovered,
        end: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_object_from_prose() {
        let text = r#"Sure! Here is the draft: {"a": 1, "b": [2, 3]} Let me know."#;
        assert_eq!(extract_candidates(text), vec![r#"{"a": 1, "b": [2, 3]}"#]);
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let text = r#"{"q": "SELECT '{' || x || ']'", "n": 1}"#;
        assert_eq!(extract_candidates(text), vec![text]);
    }

    #[test]
    fn escaped_quotes_stay_inside_string() {
        let text = r#"x {"s": "he said \"}\" loudly"} y"#;
        assert_eq!(
            extract_candidates(text),
            vec![r#"{"s": "he said \"}\" loudly"}"#]
        );
    }

    #[test]
    fn recovers_truncated_object() {
        assert_eq!(extract_candidates(r#"{"a":1,"b":2"#), vec![r#"{"a":1,"b":2}"#]);
    }

    #[test]
    fn recovers_mixed_nesting_in_stack_order() {
        assert_eq!(
            extract_candidates(r#"{"patch":[{"op":"replace""#),
            vec![r#"{"patch":[{"op":"replace"}]}"#]
        );
    }

    #[test]
    fn truncation_inside_string_yields_nothing() {
        assert!(extract_candidates(r#"{"a":"unterminated"#).is_empty());
    }

    #[test]
    fn truncated_outer_string_still_finds_inner_object() {
        let text = r#"{"x": {"b": 1}, "c": "cut"#;
        assert_eq!(extract_candidates(text), vec![r#"{"b": 1}"#]);
    }

    #[test]
    fn candidates_do_not_overlap() {
        let text = r#"{"outer": {"inner": 1}} and [1, 2]"#;
        assert_eq!(
            extract_candidates(text),
            vec![r#"{"outer": {"inner": 1}}"#, "[1, 2]"]
        );
    }

    #[test]
    fn mismatched_closer_abandons_start() {
        // `{` closed by `]` fails, the inner array still succeeds
        assert_eq!(extract_candidates("{[1]] tail"), vec!["[1]"]);
    }

    #[test]
    fn multibyte_text_is_safe() {
        let text = "설명: {\"이름\": \"사용자\"} 끝";
        assert_eq!(extract_candidates(text), vec!["{\"이름\": \"사용자\"}"]);
    }

    #[test]
    fn plain_text_has_no_candidates() {
        assert!(extract_candidates("no json here").is_empty());
        assert!(extract_candidates("").is_empty());
    }
}
