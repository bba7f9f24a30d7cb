//! JSON extraction from free-text model replies.
//!
//! Models wrap their answer in prose more often than not. Extraction scans
//! for brace-balanced candidates (string- and escape-aware) and returns the
//! first one that parses as a JSON object, as a typed result rather than a
//! bare failure. When a reply contains several objects, the first wins;
//! an example object ahead of the real answer is still mis-extracted.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no JSON object found in model reply")]
    NoObject,
}

/// Extract the first brace-balanced substring of `text` that parses as a
/// JSON object.
pub fn extract_json_object(text: &str) -> Result<Value, ExtractError> {
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find('{') {
        let start = search_from + rel;
        if let Some(len) = balanced_object_len(&text[start..])
            && let Ok(value) = serde_json::from_str::<Value>(&text[start..start + len])
            && value.is_object()
        {
            return Ok(value);
        }
        search_from = start + 1;
    }
    Err(ExtractError::NoObject)
}

/// Length of the brace-balanced prefix starting at a `{`, or `None` when
/// the braces never close. Braces inside string literals are ignored.
fn balanced_object_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
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
    use serde_json::json;

    #[test]
    fn bare_object_is_extracted() {
        let value = extract_json_object(r#"{"overall_score": 85}"#).unwrap();
        assert_eq!(value, json!({"overall_score": 85}));
    }

    #[test]
    fn object_surrounded_by_prose_is_extracted() {
        let reply = r#"Here is my analysis:

{"food_name": "Organic apples", "overall_score": 88}

Let me know if you need more detail."#;
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value["food_name"], "Organic apples");
    }

    #[test]
    fn nested_braces_are_balanced() {
        let reply = r#"{"breakdown": {"carbon_footprint": {"score": 75}}, "overall_score": 70}"#;
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value["breakdown"]["carbon_footprint"]["score"], 75);
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_the_scan() {
        let reply = r#"{"rationale": "uses {placeholder} syntax \" quoted", "overall_score": 50}"#;
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value["overall_score"], 50);
    }

    #[test]
    fn malformed_leading_brace_is_skipped() {
        // a stray unparsable block before the real object
        let reply = r#"score {not json} then {"overall_score": 42}"#;
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value["overall_score"], 42);
    }

    #[test]
    fn first_valid_object_wins() {
        let reply = r#"{"example": true} and later {"overall_score": 42}"#;
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value, json!({"example": true}));
    }

    #[test]
    fn reply_without_object_is_a_typed_error() {
        assert_eq!(
            extract_json_object("I cannot evaluate that."),
            Err(ExtractError::NoObject)
        );
    }

    #[test]
    fn unclosed_brace_is_a_typed_error() {
        assert_eq!(
            extract_json_object(r#"{"overall_score": 42"#),
            Err(ExtractError::NoObject)
        );
    }

    #[test]
    fn non_object_json_is_rejected() {
        // an array is not a judgment
        assert_eq!(
            extract_json_object("[1, 2, 3]"),
            Err(ExtractError::NoObject)
        );
    }
}
