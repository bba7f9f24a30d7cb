use std::borrow::Cow;

use crate::error::LlmError;

const MAX_API_ERROR_CHARS: usize = 200;

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

fn scrub_after_marker(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    loop {
        let Some(rel) = scrubbed[search_from..].find(marker) else {
            break;
        };

        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        // Skip bare markers without a token value.
        if end == content_start {
            search_from = content_start;
            continue;
        }

        scrubbed.replace_range(start..end, "[REDACTED]");
        search_from = start + "[REDACTED]".len();
    }
}

/// Scrub secret-like token patterns from provider error strings.
///
/// The markers cover what this service can actually leak: its own API key
/// in prefix form (`sk-`), auth headers echoed back by proxies, and
/// key/token query or JSON fields.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    const MARKERS: [&str; 8] = [
        "sk-",
        "Authorization: Bearer ",
        "authorization: bearer ",
        "x-api-key: ",
        "api_key=",
        "access_token=",
        "\"api_key\":\"",
        "\"access_token\":\"",
    ];

    if !MARKERS.iter().any(|marker| input.contains(marker)) {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in MARKERS {
        scrub_after_marker(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let scrubbed = scrubbed.as_ref();
    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized provider error from a failed HTTP response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    LlmError::Request {
        provider: provider.to_string(),
        message: format!("({status}): {}", sanitize_api_error(&body)),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through_borrowed() {
        let input = "model overloaded, try again later";
        assert!(matches!(scrub_secret_patterns(input), Cow::Borrowed(_)));
    }

    #[test]
    fn api_key_prefix_is_redacted() {
        let scrubbed = scrub_secret_patterns("invalid key sk-ant-abc123 provided");
        assert_eq!(scrubbed, "invalid key [REDACTED] provided");
    }

    #[test]
    fn bearer_header_is_redacted() {
        let scrubbed = scrub_secret_patterns("got Authorization: Bearer tok.en-123 in request");
        assert!(!scrubbed.contains("tok.en-123"));
        assert!(scrubbed.contains("[REDACTED]"));
    }

    #[test]
    fn json_api_key_field_is_redacted() {
        let scrubbed = scrub_secret_patterns(r#"{"api_key":"abc123","detail":"bad"}"#);
        assert!(!scrubbed.contains("abc123"));
    }

    #[test]
    fn bare_marker_without_token_is_kept() {
        let input = "keys must start with sk- followed by more";
        // a space right after the marker means there is no token to redact
        assert_eq!(scrub_secret_patterns(input), input);
    }

    #[test]
    fn long_error_is_truncated() {
        let long = "x".repeat(500);
        let sanitized = sanitize_api_error(&long);
        assert!(sanitized.ends_with("..."));
        assert!(sanitized.chars().count() <= MAX_API_ERROR_CHARS + 3);
    }

    #[test]
    fn short_error_is_untouched() {
        assert_eq!(sanitize_api_error("overloaded"), "overloaded");
    }
}
