/// Truncate a string to at most `max_chars` characters, appending "..." when
/// anything was cut. Safe on multi-byte input.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", s[..idx].trim_end()),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_untouched() {
        assert_eq!(truncate_with_ellipsis("oat milk", 50), "oat milk");
    }

    #[test]
    fn long_input_is_cut_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("organic oat milk", 7), "organic...");
    }

    #[test]
    fn multibyte_input_cuts_on_char_boundary() {
        assert_eq!(truncate_with_ellipsis("crème fraîche", 5), "crème...");
    }
}
