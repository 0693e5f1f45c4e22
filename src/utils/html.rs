// src/utils/html.rs

/// Sanitizes admin-entered quiz, question and option text.
///
/// Whitelist-based: harmless markup such as <b> survives, <script> and event
/// handler attributes are stripped. Applied before the text is stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_removed_plain_text_kept() {
        assert_eq!(clean_html("What is 2 + 2?"), "What is 2 + 2?");
        assert_eq!(clean_html("<b>TCP</b><script>alert(1)</script>"), "<b>TCP</b>");
    }
}
