use std::collections::HashSet;

/// Strips every tag from free-text input, keeping the text content.
///
/// Shared across requests; holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer;

impl Sanitizer {
    pub fn new() -> Self {
        Self
    }

    pub fn sanitize(&self, input: &str) -> String {
        ammonia::Builder::empty()
            .clean_content_tags(HashSet::from(["script", "style"]))
            .clean(input)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(Sanitizer::new().sanitize("Sodium chloride"), "Sodium chloride");
    }

    #[test]
    fn test_markup_removed() {
        let out = Sanitizer::new().sanitize("<b>bold</b><script>alert(1)</script>");
        assert_eq!(out, "bold");
    }
}
