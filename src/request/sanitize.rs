use std::collections::{HashMap, HashSet};

use ammonia::Builder;
use once_cell::sync::Lazy;

/// Strict subset: `b`, `i`, `em` and `strong`, without attributes, URL
/// schemes or comments.
static STRICT: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder
        .tags(HashSet::from(["b", "i", "em", "strong"]))
        .tag_attributes(HashMap::new())
        .generic_attributes(HashSet::new())
        .url_schemes(HashSet::new())
        .link_rel(None)
        .strip_comments(true);
    builder
});

/// Characters the HTML parser may rewrite. Strings without any of them come
/// out of the sanitizer unchanged.
const REWRITTEN: [char; 6] = ['<', '>', '&', '\0', '\r', '\u{a0}'];

/// Sanitize one user-sent string.
#[must_use]
pub fn sanitize(input: &str) -> String {
    if !input.contains(REWRITTEN) {
        return input.to_string();
    }
    STRICT.clean(input).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_scripts_and_attributes() {
        let clean = sanitize("<b onclick=\"x()\">hi</b><script>alert(1)</script>");
        assert_eq!(clean, "<b>hi</b>");
    }

    #[test]
    fn test_drops_disallowed_tags_keeps_text() {
        assert_eq!(sanitize("<div><em>a</em> <a href=\"https://x\">b</a></div>"), "<em>a</em> b");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(sanitize("hello world 42"), "hello world 42");
        assert_eq!(sanitize("say \"hi\" it's fine"), "say \"hi\" it's fine");
        assert_eq!(sanitize("a & b"), "a &amp; b");
    }

    fn fragment() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,8}",
            Just("<b>".to_string()),
            Just("</b>".to_string()),
            Just("<i>".to_string()),
            Just("</strong>".to_string()),
            Just("<script>".to_string()),
            Just("<a href=\"javascript:x\">".to_string()),
            Just("&".to_string()),
            Just("<!-- c -->".to_string()),
            Just("<".to_string()),
            Just(">".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_a_fixed_point(parts in proptest::collection::vec(fragment(), 0..12)) {
            let once = sanitize(&parts.concat());
            prop_assert_eq!(sanitize(&once), once.clone());
        }
    }
}
