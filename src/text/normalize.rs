use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("static regex compile"));

// Newsletter and subscription trailers that news sites append after the article body.
static BOILERPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(e-?Edition|newsletter|subscribe|Get Morning Report|\bGet\b[\s\S]*?email|Today[’']s edition).*",
    )
    .expect("static regex compile")
});

/// Collapses every run of whitespace (including newlines) into a single space
/// and trims both ends.
///
/// The result is a fixed point: normalizing it again returns the same string.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Cuts scraped article text at the first newsletter/subscription marker and
/// normalizes the remainder.
#[must_use]
pub fn strip_boilerplate(text: &str) -> String {
    let flattened = normalize_whitespace(text);
    let stripped = BOILERPLATE_RE.replace(&flattened, "");
    normalize_whitespace(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_mixed_whitespace() {
        assert_eq!(
            normalize_whitespace("  Hello,\n\n  world!\r\n\tBye  "),
            "Hello, world! Bye"
        );
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "already normalized text",
            "  lots   of\n\nspace  ",
            "unicode\u{00A0}spaces\u{2003}too",
            "",
        ];
        for input in inputs {
            let once = normalize_whitespace(input);
            assert_eq!(normalize_whitespace(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_strip_boilerplate_cuts_newsletter_tail() {
        let text = "The council approved the budget on Monday.\n\nSign up for our newsletter to get updates.";
        assert_eq!(
            strip_boilerplate(text),
            "The council approved the budget on Monday. Sign up for our"
        );
    }

    #[test]
    fn test_strip_boilerplate_keeps_plain_article() {
        let text = "Rain is expected together with strong winds.";
        assert_eq!(strip_boilerplate(text), text);
    }
}
