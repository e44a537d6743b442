//! Recognizer output cleanup.
//!
//! Every line is trimmed, runs of blank lines collapse to a single blank
//! line, and blank lines at the very start or end are dropped. The result is
//! stable under repeated cleaning.

/// Cleans an ordered list of recognized lines into display-ready text.
pub fn clean_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let joined = lines
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    clean_text(&joined)
}

/// Cleans free-form text (e.g. a user selection) the same way.
pub fn clean_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let mut out: Vec<&str> = Vec::new();

    for line in normalized.split(is_line_break).map(str::trim) {
        if !line.is_empty() {
            out.push(line);
        } else if out.last().is_some_and(|last| !last.is_empty()) {
            out.push("");
        }
    }

    if out.last() == Some(&"") {
        out.pop();
    }

    out.join("\n")
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_collapses_blank_runs() {
        let lines = ["  Hello ", "", "", "World", "   "];
        assert_eq!(clean_lines(&lines), "Hello\n\nWorld");
    }

    #[test]
    fn test_whitespace_only_line_counts_as_blank() {
        let lines = ["Hello world", "  ", "second line"];
        assert_eq!(clean_lines(&lines), "Hello world\n\nsecond line");
    }

    #[test]
    fn test_empty_input() {
        let lines: [&str; 0] = [];
        assert_eq!(clean_lines(&lines), "");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n\t\n "), "");
    }

    #[test]
    fn test_leading_blank_lines_dropped() {
        assert_eq!(clean_text("\n\n  first\nsecond"), "first\nsecond");
    }

    #[test]
    fn test_embedded_newlines_in_a_line() {
        // a recognizer may hand back a multi-line string as one entry
        let lines = ["one\n\n\ntwo", "three"];
        assert_eq!(clean_lines(&lines), "one\n\ntwo\nthree");
    }

    #[test]
    fn test_crlf_and_unicode_breaks() {
        assert_eq!(clean_text("a\r\nb\r\n\r\n\r\nc"), "a\nb\n\nc");
        assert_eq!(clean_text("a\u{2028}b"), "a\nb");
    }

    #[test]
    fn test_preserves_order_and_inner_spacing() {
        assert_eq!(clean_text("z  y\n a  b "), "z  y\na  b");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "   ",
            "Hello",
            "  Hello \n\n\nWorld\n   ",
            "\n\na\n \n \nb\n\n",
            "x\r\n\r\ny\u{2029}\u{2029}z",
            "\t tab\t\n\n\n\nend",
        ];
        for input in inputs {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once, "not idempotent for {:?}", input);
            assert!(!once.contains("\n\n\n"), "blank run survived for {:?}", input);
        }
    }
}
