//! Text cleanup applied to paged-document output.

use unicode_normalization::UnicodeNormalization;

/// Zero-width and other invisible format characters dropped outright.
const INVISIBLE: &[char] = &[
    '\u{00AD}', // soft hyphen
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}', '\u{2060}', '\u{FEFF}',
];

fn is_printable(c: char) -> bool {
    c == ' ' || !(c.is_control() || c.is_whitespace())
}

/// Flatten line breaks and tabs, strip invisible and non-printable characters, NFC-compose,
/// collapse whitespace runs and trim. Applying it twice gives the same result as once.
pub fn normalize_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            '|' => None,
            c if INVISIBLE.contains(&c) => None,
            c if !is_printable(c) => None,
            c => Some(c),
        })
        .collect();
    // compose after dropping characters so removal can't expose a new composable pair on a second pass
    let composed: String = cleaned.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_and_collapses() {
        assert_eq!(normalize_text("  a\tb\r\n\nc  "), "a b c");
    }

    #[test]
    fn strips_invisible_and_pipes() {
        assert_eq!(normalize_text("x\u{200B}y | z\u{FEFF}"), "xy z");
    }

    #[test]
    fn drops_nonprintable() {
        assert_eq!(normalize_text("a\u{0007}b\u{00A0}c"), "abc");
    }

    #[test]
    fn composes_to_nfc() {
        // e + combining acute -> é
        assert_eq!(normalize_text("cafe\u{0301}"), "caf\u{00E9}");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "  Hello,\tworld!\n\nשלום  עולם ",
            "e\u{0007}\u{0301} | x\u{200D}y",
            "\u{FEFF}\u{00A0}lead and trail\u{3000}",
            "",
        ];
        for s in samples {
            let once = normalize_text(s);
            assert_eq!(normalize_text(&once), once, "input {s:?}");
        }
    }
}
