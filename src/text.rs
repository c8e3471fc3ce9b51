//! Cleanup of recognized text

/// Punctuation that survives normalization
const KEPT_PUNCTUATION: &[char] = &['.', ',', '!', '?', '-'];

fn is_kept(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() || KEPT_PUNCTUATION.contains(&c)
}

/// Normalize OCR output into a single line of plain text.
///
/// Characters outside `[A-Za-z0-9_]`, whitespace and `. , ! ? -` are removed
/// (non-ASCII letters included), then every whitespace run, line breaks of
/// any style among them, becomes one space and the ends are trimmed.
///
/// Filtering happens before collapsing so that removed characters can't
/// leave doubled spaces behind, which keeps the function idempotent.
pub fn normalize(text: &str) -> String {
    let filtered: String = text.chars().filter(|&c| is_kept(c)).collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_newlines() {
        assert_eq!(normalize("  Hello \t\n\n World \r\n again  "), "Hello World again");
    }

    #[test]
    fn test_strips_disallowed_characters() {
        assert_eq!(normalize("Héllo@#"), "Hllo");
        assert_eq!(normalize("price: $12.50 (approx)!"), "price 12.50 approx!");
        assert_eq!(normalize("snake_case, dash-ed? yes."), "snake_case, dash-ed? yes.");
    }

    #[test]
    fn test_removed_characters_do_not_leave_double_spaces() {
        assert_eq!(normalize("a @ b"), "a b");
        assert_eq!(normalize("ğ ş ı"), "");
    }

    #[test]
    fn test_never_emits_newlines() {
        let out = normalize("line one\r\nline two\rline three\n\n\nline four");
        assert!(!out.contains('\n'));
        assert!(!out.contains('\r'));
        assert_eq!(out, "line one line two line three line four");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "   ",
            "Hello, World!",
            "a @ b # c",
            "Türkçe metin: İstanbul'da\n\nyağmur",
            "tabs\tand\u{00a0}nbsp\u{2003}em-space",
            "--- ?? !! ,, ..",
        ];

        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\n\r\t"), "");
    }
}
