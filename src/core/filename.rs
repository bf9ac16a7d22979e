use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turns a profile name into a single, portable directory name.
pub fn sanitize_path_component(name: &str) -> String {
    let name: String = name.nfc().collect();
    let name = WS_RE.replace_all(name.trim(), "_");

    let replaced: String = name
        .chars()
        .map(|c| {
            if FORBIDDEN.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim_end_matches(['.', ' ']);
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return "_".to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_handle_is_untouched() {
        assert_eq!(sanitize_path_component("NASA_Webb"), "NASA_Webb");
    }

    #[test]
    fn forbidden_chars_are_replaced() {
        for c in FORBIDDEN {
            let input = format!("a{}b", c);
            assert_eq!(sanitize_path_component(&input), "a_b", "char '{}'", c);
        }
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(sanitize_path_component("  some   user \t"), "some_user");
    }

    #[test]
    fn trailing_dots_are_trimmed() {
        assert_eq!(sanitize_path_component("user..."), "user");
    }

    #[test]
    fn dot_segments_cannot_escape() {
        assert_eq!(sanitize_path_component(".."), "_");
        assert_eq!(sanitize_path_component(""), "_");
        assert_eq!(sanitize_path_component("../etc"), ".._etc");
    }

    #[test]
    fn unicode_is_nfc_normalized() {
        assert_eq!(sanitize_path_component("e\u{0301}"), "\u{00e9}");
    }
}
