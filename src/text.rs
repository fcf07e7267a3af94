//! Small text heuristics used for titles, authors and file names.

/// Default share of uppercase characters above which a title is treated as shouted.
pub const DEFAULT_UPPERCASE_RATIO: f64 = 0.3;

/// Characters stripped from the start of a timecode title.
const LEADING_SEPARATORS: &[char] = &['-', '=', '_', '—', '–', '−', '|'];

/// Remove leading separator runs (`- `, `==`, `_ _`, `—`, `|` ...) and surrounding whitespace.
///
/// A string made only of separators becomes empty.
pub fn strip_leading_separators(text: &str) -> String {
    text.trim_start_matches(|c: char| c.is_whitespace() || LEADING_SEPARATORS.contains(&c))
        .trim_end()
        .to_string()
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalise letter case of a title.
///
/// When at least `uppercase_ratio` of the characters are uppercase the text is
/// lowercased first; either way the first character is capitalised. Empty
/// input stays empty.
pub fn normalize_case(text: &str, uppercase_ratio: f64) -> String {
    let total = text.chars().count();
    if total == 0 {
        return String::new();
    }

    let upper = text.chars().filter(|c| c.is_uppercase()).count();
    if (upper as f64) / (total as f64) < uppercase_ratio {
        capitalize_first(text)
    } else {
        capitalize_first(&text.to_lowercase())
    }
}

/// Clean a raw timecode title: strip separators, then normalise case.
pub fn clean_title(text: &str, uppercase_ratio: f64) -> String {
    normalize_case(&strip_leading_separators(text), uppercase_ratio)
}

/// Make a title safe for use inside a file name.
///
/// Anything that is not a word character, whitespace, `-`, `(`, `)`, `[` or
/// `]` becomes a space; whitespace runs collapse to one space.
pub fn sanitize_filename(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || "-_()[]".contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Take at most `max_chars` characters from the start of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_leading_separators() {
        assert_eq!(strip_leading_separators("- Intro"), "Intro");
        assert_eq!(strip_leading_separators("  — – Intro "), "Intro");
        assert_eq!(strip_leading_separators("== | __ Intro - part"), "Intro - part");
        assert_eq!(strip_leading_separators("_ _ _ Intro"), "Intro");
        assert_eq!(strip_leading_separators("−Intro"), "Intro");
    }

    #[test]
    fn test_strip_edge_cases() {
        assert_eq!(strip_leading_separators(""), "");
        assert_eq!(strip_leading_separators("---"), "");
        assert_eq!(strip_leading_separators(" - = _ | "), "");
    }

    #[test]
    fn test_normalize_case_plain() {
        assert_eq!(normalize_case("intro to rust", 0.3), "Intro to rust");
        assert_eq!(normalize_case("Intro to Rust", 0.3), "Intro to Rust");
    }

    #[test]
    fn test_normalize_case_shouted() {
        assert_eq!(normalize_case("INTRO TO RUST", 0.3), "Intro to rust");
        assert_eq!(normalize_case("ГЛАВА ПЕРВАЯ", 0.3), "Глава первая");
    }

    #[test]
    fn test_normalize_case_empty() {
        assert_eq!(normalize_case("", 0.3), "");
        assert_eq!(clean_title("--", 0.3), "");
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("— INTRO", 0.3), "Intro");
        assert_eq!(clean_title("- what is ownership", 0.3), "What is ownership");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Hello, World! (Live)"), "Hello World (Live)");
        assert_eq!(sanitize_filename("a/b\\c:d"), "a b c d");
        assert_eq!(sanitize_filename("Привет  мир?"), "Привет мир");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("привет", 2), "пр");
    }
}
