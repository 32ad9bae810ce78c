//! Character and number predicates shared by the tokenizer and the parser.

use regex::Regex;
use std::sync::LazyLock;

static RE_RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3,4}(?:[pP]|[xX×]\d{3,4})$").unwrap());

/// Hyphen-minus plus the U+2010..U+2015 dash block.
pub const DASHES: &[char] = &[
    '-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}',
];

/// Ranges of the Unicode Latin script.
const LATIN_RANGES: &[(char, char)] = &[
    ('A', 'Z'),
    ('a', 'z'),
    ('\u{00AA}', '\u{00AA}'),
    ('\u{00BA}', '\u{00BA}'),
    ('\u{00C0}', '\u{00D6}'),
    ('\u{00D8}', '\u{00F6}'),
    ('\u{00F8}', '\u{02B8}'),
    ('\u{02E0}', '\u{02E4}'),
    ('\u{1D00}', '\u{1D25}'),
    ('\u{1D2C}', '\u{1D5C}'),
    ('\u{1D62}', '\u{1D65}'),
    ('\u{1D6B}', '\u{1D77}'),
    ('\u{1D79}', '\u{1DBE}'),
    ('\u{1E00}', '\u{1EFF}'),
    ('\u{2071}', '\u{2071}'),
    ('\u{207F}', '\u{207F}'),
    ('\u{2090}', '\u{209C}'),
    ('\u{212A}', '\u{212B}'),
    ('\u{2132}', '\u{2132}'),
    ('\u{214E}', '\u{214E}'),
    ('\u{2160}', '\u{2188}'),
    ('\u{2C60}', '\u{2C7F}'),
    ('\u{A722}', '\u{A787}'),
    ('\u{A78B}', '\u{A7CA}'),
    ('\u{A7F2}', '\u{A7FF}'),
    ('\u{AB30}', '\u{AB5A}'),
    ('\u{AB5C}', '\u{AB64}'),
    ('\u{AB66}', '\u{AB69}'),
    ('\u{FB00}', '\u{FB06}'),
    ('\u{FF21}', '\u{FF3A}'),
    ('\u{FF41}', '\u{FF5A}'),
];

/// Whether `s` parses as a signed 64-bit integer.
pub fn is_numeric(s: &str) -> bool {
    s.parse::<i64>().is_ok()
}

/// Integer value of the part before the first `.`, or 0.
pub fn lenient_int(s: &str) -> i64 {
    let head = s.split('.').next().unwrap_or_default();
    head.parse().unwrap_or(0)
}

pub fn is_crc32(s: &str) -> bool {
    s.len() == 8 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Trailing `720p` or `1280x720` shape.
pub fn is_resolution(s: &str) -> bool {
    RE_RESOLUTION.is_match(s)
}

/// Whether `s` is exactly one dash character.
pub fn is_dash(s: &str) -> bool {
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if DASHES.contains(&c))
}

pub fn trim_dashes_and_spaces(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || DASHES.contains(&c))
}

fn is_latin(c: char) -> bool {
    LATIN_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&c))
}

/// More Latin-script characters than anything else.
pub fn is_mostly_latin(s: &str) -> bool {
    let (latin, other) = s.chars().fold((0usize, 0usize), |(l, o), c| {
        if is_latin(c) {
            (l + 1, o)
        } else {
            (l, o + 1)
        }
    });
    latin > other
}

/// Season number of an English ordinal ("2nd", "Second").
pub fn ordinal_number(s: &str) -> Option<u32> {
    let n = match s.to_lowercase().as_str() {
        "1st" | "first" => 1,
        "2nd" | "second" => 2,
        "3rd" | "third" => 3,
        "4th" | "fourth" => 4,
        "5th" | "fifth" => 5,
        "6th" | "sixth" => 6,
        "7th" | "seventh" => 7,
        "8th" | "eighth" => 8,
        "9th" | "ninth" => 9,
        _ => return None,
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric() {
        assert!(is_numeric("01"));
        assert!(is_numeric("-3"));
        assert!(!is_numeric("1.5"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("99999999999999999999"));
    }

    #[test]
    fn test_lenient_int() {
        assert_eq!(lenient_int("07.5"), 7);
        assert_eq!(lenient_int("12"), 12);
        assert_eq!(lenient_int("abc"), 0);
    }

    #[test]
    fn test_crc32() {
        assert!(is_crc32("1234ABCD"));
        assert!(is_crc32("deadbeef"));
        assert!(!is_crc32("1234ABCG"));
        assert!(!is_crc32("1234ABC"));
    }

    #[test]
    fn test_resolution() {
        assert!(is_resolution("1080p"));
        assert!(is_resolution("1280x720"));
        assert!(is_resolution("1920×1080"));
        assert!(is_resolution("BD1080p"));
        assert!(!is_resolution("1080i"));
        assert!(!is_resolution("12p"));
    }

    #[test]
    fn test_dash() {
        assert!(is_dash("-"));
        assert!(is_dash("\u{2013}"));
        assert!(!is_dash("--"));
        assert!(!is_dash("~"));
        assert_eq!(trim_dashes_and_spaces(" - Title \u{2014}"), "Title");
    }

    #[test]
    fn test_mostly_latin() {
        assert!(is_mostly_latin("Toradora"));
        assert!(is_mostly_latin("Café"));
        assert!(!is_mostly_latin("とらドラ"));
        assert!(!is_mostly_latin("2008"));
        assert!(!is_mostly_latin(""));
    }

    #[test]
    fn test_ordinals() {
        assert_eq!(ordinal_number("2nd"), Some(2));
        assert_eq!(ordinal_number("Ninth"), Some(9));
        assert_eq!(ordinal_number("10th"), None);
    }
}
