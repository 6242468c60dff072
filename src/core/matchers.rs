//! Value matchers for the format, boolean and character encoding rules of an OCA bundle.

use crate::domain::model::{AttributeType, BaseType};
use chrono::format::{parse, Parsed, StrftimeItems};
use regex::Regex;

const BOOLEAN_VALUES: [&str; 12] = [
    "True", "true", "TRUE", "T", "1", "1.0", "False", "false", "FALSE", "F", "0", "0.0",
];

// Order matters: at each position the first matching token wins, so longer
// tokens come before their prefixes. Each token maps to a strftime directive
// and to the digits it may span.
const ISO_TOKENS: [(&str, &str, &str); 14] = [
    ("YYYY", "%Y", "[0-9]{4}"),
    ("MM", "%m", "[0-9]{1,2}"),
    ("DDD", "%j", "[0-9]{1,3}"),
    ("DD", "%d", "[0-9]{1,2}"),
    ("D", "%w", "[0-9]"),
    ("ww", "%W", "[0-9]{1,2}"),
    ("+hh:mm", "%z", "[+-][0-9]{2}:?[0-9]{2}"),
    ("-hh:mm", "%z", "[+-][0-9]{2}:?[0-9]{2}"),
    ("+hhmm", "%z", "[+-][0-9]{2}:?[0-9]{2}"),
    ("-hhmm", "%z", "[+-][0-9]{2}:?[0-9]{2}"),
    ("hh", "%H", "[0-9]{1,2}"),
    ("mm", "%M", "[0-9]{1,2}"),
    ("sss", "%f", "[0-9]{1,6}"),
    ("ss", "%S", "[0-9]{1,2}"),
];

enum IsoPiece<'a> {
    Field { strftime: &'static str, shape: &'static str },
    Literal(&'a str),
}

fn iso_pieces(pattern: &str) -> Vec<IsoPiece<'_>> {
    let mut pieces = Vec::new();
    let mut rest = pattern;
    while let Some(c) = rest.chars().next() {
        match ISO_TOKENS.iter().find(|&&(iso, _, _)| rest.starts_with(iso)) {
            Some(&(iso, strftime, shape)) => {
                pieces.push(IsoPiece::Field { strftime, shape });
                rest = &rest[iso.len()..];
            }
            None => {
                pieces.push(IsoPiece::Literal(&rest[..c.len_utf8()]));
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    pieces
}

/// Converts an ISO 8601 pattern such as `YYYY-MM-DDThh:mm:ss` into a strftime format.
pub fn iso_to_strftime(pattern: &str) -> String {
    iso_pieces(pattern)
        .into_iter()
        .map(|piece| match piece {
            IsoPiece::Field { strftime, .. } => strftime.to_string(),
            IsoPiece::Literal("%") => "%%".to_string(),
            IsoPiece::Literal(text) => text.to_string(),
        })
        .collect()
}

/// Anchored regex of the characters each token may span: `YYYY` takes exactly
/// four digits, and no field accepts signs or surrounding whitespace.
fn iso_shape(pattern: &str) -> Option<Regex> {
    let body: String = iso_pieces(pattern)
        .into_iter()
        .map(|piece| match piece {
            IsoPiece::Field { shape, .. } => shape.to_string(),
            IsoPiece::Literal(text) => regex::escape(text),
        })
        .collect();
    Regex::new(&format!("^{}$", body)).ok()
}

pub fn match_regex(pattern: &str, value: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    match Regex::new(pattern) {
        Ok(re) => re.is_match(value),
        Err(e) => {
            tracing::debug!("Invalid regular expression {:?}: {}", pattern, e);
            false
        }
    }
}

pub fn match_boolean(value: &str) -> bool {
    BOOLEAN_VALUES.contains(&value)
}

/// Matches `value` against an ISO 8601 date/time, duration or interval pattern.
pub fn match_datetime(pattern: &str, value: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }

    if pattern.contains('/') {
        // <start>/<end>, <start>/<duration>, <duration>/<end> or R<n>/<interval>
        if !value.contains('/') {
            return false;
        }
        let pattern_parts: Vec<&str> = pattern.split('/').collect();
        let value_parts: Vec<&str> = value.split('/').collect();
        return pattern_parts.len() == value_parts.len()
            && pattern_parts
                .iter()
                .zip(value_parts.iter())
                .all(|(p, v)| match_datetime(p, v));
    }

    if pattern.starts_with('P') || pattern.starts_with('R') {
        return match_duration(pattern, value);
    }

    if !iso_shape(pattern).is_some_and(|shape| shape.is_match(value)) {
        return false;
    }

    let format = iso_to_strftime(pattern);
    let mut parsed = Parsed::new();
    if parse(&mut parsed, value, StrftimeItems::new(&format)).is_err() {
        return false;
    }

    // Reject dates that parse field by field but do not exist, e.g. 2023-02-30.
    if parsed.year().is_some() && parsed.month().is_some() && parsed.day().is_some() {
        return parsed.to_naive_date().is_ok();
    }
    true
}

/// Durations (`PnYnMnD`) and repetition heads (`Rn`): every `n` stands for digits.
fn match_duration(pattern: &str, value: &str) -> bool {
    let body = pattern
        .split('n')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[0-9]+");
    match Regex::new(&format!("^{}$", body)) {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

/// A compiled format rule for one attribute.
#[derive(Debug, Clone)]
pub enum FormatMatcher {
    Any,
    Regex(Regex),
    DateTime(String),
    Boolean,
}

impl FormatMatcher {
    pub fn new(attr_type: &AttributeType, pattern: Option<&str>) -> Result<Self, regex::Error> {
        let pattern = pattern.unwrap_or_default();
        let matcher = match attr_type.base {
            BaseType::DateTime if pattern.is_empty() => FormatMatcher::Any,
            BaseType::DateTime => FormatMatcher::DateTime(pattern.to_string()),
            BaseType::Numeric | BaseType::Text if pattern.is_empty() => FormatMatcher::Any,
            BaseType::Numeric | BaseType::Text => FormatMatcher::Regex(Regex::new(pattern)?),
            BaseType::Boolean => FormatMatcher::Boolean,
            BaseType::Other(_) => FormatMatcher::Any,
        };
        Ok(matcher)
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            FormatMatcher::Any => true,
            FormatMatcher::Regex(re) => re.is_match(value),
            FormatMatcher::DateTime(pattern) => match_datetime(pattern, value),
            FormatMatcher::Boolean => match_boolean(value),
        }
    }
}

pub fn match_format(attr_type: &AttributeType, pattern: Option<&str>, value: &str) -> bool {
    FormatMatcher::new(attr_type, pattern)
        .map(|matcher| matcher.matches(value))
        .unwrap_or(false)
}

fn normalize_encoding(encoding: &str) -> String {
    encoding.trim().to_ascii_lowercase().replace('_', "-")
}

pub fn is_valid_utf8(data: &[u8]) -> bool {
    std::str::from_utf8(data).is_ok()
}

pub fn is_valid_utf16le(data: &[u8]) -> bool {
    if data.len() % 2 != 0 {
        return false;
    }
    let units = data.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units).all(|c| c.is_ok())
}

/// Every byte sequence is valid ISO 8859-1.
pub fn is_valid_iso8859_1(_data: &[u8]) -> bool {
    true
}

/// Checks raw cell bytes against a declared encoding. Unknown encodings never match.
pub fn match_character_encoding(data: &[u8], encoding: &str) -> bool {
    match normalize_encoding(encoding).as_str() {
        "utf-8" | "utf8" => is_valid_utf8(data),
        "utf-16le" | "utf16le" => is_valid_utf16le(data),
        "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" => is_valid_iso8859_1(data),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_to_strftime() {
        assert_eq!(iso_to_strftime("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(iso_to_strftime("YYYY-DDD"), "%Y-%j");
        assert_eq!(iso_to_strftime("hh:mm:ss.sss"), "%H:%M:%S.%f");
        assert_eq!(iso_to_strftime("YYYY-MM-DDThh:mm+hh:mm"), "%Y-%m-%dT%H:%M%z");
    }

    #[test]
    fn test_match_datetime_dates() {
        assert!(match_datetime("YYYY-MM-DD", "2023-04-17"));
        assert!(!match_datetime("YYYY-MM-DD", "2023/04/17"));
        assert!(!match_datetime("YYYY-MM-DD", "2023-13-01"));
        assert!(!match_datetime("YYYY-MM-DD", "2023-02-30"));
        assert!(!match_datetime("YYYY-MM-DD", "2023-04-17T10:00"));
        assert!(match_datetime("YYYYMMDD", "20230417"));
        assert!(match_datetime("", "anything"));
        assert!(match_datetime("YYYY-MM-DD", "2023-4-7"));
    }

    #[test]
    fn test_match_datetime_requires_four_digit_year() {
        assert!(!match_datetime("YYYY-MM-DD", "23-04-17"));
        assert!(!match_datetime("YYYY-MM-DD", " 2023-04-17"));
        assert!(!match_datetime("YYYY-MM-DD", "2023-04-17 "));
        assert!(!match_datetime("YYYY-MM-DD", "+2023-04-17"));
        assert!(!match_datetime("YYYY-MM-DD", "-2023-04-17"));
        assert!(!match_datetime("YYYY-MM-DD", "12023-04-17"));
        assert!(!match_datetime("YYYY", "023"));
        assert!(match_datetime("YYYY", "0023"));
    }

    #[test]
    fn test_match_datetime_times_and_zones() {
        assert!(match_datetime("hh:mm:ss", "23:59:01"));
        assert!(!match_datetime("hh:mm:ss", "24:00:61"));
        assert!(match_datetime("YYYY-MM-DDThh:mm:ssZ", "2023-04-17T10:00:00Z"));
        assert!(match_datetime("YYYY-MM-DDThh:mm:ss+hh:mm", "2023-04-17T10:00:00+02:00"));
        assert!(match_datetime("YYYY-MM-DDThh:mm:ss+hhmm", "2023-04-17T10:00:00-0500"));
    }

    #[test]
    fn test_match_datetime_durations_and_intervals() {
        assert!(match_datetime("PnYnMnD", "P1Y22M3D"));
        assert!(!match_datetime("PnYnMnD", "P1Y22M"));
        assert!(match_datetime("Rn", "R5"));
        assert!(match_datetime("YYYY-MM-DD/YYYY-MM-DD", "2023-01-01/2023-12-31"));
        assert!(match_datetime("YYYY-MM-DD/PnD", "2023-01-01/P10D"));
        assert!(!match_datetime("YYYY-MM-DD/PnD", "2023-01-01"));
        assert!(match_datetime("Rn/YYYY-MM-DD/PnD", "R3/2023-01-01/P10D"));
        assert!(!match_datetime("Rn/YYYY-MM-DD/PnD", "R3/2023-01-01/10D"));
    }

    #[test]
    fn test_match_regex_is_unanchored() {
        assert!(match_regex("[0-9]+", "abc123"));
        assert!(!match_regex("^[0-9]+$", "abc123"));
        assert!(match_regex("", "x"));
        assert!(!match_regex("[", "["));
    }

    #[test]
    fn test_match_boolean() {
        for value in ["true", "FALSE", "T", "0.0", "1"] {
            assert!(match_boolean(value), "{value} should be accepted");
        }
        for value in ["yes", "no", "t", "", "2"] {
            assert!(!match_boolean(value), "{value} should be rejected");
        }
    }

    #[test]
    fn test_match_format_dispatch() {
        let numeric = AttributeType::parse("Numeric");
        assert!(match_format(&numeric, Some("^[0-9]+$"), "42"));
        assert!(!match_format(&numeric, Some("^[0-9]+$"), "4.2"));
        assert!(match_format(&numeric, None, "anything"));

        let boolean = AttributeType::parse("Boolean");
        assert!(match_format(&boolean, None, "true"));
        assert!(!match_format(&boolean, None, "maybe"));

        let binary = AttributeType::parse("Binary");
        assert!(match_format(&binary, Some("^x$"), "whatever"));

        assert!(FormatMatcher::new(&numeric, Some("(")).is_err());
    }

    #[test]
    fn test_match_character_encoding() {
        assert!(match_character_encoding("héllo".as_bytes(), "utf-8"));
        assert!(match_character_encoding("héllo".as_bytes(), "UTF_8"));
        assert!(!match_character_encoding(&[0xff, 0xfe, 0xfd], "utf-8"));
        assert!(match_character_encoding(&[0xe9], "iso-8859-1"));
        assert!(match_character_encoding(&[0x68, 0x00, 0x69, 0x00], "utf-16le"));
        assert!(!match_character_encoding(&[0x68, 0x00, 0x69], "utf-16le"));
        assert!(!match_character_encoding(&[0x00, 0xdc], "utf-16le"));
        assert!(!match_character_encoding(b"abc", "ebcdic"));
    }
}
