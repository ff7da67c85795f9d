//! Line-oriented parsing of numbered narratives.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\.\s*(.*)$").unwrap());
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());
static LEADING_ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s•*_-]*\d+\.\s*").unwrap());
static LEADING_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s•*_-]+").unwrap());

/// Section bodies keyed by the section number as written (`"1"`, `"01"`).
pub type Sections = BTreeMap<String, String>;

/// Splits a narrative into numbered sections.
///
/// A line such as `3. Intraday structure` opens section 3 seeded with the
/// rest of the line; following non-empty lines are appended, space-joined,
/// until the next header. Text before the first header is dropped, and a
/// repeated number restarts that section. Numbers are kept verbatim, so
/// `01.` and `1.` are distinct sections and no number is too large.
pub fn parse_sections(text: &str) -> Sections {
    let mut sections = Sections::new();
    let mut current: Option<String> = None;

    for line in LINE_BREAK.split(text) {
        if let Some(caps) = SECTION_HEADER.captures(line) {
            let number = caps[1].to_string();
            sections.insert(number.clone(), caps[2].trim().to_string());
            current = Some(number);
            continue;
        }

        let Some(number) = current.as_ref() else {
            continue;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let body = sections.entry(number.clone()).or_default();
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(trimmed);
    }

    sections
}

fn sanitize_line(line: &str) -> String {
    let mut current = line.replace("**", "");
    loop {
        let stripped = LEADING_ORDINAL.replace(&current, "");
        let stripped = LEADING_BULLET.replace(&stripped, "").trim().to_string();
        if stripped == current {
            return stripped;
        }
        current = stripped;
    }
}

/// Flattens markdown into one line of prose: bold markers, leading ordinals
/// and bullets, and blank lines are removed. Stable under repetition.
pub fn clean_text(text: &str) -> String {
    LINE_BREAK
        .split(text)
        .map(sanitize_line)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_basic() {
        let sections = parse_sections("1. Hello\nworld\n2. Second\nline");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections["1"], "Hello world");
        assert_eq!(sections["2"], "Second line");
    }

    #[test]
    fn test_preamble_and_blank_lines_are_dropped() {
        let text = "TYPE : Trade\nintro line\n\n1. Context\n\n  Weekly — bullish  \r\n2.\nDaily — range";
        let sections = parse_sections(text);
        assert_eq!(sections["1"], "Context Weekly — bullish");
        assert_eq!(sections["2"], "Daily — range");
    }

    #[test]
    fn test_repeated_header_restarts_section() {
        let sections = parse_sections("1. first\nbody\n1. again");
        assert_eq!(sections["1"], "again");
    }

    #[test]
    fn test_numbers_are_kept_as_written() {
        let sections = parse_sections("1. a\n01. b\n99999999999. c\nmore");
        assert_eq!(sections.len(), 3);
        assert_eq!(sections["1"], "a");
        assert_eq!(sections["01"], "b");
        assert_eq!(sections["99999999999"], "c more");
    }

    #[test]
    fn test_no_headers() {
        assert!(parse_sections("just prose\nwithout numbers").is_empty());
        assert!(parse_sections("").is_empty());
    }

    #[test]
    fn test_markdown_heading_is_not_a_header() {
        let sections = parse_sections("### 1. Context\nbody");
        assert!(sections.is_empty());
    }

    #[test]
    fn test_clean_text_strips_decorations() {
        let text = "**Result** — TP hit\n- first point\n* second\n• third\n\n2. numbered\n  _ under";
        assert_eq!(
            clean_text(text),
            "Result — TP hit first point second third numbered under"
        );
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let samples = [
            "1. 2. nested ordinals",
            "- 1. - 2. mixed",
            "***bold-ish*** text",
            "  \n\n",
            "plain text already clean",
            "•• double bullet\r\n3.5 lots at 1.0900",
            "a*****b",
        ];
        for sample in samples {
            let once = clean_text(sample);
            assert_eq!(clean_text(&once), once, "not stable for {:?}", sample);
        }
    }
}
