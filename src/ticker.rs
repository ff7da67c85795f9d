use once_cell::sync::Lazy;
use regex::Regex;

static PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,6}/[A-Z]{2,6}\b").unwrap());
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{3,6}[0-9]{0,4}\b").unwrap());

/// Upper-case words of the prompt layouts that are never instruments.
pub const RESERVED_SYMBOLS: [&str; 7] = [
    "TYPE",
    "ANALYSE",
    "TRADE",
    "PLAN",
    "OBJECTIFS",
    "SCENARIOS",
    "RISQUES",
];

/// Best guess at the instrument named in `text`, or an empty string.
///
/// A slash pair (`EUR/USD`) wins outright. Otherwise upper-case tokens like
/// `NAS100` or `UKOIL` are collected, reserved words removed, and a token
/// carrying digits is preferred over the first one found.
pub fn guess_symbol(text: &str) -> String {
    if let Some(pair) = PAIR.find(text) {
        return pair.as_str().to_string();
    }

    let candidates: Vec<&str> = TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| !RESERVED_SYMBOLS.contains(token))
        .collect();

    candidates
        .iter()
        .find(|token| token.chars().any(|c| c.is_ascii_digit()))
        .or_else(|| candidates.first())
        .map(|token| token.to_string())
        .unwrap_or_default()
}
