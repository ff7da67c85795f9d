use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static TOKEN_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,/\\]+").unwrap());

fn alias(token: &str) -> Option<&'static str> {
    let canonical = match token {
        "monthly" | "month" | "m1" => "M",
        "w" | "week" | "weekly" | "w1" => "W",
        "d" | "day" | "daily" | "d1" => "D",
        "h4" | "4h" => "H4",
        "h1" | "1h" | "hourly" => "H1",
        "m15" | "15m" => "M15",
        "m5" | "5m" => "M5",
        _ => return None,
    };
    Some(canonical)
}

pub fn normalize_timeframe_token(token: &str) -> Option<String> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    match alias(&trimmed.to_lowercase()) {
        Some(canonical) => Some(canonical.to_string()),
        None => Some(trimmed.to_uppercase()),
    }
}

/// Canonical, de-duplicated timeframe tokens from a string such as
/// `"Daily, 4h / H1"` or a JSON array of tokens.
pub fn normalize_timeframes(value: &Value) -> Vec<String> {
    let tokens: Vec<String> = match value {
        Value::Null => return Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) => TOKEN_SPLIT.split(s).map(str::to_string).collect(),
        other => TOKEN_SPLIT
            .split(&other.to_string())
            .map(str::to_string)
            .collect(),
    };

    let mut normalized: Vec<String> = Vec::new();
    for token in tokens {
        if let Some(candidate) = normalize_timeframe_token(&token) {
            if !normalized.contains(&candidate) {
                normalized.push(candidate);
            }
        }
    }
    normalized
}

pub fn stringify_timeframes(value: &Value) -> String {
    normalize_timeframes(value).join(" / ")
}
