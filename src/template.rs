use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

// `{{token}}` or `{{token || "fallback"}}`
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\{\s*(\w+)\s*(?:\|\|\s*"([^"]*)"\s*)?\}\}"#).unwrap());

/// Values substituted into a template, keyed by placeholder name.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: HashMap<String, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Replaces every `{{token}}` with its value. Unknown tokens become empty
/// strings; `{{token || "text"}}` falls back to `text` when the value is
/// missing or empty.
pub fn interpolate(template: &str, placeholders: &Placeholders) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let value = placeholders.get(&caps[1]).unwrap_or("");
            match caps.get(2) {
                Some(fallback) if value.trim().is_empty() => fallback.as_str().to_string(),
                _ => value.to_string(),
            }
        })
        .into_owned()
}
