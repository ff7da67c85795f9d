use serde_json::{Map, Value};

/// Finds the first syntactically valid JSON object embedded in `text`.
///
/// Only the first `{` is used as a start. Each point where the brace depth
/// returns to zero is tried as an end, in order, until one parses. Braces
/// inside string literals (escapes honored) do not count.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset;
                    if let Ok(Value::Object(map)) = serde_json::from_str(&text[start..=end]) {
                        return Some(map);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_surrounded_by_noise() {
        let map = extract_json_object("noise {\"a\":1} more noise").unwrap();
        assert_eq!(Value::Object(map), json!({"a": 1}));
    }

    #[test]
    fn test_no_braces() {
        assert!(extract_json_object("no braces here").is_none());
        assert!(extract_json_object("").is_none());
    }

    #[test]
    fn test_closing_brace_inside_string() {
        let map = extract_json_object("{\"a\": \"text with } inside\"}").unwrap();
        assert_eq!(Value::Object(map), json!({"a": "text with } inside"}));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"Here: {"a": "say \"}\" twice", "b": {"c": [1, 2]}} done"#;
        let map = extract_json_object(text).unwrap();
        assert_eq!(map["a"], json!("say \"}\" twice"));
        assert_eq!(map["b"], json!({"c": [1, 2]}));
    }

    #[test]
    fn test_code_fence_wrapper() {
        let text = "```json\n{\n  \"metadata\": {\"title\": \"Long NAS100\"}\n}\n```";
        let map = extract_json_object(text).unwrap();
        assert_eq!(map["metadata"]["title"], "Long NAS100");
    }

    #[test]
    fn test_only_first_start_is_tried() {
        // `{a}` is not JSON and every later candidate still starts with it.
        assert!(extract_json_object("{a} {\"b\": 2}").is_none());

        let text = "{\"x\": 1 } } {\"y\": 2}";
        let map = extract_json_object(text).unwrap();
        assert_eq!(Value::Object(map), json!({"x": 1}));
    }

    #[test]
    fn test_unbalanced_object() {
        assert!(extract_json_object("{\"a\": {\"b\": 1}").is_none());
    }

    #[test]
    fn test_multibyte_text_around_object() {
        let map = extract_json_object("Résumé → {\"symbol\": \"EUR/USD\", \"note\": \"été\"} ✓").unwrap();
        assert_eq!(map["note"], "été");
    }
}
