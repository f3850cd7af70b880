//! Defensive JSON handling for model responses
//! Recovers a JSON object from noisy completions and walks nested content

use serde_json::{Map, Value};

/// Parse a model response into a JSON object, tolerating surrounding prose.
///
/// Tries a direct parse first, then falls back to the first balanced
/// `{...}` region in the text. Returns `None` when nothing parseable is
/// found; callers treat that as a failed unit of work, never a panic.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    let candidate = balanced_object(trimmed)?;
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

/// Slice of the first balanced top-level `{...}` region, string-aware.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Collect every distinct `fonte` string in the value, in traversal order.
pub fn collect_sources(value: &Value) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    collect_sources_into(value, &mut sources);
    sources
}

fn collect_sources_into(value: &Value, sources: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(fonte)) = map.get("fonte") {
                if !fonte.is_empty() && !sources.iter().any(|s| s == fonte) {
                    sources.push(fonte.clone());
                }
            }
            for child in map.values() {
                collect_sources_into(child, sources);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_sources_into(item, sources);
            }
        }
        _ => {}
    }
}

/// Visit every JSON object in the value, depth-first, with its dotted path.
///
/// The single structural visitor behind all recursive validation rules:
/// each rule supplies a closure over `(object, path)` instead of writing
/// its own descent.
pub fn visit_objects<F>(value: &Value, visitor: &mut F)
where
    F: FnMut(&Map<String, Value>, &str),
{
    visit_objects_at(value, "", visitor);
}

fn visit_objects_at<F>(value: &Value, path: &str, visitor: &mut F)
where
    F: FnMut(&Map<String, Value>, &str),
{
    match value {
        Value::Object(map) => {
            visitor(map, path);
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                visit_objects_at(child, &child_path, visitor);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                visit_objects_at(item, &format!("{}[{}]", path, i), visitor);
            }
        }
        _ => {}
    }
}

/// True when the value holds anything meaningful besides `fonte` keys.
pub fn has_meaningful_content(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) => true,
        Value::Bool(_) => true,
        Value::Array(items) => items.iter().any(has_meaningful_content),
        Value::Object(map) => map
            .iter()
            .any(|(key, child)| key != "fonte" && has_meaningful_content(child)),
        Value::Null => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_direct() {
        let value = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_embedded_in_prose() {
        let text = "Aqui esta o resultado:\n```json\n{\"tipo_evento\": \"sentenca\"}\n```\nFim.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["tipo_evento"], "sentenca");
    }

    #[test]
    fn test_extract_json_balanced_with_trailing_brace() {
        // A stray closing brace after the object must not break recovery
        let text = "resultado {\"a\": {\"b\": 2}} }";
        let value = extract_json(text).unwrap();
        assert_eq!(value["a"]["b"], 2);
    }

    #[test]
    fn test_extract_json_braces_inside_strings() {
        let text = r#"x {"nota": "chaves { dentro } de string", "n": 1} y"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn test_extract_json_none_on_garbage() {
        assert!(extract_json("sem json nenhum").is_none());
        assert!(extract_json("{quebrado").is_none());
        assert!(extract_json("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_collect_sources_distinct_in_order() {
        let content = json!({
            "salario": {"valor": "R$ 2.000,00", "fonte": "fls. 12"},
            "eventos": [
                {"data": "01/02/2020", "fonte": "fls. 3"},
                {"data": "05/02/2020", "fonte": "fls. 12"}
            ]
        });
        assert_eq!(collect_sources(&content), vec!["fls. 12", "fls. 3"]);
    }

    #[test]
    fn test_visit_objects_paths() {
        let content = json!({"a": {"b": [{"c": 1}]}});
        let mut paths: Vec<String> = Vec::new();
        visit_objects(&content, &mut |_, path| paths.push(path.to_string()));
        assert_eq!(paths, vec!["", "a", "a.b[0]"]);
    }

    #[test]
    fn test_has_meaningful_content() {
        assert!(has_meaningful_content(&json!({"resumo": "texto"})));
        assert!(has_meaningful_content(&json!({"n": 0})));
        assert!(!has_meaningful_content(&json!({})));
        assert!(!has_meaningful_content(&json!({"fonte": "fls. 1"})));
        assert!(!has_meaningful_content(&json!({"campo": "", "lista": []})));
    }
}
