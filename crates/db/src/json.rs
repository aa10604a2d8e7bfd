//! Normalization for JSON-typed list columns.
//!
//! Legacy rows can hold either a JSON array of strings or a bare string.
//! Both shapes normalize to `Vec<String>` here, once, at the persistence
//! boundary; malformed content reads as the empty list so one bad row never
//! aborts a batch.

use serde_json::Value;

pub fn decode_string_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(values)) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        Ok(Value::String(text)) if !text.is_empty() => vec![text],
        Ok(_) => Vec::new(),
        // Not JSON at all: a single legacy plain-text entry. Anything that
        // looks like truncated JSON stays empty rather than leaking syntax.
        Err(_) if !trimmed.starts_with('[') && !trimmed.starts_with('{') => {
            vec![trimmed.to_string()]
        }
        Err(_) => Vec::new(),
    }
}

pub fn encode_string_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::{decode_string_list, encode_string_list};

    #[test]
    fn decodes_json_arrays() {
        assert_eq!(decode_string_list(r#"["a","b"]"#), vec!["a", "b"]);
        assert!(decode_string_list("[]").is_empty());
    }

    #[test]
    fn decodes_legacy_bare_strings() {
        assert_eq!(decode_string_list(r#""just one item""#), vec!["just one item"]);
        assert_eq!(decode_string_list("not json at all"), vec!["not json at all"]);
    }

    #[test]
    fn malformed_json_reads_as_empty() {
        assert!(decode_string_list(r#"["unterminated"#).is_empty());
        assert!(decode_string_list(r#"{"wrong":"shape"}"#).is_empty());
        assert!(decode_string_list("").is_empty());
    }

    #[test]
    fn non_string_array_entries_are_skipped() {
        assert_eq!(decode_string_list(r#"["a", 3, null, "b"]"#), vec!["a", "b"]);
    }

    #[test]
    fn round_trips_through_encode() {
        let items = vec!["first".to_string(), "second".to_string()];
        assert_eq!(decode_string_list(&encode_string_list(&items)), items);
    }
}
