use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the dedup fingerprint of a record: the lowercase hex SHA-256
/// digest of its canonical JSON serialization.
///
/// Canonical form sorts object keys lexicographically at every nesting
/// level, so two records with the same content hash identically no matter
/// the key order they arrived with.
pub fn fingerprint(record: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(record, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

// Explicit writer instead of serde_json serialization: map iteration order
// must not matter, and nested objects need the same treatment as the root.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();

            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Display for Value emits compact JSON with proper escaping
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn produces_64_lowercase_hex_chars() {
        let hash = fingerprint(&json!({"name": "Alice", "email": "a@x.com"}));

        assert_eq!(hash.len(), 64);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn identical_records_hash_equal() {
        let a = json!({"name": "Alice", "email": "a@x.com"});
        let b = json!({"name": "Alice", "email": "a@x.com"});

        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn top_level_key_order_is_irrelevant() {
        let a: Value = serde_json::from_str(r#"{"name":"Alice","email":"a@x.com"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"email":"a@x.com","name":"Alice"}"#).unwrap();

        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn nested_key_order_is_irrelevant() {
        let a: Value = serde_json::from_str(
            r#"{"name":"Alice","email":"a@x.com","address":{"city":"Lyon","zip":"69001"}}"#,
        )
        .unwrap();
        let b: Value = serde_json::from_str(
            r#"{"email":"a@x.com","address":{"zip":"69001","city":"Lyon"},"name":"Alice"}"#,
        )
        .unwrap();

        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn objects_inside_arrays_are_canonicalized() {
        let a: Value =
            serde_json::from_str(r#"{"name":"a","email":"e","tags":[{"k":1,"v":2}]}"#).unwrap();
        let b: Value =
            serde_json::from_str(r#"{"name":"a","email":"e","tags":[{"v":2,"k":1}]}"#).unwrap();

        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn array_order_is_content() {
        let a = json!({"name": "a", "email": "e", "tags": [1, 2]});
        let b = json!({"name": "a", "email": "e", "tags": [2, 1]});

        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn any_value_change_changes_the_hash() {
        let a = json!({"name": "Alice", "email": "a@x.com"});
        let b = json!({"name": "Alice", "email": "b@x.com"});
        let c = json!({"name": "Alice", "email": "a@x.com", "extra": null});

        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn string_escapes_do_not_collide_with_structure() {
        let a = json!({"name": "a\",\"x", "email": "e"});
        let b = json!({"name": "a", "x": "", "email": "e"});

        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
