use serde_json::Value;

const REQUIRED_FIELDS: [&str; 2] = ["name", "email"];

/// Check the structural preconditions for a record: it must be a JSON
/// object carrying truthy `name` and `email` members. No format or type
/// checks beyond presence and truthiness; extra fields are fine.
pub fn is_valid_record(record: &Value) -> bool {
    let Value::Object(map) = record else {
        return false;
    };

    REQUIRED_FIELDS
        .iter()
        .all(|field| map.get(*field).is_some_and(is_truthy))
}

// Truthiness mirrors what the service has always accepted: empty or
// zero-like values do not count as a populated field.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
