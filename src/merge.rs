use serde_json::{Map, Value};

/// Deep-merges `source` into `target`.
///
/// Keys missing in `target` are copied. Where both sides hold a value, arrays
/// are concatenated (target items first), objects are merged recursively and
/// any other target value is kept as is.
pub fn merge_into(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, incoming) in source {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), incoming.clone());
            }
            Some(existing) => merge_value(existing, incoming),
        }
    }
}

fn merge_value(existing: &mut Value, incoming: &Value) {
    match (existing, incoming) {
        (Value::Array(left), Value::Array(right)) => left.extend(right.iter().cloned()),
        (Value::Array(left), other) => left.push(other.clone()),
        (Value::Object(left), Value::Object(right)) => merge_into(left, right),
        _ => {}
    }
}
