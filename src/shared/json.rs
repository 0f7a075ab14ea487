use serde::Serialize;
use serde_json::Value;

/// Serializes `input` and removes every null field, at any depth.
pub fn without_nulls<T: Serialize>(input: T) -> Value {
    let mut value = serde_json::to_value(input).unwrap_or(Value::Null);
    strip_nulls(&mut value);
    value
}

/// Removes null object fields in place. Nulls inside arrays are kept so element
/// positions do not shift.
pub fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for (_, v) in map.iter_mut() {
                strip_nulls(v);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                strip_nulls(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_nulls_removed() {
        let value = without_nulls(json!({
            "Name": "Default Domain Policy",
            "Owner": null,
            "Settings": {"Path": null, "Value": 1},
            "Members": [null, {"Sid": null, "Name": "Admins"}]
        }));

        assert_eq!(
            value,
            json!({
                "Name": "Default Domain Policy",
                "Settings": {"Value": 1},
                "Members": [null, {"Name": "Admins"}]
            })
        );
    }

    #[test]
    fn test_scalars_untouched() {
        assert_eq!(without_nulls(5), json!(5));
        assert_eq!(without_nulls(Option::<u8>::None), Value::Null);
    }
}
