//! Cache key derivation.
//!
//! Keys are SHA-256 hex digests, stable across processes so that a shared
//! store (e.g. redis) sees the same fingerprint from every instance.

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Derive the fingerprint of a generation request.
///
/// The digest covers an unambiguous encoding of
/// `[prompt, content_type, model, [[key, value], ...]]` with parameters in
/// key order, and nested objects inside parameter values re-sorted, so
/// equivalent parameter sets always produce the same key.
pub fn derive_key(
    prompt: &str,
    content_type: &str,
    model: &str,
    params: &BTreeMap<String, Value>,
) -> String {
    let mut canonical = String::new();
    canonical.push('[');
    write_canonical(&mut canonical, &Value::from(prompt));
    canonical.push(',');
    write_canonical(&mut canonical, &Value::from(content_type));
    canonical.push(',');
    write_canonical(&mut canonical, &Value::from(model));
    canonical.push_str(",[");
    for (i, (key, value)) in params.iter().enumerate() {
        if i > 0 {
            canonical.push(',');
        }
        canonical.push('[');
        write_canonical(&mut canonical, &Value::from(key.as_str()));
        canonical.push(',');
        write_canonical(&mut canonical, value);
        canonical.push(']');
    }
    canonical.push_str("]]");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Append `value` as JSON with object keys in sorted order.
fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (k, v)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(k.as_str()).to_string());
                out.push(':');
                write_canonical(out, v);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, v);
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

    fn params(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn derive_key_deterministic() {
        let empty = BTreeMap::new();
        let k1 = derive_key("hi", "text", "gpt-3.5-turbo", &empty);
        let k2 = derive_key("hi", "text", "gpt-3.5-turbo", &empty);
        assert_eq!(k1, k2);
        assert_eq!(k1.len(), 64);
    }

    #[test]
    fn derive_key_differs_on_each_field() {
        let empty = BTreeMap::new();
        let base = derive_key("hi", "text", "gpt-3.5-turbo", &empty);
        assert_ne!(base, derive_key("ho", "text", "gpt-3.5-turbo", &empty));
        assert_ne!(base, derive_key("hi", "code", "gpt-3.5-turbo", &empty));
        assert_ne!(base, derive_key("hi", "text", "gpt-4", &empty));
        assert_ne!(
            base,
            derive_key("hi", "text", "gpt-3.5-turbo", &params(&[("tone", json!("warm"))]))
        );
    }

    #[test]
    fn derive_key_ignores_param_insertion_order() {
        let mut a = BTreeMap::new();
        a.insert("platform".to_string(), json!("twitter"));
        a.insert("audience".to_string(), json!("developers"));
        let mut b = BTreeMap::new();
        b.insert("audience".to_string(), json!("developers"));
        b.insert("platform".to_string(), json!("twitter"));
        assert_eq!(
            derive_key("p", "social_media", "gpt-4", &a),
            derive_key("p", "social_media", "gpt-4", &b)
        );
    }

    #[test]
    fn derive_key_sorts_nested_objects() {
        let a = params(&[("opts", json!({"x": 1, "y": 2}))]);
        let b = params(&[("opts", json!({"y": 2, "x": 1}))]);
        assert_eq!(derive_key("p", "text", "m", &a), derive_key("p", "text", "m", &b));
    }

    #[test]
    fn derive_key_fields_do_not_bleed() {
        let empty = BTreeMap::new();
        // naive "prompt:type:model" joining would collide here
        assert_ne!(
            derive_key("a:b", "c", "d", &empty),
            derive_key("a", "b:c", "d", &empty)
        );
    }

    #[test]
    fn derive_key_distinguishes_value_types() {
        let string = params(&[("n", json!("1"))]);
        let number = params(&[("n", json!(1))]);
        assert_ne!(
            derive_key("p", "text", "m", &string),
            derive_key("p", "text", "m", &number)
        );
    }
}
