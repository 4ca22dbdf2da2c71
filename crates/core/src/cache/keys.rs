//! Signature codec: turns an `(endpoint, args)` pair into a stable cache key.

use std::fmt;

use serde_json::Value;

/// Deterministic identifier for a logical query.
///
/// Keys are built only through [`key_for`], so two keys compare equal exactly
/// when their endpoints match and their arguments are equal as JSON values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the cache key for a query against `endpoint` with `args`.
///
/// Object members are written in sorted order, so argument maps that differ
/// only in insertion order produce the same key. Absent arguments and an
/// explicit JSON `null` are the same request.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use stockroom_core::cache::key_for;
///
/// let a = key_for("/products", Some(&json!({ "search": "shoe", "page": 1 })));
/// let b = key_for("/products", Some(&json!({ "page": 1, "search": "shoe" })));
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), r#"/products({"page":1,"search":"shoe"})"#);
///
/// assert_eq!(key_for("/dashboard", None).as_str(), "/dashboard()");
/// ```
pub fn key_for(endpoint: &str, args: Option<&Value>) -> CacheKey {
    let mut key = String::with_capacity(endpoint.len() + 2);
    key.push_str(endpoint);
    key.push('(');
    match args {
        None | Some(Value::Null) => {}
        Some(value) => write_canonical(value, &mut key),
    }
    key.push(')');
    CacheKey(key)
}

/// Writes `value` as compact JSON with object members sorted by name.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut members: Vec<(&String, &Value)> = map.iter().collect();
            members.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, member)) in members.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(member, out);
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
    fn test_key_without_args() {
        assert_eq!(key_for("/dashboard", None).as_str(), "/dashboard()");
    }

    #[test]
    fn test_null_args_match_absent_args() {
        assert_eq!(
            key_for("/users", Some(&Value::Null)),
            key_for("/users", None)
        );
    }

    #[test]
    fn test_string_args_are_quoted() {
        let key = key_for("/products", Some(&json!("shoe")));
        assert_eq!(key.as_str(), r#"/products("shoe")"#);
    }

    #[test]
    fn test_member_order_does_not_matter() {
        let mut first = serde_json::Map::new();
        first.insert("b".to_string(), json!(2));
        first.insert("a".to_string(), json!({ "y": true, "x": [1, 2] }));

        let mut second = serde_json::Map::new();
        second.insert("a".to_string(), json!({ "x": [1, 2], "y": true }));
        second.insert("b".to_string(), json!(2));

        assert_eq!(
            key_for("/q", Some(&Value::Object(first))),
            key_for("/q", Some(&Value::Object(second)))
        );
    }

    #[test]
    fn test_array_order_matters() {
        assert_ne!(
            key_for("/q", Some(&json!([1, 2]))),
            key_for("/q", Some(&json!([2, 1])))
        );
    }

    #[test]
    fn test_different_endpoints_differ() {
        let args = json!({ "search": "shoe" });
        assert_ne!(
            key_for("/products", Some(&args)),
            key_for("/users", Some(&args))
        );
    }

    #[test]
    fn test_keys_with_escaped_strings() {
        let key = key_for("/products", Some(&json!({ "search": "a\"b" })));
        assert_eq!(key.as_str(), r#"/products({"search":"a\"b"})"#);
    }

    #[test]
    fn test_display_matches_as_str() {
        let key = key_for("/expenses", None);
        assert_eq!(key.to_string(), key.as_str());
    }
}
