//! Mapping endpoint identifiers onto HTTP requests.
//!
//! Query endpoints are plain paths (`/products`). Mutation endpoints carry
//! their method and may name path parameters (`PUT /products/{id}`), which
//! are filled from the mutation arguments, percent-encoded as one path
//! segment each.

use reqwest::Method;
use serde_json::Value;

use crate::error::{ClientError, Result};

/// A resolved HTTP method and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
}

impl Route {
    /// Parses `endpoint`, substituting `{param}` placeholders from `args`.
    ///
    /// An endpoint without a method is a `GET`.
    pub fn parse(endpoint: &str, args: Option<&Value>) -> Result<Self> {
        let (method, template) = match endpoint.trim().split_once(' ') {
            Some((method, template)) => {
                let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
                    ClientError::InvalidInput(format!("Unknown method in endpoint: {}", endpoint))
                })?;
                (method, template.trim())
            }
            None => (Method::GET, endpoint.trim()),
        };

        Ok(Self {
            method,
            path: fill_path(template, args)?,
        })
    }
}

/// Flattens object arguments into query parameters. Nulls are skipped.
pub fn query_pairs(args: Option<&Value>) -> Vec<(String, String)> {
    match args {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.clone(), param_string(value)))
            .collect(),
        _ => Vec::new(),
    }
}

fn fill_path(template: &str, args: Option<&Value>) -> Result<String> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let close = rest[open..]
            .find('}')
            .map(|offset| open + offset)
            .ok_or_else(|| {
                ClientError::InvalidInput(format!("Unclosed path parameter in {}", template))
            })?;
        let name = &rest[open + 1..close];
        let value = args
            .and_then(|args| args.get(name))
            .filter(|value| !value.is_null())
            .ok_or_else(|| ClientError::InvalidInput(format!("Missing path parameter: {}", name)))?;

        path.push_str(&rest[..open]);
        path.push_str(&urlencoding::encode(&param_string(value)));
        rest = &rest[close + 1..];
    }
    path.push_str(rest);

    Ok(path)
}

fn param_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_endpoint_is_get() {
        let route = Route::parse("/products", None).unwrap();
        assert_eq!(route.method, Method::GET);
        assert_eq!(route.path, "/products");
    }

    #[test]
    fn test_method_and_parameter() {
        let route = Route::parse("PUT /products/{id}", Some(&json!({ "id": "abc" }))).unwrap();
        assert_eq!(route.method, Method::PUT);
        assert_eq!(route.path, "/products/abc");

        let route = Route::parse("DELETE /products/{id}", Some(&json!({ "id": 7 }))).unwrap();
        assert_eq!(route.method, Method::DELETE);
        assert_eq!(route.path, "/products/7");
    }

    #[test]
    fn test_parameter_cannot_escape_its_segment() {
        let route = Route::parse("PUT /products/{id}", Some(&json!({ "id": "a/b?c#d" }))).unwrap();
        assert_eq!(route.path, "/products/a%2Fb%3Fc%23d");

        let route = Route::parse("DELETE /products/{id}", Some(&json!({ "id": "shoe b" }))).unwrap();
        assert_eq!(route.path, "/products/shoe%20b");
    }

    #[test]
    fn test_missing_parameter_is_rejected() {
        let result = Route::parse("DELETE /products/{id}", None);
        assert!(matches!(result, Err(ClientError::InvalidInput(_))));

        let result = Route::parse("DELETE /products/{id", Some(&json!({ "id": 1 })));
        assert!(matches!(result, Err(ClientError::InvalidInput(_))));
    }

    #[test]
    fn test_query_pairs() {
        let pairs = query_pairs(Some(&json!({ "search": "shoe", "page": 2, "skip": null })));
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("search".to_string(), "shoe".to_string()),
            ]
        );
        assert!(query_pairs(None).is_empty());
        assert!(query_pairs(Some(&json!("shoe"))).is_empty());
    }
}
