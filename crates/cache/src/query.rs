//! Query and mutation definitions handed to the cache.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use stockroom_core::cache::{key_for, CacheKey, TagSet};

/// Computes the tags a fetched value provides.
pub type TagProvider = Arc<dyn Fn(&Value) -> TagSet + Send + Sync>;

/// How a query declares the tags of its result.
#[derive(Clone)]
pub enum ProvidesTags {
    /// The same tags for every result.
    Fixed(TagSet),
    /// Tags derived from the result itself.
    FromResult(TagProvider),
}

impl ProvidesTags {
    pub fn resolve(&self, value: &Value) -> TagSet {
        match self {
            ProvidesTags::Fixed(tags) => tags.clone(),
            ProvidesTags::FromResult(provider) => provider(value),
        }
    }
}

impl fmt::Debug for ProvidesTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvidesTags::Fixed(tags) => f.debug_tuple("Fixed").field(tags).finish(),
            ProvidesTags::FromResult(_) => f.write_str("FromResult(..)"),
        }
    }
}

/// A read against the transport: endpoint, arguments and declared tags.
#[derive(Debug, Clone)]
pub struct QueryDef {
    key: CacheKey,
    endpoint: String,
    args: Option<Value>,
    provides: ProvidesTags,
}

impl QueryDef {
    /// Creates a query that provides no tags.
    pub fn new(endpoint: impl Into<String>, args: Option<Value>) -> Self {
        let endpoint = endpoint.into();
        Self {
            key: key_for(&endpoint, args.as_ref()),
            endpoint,
            args,
            provides: ProvidesTags::Fixed(TagSet::new()),
        }
    }

    /// Declares a fixed tag set for every result.
    pub fn provides(mut self, tags: TagSet) -> Self {
        self.provides = ProvidesTags::Fixed(tags);
        self
    }

    /// Declares tags computed from each result.
    pub fn provides_with<F>(mut self, provider: F) -> Self
    where
        F: Fn(&Value) -> TagSet + Send + Sync + 'static,
    {
        self.provides = ProvidesTags::FromResult(Arc::new(provider));
        self
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn args(&self) -> Option<&Value> {
        self.args.as_ref()
    }

    pub fn tags_for(&self, value: &Value) -> TagSet {
        self.provides.resolve(value)
    }
}

/// A write against the transport and the tags it invalidates on success.
#[derive(Debug, Clone)]
pub struct Mutation {
    endpoint: String,
    args: Option<Value>,
    body: Option<Value>,
    invalidates: TagSet,
}

impl Mutation {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            args: None,
            body: None,
            invalidates: TagSet::new(),
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn invalidates(mut self, tags: TagSet) -> Self {
        self.invalidates = tags;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn args(&self) -> Option<&Value> {
        self.args.as_ref()
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn invalidated_tags(&self) -> &TagSet {
        &self.invalidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockroom_core::cache::{tag_set, Tag};

    #[test]
    fn test_key_follows_endpoint_and_args() {
        let a = QueryDef::new("/products", Some(json!({ "search": "shoe" })));
        let b = QueryDef::new("/products", Some(json!({ "search": "shoe" })))
            .provides(tag_set(["Products"]));
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), &key_for("/products", Some(&json!({ "search": "shoe" }))));
    }

    #[test]
    fn test_fixed_tags() {
        let query = QueryDef::new("/users", None).provides(tag_set(["Users"]));
        assert_eq!(query.tags_for(&json!([])), tag_set(["Users"]));
    }

    #[test]
    fn test_tags_from_result() {
        let query = QueryDef::new("/products", None).provides_with(|value| {
            value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str())
                        .map(|id| Tag::with_id("Products", id))
                        .collect()
                })
                .unwrap_or_default()
        });

        assert_eq!(
            query.tags_for(&json!(["1", "2"])),
            tag_set(["Products:1", "Products:2"])
        );
    }

    #[test]
    fn test_default_provides_nothing() {
        let query = QueryDef::new("/dashboard", None);
        assert!(query.tags_for(&json!({})).is_empty());
    }

    #[test]
    fn test_mutation_builder() {
        let mutation = Mutation::new("POST /products")
            .with_body(json!({ "name": "Shoe B" }))
            .invalidates(tag_set(["Products:LIST"]));

        assert_eq!(mutation.endpoint(), "POST /products");
        assert!(mutation.args().is_none());
        assert_eq!(mutation.body(), Some(&json!({ "name": "Shoe B" })));
        assert_eq!(mutation.invalidated_tags(), &tag_set(["Products:LIST"]));
    }
}
