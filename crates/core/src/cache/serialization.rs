//! Pure functions for moving domain types in and out of cached JSON values.
//!
//! The cache stores whatever JSON the transport returned; typed callers
//! decode on the way out and encode request bodies on the way in.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{CacheError, Result};

/// Encodes a domain value as JSON for a request body or arguments.
pub fn encode<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| CacheError::Deserialize(e.to_string()))
}

/// Decodes a cached JSON value into a domain type.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| CacheError::Deserialize(e.to_string()))
}
