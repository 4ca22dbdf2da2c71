//! JSON output formatting.

use serde_json::{json, Value};
use stockroom_cache::Snapshot;

/// Format a value as JSON.
pub fn format_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// A subscription snapshot as `{status, value?, errorInfo?}`.
pub fn snapshot_json(snapshot: &Snapshot) -> Value {
    let mut out = json!({ "status": snapshot.status });
    if let Some(value) = &snapshot.value {
        out["value"] = value.clone();
    }
    if let Some(error) = &snapshot.error {
        out["errorInfo"] = json!({ "status": error.status, "message": error.message });
    }
    out
}
