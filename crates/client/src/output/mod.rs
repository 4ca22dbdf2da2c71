//! Rendering of inventory data and cache snapshots for the terminal.
//!
//! `--format json` prints compact JSON, one document per line, so `watch`
//! output can be piped into line-oriented tools.

pub mod json;
pub mod pretty;

use stockroom_cache::Snapshot;

use crate::cli::OutputFormat;

/// Renders an API value. Types without a pretty renderer print as indented JSON.
pub fn format_output<T: serde::Serialize>(value: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_json(value),
        OutputFormat::Pretty => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

/// Renders one state change of a watched query.
pub fn format_snapshot(snapshot: &Snapshot, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::snapshot_json(snapshot).to_string(),
        OutputFormat::Pretty => pretty::format_snapshot(snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockroom_cache::Status;

    #[test]
    fn test_snapshot_json_is_one_line() {
        let snapshot = Snapshot {
            status: Status::Stale,
            value: Some(json!([{ "productId": "p1" }])),
            error: None,
        };

        let line = format_snapshot(&snapshot, OutputFormat::Json);

        assert!(!line.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&line).unwrap(),
            json!({ "status": "stale", "value": [{ "productId": "p1" }] })
        );
        assert_eq!(
            format_snapshot(&snapshot, OutputFormat::Pretty),
            "[stale] 1 item(s)"
        );
    }
}
