//! Per-entry status state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a cache entry.
///
/// ```text
/// uninitialized -> loading -> success | error
/// success -> loading | stale
/// stale   -> loading
/// error   -> loading
/// loading -> stale        (background revalidation failed, last value kept)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Uninitialized,
    Loading,
    Success,
    Error,
    Stale,
}

impl Status {
    /// Returns true if the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: Status) -> bool {
        use Status::*;
        matches!(
            (self, next),
            (Uninitialized, Loading)
                | (Loading, Success)
                | (Loading, Error)
                | (Loading, Stale)
                | (Success, Loading)
                | (Success, Stale)
                | (Stale, Loading)
                | (Error, Loading)
        )
    }

    /// Returns true if an entry in this status holds a servable value.
    pub fn has_value(self) -> bool {
        matches!(self, Status::Success | Status::Stale)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Uninitialized => "uninitialized",
            Status::Loading => "loading",
            Status::Success => "success",
            Status::Error => "error",
            Status::Stale => "stale",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
