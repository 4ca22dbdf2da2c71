use std::{env, time::Duration};

use crate::policy::QueryPolicy;

/// Cache configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Garbage collector sweep interval in seconds (default: 10)
    pub gc_interval_seconds: u64,
    /// Default retention window in seconds (default: 60)
    pub retention_seconds: u64,
    /// Default stale time in seconds (default: 0)
    pub stale_time_seconds: u64,
    /// Default for serving stale values on background errors (default: true)
    pub serve_stale_on_error: bool,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_GC_INTERVAL_SECONDS` - Sweep interval (default: 10)
    /// - `CACHE_RETENTION_SECONDS` - Retention window (default: 60)
    /// - `CACHE_STALE_TIME_SECONDS` - Stale time (default: 0)
    /// - `CACHE_SERVE_STALE_ON_ERROR` - Serve stale on error (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::defaults();
        Self {
            gc_interval_seconds: lookup("CACHE_GC_INTERVAL_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.gc_interval_seconds),
            retention_seconds: lookup("CACHE_RETENTION_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retention_seconds),
            stale_time_seconds: lookup("CACHE_STALE_TIME_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.stale_time_seconds),
            serve_stale_on_error: lookup("CACHE_SERVE_STALE_ON_ERROR")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.serve_stale_on_error),
        }
    }

    /// Built-in defaults, ignoring the environment.
    pub fn defaults() -> Self {
        Self {
            gc_interval_seconds: 10,
            retention_seconds: 60,
            stale_time_seconds: 0,
            serve_stale_on_error: true,
        }
    }

    /// Get the sweep interval as a Duration. Never zero.
    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc_interval_seconds.max(1))
    }

    /// The policy applied to queries that don't override it.
    pub fn default_policy(&self) -> QueryPolicy {
        QueryPolicy {
            stale_time: Duration::from_secs(self.stale_time_seconds),
            retention: Duration::from_secs(self.retention_seconds),
            serve_stale_on_error: self.serve_stale_on_error,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
