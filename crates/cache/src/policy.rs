use std::time::Duration;

/// Default retention for unobserved entries.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60);

/// Per-query caching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// How long a successful result is served without revalidation.
    pub stale_time: Duration,
    /// How long an entry survives after its last subscriber leaves.
    pub retention: Duration,
    /// Serve the last good value while revalidating instead of waiting for
    /// the network, and keep serving it if the revalidation fails.
    pub serve_stale_on_error: bool,
}

impl QueryPolicy {
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn serve_stale_on_error(mut self, serve: bool) -> Self {
        self.serve_stale_on_error = serve;
        self
    }
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            retention: DEFAULT_RETENTION,
            serve_stale_on_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = QueryPolicy::default();
        assert_eq!(policy.stale_time, Duration::ZERO);
        assert_eq!(policy.retention, Duration::from_secs(60));
        assert!(policy.serve_stale_on_error);
    }

    #[test]
    fn test_builder_overrides() {
        let policy = QueryPolicy::default()
            .with_stale_time(Duration::from_secs(5))
            .with_retention(Duration::ZERO)
            .serve_stale_on_error(false);

        assert_eq!(policy.stale_time, Duration::from_secs(5));
        assert_eq!(policy.retention, Duration::ZERO);
        assert!(!policy.serve_stale_on_error);
    }
}
