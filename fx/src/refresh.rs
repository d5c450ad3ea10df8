//! Time-to-live bookkeeping for table reloads.

use chrono::Duration;
use ledgerfx_common::{constants, Timestamp};

/// Decides whether the rate table is old enough to reload.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    ttl: Duration,
    last_load: Option<Timestamp>,
}

impl RefreshPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            last_load: None,
        }
    }

    /// True if nothing was ever loaded, or the last load is older than the TTL.
    pub fn should_refresh(&self, now: Timestamp) -> bool {
        match self.last_load {
            None => true,
            Some(last) => now.signed_duration_since(last) > self.ttl,
        }
    }

    /// Record a successful load at `now`.
    pub fn mark_loaded(&mut self, now: Timestamp) {
        self.last_load = Some(now);
    }

    pub fn last_loaded_at(&self) -> Option<Timestamp> {
        self.last_load
    }

    pub fn has_loaded(&self) -> bool {
        self.last_load.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::new(constants::default_refresh_ttl())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_never_loaded_needs_refresh() {
        let policy = RefreshPolicy::default();
        assert!(!policy.has_loaded());
        assert!(policy.should_refresh(Utc::now()));
    }

    #[test]
    fn test_ttl_boundary_is_exclusive() {
        let start = Utc::now();
        let mut policy = RefreshPolicy::new(Duration::hours(6));
        policy.mark_loaded(start);

        assert!(!policy.should_refresh(start));
        assert!(!policy.should_refresh(start + Duration::hours(6)));
        assert!(policy.should_refresh(start + Duration::hours(6) + Duration::seconds(1)));
        assert_eq!(policy.last_loaded_at(), Some(start));
    }
}
