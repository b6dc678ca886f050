use chrono::{DateTime, Duration, Utc};

use crate::config::AuthConfig;

/// Pure lockout decisions. The store performs the actual counter increment
/// atomically; this module only decides what a given state means.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    max_attempts: i64,
    duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutDecision {
    Allow,
    Locked { until: DateTime<Utc> },
}

impl LockoutPolicy {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            max_attempts: config.max_login_attempts,
            duration: config.lockout_duration,
        }
    }

    /// A lock only matters while its deadline is still in the future; a
    /// stale `locked_until` reads as unlocked.
    pub fn check(&self, locked_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> LockoutDecision {
        match locked_until {
            Some(until) if now < until => LockoutDecision::Locked { until },
            _ => LockoutDecision::Allow,
        }
    }

    /// Called with the counter value after a failed password check. Returns
    /// the lock deadline once the threshold is reached.
    pub fn after_failure(&self, attempts: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if attempts >= self.max_attempts {
            Some(now + self.duration)
        } else {
            None
        }
    }
}
