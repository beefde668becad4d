use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inclusive amount tiers gating urgency and escalation in the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionThresholds {
    pub standard: f64,
    pub moderate: f64,
    pub high: f64,
    pub critical: f64,
    pub escalation: f64,
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self {
            standard: 10_000.0,
            moderate: 50_000.0,
            high: 100_000.0,
            critical: 250_000.0,
            escalation: 500_000.0,
        }
    }
}

/// Retention and sweep settings for the priority action store.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    /// List cap applied after an incremental event.
    pub new_loan_capacity: usize,
    /// List cap applied after a staleness sweep.
    pub stale_capacity: usize,
    pub stale_after_days: i64,
    pub stale_lookback_days: i64,
    /// Upper bound on any single backend call made by the service.
    pub fetch_timeout: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            new_loan_capacity: 10,
            stale_capacity: 15,
            stale_after_days: 3,
            stale_lookback_days: 30,
            fetch_timeout: Duration::from_secs(15),
        }
    }
}
