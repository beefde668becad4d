use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;

use super::domain::PriorityAction;
use crate::context::UserContext;

/// Team figures shown on the morning brief card.
///
/// These are placeholder numbers until the dashboard exposes team metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSnapshot {
    pub active_officers: u32,
    pub loans_in_pipeline: u32,
    pub collections_rate_percent: f64,
    pub portfolio_at_risk_percent: f64,
}

impl Default for TeamSnapshot {
    fn default() -> Self {
        Self {
            active_officers: 12,
            loans_in_pipeline: 38,
            collections_rate_percent: 94.5,
            portfolio_at_risk_percent: 3.2,
        }
    }
}

/// Read-only daily summary derived from the live action list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorningBrief {
    pub greeting: String,
    pub team_snapshot: TeamSnapshot,
    pub urgent_count: usize,
    pub priority_actions: Vec<PriorityAction>,
    pub generated_at: DateTime<FixedOffset>,
}

impl MorningBrief {
    pub fn compose(
        user: &UserContext,
        priority_actions: Vec<PriorityAction>,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let salutation = match now.hour() {
            0..=11 => "Good morning",
            12..=16 => "Good afternoon",
            _ => "Good evening",
        };
        let name = user.first_name.trim();
        let greeting = if name.is_empty() {
            salutation.to_string()
        } else {
            format!("{salutation}, {name}")
        };

        Self {
            greeting,
            team_snapshot: TeamSnapshot::default(),
            urgent_count: priority_actions.iter().filter(|action| action.urgent).count(),
            priority_actions,
            generated_at: now,
        }
    }
}
