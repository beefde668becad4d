use chrono::{DateTime, Utc};

use super::{format_amount, ActionEngine};
use crate::feed::domain::{PriorityAction, RawLoanEvent};

const SUMMARY_URGENT_DAYS: i64 = 7;

/// Totals for one staleness sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaleBatchTotals {
    pub loans: usize,
    pub total_amount: f64,
    /// Zero for an empty batch.
    pub max_days_pending: i64,
}

impl ActionEngine {
    pub fn stale_totals(
        &self,
        stale_loans: &[RawLoanEvent],
        now: DateTime<Utc>,
    ) -> StaleBatchTotals {
        let parsed: Vec<_> = stale_loans
            .iter()
            .map(|raw| self.normalize(raw, now))
            .collect();

        StaleBatchTotals {
            loans: parsed.len(),
            total_amount: parsed.iter().map(|loan| loan.amount).sum(),
            max_days_pending: parsed
                .iter()
                .filter_map(|loan| loan.days_pending)
                .max()
                .unwrap_or(0),
        }
    }

    /// Collapse a sweep's overdue loans into a single summary action.
    pub fn stale_loan_summary(
        &self,
        stale_loans: &[RawLoanEvent],
        time_str: &str,
        now: DateTime<Utc>,
    ) -> PriorityAction {
        let totals = self.stale_totals(stale_loans, now);
        let noun = if totals.loans == 1 { "loan" } else { "loans" };

        PriorityAction {
            id: None,
            action: format!(
                "Stale Loan Summary: {} {} awaiting action, {} outstanding, oldest pending {} days",
                totals.loans,
                noun,
                format_amount(totals.total_amount),
                totals.max_days_pending
            ),
            due: time_str.to_string(),
            urgent: totals.max_days_pending >= SUMMARY_URGENT_DAYS,
            status: Some("pending".to_string()),
            position_id: None,
            user_id: None,
            office_id: None,
            position_specific: Some(false),
            target_position_ids: None,
            created_date: Some(now),
            updated_at: None,
        }
    }
}
