//! Position-aware action generation.
//!
//! Each event is normalized and classified as a payment, a reloan, or a new loan. Payments
//! and reloans have their own small rule tables and never fall through to the new-loan
//! table. New-loan rules are evaluated in a fixed order, one block per position, and a
//! block only runs when the current position is allowed to see it.

mod new_loan;
mod summary;
mod transactions;

pub use summary::StaleBatchTotals;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::access::is_position_allowed;
use super::config::ActionThresholds;
use super::domain::{LoanActionContext, ParsedLoanData, PositionId, PriorityAction, RawLoanEvent};
use super::normalizer::parse_loan_data;
use crate::api::OfficeDirectory;

pub(crate) const DUE_IMMEDIATELY: &str = "Immediately";
pub(crate) const DUE_TWO_HOURS: &str = "Within 2 hours";
pub(crate) const DUE_FOUR_HOURS: &str = "Within 4 hours";
pub(crate) const DUE_TODAY: &str = "Today";
pub(crate) const DUE_END_OF_DAY: &str = "End of day";
pub(crate) const DUE_THIS_WEEK: &str = "This week";

/// Payment transaction kinds that short-circuit the new-loan rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    PartPayment,
    FullPayment,
    ReloanPayment,
    InterestWaiver,
}

impl PaymentKind {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "part_payment" => Some(Self::PartPayment),
            "full_payment" => Some(Self::FullPayment),
            "reloan_payment" => Some(Self::ReloanPayment),
            "interest_waiver" => Some(Self::InterestWaiver),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PartPayment => "part payment",
            Self::FullPayment => "full payment",
            Self::ReloanPayment => "reloan payment",
            Self::InterestWaiver => "interest waiver",
        }
    }
}

/// Rule family an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Payment(PaymentKind),
    Reloan,
    NewLoan,
}

/// Route a normalized event by its loan type.
///
/// Types are compared case-insensitively with spaces and hyphens treated as underscores,
/// so `"Part Payment"` and `"part_payment"` classify the same way.
pub fn classify(loan: &ParsedLoanData) -> EventClass {
    let key = loan
        .loan_type
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_");

    if let Some(kind) = PaymentKind::from_key(&key) {
        return EventClass::Payment(kind);
    }

    if key == "reloan" {
        EventClass::Reloan
    } else {
        EventClass::NewLoan
    }
}

/// Everything a rule needs to render its actions.
pub(crate) struct RuleInput<'a> {
    pub(crate) loan: &'a ParsedLoanData,
    pub(crate) context: &'a LoanActionContext,
    pub(crate) thresholds: &'a ActionThresholds,
    pub(crate) now: DateTime<Utc>,
}

impl RuleInput<'_> {
    pub(crate) fn days_pending(&self) -> i64 {
        self.context
            .days_pending
            .or(self.loan.days_pending)
            .unwrap_or(0)
    }

    pub(crate) fn at_least(&self, threshold: f64) -> bool {
        self.loan.amount >= threshold
    }

    pub(crate) fn amount(&self) -> String {
        format_amount(self.loan.amount)
    }

    /// Loan number when known, otherwise the borrower.
    pub(crate) fn reference(&self) -> &str {
        if self.loan.loan_number.is_empty() {
            &self.loan.borrower_name
        } else {
            &self.loan.loan_number
        }
    }

    pub(crate) fn action(
        &self,
        text: String,
        due: &str,
        urgent: bool,
        targets: &[PositionId],
    ) -> PriorityAction {
        PriorityAction {
            id: None,
            action: text,
            due: due.to_string(),
            urgent,
            status: Some("pending".to_string()),
            position_id: Some(self.context.current_position_id),
            user_id: None,
            office_id: (self.loan.office_id != 0).then_some(self.loan.office_id),
            position_specific: Some(true),
            target_position_ids: Some(targets.to_vec()),
            created_date: Some(self.now),
            updated_at: None,
        }
    }
}

pub(crate) type BlockFn = fn(&RuleInput<'_>, &'static [PositionId], &mut Vec<PriorityAction>);

/// One position block of the new-loan table.
pub(crate) struct PositionRule {
    pub(crate) key: &'static str,
    pub(crate) positions: &'static [PositionId],
    pub(crate) fresh: BlockFn,
    pub(crate) stale: BlockFn,
}

/// One position entry of the payment and reloan tables.
pub(crate) struct TransactionRule {
    pub(crate) key: &'static str,
    pub(crate) positions: &'static [PositionId],
    pub(crate) build: fn(&RuleInput<'_>, &'static [PositionId]) -> PriorityAction,
}

/// Stateless rule engine over a threshold configuration and an office lookup.
#[derive(Clone)]
pub struct ActionEngine {
    thresholds: ActionThresholds,
    offices: Arc<dyn OfficeDirectory>,
}

impl ActionEngine {
    pub fn new(thresholds: ActionThresholds, offices: Arc<dyn OfficeDirectory>) -> Self {
        Self {
            thresholds,
            offices,
        }
    }

    pub fn thresholds(&self) -> &ActionThresholds {
        &self.thresholds
    }

    pub fn offices(&self) -> Arc<dyn OfficeDirectory> {
        Arc::clone(&self.offices)
    }

    pub fn normalize(&self, raw: &RawLoanEvent, now: DateTime<Utc>) -> ParsedLoanData {
        parse_loan_data(raw, self.offices.as_ref(), now)
    }

    /// Produce the actions one event yields for the context's position.
    pub fn generate(
        &self,
        raw: &RawLoanEvent,
        context: &LoanActionContext,
        now: DateTime<Utc>,
    ) -> Vec<PriorityAction> {
        let loan = self.normalize(raw, now);
        let input = RuleInput {
            loan: &loan,
            context,
            thresholds: &self.thresholds,
            now,
        };
        let class = classify(&loan);

        let mut actions = Vec::new();
        match class {
            EventClass::Payment(_) => {
                if !context.is_stale_loan {
                    apply_transaction_rules(transactions::PAYMENT_RULES, &input, &mut actions);
                }
            }
            EventClass::Reloan => {
                if !context.is_stale_loan {
                    apply_transaction_rules(transactions::RELOAN_RULES, &input, &mut actions);
                }
            }
            EventClass::NewLoan => {
                for rule in new_loan::NEW_LOAN_RULES {
                    if !is_position_allowed(context.current_position_id, rule.positions) {
                        continue;
                    }
                    let block = if context.is_stale_loan {
                        rule.stale
                    } else {
                        rule.fresh
                    };
                    let before = actions.len();
                    block(&input, rule.positions, &mut actions);
                    if actions.len() > before {
                        debug!(rule = rule.key, added = actions.len() - before, "rule fired");
                    }
                }

                if !context.is_stale_loan && context.loan_count == 1 {
                    actions.push(new_loan::first_loan_of_the_day(&input));
                }
            }
        }

        debug!(
            position = %context.current_position_id,
            ?class,
            stale = context.is_stale_loan,
            loan = %loan.loan_number,
            generated = actions.len(),
            "generated priority actions"
        );

        actions
    }
}

fn apply_transaction_rules(
    rules: &[TransactionRule],
    input: &RuleInput<'_>,
    actions: &mut Vec<PriorityAction>,
) {
    for rule in rules {
        if is_position_allowed(input.context.current_position_id, rule.positions) {
            debug!(rule = rule.key, "transaction rule fired");
            actions.push((rule.build)(input, rule.positions));
        }
    }
}

/// Kwacha amount with thousands separators; cents only when non-zero.
pub(crate) fn format_amount(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if fraction == 0 {
        format!("{sign}K{grouped}")
    } else {
        format!("{sign}K{grouped}.{fraction:02}")
    }
}
