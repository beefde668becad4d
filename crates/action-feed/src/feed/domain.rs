use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::{FlexibleId, FlexibleNumber};

/// Numeric organizational role identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PositionId(pub u32);

impl PositionId {
    /// Designated super-position; sees every rule block.
    pub const SUPER_ADMIN: Self = Self(1);
    pub const GENERAL_OPERATIONS_MANAGER: Self = Self(2);
    pub const PROVINCIAL_MANAGER: Self = Self(3);
    pub const DISTRICT_MANAGER: Self = Self(4);
    pub const BRANCH_MANAGER: Self = Self(5);
    pub const RISK_MANAGER: Self = Self(6);
    pub const PAYROLL_LOANS_MANAGER: Self = Self(7);
    pub const MANAGEMENT_ACCOUNTANT: Self = Self(8);
    pub const LOAN_CONSULTANT: Self = Self(9);
    pub const GENERAL_OPERATIONS_ADMINISTRATOR: Self = Self(10);
    pub const PROVINCIAL_OPERATIONS_ADMINISTRATOR: Self = Self(11);
    pub const RECOVERIES_COORDINATOR: Self = Self(14);

    pub const fn label(self) -> &'static str {
        match self.0 {
            1 => "Super Admin",
            2 => "General Operations Manager",
            3 => "Provincial Manager",
            4 => "District Manager",
            5 => "Branch Manager",
            6 => "Risk Manager",
            7 => "Payroll Loans Manager",
            8 => "Management Accountant",
            9 => "Loan Consultant",
            10 => "General Operations Administrator",
            11 => "Provincial Operations Administrator",
            14 => "Recoveries Coordinator",
            _ => "Unassigned",
        }
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.0)
    }
}

/// Loan or transaction event as delivered by polling or the push channel.
///
/// Both the flat loan-record shape and the nested push shape (with `loan` and
/// `transaction` sub-objects) deserialize into this struct; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLoanEvent {
    pub id: Option<FlexibleId>,
    pub amount: Option<FlexibleNumber>,
    pub client: Option<String>,
    pub borrower_name: Option<String>,
    pub loan_number: Option<String>,
    pub status: Option<String>,
    pub created_by: Option<FlexibleId>,
    pub office_id: Option<FlexibleNumber>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub created_at: Option<String>,
    pub loan: Option<RawLoan>,
    pub transaction: Option<RawTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLoan {
    pub id: Option<FlexibleId>,
    pub principal: Option<FlexibleNumber>,
    pub status: Option<String>,
    pub office_id: Option<FlexibleNumber>,
    pub created_at: Option<String>,
    pub loan_product: Option<RawLoanProduct>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLoanProduct {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTransaction {
    pub id: Option<FlexibleId>,
    pub transaction_type: Option<String>,
    pub credit: Option<FlexibleNumber>,
}

/// Canonical loan record produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLoanData {
    pub amount: f64,
    pub borrower_name: String,
    pub loan_number: String,
    pub status: String,
    pub created_by: String,
    pub office_id: u32,
    pub office_name: String,
    pub loan_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_pending: Option<i64>,
}

/// Calling context for one rule-engine pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanActionContext {
    pub current_position_id: PositionId,
    pub loan_count: u64,
    pub is_stale_loan: bool,
    pub days_pending: Option<i64>,
}

impl LoanActionContext {
    pub fn fresh(current_position_id: PositionId, loan_count: u64) -> Self {
        Self {
            current_position_id,
            loan_count,
            is_stale_loan: false,
            days_pending: None,
        }
    }

    pub fn stale(
        current_position_id: PositionId,
        loan_count: u64,
        days_pending: Option<i64>,
    ) -> Self {
        Self {
            current_position_id,
            loan_count,
            is_stale_loan: true,
            days_pending,
        }
    }
}

/// Feed item handed to dashboard subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub action: String,
    pub due: String,
    pub urgent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<PositionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_id: Option<u32>,
    #[serde(
        rename = "positionSpecific",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub position_specific: Option<bool>,
    #[serde(
        rename = "targetPositionIds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_position_ids: Option<Vec<PositionId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PriorityAction {
    /// Whether the action was produced for `position` (or for everyone).
    pub fn targets(&self, position: PositionId) -> bool {
        match &self.target_position_ids {
            Some(targets) => targets.contains(&position),
            None => true,
        }
    }
}
