//! Priority action feed: normalization, position rules, and the retained action list.

pub(crate) mod access;
pub mod brief;
pub mod config;
pub mod domain;
pub mod import;
pub(crate) mod normalizer;
pub mod router;
pub(crate) mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use access::is_position_allowed;
pub use brief::{MorningBrief, TeamSnapshot};
pub use config::{ActionThresholds, FeedSettings};
pub use domain::{
    LoanActionContext, ParsedLoanData, PositionId, PriorityAction, RawLoan, RawLoanEvent,
    RawLoanProduct, RawTransaction,
};
pub use import::{LoanExportImporter, LoanImportError};
pub use normalizer::parse_loan_data;
pub use router::{priority_action_router, FeedRouterState};
pub use rules::{classify, ActionEngine, EventClass, PaymentKind, StaleBatchTotals};
pub use service::{PriorityActionService, ProcessOutcome};
