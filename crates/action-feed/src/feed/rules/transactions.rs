use super::{
    classify, EventClass, RuleInput, TransactionRule, DUE_END_OF_DAY, DUE_TODAY, DUE_TWO_HOURS,
};
use crate::feed::domain::{PositionId, PriorityAction};

pub(crate) const PAYMENT_RULES: &[TransactionRule] = &[
    TransactionRule {
        key: "payment_branch_manager",
        positions: &[PositionId::BRANCH_MANAGER],
        build: payment_for_branch_manager,
    },
    TransactionRule {
        key: "payment_management_accountant",
        positions: &[PositionId::MANAGEMENT_ACCOUNTANT],
        build: payment_for_accountant,
    },
    TransactionRule {
        key: "payment_operations_administrators",
        positions: &[
            PositionId::GENERAL_OPERATIONS_ADMINISTRATOR,
            PositionId::PROVINCIAL_OPERATIONS_ADMINISTRATOR,
        ],
        build: payment_for_administrators,
    },
    TransactionRule {
        key: "payment_super_admin",
        positions: &[PositionId::SUPER_ADMIN],
        build: payment_for_super_admin,
    },
];

pub(crate) const RELOAN_RULES: &[TransactionRule] = &[
    TransactionRule {
        key: "reloan_branch_manager",
        positions: &[PositionId::BRANCH_MANAGER],
        build: reloan_for_branch_manager,
    },
    TransactionRule {
        key: "reloan_loan_consultant",
        positions: &[PositionId::LOAN_CONSULTANT],
        build: reloan_for_consultant,
    },
];

fn payment_label(input: &RuleInput<'_>) -> &'static str {
    match classify(input.loan) {
        EventClass::Payment(kind) => kind.label(),
        _ => "payment",
    }
}

fn payment_for_branch_manager(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
) -> PriorityAction {
    input.action(
        format!(
            "Payment from {}: {} ({})",
            input.loan.borrower_name,
            input.amount(),
            payment_label(input)
        ),
        DUE_TODAY,
        false,
        targets,
    )
}

fn payment_for_accountant(input: &RuleInput<'_>, targets: &'static [PositionId]) -> PriorityAction {
    input.action(
        format!(
            "Payment Received: {} from {} ({}), post to ledger",
            input.amount(),
            input.loan.borrower_name,
            payment_label(input)
        ),
        DUE_END_OF_DAY,
        false,
        targets,
    )
}

fn payment_for_administrators(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
) -> PriorityAction {
    input.action(
        format!(
            "Record {} of {} for {} ({})",
            payment_label(input),
            input.amount(),
            input.loan.borrower_name,
            input.reference()
        ),
        DUE_END_OF_DAY,
        false,
        targets,
    )
}

fn payment_for_super_admin(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
) -> PriorityAction {
    input.action(
        format!(
            "Payment activity: {} paid {} ({}) at {}",
            input.loan.borrower_name,
            input.amount(),
            payment_label(input),
            input.loan.office_name
        ),
        DUE_TODAY,
        false,
        targets,
    )
}

fn reloan_for_branch_manager(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
) -> PriorityAction {
    input.action(
        format!(
            "Reloan request from {}: {}",
            input.loan.borrower_name,
            input.amount()
        ),
        DUE_TWO_HOURS,
        input.at_least(input.thresholds.moderate),
        targets,
    )
}

fn reloan_for_consultant(input: &RuleInput<'_>, targets: &'static [PositionId]) -> PriorityAction {
    input.action(
        format!(
            "Process reloan paperwork for {} ({})",
            input.loan.borrower_name,
            input.reference()
        ),
        DUE_TODAY,
        false,
        targets,
    )
}
