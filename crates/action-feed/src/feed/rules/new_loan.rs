use super::{
    PositionRule, RuleInput, DUE_END_OF_DAY, DUE_FOUR_HOURS, DUE_IMMEDIATELY, DUE_THIS_WEEK,
    DUE_TODAY, DUE_TWO_HOURS,
};
use crate::feed::domain::{PositionId, PriorityAction};

const BRANCH_STALE_URGENT_DAYS: i64 = 7;
const RISK_STALE_URGENT_DAYS: i64 = 5;
const DISTRICT_STALE_MIN_DAYS: i64 = 5;
const DISTRICT_STALE_URGENT_DAYS: i64 = 10;
const PROVINCIAL_STALE_MIN_DAYS: i64 = 7;
const PROVINCIAL_STALE_URGENT_DAYS: i64 = 14;
const EXECUTIVE_STALE_MIN_DAYS: i64 = 14;
const EXECUTIVE_STALE_URGENT_DAYS: i64 = 21;
const ACCOUNTANT_STALE_URGENT_DAYS: i64 = 10;
const PAYROLL_STALE_URGENT_DAYS: i64 = 7;
const RECOVERY_WATCH_DAYS: i64 = 10;
const RECOVERY_URGENT_DAYS: i64 = 14;
const CONSULTANT_STALE_URGENT_DAYS: i64 = 5;
const ADMIN_STALE_URGENT_DAYS: i64 = 7;
const SUPER_STALE_URGENT_DAYS: i64 = 14;

/// Evaluated top to bottom; the order is part of the output contract.
pub(crate) const NEW_LOAN_RULES: &[PositionRule] = &[
    PositionRule {
        key: "branch_manager",
        positions: &[PositionId::BRANCH_MANAGER],
        fresh: branch_manager_fresh,
        stale: branch_manager_stale,
    },
    PositionRule {
        key: "risk_manager",
        positions: &[PositionId::RISK_MANAGER],
        fresh: risk_manager_fresh,
        stale: risk_manager_stale,
    },
    PositionRule {
        key: "district_manager",
        positions: &[PositionId::DISTRICT_MANAGER],
        fresh: district_manager_fresh,
        stale: district_manager_stale,
    },
    PositionRule {
        key: "provincial_manager",
        positions: &[PositionId::PROVINCIAL_MANAGER],
        fresh: provincial_manager_fresh,
        stale: provincial_manager_stale,
    },
    PositionRule {
        key: "general_operations_manager",
        positions: &[PositionId::GENERAL_OPERATIONS_MANAGER],
        fresh: executive_fresh,
        stale: executive_stale,
    },
    PositionRule {
        key: "management_accountant",
        positions: &[PositionId::MANAGEMENT_ACCOUNTANT],
        fresh: accountant_fresh,
        stale: accountant_stale,
    },
    PositionRule {
        key: "payroll_loans_manager",
        positions: &[PositionId::PAYROLL_LOANS_MANAGER],
        fresh: payroll_fresh,
        stale: payroll_stale,
    },
    PositionRule {
        key: "recoveries_coordinator",
        positions: &[PositionId::RECOVERIES_COORDINATOR],
        fresh: recoveries_fresh,
        stale: recoveries_stale,
    },
    PositionRule {
        key: "loan_consultant",
        positions: &[PositionId::LOAN_CONSULTANT],
        fresh: consultant_fresh,
        stale: consultant_stale,
    },
    PositionRule {
        key: "operations_administrators",
        positions: &[
            PositionId::GENERAL_OPERATIONS_ADMINISTRATOR,
            PositionId::PROVINCIAL_OPERATIONS_ADMINISTRATOR,
        ],
        fresh: administrators_fresh,
        stale: administrators_stale,
    },
    PositionRule {
        key: "super_admin",
        positions: &[PositionId::SUPER_ADMIN],
        fresh: super_admin_fresh,
        stale: super_admin_stale,
    },
];

fn branch_manager_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let loan = input.loan;
    let above_moderate = input.at_least(input.thresholds.moderate);

    actions.push(input.action(
        format!(
            "New loan application from {} ({}) at {}",
            loan.borrower_name,
            input.amount(),
            loan.office_name
        ),
        DUE_TODAY,
        above_moderate,
        targets,
    ));

    if above_moderate {
        actions.push(input.action(
            format!(
                "Review & Approval Required: {} for {} exceeds the branch limit",
                input.amount(),
                input.reference()
            ),
            DUE_TWO_HOURS,
            true,
            targets,
        ));
    }
}

fn branch_manager_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    actions.push(input.action(
        format!(
            "Pending {} days: {} {} ({}) awaiting branch decision",
            days,
            input.loan.borrower_name,
            input.loan.loan_type,
            input.amount()
        ),
        DUE_TODAY,
        days >= BRANCH_STALE_URGENT_DAYS || input.at_least(input.thresholds.moderate),
        targets,
    ));
}

fn risk_manager_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    if !input.at_least(input.thresholds.high) {
        return;
    }

    actions.push(input.action(
        format!(
            "Risk assessment: {} for {} is above the high-value threshold",
            input.amount(),
            input.loan.borrower_name
        ),
        DUE_FOUR_HOURS,
        input.at_least(input.thresholds.critical),
        targets,
    ));
}

fn risk_manager_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    if !input.at_least(input.thresholds.high) {
        return;
    }

    let days = input.days_pending();
    actions.push(input.action(
        format!(
            "Unresolved high-value exposure: {} ({}) pending {} days",
            input.loan.borrower_name,
            input.amount(),
            days
        ),
        DUE_TODAY,
        days >= RISK_STALE_URGENT_DAYS || input.at_least(input.thresholds.critical),
        targets,
    ));
}

fn district_manager_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    if !input.at_least(input.thresholds.moderate) {
        return;
    }

    actions.push(input.action(
        format!(
            "District oversight: {} loan for {} at {}",
            input.amount(),
            input.loan.borrower_name,
            input.loan.office_name
        ),
        DUE_END_OF_DAY,
        input.at_least(input.thresholds.high),
        targets,
    ));
}

fn district_manager_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    if days < DISTRICT_STALE_MIN_DAYS {
        return;
    }

    actions.push(input.action(
        format!(
            "Escalated from {}: {} pending {} days ({})",
            input.loan.office_name,
            input.loan.borrower_name,
            days,
            input.amount()
        ),
        DUE_TODAY,
        days >= DISTRICT_STALE_URGENT_DAYS || input.at_least(input.thresholds.high),
        targets,
    ));
}

fn provincial_manager_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    if !input.at_least(input.thresholds.high) {
        return;
    }

    actions.push(input.action(
        format!(
            "Provincial review: {} loan for {} ({})",
            input.amount(),
            input.loan.borrower_name,
            input.loan.office_name
        ),
        DUE_END_OF_DAY,
        input.at_least(input.thresholds.critical),
        targets,
    ));
}

fn provincial_manager_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    if days < PROVINCIAL_STALE_MIN_DAYS {
        return;
    }

    actions.push(input.action(
        format!(
            "Provincial backlog: {} at {} pending {} days",
            input.loan.borrower_name, input.loan.office_name, days
        ),
        DUE_THIS_WEEK,
        days >= PROVINCIAL_STALE_URGENT_DAYS,
        targets,
    ));
}

fn executive_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    if input.at_least(input.thresholds.escalation) {
        actions.push(input.action(
            format!(
                "Executive approval required: {} for {} ({})",
                input.amount(),
                input.loan.borrower_name,
                input.loan.office_name
            ),
            DUE_IMMEDIATELY,
            true,
            targets,
        ));
        return;
    }

    actions.push(input.action(
        format!(
            "Portfolio update: loan #{} today, {} {} at {}",
            input.context.loan_count,
            input.amount(),
            input.loan.loan_type,
            input.loan.office_name
        ),
        DUE_END_OF_DAY,
        false,
        targets,
    ));
}

fn executive_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    if days < EXECUTIVE_STALE_MIN_DAYS && !input.at_least(input.thresholds.critical) {
        return;
    }

    actions.push(input.action(
        format!(
            "Executive attention: {} ({}) stalled {} days at {}",
            input.loan.borrower_name,
            input.amount(),
            days,
            input.loan.office_name
        ),
        DUE_TODAY,
        days >= EXECUTIVE_STALE_URGENT_DAYS || input.at_least(input.thresholds.escalation),
        targets,
    ));
}

fn accountant_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    actions.push(input.action(
        format!(
            "Verify disbursement readiness: {} {} ({})",
            input.loan.borrower_name,
            input.amount(),
            input.loan.loan_type
        ),
        DUE_END_OF_DAY,
        input.at_least(input.thresholds.critical),
        targets,
    ));
}

fn accountant_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    actions.push(input.action(
        format!(
            "Reconcile pending book entry: {} {}, outstanding {} days",
            input.loan.borrower_name,
            input.amount(),
            days
        ),
        DUE_END_OF_DAY,
        days >= ACCOUNTANT_STALE_URGENT_DAYS,
        targets,
    ));
}

fn payroll_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    if !input.at_least(input.thresholds.standard) {
        return;
    }

    actions.push(input.action(
        format!(
            "Confirm payroll deduction setup for {} ({})",
            input.loan.borrower_name,
            input.amount()
        ),
        DUE_TODAY,
        input.at_least(input.thresholds.high),
        targets,
    ));
}

fn payroll_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    actions.push(input.action(
        format!(
            "Payroll deduction still pending after {} days: {}",
            days, input.loan.borrower_name
        ),
        DUE_TODAY,
        days >= PAYROLL_STALE_URGENT_DAYS,
        targets,
    ));
}

fn recoveries_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    if !input.at_least(input.thresholds.critical) {
        return;
    }

    actions.push(input.action(
        format!(
            "Open recovery profile for large exposure: {} ({})",
            input.loan.borrower_name,
            input.amount()
        ),
        DUE_THIS_WEEK,
        false,
        targets,
    ));
}

fn recoveries_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    if days < RECOVERY_WATCH_DAYS {
        return;
    }

    actions.push(input.action(
        format!(
            "Recovery Watch: {} ({}) pending {} days at {}",
            input.loan.borrower_name,
            input.amount(),
            days,
            input.loan.office_name
        ),
        DUE_TODAY,
        days >= RECOVERY_URGENT_DAYS,
        targets,
    ));
}

fn consultant_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    actions.push(input.action(
        format!(
            "Complete client documentation for {} ({})",
            input.loan.borrower_name,
            input.reference()
        ),
        DUE_TODAY,
        false,
        targets,
    ));
}

fn consultant_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    actions.push(input.action(
        format!(
            "Follow up with {}: application pending {} days",
            input.loan.borrower_name, days
        ),
        DUE_TODAY,
        days >= CONSULTANT_STALE_URGENT_DAYS,
        targets,
    ));
}

fn administrators_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    actions.push(input.action(
        format!(
            "Log new application {} for {} at {}",
            input.reference(),
            input.loan.borrower_name,
            input.loan.office_name
        ),
        DUE_END_OF_DAY,
        false,
        targets,
    ));
}

fn administrators_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    actions.push(input.action(
        format!(
            "Update pending register: {} ({}) waiting {} days",
            input.reference(),
            input.loan.borrower_name,
            days
        ),
        DUE_END_OF_DAY,
        days >= ADMIN_STALE_URGENT_DAYS,
        targets,
    ));
}

fn super_admin_fresh(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    actions.push(input.action(
        format!(
            "System feed: {} {} for {} at {} by {}",
            input.loan.loan_type,
            input.amount(),
            input.loan.borrower_name,
            input.loan.office_name,
            input.loan.created_by
        ),
        DUE_TODAY,
        input.at_least(input.thresholds.escalation),
        targets,
    ));
}

fn super_admin_stale(
    input: &RuleInput<'_>,
    targets: &'static [PositionId],
    actions: &mut Vec<PriorityAction>,
) {
    let days = input.days_pending();
    actions.push(input.action(
        format!(
            "System stale alert: {} ({}) pending {} days at {}",
            input.loan.borrower_name,
            input.amount(),
            days,
            input.loan.office_name
        ),
        DUE_TODAY,
        days >= SUPER_STALE_URGENT_DAYS,
        targets,
    ));
}

/// Motivational item for the first loan of the day; visible to every position.
pub(super) fn first_loan_of_the_day(input: &RuleInput<'_>) -> PriorityAction {
    PriorityAction {
        id: None,
        action: format!(
            "First loan of the day! {} ({}) is in. Keep the momentum going",
            input.loan.borrower_name,
            input.amount()
        ),
        due: DUE_TODAY.to_string(),
        urgent: false,
        status: Some("pending".to_string()),
        position_id: None,
        user_id: None,
        office_id: None,
        position_specific: Some(false),
        target_position_ids: None,
        created_date: Some(input.now),
        updated_at: None,
    }
}
