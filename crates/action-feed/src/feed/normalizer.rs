use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::domain::{ParsedLoanData, RawLoanEvent};
use crate::api::{FlexibleNumber, OfficeDirectory};

const UNKNOWN_CLIENT: &str = "Unknown Client";
const DEFAULT_STATUS: &str = "pending";
const DEFAULT_LOAN_TYPE: &str = "New Loan";
const DEFAULT_CREATOR: &str = "System";
const HEAD_OFFICE: &str = "Main Office";
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Collapse any known event shape into a [`ParsedLoanData`].
///
/// Each field follows a fixed fallback chain, so earlier sources always win over later
/// ones. Missing or unparsable input degrades to defaults instead of failing.
pub fn parse_loan_data(
    raw: &RawLoanEvent,
    offices: &dyn OfficeDirectory,
    now: DateTime<Utc>,
) -> ParsedLoanData {
    let loan = raw.loan.as_ref();
    let transaction = raw.transaction.as_ref();

    let amount = number(&raw.amount)
        .or_else(|| loan.and_then(|loan| number(&loan.principal)))
        .or_else(|| transaction.and_then(|tx| number(&tx.credit)))
        .unwrap_or(0.0);

    let borrower_name = text(&raw.client)
        .or_else(|| text(&raw.borrower_name))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    let loan_number = text(&raw.loan_number)
        .or_else(|| {
            loan.and_then(|loan| loan.id.as_ref())
                .and_then(|id| id.non_empty())
                .map(|id| format!("LOAN-{id}"))
        })
        .or_else(|| {
            raw.id
                .as_ref()
                .and_then(|id| id.non_empty())
                .map(|id| format!("LOAN-{id}"))
        })
        .unwrap_or_default();

    let status = text(&raw.status)
        .or_else(|| loan.and_then(|loan| text(&loan.status)))
        .unwrap_or_else(|| DEFAULT_STATUS.to_string())
        .to_lowercase();

    let loan_type = text(&raw.event_type)
        .or_else(|| {
            loan.and_then(|loan| loan.loan_product.as_ref())
                .and_then(|product| text(&product.name))
        })
        .or_else(|| transaction.and_then(|tx| text(&tx.transaction_type)))
        .unwrap_or_else(|| DEFAULT_LOAN_TYPE.to_string());

    let created_by = raw
        .created_by
        .as_ref()
        .and_then(|id| id.non_empty())
        .unwrap_or_else(|| DEFAULT_CREATOR.to_string());

    let office_id = raw
        .office_id
        .as_ref()
        .and_then(FlexibleNumber::as_u32)
        .or_else(|| {
            loan.and_then(|loan| loan.office_id.as_ref())
                .and_then(FlexibleNumber::as_u32)
        })
        .unwrap_or(0);

    let days_pending = created_at(raw).map(|created| {
        now.signed_duration_since(created)
            .num_milliseconds()
            .div_euclid(MILLIS_PER_DAY)
    });

    ParsedLoanData {
        amount,
        borrower_name,
        loan_number,
        status,
        created_by,
        office_id,
        office_name: office_name(office_id, offices),
        loan_type,
        days_pending,
    }
}

/// Creation timestamp, preferring the root field over the nested loan.
pub fn created_at(raw: &RawLoanEvent) -> Option<DateTime<Utc>> {
    text(&raw.created_at)
        .and_then(|value| parse_timestamp(&value))
        .or_else(|| {
            raw.loan
                .as_ref()
                .and_then(|loan| text(&loan.created_at))
                .and_then(|value| parse_timestamp(&value))
        })
}

pub(crate) fn office_name(office_id: u32, offices: &dyn OfficeDirectory) -> String {
    if office_id == 0 {
        return HEAD_OFFICE.to_string();
    }

    offices
        .office_name(office_id)
        .unwrap_or_else(|| format!("Office #{office_id}"))
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn number(value: &Option<FlexibleNumber>) -> Option<f64> {
    value.as_ref().and_then(FlexibleNumber::value)
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
