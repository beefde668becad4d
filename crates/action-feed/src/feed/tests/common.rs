use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::Value;

use crate::api::{
    ApiError, FlexibleId, FlexibleNumber, LoanEventSource, LoanQuery, OfficeCache, OfficeRecord,
};
use crate::clock::ManualClock;
use crate::context::UserContext;
use crate::feed::{
    ActionEngine, ActionThresholds, FeedSettings, PositionId, PriorityActionService, RawLoanEvent,
};

/// Tuesday morning in Lusaka.
pub(super) fn business_morning() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .expect("valid offset")
        .with_ymd_and_hms(2025, 3, 4, 9, 30, 0)
        .single()
        .expect("valid time")
}

pub(super) fn now_utc() -> DateTime<Utc> {
    business_morning().with_timezone(&Utc)
}

pub(super) fn offices() -> Arc<OfficeCache> {
    Arc::new(OfficeCache::from_records([
        OfficeRecord {
            id: 3,
            name: "Kabwe Branch".to_string(),
        },
        OfficeRecord {
            id: 4,
            name: "Ndola Branch".to_string(),
        },
    ]))
}

pub(super) fn engine() -> ActionEngine {
    ActionEngine::new(ActionThresholds::default(), offices())
}

pub(super) fn user(position_id: PositionId) -> UserContext {
    UserContext {
        user_id: Some(41),
        office_id: Some(3),
        first_name: "Chanda".to_string(),
        last_name: "Phiri".to_string(),
        ..UserContext::for_position(position_id)
    }
}

pub(super) fn loan_event(client: &str, amount: &str, loan_type: &str) -> RawLoanEvent {
    RawLoanEvent {
        client: Some(client.to_string()),
        amount: Some(FlexibleNumber::Text(amount.to_string())),
        created_by: Some(FlexibleId::Text("Agent1".to_string())),
        office_id: Some(FlexibleNumber::Number(3.0)),
        event_type: Some(loan_type.to_string()),
        ..RawLoanEvent::default()
    }
}

pub(super) fn numbered_loan(number: u32) -> RawLoanEvent {
    RawLoanEvent {
        loan_number: Some(format!("LN-{number:03}")),
        ..loan_event(&format!("Borrower {number}"), "5000", "new_loan")
    }
}

pub(super) fn stale_loan(client: &str, amount: &str, days_ago: i64) -> RawLoanEvent {
    let created = now_utc() - chrono::Duration::days(days_ago);
    RawLoanEvent {
        created_at: Some(created.to_rfc3339()),
        ..loan_event(client, amount, "new_loan")
    }
}

/// In-memory backend that answers "today" and stale-window queries separately.
#[derive(Default)]
pub(super) struct ScriptedLoanSource {
    pub(super) today: Vec<RawLoanEvent>,
    pub(super) stale: Vec<RawLoanEvent>,
    pub(super) fail: bool,
    pub(super) delay: Option<Duration>,
    pub(super) calls: AtomicUsize,
    pub(super) queries: Mutex<Vec<LoanQuery>>,
}

impl ScriptedLoanSource {
    pub(super) fn with_today(today: Vec<RawLoanEvent>) -> Self {
        Self {
            today,
            ..Self::default()
        }
    }

    pub(super) fn with_stale(stale: Vec<RawLoanEvent>) -> Self {
        Self {
            stale,
            ..Self::default()
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn queries(&self) -> Vec<LoanQuery> {
        self.queries.lock().expect("query log poisoned").clone()
    }
}

#[async_trait]
impl LoanEventSource for ScriptedLoanSource {
    async fn pending_loans(&self, query: &LoanQuery) -> Result<Vec<RawLoanEvent>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries
            .lock()
            .expect("query log poisoned")
            .push(query.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ApiError::Transport("connection refused".to_string()));
        }

        if query.start_date == query.end_date {
            Ok(self.today.clone())
        } else {
            Ok(self.stale.clone())
        }
    }
}

pub(super) fn build_service(
    source: ScriptedLoanSource,
) -> (
    PriorityActionService<ScriptedLoanSource>,
    Arc<ScriptedLoanSource>,
    Arc<ManualClock>,
) {
    let source = Arc::new(source);
    let clock = Arc::new(ManualClock::new(business_morning()));
    let service =
        PriorityActionService::new(source.clone(), offices()).with_clock(clock.clone());
    (service, source, clock)
}

pub(super) fn quick_timeout_settings() -> FeedSettings {
    FeedSettings {
        fetch_timeout: Duration::from_millis(50),
        ..FeedSettings::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
