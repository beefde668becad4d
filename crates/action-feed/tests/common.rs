#![allow(dead_code)]

use std::sync::Arc;

use action_feed::api::{FlexibleId, FlexibleNumber, OfficeCache, OfficeRecord};
use action_feed::clock::ManualClock;
use action_feed::context::UserContext;
use action_feed::feed::{PositionId, RawLoanEvent};
use chrono::{DateTime, FixedOffset, TimeZone};

/// Tuesday 2025-03-04, 09:30 in Lusaka.
pub fn business_morning() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .expect("valid offset")
        .with_ymd_and_hms(2025, 3, 4, 9, 30, 0)
        .single()
        .expect("valid time")
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(business_morning()))
}

pub fn offices() -> Arc<OfficeCache> {
    Arc::new(OfficeCache::from_records([OfficeRecord {
        id: 3,
        name: "Kabwe Branch".to_string(),
    }]))
}

pub fn branch_user(position_id: PositionId) -> UserContext {
    UserContext {
        user_id: Some(41),
        office_id: Some(3),
        first_name: "Chanda".to_string(),
        last_name: "Phiri".to_string(),
        ..UserContext::for_position(position_id)
    }
}

pub fn loan(client: &str, amount: &str, created_at: &str) -> RawLoanEvent {
    RawLoanEvent {
        client: Some(client.to_string()),
        amount: Some(FlexibleNumber::Text(amount.to_string())),
        created_by: Some(FlexibleId::Text("Agent1".to_string())),
        office_id: Some(FlexibleNumber::Number(3.0)),
        event_type: Some("new_loan".to_string()),
        created_at: Some(created_at.to_string()),
        ..RawLoanEvent::default()
    }
}
