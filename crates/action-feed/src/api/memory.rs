use std::sync::RwLock;

use async_trait::async_trait;

use super::{AlertEventSource, AlertQuery, ApiError, LoanEventSource, LoanQuery};
use crate::alerts::RawAlertEvent;
use crate::feed::normalizer::parse_timestamp;
use crate::feed::RawLoanEvent;

/// Loan backend held in memory, used for offline replays of exported events.
///
/// Queries select events whose creation date falls in the requested window. Events with
/// no parsable timestamp count as created today, so they only answer same-day queries.
#[derive(Debug, Default)]
pub struct MemoryLoanSource {
    events: RwLock<Vec<RawLoanEvent>>,
}

impl MemoryLoanSource {
    pub fn new(events: Vec<RawLoanEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }

    pub fn push(&self, event: RawLoanEvent) {
        self.events
            .write()
            .expect("loan source lock poisoned")
            .push(event);
    }

    pub fn len(&self) -> usize {
        self.events.read().expect("loan source lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_query(event: &RawLoanEvent, query: &LoanQuery) -> bool {
    if let Some(office_id) = query.office_id {
        let event_office = event
            .office_id
            .as_ref()
            .or_else(|| event.loan.as_ref().and_then(|loan| loan.office_id.as_ref()))
            .and_then(|office| office.as_u32());
        if event_office.is_some_and(|id| id != office_id) {
            return false;
        }
    }

    let created = event
        .created_at
        .as_deref()
        .or_else(|| event.loan.as_ref().and_then(|loan| loan.created_at.as_deref()))
        .and_then(parse_timestamp);

    match created {
        Some(created) => {
            let day = created.date_naive();
            query.start_date <= day && day <= query.end_date
        }
        None => query.start_date == query.end_date,
    }
}

#[async_trait]
impl LoanEventSource for MemoryLoanSource {
    async fn pending_loans(&self, query: &LoanQuery) -> Result<Vec<RawLoanEvent>, ApiError> {
        let events = self.events.read().expect("loan source lock poisoned");
        Ok(events
            .iter()
            .filter(|event| matches_query(event, query))
            .cloned()
            .collect())
    }
}

/// Alert backend held in memory; every query sees the full list.
#[derive(Debug, Default)]
pub struct MemoryAlertSource {
    alerts: RwLock<Vec<RawAlertEvent>>,
}

impl MemoryAlertSource {
    pub fn new(alerts: Vec<RawAlertEvent>) -> Self {
        Self {
            alerts: RwLock::new(alerts),
        }
    }

    pub fn replace(&self, alerts: Vec<RawAlertEvent>) {
        *self.alerts.write().expect("alert source lock poisoned") = alerts;
    }
}

#[async_trait]
impl AlertEventSource for MemoryAlertSource {
    async fn alerts(&self, _query: &AlertQuery) -> Result<Vec<RawAlertEvent>, ApiError> {
        Ok(self
            .alerts
            .read()
            .expect("alert source lock poisoned")
            .clone())
    }
}
