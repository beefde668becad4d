//! Boundary to the lending backend's REST API.
//!
//! The feed and alert services only see the traits defined here; `HttpDashboardClient`
//! is the production implementation and tests substitute in-memory sources.

pub mod http;
mod memory;
mod offices;
pub mod response;
pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::alerts::RawAlertEvent;
use crate::context::UserContext;
use crate::feed::RawLoanEvent;

pub use http::HttpDashboardClient;
pub use memory::{MemoryAlertSource, MemoryLoanSource};
pub use offices::{OfficeCache, OfficeDirectory, OfficeRecord};
pub use response::{decode_list, ListResponse};
pub use wire::{FlexibleId, FlexibleNumber};

/// Filter for `GET /smart-loans`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanQuery {
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub office_id: Option<u32>,
}

impl LoanQuery {
    pub fn pending(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            status: "pending".to_string(),
            start_date,
            end_date,
            office_id: None,
        }
    }

    pub fn with_office(mut self, office_id: Option<u32>) -> Self {
        self.office_id = office_id.filter(|id| *id != 0);
        self
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("status", self.status.clone()),
            ("start_date", self.start_date.format("%Y-%m-%d").to_string()),
            ("end_date", self.end_date.format("%Y-%m-%d").to_string()),
        ];
        if let Some(office_id) = self.office_id {
            pairs.push(("office_id", office_id.to_string()));
        }
        pairs
    }
}

/// Filter for `GET /smart-alerts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertQuery {
    pub user_id: Option<u64>,
    pub office_id: Option<u32>,
    pub position_id: Option<u32>,
}

impl AlertQuery {
    pub fn for_user(user: &UserContext) -> Self {
        Self {
            user_id: user.user_id,
            office_id: user.office_id,
            position_id: Some(user.position_id.0),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let render = |value: Option<String>| value.unwrap_or_default();
        vec![
            ("user_id", render(self.user_id.map(|id| id.to_string()))),
            ("office_id", render(self.office_id.map(|id| id.to_string()))),
            ("position_id", render(self.position_id.map(|id| id.to_string()))),
        ]
    }
}

/// Source of pending loan and payment events.
#[async_trait]
pub trait LoanEventSource: Send + Sync {
    async fn pending_loans(&self, query: &LoanQuery) -> Result<Vec<RawLoanEvent>, ApiError>;
}

/// Source of backend-generated alerts.
#[async_trait]
pub trait AlertEventSource: Send + Sync {
    async fn alerts(&self, query: &AlertQuery) -> Result<Vec<RawAlertEvent>, ApiError>;
}

/// Failures talking to the lending backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("backend request failed: {0}")]
    Transport(String),
    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend response could not be decoded: {0}")]
    Decode(String),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::PositionId;

    #[test]
    fn loan_query_renders_dates_and_optional_office() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
        let query = LoanQuery::pending(day, day).with_office(Some(12));
        assert_eq!(
            query.query_pairs(),
            vec![
                ("status", "pending".to_string()),
                ("start_date", "2026-10-19".to_string()),
                ("end_date", "2026-10-19".to_string()),
                ("office_id", "12".to_string()),
            ]
        );

        let head_office = LoanQuery::pending(day, day).with_office(Some(0));
        assert!(head_office.office_id.is_none());
    }

    #[test]
    fn alert_query_takes_scope_from_user() {
        let user = UserContext {
            user_id: Some(7),
            office_id: Some(3),
            position_id: PositionId::BRANCH_MANAGER,
            ..UserContext::default()
        };
        let query = AlertQuery::for_user(&user);
        assert_eq!(query.position_id, Some(5));
        assert_eq!(query.query_pairs()[0], ("user_id", "7".to_string()));
    }
}
