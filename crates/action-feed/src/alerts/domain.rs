use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::feed::PositionId;

/// Source value stamped on alerts that came from the backend.
pub const API_SOURCE: &str = "api";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Kpi,
    Loan,
    Payment,
    Risk,
    Compliance,
    #[default]
    System,
}

impl AlertType {
    /// Case-insensitive lookup; `None` for unknown names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kpi" => Some(Self::Kpi),
            "loan" => Some(Self::Loan),
            "payment" => Some(Self::Payment),
            "risk" => Some(Self::Risk),
            "compliance" => Some(Self::Compliance),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl AlertPriority {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Sort key; lower ranks are shown first.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

/// Stored alert as handed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "kpi_id", default, skip_serializing_if = "Option::is_none")]
    pub kpi_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<PositionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    pub is_read: bool,
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Alert {
    pub fn is_from_api(&self) -> bool {
        self.source.as_deref() == Some(API_SOURCE)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Alert payload before the store assigns an id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewAlert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub message: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    #[serde(rename = "kpi_id")]
    pub kpi_id: Option<String>,
    pub position_id: Option<PositionId>,
    pub office_id: Option<u32>,
    pub province_id: Option<u32>,
    pub user_id: Option<u64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub action_url: Option<String>,
    pub action_label: Option<String>,
    pub metadata: Option<Value>,
}

impl NewAlert {
    pub fn new(alert_type: AlertType, priority: AlertPriority, message: impl Into<String>) -> Self {
        Self {
            alert_type,
            priority,
            message: message.into(),
            ..Self::default()
        }
    }

    pub(crate) fn into_alert(self, id: String, created_at: DateTime<Utc>) -> Alert {
        Alert {
            id,
            alert_type: self.alert_type,
            priority: self.priority,
            message: self.message,
            title: self.title,
            category: self.category,
            source: self.source,
            kpi_id: self.kpi_id,
            position_id: self.position_id,
            office_id: self.office_id,
            province_id: self.province_id,
            user_id: self.user_id,
            is_read: false,
            is_dismissed: false,
            created_at,
            expires_at: self.expires_at,
            action_url: self.action_url,
            action_label: self.action_label,
            metadata: self.metadata,
        }
    }
}

/// Conjunction of optional predicates; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertFilter {
    pub types: Option<Vec<AlertType>>,
    pub priorities: Option<Vec<AlertPriority>>,
    pub position_id: Option<PositionId>,
    pub office_id: Option<u32>,
    pub unread_only: bool,
    pub category: Option<String>,
    pub kpi_id: Option<String>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(types) = &self.types {
            if !types.contains(&alert.alert_type) {
                return false;
            }
        }
        if let Some(priorities) = &self.priorities {
            if !priorities.contains(&alert.priority) {
                return false;
            }
        }
        if self.position_id.is_some() && alert.position_id != self.position_id {
            return false;
        }
        if self.office_id.is_some() && alert.office_id != self.office_id {
            return false;
        }
        if self.unread_only && alert.is_read {
            return false;
        }
        if self.category.is_some() && alert.category != self.category {
            return false;
        }
        if self.kpi_id.is_some() && alert.kpi_id != self.kpi_id {
            return false;
        }
        true
    }
}

/// Most severe first, newest first within a priority.
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|left, right| {
        left.priority
            .rank()
            .cmp(&right.priority.rank())
            .then_with(|| right.created_at.cmp(&left.created_at))
    });
}
