use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{Alert, AlertPriority, AlertType, API_SOURCE};
use crate::api::{FlexibleId, FlexibleNumber};
use crate::feed::normalizer::parse_timestamp;
use crate::feed::PositionId;

/// Alert row from `GET /smart-alerts`; accepts snake_case and camelCase keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAlertEvent {
    pub id: Option<FlexibleId>,
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    pub priority: Option<String>,
    pub message: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "kpiId")]
    pub kpi_id: Option<FlexibleId>,
    #[serde(alias = "positionId")]
    pub position_id: Option<FlexibleNumber>,
    #[serde(alias = "officeId")]
    pub office_id: Option<FlexibleNumber>,
    #[serde(alias = "provinceId")]
    pub province_id: Option<FlexibleNumber>,
    #[serde(alias = "userId")]
    pub user_id: Option<FlexibleNumber>,
    #[serde(alias = "isRead")]
    pub is_read: Option<bool>,
    #[serde(alias = "isDismissed")]
    pub is_dismissed: Option<bool>,
    #[serde(alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(alias = "expiresAt")]
    pub expires_at: Option<String>,
    #[serde(alias = "actionUrl")]
    pub action_url: Option<String>,
    #[serde(alias = "actionLabel")]
    pub action_label: Option<String>,
    pub metadata: Option<Value>,
}

/// Convert a backend alert into the stored shape.
///
/// Unknown priorities become medium and unknown types become system alerts. The source is
/// always stamped as `api` so a later refresh can replace it. `fallback_id` is only called
/// when the backend sent no id.
pub fn alert_from_raw<F>(raw: RawAlertEvent, now: DateTime<Utc>, fallback_id: F) -> Alert
where
    F: FnOnce() -> String,
{
    let message = text(raw.message)
        .or_else(|| text(raw.title.clone()))
        .unwrap_or_else(|| "Alert".to_string());

    Alert {
        id: raw
            .id
            .as_ref()
            .and_then(FlexibleId::non_empty)
            .unwrap_or_else(fallback_id),
        alert_type: raw
            .alert_type
            .as_deref()
            .and_then(AlertType::parse)
            .unwrap_or(AlertType::System),
        priority: raw
            .priority
            .as_deref()
            .and_then(AlertPriority::parse)
            .unwrap_or(AlertPriority::Medium),
        message,
        title: text(raw.title),
        category: text(raw.category),
        source: Some(API_SOURCE.to_string()),
        kpi_id: raw.kpi_id.as_ref().and_then(FlexibleId::non_empty),
        position_id: raw
            .position_id
            .as_ref()
            .and_then(FlexibleNumber::as_u32)
            .map(PositionId),
        office_id: raw.office_id.as_ref().and_then(FlexibleNumber::as_u32),
        province_id: raw.province_id.as_ref().and_then(FlexibleNumber::as_u32),
        user_id: raw
            .user_id
            .as_ref()
            .and_then(FlexibleNumber::value)
            .filter(|id| *id >= 0.0)
            .map(|id| id.trunc() as u64),
        is_read: raw.is_read.unwrap_or(false),
        is_dismissed: raw.is_dismissed.unwrap_or(false),
        created_at: raw
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now),
        expires_at: raw.expires_at.as_deref().and_then(parse_timestamp),
        action_url: text(raw.action_url),
        action_label: text(raw.action_label),
        metadata: raw.metadata,
    }
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_enums_fall_back_and_source_is_stamped() {
        let raw: RawAlertEvent = serde_json::from_value(json!({
            "id": 12,
            "type": "weather",
            "priority": "URGENT",
            "title": "Disbursement backlog",
            "officeId": "3",
            "position_id": 5,
            "createdAt": "2025-03-04T06:00:00Z"
        }))
        .expect("raw alert");

        let now = Utc::now();
        let alert = alert_from_raw(raw, now, || "api-1".to_string());

        assert_eq!(alert.id, "12");
        assert_eq!(alert.alert_type, AlertType::System);
        assert_eq!(alert.priority, AlertPriority::Medium);
        assert_eq!(alert.message, "Disbursement backlog");
        assert_eq!(alert.source.as_deref(), Some("api"));
        assert_eq!(alert.office_id, Some(3));
        assert_eq!(alert.position_id, Some(PositionId::BRANCH_MANAGER));
        assert_ne!(alert.created_at, now);
        assert!(!alert.is_read);
    }

    #[test]
    fn missing_id_and_timestamp_use_fallbacks() {
        let now = Utc::now();
        let alert = alert_from_raw(
            RawAlertEvent {
                priority: Some("High".to_string()),
                alert_type: Some("risk".to_string()),
                ..RawAlertEvent::default()
            },
            now,
            || "api-7".to_string(),
        );

        assert_eq!(alert.id, "api-7");
        assert_eq!(alert.priority, AlertPriority::High);
        assert_eq!(alert.alert_type, AlertType::Risk);
        assert_eq!(alert.message, "Alert");
        assert_eq!(alert.created_at, now);
    }
}
