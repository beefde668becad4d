use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AlertFilter, AlertPriority, AlertType, NewAlert};
use super::service::AlertService;
use crate::api::AlertEventSource;
use crate::context::UserContextProvider;
use crate::feed::PositionId;

/// Shared state for the alert endpoints.
pub struct AlertRouterState<S, U> {
    pub service: Arc<AlertService<S>>,
    pub users: Arc<U>,
}

impl<S, U> Clone for AlertRouterState<S, U> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            users: Arc::clone(&self.users),
        }
    }
}

/// Query string for `GET /api/v1/alerts`; `type` and `priority` take comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct AlertListParams {
    #[serde(rename = "type")]
    pub types: Option<String>,
    pub priority: Option<String>,
    pub position_id: Option<u32>,
    pub office_id: Option<u32>,
    pub unread_only: Option<bool>,
    pub category: Option<String>,
    pub kpi_id: Option<String>,
}

impl AlertListParams {
    pub fn into_filter(self) -> Result<AlertFilter, String> {
        Ok(AlertFilter {
            types: parse_list(self.types.as_deref(), "type", AlertType::parse)?,
            priorities: parse_list(self.priority.as_deref(), "priority", AlertPriority::parse)?,
            position_id: self.position_id.map(PositionId),
            office_id: self.office_id,
            unread_only: self.unread_only.unwrap_or(false),
            category: self.category.filter(|value| !value.trim().is_empty()),
            kpi_id: self.kpi_id.filter(|value| !value.trim().is_empty()),
        })
    }
}

fn parse_list<T>(
    raw: Option<&str>,
    field: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<Vec<T>>, String> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Ok(None);
    };

    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse(value).ok_or_else(|| format!("unknown {field} `{value}`")))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Router builder exposing the alert store.
pub fn alert_router<S, U>(service: Arc<AlertService<S>>, users: Arc<U>) -> Router
where
    S: AlertEventSource + 'static,
    U: UserContextProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/alerts",
            get(list_handler::<S, U>).post(create_handler::<S, U>),
        )
        .route("/api/v1/alerts/:alert_id/read", post(read_handler::<S, U>))
        .route(
            "/api/v1/alerts/:alert_id/dismiss",
            post(dismiss_handler::<S, U>),
        )
        .route("/api/v1/alerts/:alert_id", delete(remove_handler::<S, U>))
        .with_state(AlertRouterState { service, users })
}

pub(crate) async fn list_handler<S, U>(
    State(state): State<AlertRouterState<S, U>>,
    Query(params): Query<AlertListParams>,
) -> Response
where
    S: AlertEventSource + 'static,
    U: UserContextProvider + 'static,
{
    let filter = match params.into_filter() {
        Ok(filter) => filter,
        Err(message) => {
            let payload = json!({ "error": message });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    if !state.service.is_initialized() {
        let user = state.users.current_user();
        state.service.initialize_from_api(&user).await;
    }

    let alerts = state.service.get_alerts(&filter);
    let payload = json!({
        "count": alerts.len(),
        "unread": state.service.unread_count(),
        "alerts": alerts,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn create_handler<S, U>(
    State(state): State<AlertRouterState<S, U>>,
    axum::Json(alert): axum::Json<NewAlert>,
) -> Response
where
    S: AlertEventSource + 'static,
    U: UserContextProvider + 'static,
{
    if alert.message.trim().is_empty() {
        let payload = json!({ "error": "alert message is required" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    let stored = state.service.add_alert(alert);
    (StatusCode::CREATED, axum::Json(stored)).into_response()
}

pub(crate) async fn read_handler<S, U>(
    State(state): State<AlertRouterState<S, U>>,
    Path(alert_id): Path<String>,
) -> Response
where
    S: AlertEventSource + 'static,
    U: UserContextProvider + 'static,
{
    outcome(state.service.mark_as_read(&alert_id), &alert_id, "read")
}

pub(crate) async fn dismiss_handler<S, U>(
    State(state): State<AlertRouterState<S, U>>,
    Path(alert_id): Path<String>,
) -> Response
where
    S: AlertEventSource + 'static,
    U: UserContextProvider + 'static,
{
    outcome(state.service.dismiss_alert(&alert_id), &alert_id, "dismissed")
}

pub(crate) async fn remove_handler<S, U>(
    State(state): State<AlertRouterState<S, U>>,
    Path(alert_id): Path<String>,
) -> Response
where
    S: AlertEventSource + 'static,
    U: UserContextProvider + 'static,
{
    outcome(state.service.remove_alert(&alert_id), &alert_id, "removed")
}

fn outcome(found: bool, alert_id: &str, status: &str) -> Response {
    if found {
        let payload = json!({ "id": alert_id, "status": status });
        (StatusCode::OK, axum::Json(payload)).into_response()
    } else {
        let payload = json!({ "error": "alert not found", "id": alert_id });
        (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
    }
}
