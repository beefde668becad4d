use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::json;

use super::domain::RawLoanEvent;
use super::service::PriorityActionService;
use crate::api::LoanEventSource;
use crate::context::UserContextProvider;

/// Shared state for the priority action endpoints.
pub struct FeedRouterState<L, U> {
    pub service: Arc<PriorityActionService<L>>,
    pub users: Arc<U>,
}

impl<L, U> Clone for FeedRouterState<L, U> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            users: Arc::clone(&self.users),
        }
    }
}

/// Router builder exposing the priority action feed.
pub fn priority_action_router<L, U>(
    service: Arc<PriorityActionService<L>>,
    users: Arc<U>,
) -> Router
where
    L: LoanEventSource + 'static,
    U: UserContextProvider + 'static,
{
    Router::new()
        .route("/api/v1/priority-actions", get(list_handler::<L, U>))
        .route(
            "/api/v1/priority-actions/events",
            post(process_event_handler::<L, U>),
        )
        .route(
            "/api/v1/priority-actions/stale-check",
            post(stale_check_handler::<L, U>),
        )
        .route(
            "/api/v1/priority-actions/brief",
            get(morning_brief_handler::<L, U>),
        )
        .route(
            "/api/v1/priority-actions/:index",
            delete(complete_handler::<L, U>),
        )
        .with_state(FeedRouterState { service, users })
}

/// Lists the feed, loading it from the backend on first use.
pub(crate) async fn list_handler<L, U>(State(state): State<FeedRouterState<L, U>>) -> Response
where
    L: LoanEventSource + 'static,
    U: UserContextProvider + 'static,
{
    let user = state.users.current_user();
    let actions = if state.service.is_initialized() {
        state.service.priority_actions()
    } else {
        state.service.initialize_from_api(&user).await
    };

    let payload = json!({
        "position_id": user.position_id,
        "loan_count": state.service.loan_count(),
        "count": actions.len(),
        "priority_actions": actions,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn process_event_handler<L, U>(
    State(state): State<FeedRouterState<L, U>>,
    axum::Json(event): axum::Json<RawLoanEvent>,
) -> Response
where
    L: LoanEventSource + 'static,
    U: UserContextProvider + 'static,
{
    let user = state.users.current_user();
    let outcome = state.service.process_new_loan(&user, &event);
    (StatusCode::ACCEPTED, axum::Json(outcome)).into_response()
}

pub(crate) async fn stale_check_handler<L, U>(
    State(state): State<FeedRouterState<L, U>>,
) -> Response
where
    L: LoanEventSource + 'static,
    U: UserContextProvider + 'static,
{
    let user = state.users.current_user();
    let added = state.service.check_stale_loans(&user).await;
    let payload = json!({
        "added": added,
        "count": state.service.priority_actions().len(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn complete_handler<L, U>(
    State(state): State<FeedRouterState<L, U>>,
    Path(index): Path<usize>,
) -> Response
where
    L: LoanEventSource + 'static,
    U: UserContextProvider + 'static,
{
    match state.service.mark_as_completed(index) {
        Some(action) => (StatusCode::OK, axum::Json(action)).into_response(),
        None => {
            let payload = json!({
                "error": "no priority action at index",
                "index": index,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn morning_brief_handler<L, U>(
    State(state): State<FeedRouterState<L, U>>,
) -> Response
where
    L: LoanEventSource + 'static,
    U: UserContextProvider + 'static,
{
    let user = state.users.current_user();
    let brief = state.service.generate_morning_brief(&user);
    (StatusCode::OK, axum::Json(brief)).into_response()
}
