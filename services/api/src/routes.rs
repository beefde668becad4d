use crate::infra::{AppState, SessionStore};
use action_feed::alerts::{alert_router, AlertService};
use action_feed::api::{AlertEventSource, LoanEventSource};
use action_feed::context::{UserContext, UserContextProvider};
use action_feed::feed::{priority_action_router, PriorityActionService};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub(crate) struct SessionRouterState<L, A> {
    feed: Arc<PriorityActionService<L>>,
    alerts: Arc<AlertService<A>>,
    session: Arc<SessionStore>,
}

impl<L, A> Clone for SessionRouterState<L, A> {
    fn clone(&self) -> Self {
        Self {
            feed: Arc::clone(&self.feed),
            alerts: Arc::clone(&self.alerts),
            session: Arc::clone(&self.session),
        }
    }
}

pub(crate) fn with_service_routes<L, A>(
    feed: Arc<PriorityActionService<L>>,
    alerts: Arc<AlertService<A>>,
    session: Arc<SessionStore>,
) -> Router
where
    L: LoanEventSource + 'static,
    A: AlertEventSource + 'static,
{
    let session_routes = Router::new()
        .route(
            "/api/v1/session",
            get(session_endpoint::<L, A>).put(update_session_endpoint::<L, A>),
        )
        .with_state(SessionRouterState {
            feed: Arc::clone(&feed),
            alerts: Arc::clone(&alerts),
            session: Arc::clone(&session),
        });

    priority_action_router(feed, Arc::clone(&session))
        .merge(alert_router(alerts, session))
        .merge(session_routes)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn session_endpoint<L, A>(State(state): State<SessionRouterState<L, A>>) -> Response
where
    L: LoanEventSource + 'static,
    A: AlertEventSource + 'static,
{
    (StatusCode::OK, Json(state.session.current_user())).into_response()
}

/// Switch the dashboard user; a new position, office or impersonation target rebuilds
/// both stores before responding.
async fn update_session_endpoint<L, A>(
    State(state): State<SessionRouterState<L, A>>,
    Json(next): Json<UserContext>,
) -> Response
where
    L: LoanEventSource + 'static,
    A: AlertEventSource + 'static,
{
    let changed = state.session.replace(next);
    let user = state.session.current_user();

    if changed {
        state.feed.reset_to_defaults();
        state.feed.initialize_from_api(&user).await;
        state.alerts.reset(&user).await;
        info!(
            position = %user.position_id,
            office = ?user.office_id,
            impersonating = user.is_impersonating,
            "session changed; feeds rebuilt"
        );
    }

    let payload = json!({
        "session": user,
        "changed": changed,
        "priority_actions": state.feed.priority_actions().len(),
        "alerts": state.alerts.alerts().len(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_feed::alerts::RawAlertEvent;
    use action_feed::api::{
        FlexibleNumber, MemoryAlertSource, MemoryLoanSource, OfficeCache,
    };
    use action_feed::clock::ManualClock;
    use action_feed::feed::{PositionId, RawLoanEvent};
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{FixedOffset, TimeZone};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    struct Harness {
        router: Router,
        feed: Arc<PriorityActionService<MemoryLoanSource>>,
        alerts: Arc<AlertService<MemoryAlertSource>>,
    }

    fn harness(ready: bool) -> Harness {
        let clock = Arc::new(ManualClock::new(
            FixedOffset::east_opt(2 * 3600)
                .expect("valid offset")
                .with_ymd_and_hms(2025, 3, 4, 9, 30, 0)
                .single()
                .expect("valid time"),
        ));
        let loans = Arc::new(MemoryLoanSource::new(vec![RawLoanEvent {
            client: Some("Jane Doe".to_string()),
            amount: Some(FlexibleNumber::Number(75_000.0)),
            office_id: Some(FlexibleNumber::Number(3.0)),
            event_type: Some("new_loan".to_string()),
            created_at: Some("2025-03-04T07:00:00Z".to_string()),
            ..RawLoanEvent::default()
        }]));
        let alerts_source = Arc::new(MemoryAlertSource::new(vec![RawAlertEvent {
            message: Some("PAR30 above target".to_string()),
            priority: Some("high".to_string()),
            ..RawAlertEvent::default()
        }]));

        let feed = Arc::new(
            PriorityActionService::new(loans, Arc::new(OfficeCache::default()))
                .with_clock(clock.clone()),
        );
        let alerts = Arc::new(AlertService::new(alerts_source).with_clock(clock));
        let session = Arc::new(SessionStore::new(UserContext::for_position(
            PositionId::LOAN_CONSULTANT,
        )));

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = with_service_routes(Arc::clone(&feed), Arc::clone(&alerts), session)
            .layer(Extension(state));

        Harness {
            router,
            feed,
            alerts,
        }
    }

    async fn read_json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn put_session(payload: serde_json::Value) -> Request<Body> {
        Request::put("/api/v1/session")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let response = harness(false)
            .router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = harness(true)
            .router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn position_change_rebuilds_both_stores() {
        let Harness {
            router,
            feed,
            alerts,
        } = harness(true);

        let response = router
            .clone()
            .oneshot(put_session(json!({
                "positionId": 5,
                "officeId": 3,
                "firstName": "Chanda"
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["changed"], true);
        assert_eq!(body["session"]["positionName"], "Branch Manager");
        assert_eq!(body["priority_actions"], 3);
        assert_eq!(body["alerts"], 1);
        assert_eq!(feed.current_position(), Some(PositionId::BRANCH_MANAGER));
        assert!(alerts.is_initialized());

        let unchanged = router
            .oneshot(put_session(json!({
                "positionId": 5,
                "officeId": 3,
                "firstName": "Chanda",
                "lastName": "Phiri"
            })))
            .await
            .expect("response");
        let body = read_json_body(unchanged).await;
        assert_eq!(body["changed"], false);
        assert_eq!(body["priority_actions"], 3);
    }

    #[tokio::test]
    async fn health_and_session_are_readable() {
        let router = harness(true).router;

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(health.status(), StatusCode::OK);

        let session = router
            .oneshot(
                Request::get("/api/v1/session")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = read_json_body(session).await;
        assert_eq!(body["positionId"], 9);
    }
}
