use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use crate::feed::{priority_action_router, PositionId};

fn router_for(source: ScriptedLoanSource, position: PositionId) -> axum::Router {
    let (service, _, _) = build_service(source);
    priority_action_router(Arc::new(service), Arc::new(user(position)))
}

#[tokio::test]
async fn listing_initializes_the_feed_on_first_request() {
    let router = router_for(
        ScriptedLoanSource::with_today(vec![loan_event("Jane Doe", "75000", "new_loan")]),
        PositionId::BRANCH_MANAGER,
    );

    let response = router
        .oneshot(
            Request::get("/api/v1/priority-actions")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["position_id"], 5);
    assert_eq!(body["priority_actions"][1]["positionSpecific"], true);
}

#[tokio::test]
async fn posted_events_run_through_the_rules() {
    let router = router_for(ScriptedLoanSource::default(), PositionId::MANAGEMENT_ACCOUNTANT);
    let event = loan_event("Gideon Mwanza", "2200", "part_payment");

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/priority-actions/events")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&event).expect("encode")))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = read_json_body(response).await;
    assert_eq!(body["count"], 1);
    assert!(body["new_actions"][0]["action"]
        .as_str()
        .is_some_and(|text| text.starts_with("Payment Received")));

    let completed = router
        .clone()
        .oneshot(
            Request::delete("/api/v1/priority-actions/0")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(completed.status(), StatusCode::OK);

    let missing = router
        .oneshot(
            Request::delete("/api/v1/priority-actions/0")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stale_check_reports_added_actions() {
    let router = router_for(
        ScriptedLoanSource::with_stale(vec![stale_loan("Peter Zulu", "20000", 16)]),
        PositionId::RECOVERIES_COORDINATOR,
    );

    let response = router
        .oneshot(
            Request::post("/api/v1/priority-actions/stale-check")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["added"], 2);
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn brief_route_greets_the_session_user() {
    let router = router_for(ScriptedLoanSource::default(), PositionId::BRANCH_MANAGER);

    let response = router
        .oneshot(
            Request::get("/api/v1/priority-actions/brief")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["greeting"], "Good morning, Chanda");
    assert!(body["team_snapshot"]["active_officers"].is_number());
}
