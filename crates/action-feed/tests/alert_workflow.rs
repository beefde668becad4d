mod common;

use std::sync::Arc;

use action_feed::alerts::{
    AlertFilter, AlertPriority, AlertService, AlertType, NewAlert, RawAlertEvent,
};
use action_feed::api::MemoryAlertSource;
use action_feed::feed::PositionId;
use common::{branch_user, clock};
use serde_json::json;

fn backend_alerts() -> Vec<RawAlertEvent> {
    serde_json::from_value(json!([
        {
            "id": 501,
            "type": "kpi",
            "priority": "high",
            "message": "PAR30 above 5% at Kabwe Branch",
            "category": "portfolio",
            "officeId": 3,
            "createdAt": "2025-03-04T06:00:00Z"
        },
        {
            "type": "compliance",
            "priority": "critical",
            "title": "KYC documents missing for 4 clients",
            "created_at": "2025-03-04T05:00:00Z",
            "expires_at": "2025-03-04T07:00:00Z"
        }
    ]))
    .expect("backend alerts decode")
}

#[tokio::test]
async fn dashboard_session_sees_backend_and_local_alerts() {
    let source = Arc::new(MemoryAlertSource::new(backend_alerts()));
    let service = AlertService::new(Arc::clone(&source)).with_clock(clock());
    let user = branch_user(PositionId::BRANCH_MANAGER);

    let loaded = service.initialize_from_api(&user).await;
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id, "501");
    assert_eq!(loaded[1].id, "api-1");
    assert!(loaded.iter().all(|alert| alert.is_from_api()));

    let local = service.add_alert(NewAlert {
        office_id: Some(3),
        ..NewAlert::new(AlertType::Loan, AlertPriority::Low, "Disbursement batch queued")
    });
    assert_eq!(service.alerts()[0].id, local.id);

    let sorted = service.get_alerts(&AlertFilter::default());
    let priorities: Vec<_> = sorted.iter().map(|alert| alert.priority).collect();
    assert_eq!(
        priorities,
        vec![AlertPriority::Critical, AlertPriority::High, AlertPriority::Low]
    );

    let kabwe = service.get_alerts(&AlertFilter {
        office_id: Some(3),
        ..AlertFilter::default()
    });
    assert_eq!(kabwe.len(), 2);

    assert!(service.mark_as_read("501"));
    assert!(!service.mark_as_read("missing"));
    assert_eq!(service.unread_count(), 2);

    assert_eq!(service.purge_expired(), 1);
    assert_eq!(service.alerts().len(), 2);
}

#[tokio::test]
async fn reset_reloads_for_the_new_session() {
    let source = Arc::new(MemoryAlertSource::new(backend_alerts()));
    let service = AlertService::new(Arc::clone(&source)).with_clock(clock());
    service
        .initialize_from_api(&branch_user(PositionId::BRANCH_MANAGER))
        .await;
    service.add_alert(NewAlert::new(
        AlertType::System,
        AlertPriority::Medium,
        "Sync finished",
    ));

    source.replace(Vec::new());
    let reloaded = service
        .reset(&branch_user(PositionId::RISK_MANAGER))
        .await;

    assert!(reloaded.is_empty());
    assert!(service.is_initialized());
    assert_eq!(service.unread_count(), 0);
}
