mod common;

use std::sync::Arc;

use action_feed::api::MemoryLoanSource;
use action_feed::feed::{LoanExportImporter, PositionId, PriorityActionService};
use common::{branch_user, clock, offices};

const EXPORT: &str = "\
id,amount,client,loan_number,status,created_by,office_id,type,created_at,transaction_type,credit
1,75000,Jane Doe,LN-001,pending,Agent1,3,new_loan,2025-03-04T07:00:00Z,,
2,,Gideon Mwanza,LN-002,pending,Agent2,3,part_payment,2025-03-04T07:10:00Z,,2200
3,30000,Peter Zulu,LN-003,pending,Agent1,3,new_loan,2025-02-25T07:00:00Z,,
";

#[test]
fn export_rows_become_events_in_file_order() {
    let events = LoanExportImporter::from_reader(EXPORT.as_bytes()).expect("export parses");

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].client.as_deref(), Some("Jane Doe"));
    assert!(events[1].amount.is_none());
    assert!(events[1].transaction.is_some());
    assert_eq!(events[2].loan_number.as_deref(), Some("LN-003"));
}

#[tokio::test]
async fn replayed_export_drives_the_feed() {
    let events = LoanExportImporter::from_reader(EXPORT.as_bytes()).expect("export parses");
    let source = Arc::new(MemoryLoanSource::new(events));
    let service = PriorityActionService::new(source, offices()).with_clock(clock());
    let user = branch_user(PositionId::BRANCH_MANAGER);

    let actions = service.initialize_from_api(&user).await;
    assert!(actions.iter().any(|action| action.action.contains("Jane Doe")));
    assert!(actions
        .iter()
        .all(|action| !action.action.contains("Peter Zulu")));

    assert_eq!(service.check_stale_loans(&user).await, 2);
    assert!(service.priority_actions()[1]
        .action
        .contains("Peter Zulu"));
}

#[test]
fn missing_file_reports_io_error() {
    let error = LoanExportImporter::from_path("/nonexistent/loans.csv")
        .expect_err("missing export fails");
    assert!(error.to_string().starts_with("failed to read loan export"));
}
