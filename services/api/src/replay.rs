use crate::infra::parse_timestamp;
use action_feed::api::{MemoryLoanSource, OfficeCache, OfficeRecord};
use action_feed::clock::{Clock, ManualClock, SystemClock};
use action_feed::context::UserContext;
use action_feed::error::AppError;
use action_feed::feed::{
    LoanExportImporter, MorningBrief, PositionId, PriorityAction, PriorityActionService,
    RawLoanEvent,
};
use chrono::{DateTime, FixedOffset};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReplayMode {
    /// Load the export as the backend and run the startup load plus one stale sweep
    #[default]
    Snapshot,
    /// Push every row through the incremental event path in file order
    Stream,
}

#[derive(Args, Debug)]
pub(crate) struct ReplayArgs {
    /// CSV loan export to replay
    #[arg(long)]
    pub(crate) events: PathBuf,
    /// Position id the feed is generated for (5 = Branch Manager)
    #[arg(long, default_value_t = 5)]
    pub(crate) position: u32,
    /// Office id of the replaying user
    #[arg(long)]
    pub(crate) office_id: Option<u32>,
    /// Office names as ID=NAME pairs, e.g. --office "3=Kabwe Branch"
    #[arg(long = "office", value_parser = parse_office)]
    pub(crate) offices: Vec<OfficeRecord>,
    /// First name used in the brief greeting
    #[arg(long, default_value = "")]
    pub(crate) first_name: String,
    /// Pin the replay clock (RFC 3339); defaults to the current time
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) at: Option<DateTime<FixedOffset>>,
    #[arg(long, value_enum, default_value_t = ReplayMode::Snapshot)]
    pub(crate) mode: ReplayMode,
    /// Print the morning brief as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_replay(args: ReplayArgs) -> Result<(), AppError> {
    let ReplayArgs {
        events,
        position,
        office_id,
        offices,
        first_name,
        at,
        mode,
        json,
    } = args;

    let events = LoanExportImporter::from_path(&events)?;
    let clock: Arc<dyn Clock> = match at {
        Some(at) => Arc::new(ManualClock::new(at)),
        None => Arc::new(SystemClock),
    };
    let user = UserContext {
        office_id,
        first_name,
        ..UserContext::for_position(PositionId(position))
    };

    let brief = replay_events(events, &user, offices, clock, mode).await;

    if json {
        let rendered = serde_json::to_string_pretty(&brief)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        render_brief(&user, &brief);
    }
    Ok(())
}

pub(crate) async fn replay_events(
    events: Vec<RawLoanEvent>,
    user: &UserContext,
    offices: Vec<OfficeRecord>,
    clock: Arc<dyn Clock>,
    mode: ReplayMode,
) -> MorningBrief {
    let source = Arc::new(MemoryLoanSource::default());
    let service = PriorityActionService::new(
        Arc::clone(&source),
        Arc::new(OfficeCache::from_records(offices)),
    )
    .with_clock(clock);

    match mode {
        ReplayMode::Snapshot => {
            for event in events {
                source.push(event);
            }
            service.initialize_from_api(user).await;
            service.check_stale_loans(user).await;
        }
        ReplayMode::Stream => {
            for event in &events {
                service.process_new_loan(user, event);
            }
        }
    }

    service.generate_morning_brief(user)
}

fn render_brief(user: &UserContext, brief: &MorningBrief) {
    println!("{}", brief.greeting);
    println!("{}", user_line(user));
    println!(
        "Team: {} active officers, {} loans in pipeline, {:.1}% collections, {:.1}% PAR",
        brief.team_snapshot.active_officers,
        brief.team_snapshot.loans_in_pipeline,
        brief.team_snapshot.collections_rate_percent,
        brief.team_snapshot.portfolio_at_risk_percent
    );
    println!(
        "\nPriority actions ({} urgent of {})",
        brief.urgent_count,
        brief.priority_actions.len()
    );
    if brief.priority_actions.is_empty() {
        println!("  (none)");
    }
    for (index, action) in brief.priority_actions.iter().enumerate() {
        println!("  {}", action_line(index, action));
    }
}

fn user_line(user: &UserContext) -> String {
    let position = format!("{} ({})", user.position_name, user.position_id);
    match user.display_name() {
        name if name.is_empty() => format!("Position: {position}"),
        name => format!("User: {name}, {position}"),
    }
}

fn action_line(index: usize, action: &PriorityAction) -> String {
    let marker = if action.urgent { "!" } else { " " };
    format!("{index:>2}. [{marker}] {:<12} {}", action.due, action.action)
}

fn parse_office(raw: &str) -> Result<OfficeRecord, String> {
    let (id, name) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=NAME, got '{raw}'"))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid office id in '{raw}' ({err})"))?;
    Ok(OfficeRecord {
        id,
        name: name.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_feed::api::{FlexibleId, FlexibleNumber};

    fn pinned_clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(
            parse_timestamp("2025-03-04T09:30:00+02:00").expect("valid timestamp"),
        ))
    }

    fn event(client: &str, amount: f64, created_at: &str) -> RawLoanEvent {
        RawLoanEvent {
            client: Some(client.to_string()),
            amount: Some(FlexibleNumber::Number(amount)),
            created_by: Some(FlexibleId::Text("Agent1".to_string())),
            office_id: Some(FlexibleNumber::Number(3.0)),
            event_type: Some("new_loan".to_string()),
            created_at: Some(created_at.to_string()),
            ..RawLoanEvent::default()
        }
    }

    #[test]
    fn parses_office_pairs() {
        let record = parse_office("3= Kabwe Branch").expect("office parses");
        assert_eq!(record.id, 3);
        assert_eq!(record.name, "Kabwe Branch");
        assert!(parse_office("Kabwe").is_err());
    }

    #[test]
    fn user_line_prefers_the_display_name() {
        let anonymous = UserContext::for_position(PositionId::BRANCH_MANAGER);
        assert_eq!(
            user_line(&anonymous),
            format!("Position: Branch Manager ({})", PositionId::BRANCH_MANAGER)
        );

        let named = UserContext {
            first_name: " Chanda".to_string(),
            last_name: "Phiri ".to_string(),
            ..anonymous
        };
        assert_eq!(
            user_line(&named),
            format!("User: Chanda Phiri, Branch Manager ({})", PositionId::BRANCH_MANAGER)
        );
    }

    #[tokio::test]
    async fn snapshot_mode_includes_the_stale_sweep() {
        let user = UserContext {
            office_id: Some(3),
            first_name: "Chanda".to_string(),
            ..UserContext::for_position(PositionId::BRANCH_MANAGER)
        };
        let events = vec![
            event("Jane Doe", 75_000.0, "2025-03-04T07:00:00Z"),
            event("Peter Zulu", 30_000.0, "2025-02-25T07:00:00Z"),
        ];

        let brief = replay_events(
            events,
            &user,
            vec![OfficeRecord {
                id: 3,
                name: "Kabwe Branch".to_string(),
            }],
            pinned_clock(),
            ReplayMode::Snapshot,
        )
        .await;

        assert_eq!(brief.greeting, "Good morning, Chanda");
        assert_eq!(brief.priority_actions.len(), 5);
        assert!(brief.priority_actions[0]
            .action
            .starts_with("Stale Loan Summary"));
        assert!(brief.priority_actions[2].action.contains("Kabwe Branch"));
    }

    #[tokio::test]
    async fn stream_mode_counts_every_row_as_today() {
        let user = UserContext::for_position(PositionId::BRANCH_MANAGER);
        let events = vec![
            event("Jane Doe", 8_000.0, "2025-03-04T07:00:00Z"),
            event("Mary Banda", 9_000.0, "2025-03-04T07:10:00Z"),
        ];

        let brief = replay_events(
            events,
            &user,
            Vec::new(),
            pinned_clock(),
            ReplayMode::Stream,
        )
        .await;

        let first_of_day = brief
            .priority_actions
            .iter()
            .filter(|action| action.action.starts_with("First loan of the day!"))
            .count();
        assert_eq!(first_of_day, 1);
        assert_eq!(brief.priority_actions.len(), 3);
        assert!(brief.priority_actions[0].action.contains("Mary Banda"));
    }
}
