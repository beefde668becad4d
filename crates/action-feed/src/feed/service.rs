use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::brief::MorningBrief;
use super::config::{ActionThresholds, FeedSettings};
use super::domain::{LoanActionContext, PositionId, PriorityAction, RawLoanEvent};
use super::rules::ActionEngine;
use crate::api::{ApiError, LoanEventSource, LoanQuery, OfficeDirectory};
use crate::clock::{Clock, SystemClock};
use crate::context::UserContext;
use crate::subscribers::{SubscriberSet, Subscription};

/// Result of feeding one event through the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    pub new_actions: Vec<PriorityAction>,
    pub count: usize,
}

#[derive(Debug, Default)]
struct FeedState {
    actions: Vec<PriorityAction>,
    loan_count: u64,
    count_day: Option<NaiveDate>,
    current_position: Option<PositionId>,
    impersonating: bool,
    initialized: bool,
    revision: u64,
    /// Bumped by every reset; an initialization that started in an older epoch is discarded.
    epoch: u64,
}

impl FeedState {
    /// Increment the first-loan counter, restarting it when the calendar day changes.
    fn next_loan_count(&mut self, today: NaiveDate) -> u64 {
        if self.count_day != Some(today) {
            if self.count_day.is_some() {
                debug!(%today, "new business day; restarting loan counter");
            }
            self.count_day = Some(today);
            self.loan_count = 0;
        }
        self.loan_count += 1;
        self.loan_count
    }

    fn snapshot(&mut self) -> (u64, Vec<PriorityAction>) {
        self.revision += 1;
        (self.revision, self.actions.clone())
    }
}

/// Owner of the ranked priority action list for one dashboard session.
///
/// Every mutating operation takes the caller's [`UserContext`] so a position change
/// (including impersonation) applies to the very next event. Actions already in the list
/// are not re-filtered when the position changes.
pub struct PriorityActionService<L> {
    source: Arc<L>,
    engine: ActionEngine,
    clock: Arc<dyn Clock>,
    settings: FeedSettings,
    state: Mutex<FeedState>,
    init_gate: tokio::sync::Mutex<()>,
    subscribers: SubscriberSet<Vec<PriorityAction>>,
}

impl<L> PriorityActionService<L>
where
    L: LoanEventSource + 'static,
{
    pub fn new(source: Arc<L>, offices: Arc<dyn OfficeDirectory>) -> Self {
        Self {
            source,
            engine: ActionEngine::new(ActionThresholds::default(), offices),
            clock: Arc::new(SystemClock),
            settings: FeedSettings::default(),
            state: Mutex::new(FeedState::default()),
            init_gate: tokio::sync::Mutex::new(()),
            subscribers: SubscriberSet::new("priority_actions"),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: FeedSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ActionThresholds) -> Self {
        self.engine = ActionEngine::new(thresholds, self.engine.offices());
        self
    }

    pub fn engine(&self) -> &ActionEngine {
        &self.engine
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Load today's pending loans for the user's office and rebuild the list.
    ///
    /// Concurrent callers wait for the first one and then see its result, so at most one
    /// backend round-trip is in flight. A backend failure still marks the service
    /// initialized and leaves the list usable.
    pub async fn initialize_from_api(&self, user: &UserContext) -> Vec<PriorityAction> {
        let _gate = self.init_gate.lock().await;
        let epoch = {
            let state = self.lock_state();
            if state.initialized {
                return state.actions.clone();
            }
            state.epoch
        };

        self.refresh_position(user);
        let now = self.clock.now();
        let today = now.date_naive();
        let query = LoanQuery::pending(today, today).with_office(user.office_id);

        let fetched = self.fetch(&query).await;

        let (revision, snapshot) = {
            let mut state = self.lock_state();
            if state.epoch != epoch {
                info!(
                    position = %user.position_id,
                    "priority action state was reset during initialization; discarding result"
                );
                return state.actions.clone();
            }
            match fetched {
                Ok(loans) => {
                    let utc_now = now.with_timezone(&Utc);
                    let mut generated = Vec::new();
                    for loan in &loans {
                        let count = state.next_loan_count(today);
                        let context = LoanActionContext::fresh(user.position_id, count);
                        generated.extend(self.engine.generate(loan, &context, utc_now));
                    }
                    info!(
                        position = %user.position_id,
                        loans = loans.len(),
                        actions = generated.len(),
                        "priority actions initialized from backend"
                    );
                    state.actions = generated;
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        "priority action initialization failed; continuing with current list"
                    );
                }
            }
            state.initialized = true;
            state.snapshot()
        };

        self.subscribers.publish(revision, &snapshot);
        snapshot
    }

    /// Run one incoming event for the current position and put its actions first.
    pub fn process_new_loan(&self, user: &UserContext, loan: &RawLoanEvent) -> ProcessOutcome {
        self.refresh_position(user);
        let now = self.clock.now();

        let (revision, snapshot, new_actions) = {
            let mut state = self.lock_state();
            let count = state.next_loan_count(now.date_naive());
            let context = LoanActionContext::fresh(user.position_id, count);
            let new_actions = self
                .engine
                .generate(loan, &context, now.with_timezone(&Utc));

            prepend(
                &mut state.actions,
                new_actions.clone(),
                self.settings.new_loan_capacity,
            );
            let (revision, snapshot) = state.snapshot();
            (revision, snapshot, new_actions)
        };

        self.subscribers.publish(revision, &snapshot);

        let count = new_actions.len();
        ProcessOutcome { new_actions, count }
    }

    /// Sweep the backend for loans pending past the stale threshold.
    ///
    /// Returns the number of actions added; zero when nothing is stale or the backend
    /// could not be reached.
    pub async fn check_stale_loans(&self, user: &UserContext) -> usize {
        self.refresh_position(user);
        let now = self.clock.now();
        let today = now.date_naive();
        let query = LoanQuery::pending(
            today - Duration::days(self.settings.stale_lookback_days),
            today - Duration::days(self.settings.stale_after_days),
        )
        .with_office(user.office_id);

        let loans = match self.fetch(&query).await {
            Ok(loans) => loans,
            Err(err) => {
                warn!(error = %err, "stale loan sweep failed");
                return 0;
            }
        };

        if loans.is_empty() {
            debug!("stale loan sweep found nothing");
            return 0;
        }

        let utc_now = now.with_timezone(&Utc);
        let time_str = now.format("%H:%M").to_string();

        let (revision, snapshot, added) = {
            let mut state = self.lock_state();
            let mut batch = vec![self.engine.stale_loan_summary(&loans, &time_str, utc_now)];
            for loan in &loans {
                let days_pending = self.engine.normalize(loan, utc_now).days_pending;
                let context =
                    LoanActionContext::stale(user.position_id, state.loan_count, days_pending);
                batch.extend(self.engine.generate(loan, &context, utc_now));
            }

            let added = batch.len();
            prepend(&mut state.actions, batch, self.settings.stale_capacity);
            let (revision, snapshot) = state.snapshot();
            (revision, snapshot, added)
        };

        info!(
            position = %user.position_id,
            stale_loans = loans.len(),
            added,
            "stale loan sweep complete"
        );
        self.subscribers.publish(revision, &snapshot);
        added
    }

    /// Remove the entry at `index`; out-of-range indexes are ignored.
    pub fn mark_as_completed(&self, index: usize) -> Option<PriorityAction> {
        let (revision, snapshot, removed) = {
            let mut state = self.lock_state();
            if index >= state.actions.len() {
                debug!(
                    index,
                    len = state.actions.len(),
                    "ignoring completion for missing action"
                );
                return None;
            }
            let removed = state.actions.remove(index);
            let (revision, snapshot) = state.snapshot();
            (revision, snapshot, removed)
        };

        self.subscribers.publish(revision, &snapshot);
        Some(removed)
    }

    /// Allow the next `initialize_from_api` call to hit the backend again.
    ///
    /// None of the reset operations notify subscribers. `reset_initialization` and
    /// `reset_to_defaults` also invalidate an initialization still waiting on the backend.
    pub fn reset_initialization(&self) {
        let mut state = self.lock_state();
        state.initialized = false;
        state.epoch += 1;
    }

    pub fn clear_priority_actions(&self) {
        self.lock_state().actions.clear();
    }

    pub fn reset_to_defaults(&self) {
        let mut state = self.lock_state();
        let revision = state.revision;
        let epoch = state.epoch + 1;
        *state = FeedState {
            revision,
            epoch,
            ..FeedState::default()
        };
    }

    /// Register `callback`; it receives the current list now and after every mutation.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Vec<PriorityAction>) + Send + Sync + 'static,
    {
        let current = self.priority_actions();
        self.subscribers.subscribe(&current, callback)
    }

    pub fn priority_actions(&self) -> Vec<PriorityAction> {
        self.lock_state().actions.clone()
    }

    pub fn loan_count(&self) -> u64 {
        self.lock_state().loan_count
    }

    pub fn current_position(&self) -> Option<PositionId> {
        self.lock_state().current_position
    }

    pub fn is_initialized(&self) -> bool {
        self.lock_state().initialized
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn generate_morning_brief(&self, user: &UserContext) -> MorningBrief {
        MorningBrief::compose(user, self.priority_actions(), self.clock.now())
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    fn refresh_position(&self, user: &UserContext) {
        let mut state = self.lock_state();
        let previous = state.current_position.replace(user.position_id);
        let was_impersonating = std::mem::replace(&mut state.impersonating, user.is_impersonating);

        if let Some(previous) = previous.filter(|previous| *previous != user.position_id) {
            info!(
                from = %previous,
                to = %user.position_id,
                impersonating = user.is_impersonating,
                "position context changed"
            );
        } else if was_impersonating != user.is_impersonating {
            info!(
                position = %user.position_id,
                impersonating = user.is_impersonating,
                "impersonation state changed"
            );
        }
    }

    async fn fetch(&self, query: &LoanQuery) -> Result<Vec<RawLoanEvent>, ApiError> {
        let limit = self.settings.fetch_timeout;
        match tokio::time::timeout(limit, self.source.pending_loans(query)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(limit)),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().expect("feed state mutex poisoned")
    }
}

fn prepend(list: &mut Vec<PriorityAction>, mut fresh: Vec<PriorityAction>, capacity: usize) {
    fresh.append(list);
    fresh.truncate(capacity);
    *list = fresh;
}
