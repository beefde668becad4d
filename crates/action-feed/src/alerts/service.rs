use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{sort_alerts, Alert, AlertFilter, NewAlert};
use super::normalizer::{alert_from_raw, RawAlertEvent};
use crate::api::{AlertEventSource, AlertQuery, ApiError};
use crate::clock::{Clock, SystemClock};
use crate::context::UserContext;
use crate::subscribers::{SubscriberSet, Subscription};

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Default)]
struct AlertState {
    alerts: Vec<Alert>,
    next_id: u64,
    initialized: bool,
    revision: u64,
    /// Bumped by every reset; an initialization that started in an older epoch is discarded.
    epoch: u64,
}

impl AlertState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn snapshot(&mut self) -> (u64, Vec<Alert>) {
        self.revision += 1;
        (self.revision, self.alerts.clone())
    }
}

/// Store for system alerts with the same copy-on-read, notify-on-write contract as the
/// priority action feed.
pub struct AlertService<S> {
    source: Arc<S>,
    clock: Arc<dyn Clock>,
    fetch_timeout: Duration,
    state: Mutex<AlertState>,
    init_gate: tokio::sync::Mutex<()>,
    subscribers: SubscriberSet<Vec<Alert>>,
}

impl<S> AlertService<S>
where
    S: AlertEventSource + 'static,
{
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            clock: Arc::new(SystemClock),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            state: Mutex::new(AlertState::default()),
            init_gate: tokio::sync::Mutex::new(()),
            subscribers: SubscriberSet::new("alerts"),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn add_alert(&self, alert: NewAlert) -> Alert {
        self.add_alerts(vec![alert]).remove(0)
    }

    /// Store a batch of alerts with a single notification.
    pub fn add_alerts(&self, alerts: Vec<NewAlert>) -> Vec<Alert> {
        let created_at = self.clock.now().with_timezone(&Utc);
        let (revision, snapshot, added) = {
            let mut state = self.lock_state();
            let added: Vec<Alert> = alerts
                .into_iter()
                .map(|alert| {
                    let id = state.next_id("alert");
                    alert.into_alert(id, created_at)
                })
                .collect();
            state.alerts.splice(0..0, added.iter().cloned());
            let (revision, snapshot) = state.snapshot();
            (revision, snapshot, added)
        };

        debug!(added = added.len(), "alerts added");
        self.subscribers.publish(revision, &snapshot);
        added
    }

    /// Alerts matching `filter`, most severe and newest first.
    pub fn get_alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self
            .lock_state()
            .alerts
            .iter()
            .filter(|alert| filter.matches(alert))
            .cloned()
            .collect();
        sort_alerts(&mut alerts);
        alerts
    }

    pub fn mark_as_read(&self, id: &str) -> bool {
        self.update(id, |alert| alert.is_read = true)
    }

    pub fn dismiss_alert(&self, id: &str) -> bool {
        self.update(id, |alert| alert.is_dismissed = true)
    }

    pub fn mark_all_as_read(&self) -> usize {
        self.mutate(|alerts| {
            let mut changed = 0;
            for alert in alerts.iter_mut().filter(|alert| !alert.is_read) {
                alert.is_read = true;
                changed += 1;
            }
            changed
        })
    }

    pub fn remove_alert(&self, id: &str) -> bool {
        self.mutate(|alerts| {
            let before = alerts.len();
            alerts.retain(|alert| alert.id != id);
            before - alerts.len()
        }) > 0
    }

    pub fn clear_all_alerts(&self) {
        self.mutate(|alerts| {
            let removed = alerts.len();
            alerts.clear();
            removed
        });
    }

    pub fn clear_dismissed_alerts(&self) -> usize {
        self.mutate(|alerts| {
            let before = alerts.len();
            alerts.retain(|alert| !alert.is_dismissed);
            before - alerts.len()
        })
    }

    /// Drop alerts whose expiry is at or before the clock's current time.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now().with_timezone(&Utc);
        let purged = self.mutate(|alerts| {
            let before = alerts.len();
            alerts.retain(|alert| !alert.is_expired(now));
            before - alerts.len()
        });
        if purged > 0 {
            info!(purged, "expired alerts purged");
        }
        purged
    }

    pub fn unread_count(&self) -> usize {
        self.lock_state()
            .alerts
            .iter()
            .filter(|alert| !alert.is_read && !alert.is_dismissed)
            .count()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.lock_state().alerts.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.lock_state().initialized
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Vec<Alert>) + Send + Sync + 'static,
    {
        let current = self.alerts();
        self.subscribers.subscribe(&current, callback)
    }

    /// Pull backend alerts for `user`, replacing earlier backend alerts and keeping
    /// locally added ones.
    pub async fn initialize_from_api(&self, user: &UserContext) -> Vec<Alert> {
        let _gate = self.init_gate.lock().await;
        let epoch = {
            let state = self.lock_state();
            if state.initialized {
                return state.alerts.clone();
            }
            state.epoch
        };

        let fetched = self.fetch(&AlertQuery::for_user(user)).await;
        let now = self.clock.now().with_timezone(&Utc);

        let (revision, snapshot) = {
            let mut state = self.lock_state();
            if state.epoch != epoch {
                info!(
                    position = %user.position_id,
                    "alert store was reset during initialization; discarding result"
                );
                return state.alerts.clone();
            }
            match fetched {
                Ok(raw_alerts) => {
                    let mut merged = Vec::with_capacity(raw_alerts.len() + state.alerts.len());
                    for raw in raw_alerts {
                        merged.push(alert_from_raw(raw, now, || state.next_id("api")));
                    }
                    let fetched_count = merged.len();
                    merged.extend(state.alerts.drain(..).filter(|alert| !alert.is_from_api()));
                    info!(
                        position = %user.position_id,
                        fetched = fetched_count,
                        total = merged.len(),
                        "alerts initialized from backend"
                    );
                    state.alerts = merged;
                }
                Err(err) => {
                    warn!(error = %err, "alert initialization failed; keeping local alerts");
                }
            }
            state.initialized = true;
            state.snapshot()
        };

        self.subscribers.publish(revision, &snapshot);
        snapshot
    }

    /// Forget every alert and load again for a new user context.
    pub async fn reset(&self, user: &UserContext) -> Vec<Alert> {
        {
            let mut state = self.lock_state();
            state.alerts.clear();
            state.initialized = false;
            state.epoch += 1;
        }
        info!(
            position = %user.position_id,
            impersonating = user.is_impersonating,
            "alert store reset"
        );
        self.initialize_from_api(user).await
    }

    fn update<F>(&self, id: &str, apply: F) -> bool
    where
        F: Fn(&mut Alert),
    {
        self.mutate(|alerts| match alerts.iter_mut().find(|alert| alert.id == id) {
            Some(alert) => {
                apply(alert);
                1
            }
            None => 0,
        }) > 0
    }

    /// Apply `change` and notify subscribers if it reports any affected alerts.
    fn mutate<F>(&self, change: F) -> usize
    where
        F: FnOnce(&mut Vec<Alert>) -> usize,
    {
        let (affected, published) = {
            let mut state = self.lock_state();
            let affected = change(&mut state.alerts);
            (affected, (affected > 0).then(|| state.snapshot()))
        };

        if let Some((revision, snapshot)) = published {
            self.subscribers.publish(revision, &snapshot);
        }
        affected
    }

    async fn fetch(&self, query: &AlertQuery) -> Result<Vec<RawAlertEvent>, ApiError> {
        match tokio::time::timeout(self.fetch_timeout, self.source.alerts(query)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(self.fetch_timeout)),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AlertState> {
        self.state.lock().expect("alert state mutex poisoned")
    }
}
