use action_feed::context::{UserContext, UserContextProvider};
use chrono::{DateTime, FixedOffset};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Current dashboard session; every request reads the user from here.
#[derive(Debug)]
pub(crate) struct SessionStore {
    current: RwLock<UserContext>,
}

impl SessionStore {
    pub(crate) fn new(initial: UserContext) -> Self {
        Self {
            current: RwLock::new(with_position_name(initial)),
        }
    }

    /// Store `next` and report whether the feed scope changed.
    ///
    /// Name-only edits are stored without counting as a change.
    pub(crate) fn replace(&self, next: UserContext) -> bool {
        let next = with_position_name(next);
        let mut guard = self.current.write().expect("session lock poisoned");
        let changed = scope_changed(&guard, &next);
        *guard = next;
        changed
    }
}

impl UserContextProvider for SessionStore {
    fn current_user(&self) -> UserContext {
        self.current.read().expect("session lock poisoned").clone()
    }
}

fn with_position_name(mut user: UserContext) -> UserContext {
    if user.position_name.trim().is_empty() {
        user.position_name = user.position_id.label().to_string();
    }
    user
}

fn scope_changed(current: &UserContext, next: &UserContext) -> bool {
    current.position_id != next.position_id
        || current.office_id != next.office_id
        || current.province_id != next.province_id
        || current.user_id != next.user_id
        || current.is_impersonating != next.is_impersonating
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
