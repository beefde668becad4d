//! System alerts: backend alerts merged with locally raised ones.

pub mod domain;
pub mod normalizer;
pub mod router;
pub mod service;

pub use domain::{sort_alerts, Alert, AlertFilter, AlertPriority, AlertType, NewAlert, API_SOURCE};
pub use normalizer::{alert_from_raw, RawAlertEvent};
pub use router::{alert_router, AlertListParams, AlertRouterState};
pub use service::AlertService;
