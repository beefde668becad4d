//! Priority action feed and alert store for microfinance leadership dashboards.
//!
//! Loan and payment events arrive from the lending backend, are normalized into a single
//! record shape, and are run through a position-aware rule engine. The resulting actions are
//! retained by [`feed::PriorityActionService`] and fanned out to subscribers; system alerts
//! follow the same store-and-notify discipline in [`alerts::AlertService`].

pub mod alerts;
pub mod api;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod feed;
pub mod subscribers;
pub mod telemetry;
