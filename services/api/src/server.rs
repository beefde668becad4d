use crate::cli::ServeArgs;
use crate::infra::{AppState, SessionStore};
use crate::routes::with_service_routes;
use action_feed::alerts::AlertService;
use action_feed::api::{AlertEventSource, HttpDashboardClient, LoanEventSource, OfficeCache};
use action_feed::config::AppConfig;
use action_feed::context::UserContextProvider;
use action_feed::error::AppError;
use action_feed::feed::PriorityActionService;
use action_feed::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let client = Arc::new(HttpDashboardClient::new(&config.api)?);
    let offices = Arc::new(OfficeCache::default());
    match client.offices().await {
        Ok(records) => {
            let cached = offices.replace(records);
            info!(offices = cached, "office directory loaded");
        }
        Err(err) => warn!(error = %err, "office directory unavailable; office names fall back"),
    }

    let feed = Arc::new(
        PriorityActionService::new(client.clone(), offices).with_settings(config.feed_settings()),
    );
    let alerts = Arc::new(AlertService::new(client.clone()).with_fetch_timeout(config.api.timeout));
    let session = Arc::new(SessionStore::new(config.session.clone()));

    if let Some(interval) = config.feed.stale_sweep_interval {
        spawn_stale_sweep(
            Arc::clone(&feed),
            Arc::clone(&alerts),
            Arc::clone(&session),
            interval,
        );
    }

    let app = with_service_routes(feed, alerts, session)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        backend = client.base_url(),
        "priority action feed ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodic staleness sweep for the session user; also drops expired alerts.
fn spawn_stale_sweep<L, A>(
    feed: Arc<PriorityActionService<L>>,
    alerts: Arc<AlertService<A>>,
    session: Arc<SessionStore>,
    every: Duration,
) where
    L: LoanEventSource + 'static,
    A: AlertEventSource + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let user = session.current_user();
            let added = feed.check_stale_loans(&user).await;
            let purged = alerts.purge_expired();
            info!(
                position = %user.position_id,
                added,
                purged,
                "scheduled sweep finished"
            );
        }
    });
}
