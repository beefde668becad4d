use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::context::UserContext;
use crate::feed::{FeedSettings, PositionId};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub api: DashboardApiConfig,
    pub feed: FeedConfig,
    /// Current-user context the server starts with until a session update arrives.
    pub session: UserContext,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_url = env::var("DASHBOARD_API_BASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "http://localhost:8000/api".to_string());
        let timeout_secs: u64 = numeric_var("DASHBOARD_API_TIMEOUT_SECS")?.unwrap_or(15);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let sweep_secs: u64 = numeric_var("STALE_SWEEP_INTERVAL_SECS")?.unwrap_or(900);

        let position_id = PositionId(numeric_var("DASHBOARD_POSITION_ID")?.unwrap_or(5));
        let session = UserContext {
            user_id: numeric_var("DASHBOARD_USER_ID")?,
            office_id: numeric_var("DASHBOARD_OFFICE_ID")?,
            province_id: numeric_var("DASHBOARD_PROVINCE_ID")?,
            first_name: env::var("DASHBOARD_FIRST_NAME").unwrap_or_default(),
            last_name: env::var("DASHBOARD_LAST_NAME").unwrap_or_default(),
            ..UserContext::for_position(position_id)
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            api: DashboardApiConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            feed: FeedConfig {
                stale_sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
            },
            session,
        })
    }

    /// Feed retention settings with the backend timeout applied to service fetches.
    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            fetch_timeout: self.api.timeout,
            ..FeedSettings::default()
        }
    }
}

fn numeric_var<T: std::str::FromStr>(variable: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(variable) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { variable, value }),
        _ => Ok(None),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Lending backend connection settings.
#[derive(Debug, Clone)]
pub struct DashboardApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// `None` disables the background stale sweep.
    pub stale_sweep_interval: Option<Duration>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidNumber { variable: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "DASHBOARD_API_TIMEOUT_SECS must be greater than zero")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a non-negative integer, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}
