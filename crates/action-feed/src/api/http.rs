use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::response::decode_list;
use super::{AlertEventSource, AlertQuery, ApiError, LoanEventSource, LoanQuery, OfficeRecord};
use crate::alerts::RawAlertEvent;
use crate::config::DashboardApiConfig;
use crate::feed::RawLoanEvent;

/// reqwest-backed client for the lending backend.
#[derive(Debug, Clone)]
pub struct HttpDashboardClient {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl HttpDashboardClient {
    pub fn new(config: &DashboardApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the office list backing the office-name cache.
    pub async fn offices(&self) -> Result<Vec<OfficeRecord>, ApiError> {
        self.get_list("offices", &[]).await
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "requesting backend list");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%url, status = status.as_u16(), "backend list request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(err))?;
        decode_list(&body)
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl LoanEventSource for HttpDashboardClient {
    async fn pending_loans(&self, query: &LoanQuery) -> Result<Vec<RawLoanEvent>, ApiError> {
        self.get_list("smart-loans", &query.query_pairs()).await
    }
}

#[async_trait]
impl AlertEventSource for HttpDashboardClient {
    async fn alerts(&self, query: &AlertQuery) -> Result<Vec<RawAlertEvent>, ApiError> {
        self.get_list("smart-alerts", &query.query_pairs()).await
    }
}
