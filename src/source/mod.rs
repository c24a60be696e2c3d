//! Dashboard API access.
//!
//! The dashboard is treated as an opaque JSON source: every domain endpoint
//! takes `date` and an optional `district` and answers with a `results`
//! collection plus a few domain-specific scalars.

use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::SourceConfig;
use crate::domain::Domain;
use crate::error::PipelineError;

/// Something that can produce raw dashboard payloads.
#[allow(async_fn_in_trait)]
pub trait DataSource {
    /// Fetch the payload for `domain` on `date`, state-wide when `district`
    /// is `None`.
    async fn fetch(
        &self,
        domain: &Domain,
        date: NaiveDate,
        district: Option<&str>,
    ) -> Result<Value, PipelineError>;
}

/// [`DataSource`] backed by the NREGS dashboard HTTP API.
pub struct HttpDataSource {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpDataSource {
    pub fn new(config: &SourceConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client: builder.build()?,
        })
    }

    /// Endpoint URL for a domain, without query parameters.
    pub fn endpoint_url(&self, domain: &Domain) -> String {
        format!("{}/{}", self.base_url, domain.endpoint)
    }
}

/// Query parameters for a fetch.
pub fn query_params(date: NaiveDate, district: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![("date", date.format("%Y-%m-%d").to_string())];
    if let Some(district) = district {
        params.push(("district", district.to_string()));
    }
    params
}

impl DataSource for HttpDataSource {
    async fn fetch(
        &self,
        domain: &Domain,
        date: NaiveDate,
        district: Option<&str>,
    ) -> Result<Value, PipelineError> {
        let url = self.endpoint_url(domain);
        let params = query_params(date, district);
        info!("Fetching {} data from: {} {:?}", domain.label, url, params);

        let fetch_failed = |reason: String| {
            error!("Failed to fetch {} data: {}", domain.label, reason);
            PipelineError::Fetch {
                domain: domain.label,
                reason,
            }
        };

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    fetch_failed(format!("request to {} timed out", url))
                } else if e.is_connect() {
                    fetch_failed(format!("cannot connect to {}", url))
                } else {
                    fetch_failed(e.to_string())
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(fetch_failed(format!("HTTP {}", status)));
        }

        let payload: Value = response.json().await.map_err(|e| PipelineError::MalformedData {
            domain: domain.label,
            scope: if district.is_some() { "district" } else { "state" },
            reason: format!("response is not JSON: {}", e),
        })?;

        debug!("Successfully fetched {} data from: {}", domain.label, url);
        Ok(payload)
    }
}
