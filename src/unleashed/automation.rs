use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::AutomationConfig;
use crate::errors::ServiceError;

/// Single attempt against the external automation workflow. Returns the
/// HTTP status code; transport failures are errors. Retry policy lives
/// with the caller.
#[async_trait]
pub trait AutomationGateway: Send + Sync {
    async fn trigger(&self, target: i64) -> Result<u16, ServiceError>;
}

/// HTTP implementation: `GET {endpoint_url}/{target}`.
#[derive(Clone)]
pub struct HttpAutomationGateway {
    http: reqwest::Client,
    endpoint_url: String,
}

impl HttpAutomationGateway {
    pub fn new(config: &AutomationConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            endpoint_url: config.endpoint_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AutomationGateway for HttpAutomationGateway {
    async fn trigger(&self, target: i64) -> Result<u16, ServiceError> {
        let url = format!("{}/{}", self.endpoint_url, target);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("automation trigger: {}", e)))?;

        Ok(response.status().as_u16())
    }
}
