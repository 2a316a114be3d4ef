use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Local;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::UnleashedConfig;
use crate::errors::ServiceError;
use crate::unleashed::types::{
    AdjustmentInfo, AdjustmentReason, BatchStock, ItemsPage, PostedAdjustment, Product,
    StockAdjustmentLine, StockAdjustmentRequest, StockOnHand, WarehouseRef,
};

type HmacSha256 = Hmac<Sha256>;

/// Read access to the external product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn all_products(&self) -> Result<Vec<Product>, ServiceError>;
}

/// Posting and status access for external stock adjustments.
///
/// Input validation is the external system's responsibility; callers pass
/// through whatever they computed, minus unresolvable lines. Retry of the
/// posting call itself is never performed here.
#[async_trait]
pub trait StockAdjustmentGateway: Send + Sync {
    async fn post_adjustment(
        &self,
        lines: Vec<StockAdjustmentLine>,
        location: &str,
        reason: AdjustmentReason,
        idempotency_key: &str,
    ) -> Result<PostedAdjustment, ServiceError>;

    async fn adjustment_status(&self, id: &str) -> Result<AdjustmentInfo, ServiceError>;
}

/// HTTP client for the Unleashed inventory API.
///
/// Every request carries the account identity in `api-auth-id` and an
/// HMAC-SHA256 signature of the query string (base64) in
/// `api-auth-signature`.
#[derive(Clone)]
pub struct UnleashedClient {
    http: reqwest::Client,
    base_url: String,
    api_id: String,
    api_key: String,
}

impl UnleashedClient {
    pub fn new(config: &UnleashedConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_id: config.api_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Signs the request query string (the part after `?`, empty for none).
    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.api_key.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(query.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    fn headers(&self, query: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "api-auth-id",
            HeaderValue::from_str(&self.api_id).unwrap_or(HeaderValue::from_static("")),
        );
        headers.insert(
            "api-auth-signature",
            HeaderValue::from_str(&self.sign(query)).unwrap_or(HeaderValue::from_static("")),
        );
        headers
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &str,
    ) -> Result<T, ServiceError> {
        let url = if query.is_empty() {
            format!("{}/{}", self.base_url, path)
        } else {
            format!("{}/{}?{}", self.base_url, path, query)
        };
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .headers(self.headers(query))
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("GET {}: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalApiError(format!(
                "GET {} returned {}",
                path,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::SerializationError(format!("GET {}: {}", path, e)))
    }

    #[instrument(skip(self))]
    pub async fn product_stock(
        &self,
        product_code: Option<&str>,
    ) -> Result<Vec<BatchStock>, ServiceError> {
        let query = match product_code {
            Some(code) => format!("pageSize=200&ProductCode={}", code),
            None => "pageSize=200".to_string(),
        };
        let page: ItemsPage<BatchStock> = self.get_json("BatchNumbers", &query).await?;
        Ok(page.items)
    }

    #[instrument(skip(self))]
    pub async fn stock_on_hand(&self) -> Result<Vec<StockOnHand>, ServiceError> {
        let page: ItemsPage<StockOnHand> = self.get_json("StockOnHand", "pageSize=1000").await?;
        Ok(page.items)
    }

    /// Bulk products restricted to the raw/bulk product group, used to
    /// offer raw varieties when building a BOM.
    #[instrument(skip(self))]
    pub async fn bulk_products(&self) -> Result<Vec<Product>, ServiceError> {
        let page: ItemsPage<Product> = self
            .get_json("Products", "productGroup=BULK&pageSize=10")
            .await?;
        Ok(page.items)
    }

    /// Walks every page of recent stock adjustments.
    #[instrument(skip(self))]
    pub async fn list_adjustments(&self) -> Result<Vec<AdjustmentInfo>, ServiceError> {
        let page_size = 1000;
        let mut page_number = 1;
        let mut total_pages = 1;
        let mut combined = Vec::new();

        while page_number <= total_pages {
            let query = format!("pageSize={}", page_size);
            let path = format!("StockAdjustments/{}", page_number);
            let page: ItemsPage<AdjustmentInfo> = self.get_json(&path, &query).await?;
            if let Some(pagination) = &page.pagination {
                total_pages = pagination.number_of_pages.max(1);
            }
            combined.extend(page.items);
            page_number += 1;
        }

        Ok(combined)
    }
}

#[async_trait]
impl ProductCatalog for UnleashedClient {
    async fn all_products(&self) -> Result<Vec<Product>, ServiceError> {
        let page: ItemsPage<Product> = self.get_json("Products", "pageSize=200").await?;
        Ok(page.items)
    }
}

#[async_trait]
impl StockAdjustmentGateway for UnleashedClient {
    async fn post_adjustment(
        &self,
        lines: Vec<StockAdjustmentLine>,
        location: &str,
        reason: AdjustmentReason,
        idempotency_key: &str,
    ) -> Result<PostedAdjustment, ServiceError> {
        let body = StockAdjustmentRequest {
            warehouse: WarehouseRef {
                warehouse_code: location.to_string(),
            },
            adjustment_date: Local::now().format("%Y-%m-%d").to_string(),
            adjustment_reason: reason.as_str().to_string(),
            status: "Parked".to_string(),
            stock_adjustment_lines: lines,
        };

        let url = format!("{}/StockAdjustments/", self.base_url);
        let response = self
            .http
            .post(&url)
            .headers(self.headers(""))
            .header("X-Idempotency-Key", idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("POST StockAdjustments: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            warn!("Stock adjustment rejected ({}): {}", status, detail);
            return Err(ServiceError::ExternalApiError(format!(
                "POST StockAdjustments returned {}",
                status
            )));
        }

        response
            .json::<PostedAdjustment>()
            .await
            .map_err(|e| ServiceError::SerializationError(format!("POST StockAdjustments: {}", e)))
    }

    async fn adjustment_status(&self, id: &str) -> Result<AdjustmentInfo, ServiceError> {
        let path = format!("StockAdjustments/{}", id.to_uppercase());
        let page: ItemsPage<AdjustmentInfo> = self.get_json(&path, "").await?;
        page.items.into_iter().next().ok_or_else(|| {
            ServiceError::NotFound(format!("stock adjustment {} not found", id))
        })
    }
}
