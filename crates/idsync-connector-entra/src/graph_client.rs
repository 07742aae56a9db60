//! Microsoft Graph HTTP client with retry and pagination.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{EntraError, EntraResult, TokenCache};

/// Longest pause honored from a `Retry-After` header.
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// `OData` error response from Microsoft Graph.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

/// `OData` error body.
#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
    #[serde(rename = "innerError")]
    pub inner_error: Option<serde_json::Value>,
}

/// Response wrapper for paginated Graph API responses.
#[derive(Debug, Deserialize)]
pub struct ODataResponse<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Read-only Microsoft Graph client.
#[derive(Debug)]
pub struct GraphClient {
    http_client: reqwest::Client,
    token_cache: Arc<TokenCache>,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    page_delay: Duration,
}

impl GraphClient {
    pub fn new(
        http_client: reqwest::Client,
        token_cache: Arc<TokenCache>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            token_cache,
            base_url: base_url.into(),
            max_retries: 5,
            retry_delay: Duration::from_secs(1),
            page_delay: Duration::from_millis(100),
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Initial backoff for transient errors; doubled on each retry.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Pause between consecutive result pages.
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Returns the base URL for Graph API requests.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a resource path with optional query parameters.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> EntraResult<String> {
        let mut url = url::Url::parse(&format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }

    /// Performs a GET request with token injection and retry handling.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> EntraResult<T> {
        let mut retries = 0;
        let mut delay = self.retry_delay;

        loop {
            let token = self.token_cache.get_token().await?;
            let response = self
                .http_client
                .get(url)
                .bearer_auth(&token)
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(1)
                    .min(MAX_RETRY_AFTER_SECS);
                if retries >= self.max_retries {
                    return Err(EntraError::RateLimited { retry_after_secs });
                }
                retries += 1;
                warn!(
                    "Throttled by Graph, retry {}/{} after {}s",
                    retries, self.max_retries, retry_after_secs
                );
                tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                continue;
            }

            if matches!(
                status,
                reqwest::StatusCode::BAD_GATEWAY
                    | reqwest::StatusCode::SERVICE_UNAVAILABLE
                    | reqwest::StatusCode::GATEWAY_TIMEOUT
            ) && retries < self.max_retries
            {
                retries += 1;
                warn!(
                    "Transient error {}, retry {}/{} after {:?}",
                    status, retries, self.max_retries, delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }

            if status.is_success() {
                return response.json().await.map_err(EntraError::from);
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.token_cache.invalidate().await;
            }

            let error_body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EntraError::NotFound(url.to_string()));
            }
            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(EntraError::PermissionDenied(url.to_string()));
            }
            if let Ok(odata_error) = serde_json::from_str::<ODataError>(&error_body) {
                return Err(EntraError::GraphApi {
                    code: odata_error.error.code,
                    message: odata_error.error.message,
                    inner_error: odata_error.error.inner_error.map(|v| v.to_string()),
                });
            }

            return Err(EntraError::GraphApi {
                code: status.to_string(),
                message: error_body,
                inner_error: None,
            });
        }
    }

    /// Follow `@odata.nextLink` until exhausted and collect every item.
    #[instrument(skip(self))]
    pub async fn get_all_pages<T: DeserializeOwned>(&self, initial_url: &str) -> EntraResult<Vec<T>> {
        let mut items = Vec::new();
        let mut url = initial_url.to_string();

        loop {
            debug!("Fetching page: {}", url);
            let page: ODataResponse<T> = self.get(&url).await?;
            items.extend(page.value);

            match page.next_link {
                Some(next) => {
                    url = next;
                    if !self.page_delay.is_zero() {
                        tokio::time::sleep(self.page_delay).await;
                    }
                }
                None => return Ok(items),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntraConfig;

    #[test]
    fn test_odata_error_parsing() {
        let json = r#"{
            "error": {
                "code": "Request_ResourceNotFound",
                "message": "Resource not found",
                "innerError": {"date": "2024-01-15"}
            }
        }"#;

        let error: ODataError = serde_json::from_str(json).unwrap();
        assert_eq!(error.error.code, "Request_ResourceNotFound");
        assert!(error.error.inner_error.is_some());
    }

    #[test]
    fn test_odata_response_without_next_link() {
        let json = r#"{"value": [{"id": "1"}, {"id": "2"}]}"#;
        let response: ODataResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(response.value.len(), 2);
        assert!(response.next_link.is_none());
    }

    #[test]
    fn test_url_encodes_query() {
        let config = EntraConfig::new("t", "c", "s");
        let http = reqwest::Client::new();
        let client = GraphClient::new(
            http.clone(),
            Arc::new(TokenCache::new(&config, http)),
            config.graph_base_url(),
        );
        let url = client
            .url("/groups", &[("$filter", "displayName eq 'Dev Ops'")])
            .unwrap();
        assert!(url.starts_with("https://graph.microsoft.com/v1.0/groups?"));
        assert!(url.contains("%24filter=displayName+eq+%27Dev+Ops%27"));
    }
}
