use std::time::Duration;

use checkout_core::{BatchConfig, RemoteError, WorkItem};
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde_json::{json, Value};

/// The per-item remote action. Implementations perform one attempt; retries
/// are the executor's business.
#[async_trait::async_trait]
pub trait RemoteCall: Send + Sync {
    async fn call(&self, item: &WorkItem, config: &BatchConfig) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone)]
pub struct AlmaSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for AlmaSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api-na.hosted.exlibrisgroup.com".to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Creates loans through `POST /almaws/v1/users/{id}/loans`.
#[derive(Debug, Clone)]
pub struct AlmaLoanClient {
    settings: AlmaSettings,
    client: reqwest::Client,
}

impl AlmaLoanClient {
    pub fn new(settings: AlmaSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { settings, client })
    }

    fn loan_url(&self, identifier: &str, barcode: &str) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|err| RemoteError::transport(format!("invalid base url: {err}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| RemoteError::transport("base url cannot carry a path"))?;
            segments
                .pop_if_empty()
                .extend(["almaws", "v1", "users", identifier, "loans"]);
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("item_barcode", barcode);
            if let Some(key) = self.settings.api_key.as_deref() {
                query.append_pair("apikey", key);
            }
        }
        Ok(url)
    }
}

fn loan_body(config: &BatchConfig) -> Value {
    json!({
        "circ_desk": { "value": config.circ_desk },
        "library": { "value": config.library },
    })
}

#[async_trait::async_trait]
impl RemoteCall for AlmaLoanClient {
    async fn call(&self, item: &WorkItem, config: &BatchConfig) -> Result<(), RemoteError> {
        let url = self.loan_url(&item.identifier, &item.token)?;

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&loan_body(config))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let mut err = RemoteError::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("request failed"),
        );
        if let Ok(payload) = serde_json::from_str::<Value>(&body) {
            err = err.with_payload(payload);
        }
        Err(err)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::transport(format!("timeout: {err}"));
    }
    RemoteError::transport(err.to_string())
}
