//! MediaMTX control API client
//!
//! Speaks the relay's v3 HTTP control API. Every call is bounded by the
//! client's request timeout and every non-2xx status becomes an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, Response, Url};
use tracing::debug;

use super::error::{GatewayError, MAX_RESPONSE_SIZE};
use super::types::{ActiveSession, ActiveSessionList, PathConfig};
use super::MediaGateway;
use crate::config::RelayConfig;

/// MediaMTX HTTP client
#[derive(Clone)]
pub struct MediaMtxClient {
    base_url: Url,
    page_size: u32,
    client: Client,
}

impl MediaMtxClient {
    /// Create a client for the control API at `base_url` (e.g. `http://127.0.0.1:9997`).
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        page_size: u32,
    ) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::InvalidConfig(format!("relay URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidConfig(format!(
                "relay URL {base_url} cannot carry a path"
            )));
        }
        if page_size == 0 {
            return Err(GatewayError::InvalidConfig(
                "list page size must be positive".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout)
            .build()?;

        Ok(Self {
            base_url,
            page_size,
            client,
        })
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.control_url(),
            Duration::from_secs(config.request_timeout_seconds),
            config.list_page_size,
        )
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidConfig("relay URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch_page(&self, page: u64) -> Result<ActiveSessionList, GatewayError> {
        let url = self.endpoint(&["v3", "webrtcsessions", "list"])?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(&[("page", page), ("itemsPerPage", u64::from(self.page_size))])
            .send()
            .await?;

        json_with_limit(check_response(response).await?).await
    }
}

#[async_trait]
impl MediaGateway for MediaMtxClient {
    async fn add_path(&self, name: &str, source: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["v3", "config", "paths", "add", name])?;
        let body = PathConfig {
            name: name.to_string(),
            source: source.to_string(),
        };

        let response = self.client.post(url).json(&body).send().await?;
        check_response(response).await?;

        debug!(path = %name, source = %source, "Relay path added");
        Ok(())
    }

    async fn delete_path(&self, name: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["v3", "config", "paths", "delete", name])?;

        let response = self.client.delete(url).send().await?;
        check_response(response).await?;

        debug!(path = %name, "Relay path deleted");
        Ok(())
    }

    async fn list_active_sessions(&self) -> Result<Vec<ActiveSession>, GatewayError> {
        let first = self.fetch_page(0).await?;
        let (item_count, page_count) = (first.item_count, first.page_count);
        let mut sessions = first.items;

        // Pages are separate requests. Sessions coming or going in between
        // shift items across page boundaries, so any change in the totals
        // means the pages read may have skipped a live session.
        for page in 1..page_count {
            let list = self.fetch_page(page).await?;
            if list.item_count != item_count || list.page_count != page_count {
                return Err(GatewayError::ListingChanged(format!(
                    "page {page} reported {} items in {} pages, page 0 reported {item_count} in {page_count}",
                    list.item_count, list.page_count
                )));
            }
            sessions.extend(list.items);
        }

        if sessions.len() as u64 != item_count {
            return Err(GatewayError::ListingChanged(format!(
                "read {} sessions, relay reported {item_count}",
                sessions.len()
            )));
        }

        debug!(count = sessions.len(), pages = page_count, "Listed relay sessions");
        Ok(sessions)
    }
}

/// Turn a non-2xx response into a classified error, keeping the relay's message.
async fn check_response(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::from_status(status, &body))
}

/// Read a response body with size limit and deserialize as JSON.
async fn json_with_limit<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, GatewayError> {
    if let Some(len) = response.content_length() {
        if len > MAX_RESPONSE_SIZE as u64 {
            return Err(GatewayError::ResponseTooLarge { size: len });
        }
    }
    let bytes = response.bytes().await?;
    if bytes.len() > MAX_RESPONSE_SIZE {
        return Err(GatewayError::ResponseTooLarge {
            size: bytes.len() as u64,
        });
    }
    serde_json::from_slice(&bytes).map_err(Into::into)
}
