//! Authenticated request channel
//!
//! Every NextDNS request of the process goes through one channel:
//!
//! - in-flight requests are capped by a permit pool shared by all clones
//! - the identity's auth header and a JSON content type are always sent
//! - non-2xx responses are logged, then mapped onto the error taxonomy
//!
//! 401 and 403 yield [`Error::Authentication`] / [`Error::Authorization`],
//! which the runner treats as fatal. The channel itself never retries.

use dnsync_core::{ChannelConfig, Error, Result};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::identity::ApiIdentity;

/// Shared HTTP channel with a process-wide concurrency ceiling
#[derive(Debug, Clone)]
pub struct RequestChannel {
    /// HTTP client (connection pool, timeout)
    client: reqwest::Client,

    /// In-flight request permits
    permits: Arc<Semaphore>,

    /// Size of the permit pool
    max_in_flight: usize,
}

impl RequestChannel {
    /// Create a channel from its configuration
    pub fn new(config: &ChannelConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_in_flight)),
            max_in_flight: config.max_in_flight,
        })
    }

    /// Size of the permit pool
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Permits currently free
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Requests currently holding a permit
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.available_permits()
    }

    /// Send one request as `identity`
    ///
    /// The URL is the identity's base URL followed by `path`. Waits for a
    /// permit when the ceiling is reached; the permit is held until the
    /// response body has been read.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(R))`: Decoded response body
    /// - `Ok(None)`: Successful response with an empty body
    /// - `Err(Error)`: Transport failure, non-2xx status, or undecodable body
    pub async fn execute<B, R>(
        &self,
        identity: &dyn ApiIdentity,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<R>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", identity.base_url(), path);
        let payload = body.map(serde_json::to_vec).transpose()?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::http("Request channel is closed"))?;

        debug!("{} {}", method, url);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(identity.auth_header_name(), identity.auth_header_value())
            .header(CONTENT_TYPE, "application/json");
        if let Some(payload) = payload {
            request = request.body(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} {} failed: {}", method, url, e)))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response of {} {}: {}", method, url, e)))?;

        if status > 299 {
            error!(
                "Request failed! Status: {} for {} {}, reason: {}",
                status, method, url, text
            );
            return Err(match status {
                401 => {
                    identity.on_unauthorized();
                    Error::Authentication { body: text }
                }
                403 => {
                    identity.on_forbidden();
                    Error::Authorization { body: text }
                }
                _ => Error::remote_api(status, text),
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&text)?))
    }
}
