//! Request identities
//!
//! An identity tells the [`crate::RequestChannel`] where a request goes and
//! how it authenticates. It also owns the reaction to rejected credentials.

use std::fmt;

/// NextDNS API root
pub const NEXTDNS_API_ROOT: &str = "https://api.nextdns.io";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Who a request is sent as
pub trait ApiIdentity: Send + Sync {
    /// URL every request path is appended to
    fn base_url(&self) -> &str;

    /// Name of the authentication header
    fn auth_header_name(&self) -> &'static str;

    /// Value of the authentication header
    /// ⚠️ NEVER log this value
    fn auth_header_value(&self) -> &str;

    /// Called once the remote answered 401
    fn on_unauthorized(&self) {}

    /// Called once the remote answered 403
    fn on_forbidden(&self) {}
}

/// One NextDNS profile's identity
#[derive(Clone)]
pub struct NextDnsIdentity {
    client_id: String,
    api_key: String,
    base_url: String,
}

impl NextDnsIdentity {
    /// Identity against the public NextDNS API
    pub fn new(client_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_api_root(NEXTDNS_API_ROOT, client_id, api_key)
    }

    /// Identity against another API root (a mock server in tests)
    pub fn with_api_root(
        api_root: &str,
        client_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client_id = client_id.into();
        let base_url = format!("{}/profiles/{}", api_root.trim_end_matches('/'), client_id);
        Self {
            client_id,
            api_key: api_key.into(),
            base_url,
        }
    }

    /// Profile identifier
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl ApiIdentity for NextDnsIdentity {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_header_name(&self) -> &'static str {
        API_KEY_HEADER
    }

    fn auth_header_value(&self) -> &str {
        &self.api_key
    }

    fn on_unauthorized(&self) {
        tracing::error!("Invalid API key for profile {}", self.client_id);
    }

    fn on_forbidden(&self) {
        tracing::error!(
            "Access to profile {} is forbidden: the API key does not own it",
            self.client_id
        );
    }
}

// The API key is redacted
impl fmt::Debug for NextDnsIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NextDnsIdentity")
            .field("client_id", &self.client_id)
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
