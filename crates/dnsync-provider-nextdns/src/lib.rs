// # NextDNS Profile Clients
//
// This crate implements the profile-scoped clients of the dnsync system
// against the NextDNS API.
//
// ## Architectural Constraints
//
// ### Trust Level: Untrusted (Remote API)
//
// Clients are **untrusted** components with strict limitations:
//
// - One HTTP request per trait call
// - No retry, backoff or pacing (owned by `BatchInvoker`)
// - No caching between calls (every run diffs against fresh remote state)
// - No background tasks
//
// All clients of a process share one `RequestChannel`, which caps the number
// of requests in flight.
//
// ## Security Requirements
//
// - API keys NEVER appear in logs or `Debug` output
// - Rejected keys (401/403) surface as fatal errors, never retried
//
// ## API Reference
//
// - List: GET `/profiles/:id/denylist`, GET `/profiles/:id/rewrites`
// - Create: POST `{"id": domain, "active": true}` / `{"name": domain, "content": ip}`
// - Delete: DELETE `/profiles/:id/denylist/:domain`, `/profiles/:id/rewrites/:id`
// - Auth: `X-Api-Key: <key>`

pub mod channel;
pub mod client;
pub mod dto;
pub mod identity;

pub use channel::RequestChannel;
pub use client::{NextDnsDenyClient, NextDnsEndpoint, NextDnsRewriteClient};
pub use identity::{ApiIdentity, NEXTDNS_API_ROOT, NextDnsIdentity};

use dnsync_core::config::{ChannelConfig, Profile};
use dnsync_core::traits::{DenylistApi, ProfileClientFactory, RewriteApi};
use dnsync_core::Result;
use std::sync::Arc;

/// Provider name accepted in the `DNS` setting
pub const PROVIDER_NAME: &str = "nextdns";

/// Factory for NextDNS profile clients
///
/// Every client built by one factory shares its request channel.
#[derive(Debug, Clone)]
pub struct NextDnsClientFactory {
    channel: RequestChannel,
    api_root: String,
}

impl NextDnsClientFactory {
    /// Create a factory over an existing channel
    pub fn new(channel: RequestChannel) -> Self {
        Self {
            channel,
            api_root: NEXTDNS_API_ROOT.to_string(),
        }
    }

    /// Create a factory with its own channel
    pub fn from_config(config: &ChannelConfig) -> Result<Self> {
        Ok(Self::new(RequestChannel::new(config)?))
    }

    /// Send requests to another API root
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    /// The shared request channel
    pub fn channel(&self) -> &RequestChannel {
        &self.channel
    }

    fn identity(&self, profile: &Profile) -> Result<Arc<NextDnsIdentity>> {
        profile.validate()?;
        Ok(Arc::new(NextDnsIdentity::with_api_root(
            &self.api_root,
            profile.client_id.clone(),
            profile.auth_secret.clone(),
        )))
    }
}

impl ProfileClientFactory for NextDnsClientFactory {
    fn deny_client(&self, profile: &Profile) -> Result<Box<dyn DenylistApi>> {
        Ok(Box::new(NextDnsDenyClient::new(
            self.identity(profile)?,
            self.channel.clone(),
        )))
    }

    fn rewrite_client(&self, profile: &Profile) -> Result<Box<dyn RewriteApi>> {
        Ok(Box::new(NextDnsRewriteClient::new(
            self.identity(profile)?,
            self.channel.clone(),
        )))
    }
}
