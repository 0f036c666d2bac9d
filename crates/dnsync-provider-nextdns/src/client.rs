//! Profile-scoped NextDNS clients
//!
//! Each client performs exactly one request per trait call. Pacing and
//! diffing belong to the core reconcilers.

use async_trait::async_trait;
use dnsync_core::{DenylistApi, RemoteEntry, Result, RewriteApi};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::sync::Arc;

use crate::channel::RequestChannel;
use crate::dto::{
    CreateDenyDto, CreateRewriteDto, DenyDto, ListResponse, RewriteDto, SingleResponse,
};
use crate::identity::{ApiIdentity, NextDnsIdentity};

/// Denylist resource path
pub const DENYLIST_PATH: &str = "/denylist";

/// Rewrites resource path
pub const REWRITES_PATH: &str = "/rewrites";

/// One resource of one profile
#[derive(Debug, Clone)]
pub struct NextDnsEndpoint {
    identity: Arc<NextDnsIdentity>,
    channel: RequestChannel,
    path: &'static str,
}

impl NextDnsEndpoint {
    /// Bind `path` of the profile behind `identity` to a channel
    pub fn new(identity: Arc<NextDnsIdentity>, channel: RequestChannel, path: &'static str) -> Self {
        Self {
            identity,
            channel,
            path,
        }
    }

    /// Full URL of the resource
    pub fn url(&self) -> String {
        format!("{}{}", self.identity.base_url(), self.path)
    }

    async fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let response: Option<ListResponse<T>> = self
            .channel
            .execute::<(), _>(&*self.identity, Method::GET, self.path, None)
            .await?;
        Ok(response.map(|r| r.data).unwrap_or_default())
    }

    async fn create<B, T>(&self, body: &B) -> Result<Option<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response: Option<SingleResponse<T>> = self
            .channel
            .execute(&*self.identity, Method::POST, self.path, Some(body))
            .await?;
        Ok(response.map(|r| r.data))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = format!("{}/{}", self.path, id);
        self.channel
            .execute::<(), serde_json::Value>(&*self.identity, Method::DELETE, &path, None)
            .await?;
        Ok(())
    }
}

/// Denylist of one profile
#[derive(Debug, Clone)]
pub struct NextDnsDenyClient {
    endpoint: NextDnsEndpoint,
}

impl NextDnsDenyClient {
    /// Create a client for the denylist of one profile
    pub fn new(identity: Arc<NextDnsIdentity>, channel: RequestChannel) -> Self {
        Self {
            endpoint: NextDnsEndpoint::new(identity, channel, DENYLIST_PATH),
        }
    }

    /// Endpoint this client sends its requests to
    pub fn endpoint(&self) -> &NextDnsEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl DenylistApi for NextDnsDenyClient {
    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        let items: Vec<DenyDto> = self.endpoint.list().await?;
        Ok(items.into_iter().map(RemoteEntry::from).collect())
    }

    async fn create(&self, domain: &str) -> Result<RemoteEntry> {
        let body = CreateDenyDto {
            id: domain,
            active: true,
        };
        let created: Option<DenyDto> = self.endpoint.create(&body).await?;
        Ok(created
            .map(RemoteEntry::from)
            .unwrap_or_else(|| RemoteEntry::deny(domain, domain, true)))
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.endpoint.delete(id).await
    }
}

/// Rewrites of one profile
#[derive(Debug, Clone)]
pub struct NextDnsRewriteClient {
    endpoint: NextDnsEndpoint,
}

impl NextDnsRewriteClient {
    /// Create a client for the rewrites of one profile
    pub fn new(identity: Arc<NextDnsIdentity>, channel: RequestChannel) -> Self {
        Self {
            endpoint: NextDnsEndpoint::new(identity, channel, REWRITES_PATH),
        }
    }

    /// Endpoint this client sends its requests to
    pub fn endpoint(&self) -> &NextDnsEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl RewriteApi for NextDnsRewriteClient {
    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        let items: Vec<RewriteDto> = self.endpoint.list().await?;
        Ok(items.into_iter().map(RemoteEntry::from).collect())
    }

    async fn create(&self, domain: &str, target: IpAddr) -> Result<RemoteEntry> {
        let body = CreateRewriteDto {
            name: domain,
            content: target.to_string(),
        };
        let created: Option<RewriteDto> = self.endpoint.create(&body).await?;
        // Without a response body the remote id is unknown
        Ok(created
            .map(RemoteEntry::from)
            .unwrap_or_else(|| RemoteEntry::rewrite(String::new(), domain, target.to_string())))
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.endpoint.delete(id).await
    }
}
