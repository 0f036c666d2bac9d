// # Profile API Traits
//
// Defines the interface for reading and mutating one profile's remote
// denylist and rewrite entries.
//
// ## Implementations
//
// - NextDNS: `dnsync-provider-nextdns` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsync_core::DenylistApi;
//
// async fn block(client: &dyn DenylistApi) -> dnsync_core::Result<()> {
//     let existing = client.list().await?;
//     if !existing.iter().any(|e| e.domain == "ads.example.com") {
//         client.create("ads.example.com").await?;
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::config::Profile;

/// The remote's view of a single entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Opaque remote identifier (used for deletion)
    pub id: String,
    /// Domain the entry applies to
    pub domain: String,
    /// Target value (rewrite entries only)
    pub target: Option<String>,
    /// Inactive entries count as absent when diffing
    pub active: bool,
}

impl RemoteEntry {
    /// A denylist entry
    pub fn deny(id: impl Into<String>, domain: impl Into<String>, active: bool) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            target: None,
            active,
        }
    }

    /// A rewrite entry (always active)
    pub fn rewrite(
        id: impl Into<String>,
        domain: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            target: Some(target.into()),
            active: true,
        }
    }
}

/// Trait for a profile's denylist resource
///
/// # Trust Level: Untrusted
///
/// Implementations perform exactly one remote call per method invocation.
/// They must not retry, cache, or pace requests: pacing is owned by
/// [`crate::BatchInvoker`] and the diff by the reconcilers.
#[async_trait]
pub trait DenylistApi: Send + Sync {
    /// List every denylist entry of the profile
    async fn list(&self) -> crate::Result<Vec<RemoteEntry>>;

    /// Block a domain
    async fn create(&self, domain: &str) -> crate::Result<RemoteEntry>;

    /// Delete an entry by its remote identifier
    async fn delete_by_id(&self, id: &str) -> crate::Result<()>;
}

/// Trait for a profile's rewrite resource
///
/// Same constraints as [`DenylistApi`].
#[async_trait]
pub trait RewriteApi: Send + Sync {
    /// List every rewrite entry of the profile
    async fn list(&self) -> crate::Result<Vec<RemoteEntry>>;

    /// Map a domain to a target IP
    async fn create(&self, domain: &str, target: IpAddr) -> crate::Result<RemoteEntry>;

    /// Delete an entry by its remote identifier
    async fn delete_by_id(&self, id: &str) -> crate::Result<()>;
}

/// Helper trait for constructing profile-scoped clients
///
/// Construction must be pure: no I/O happens until an operation is called.
pub trait ProfileClientFactory: Send + Sync {
    /// Create the denylist client for a profile
    fn deny_client(&self, profile: &Profile) -> crate::Result<Box<dyn DenylistApi>>;

    /// Create the rewrite client for a profile
    fn rewrite_client(&self, profile: &Profile) -> crate::Result<Box<dyn RewriteApi>>;
}
