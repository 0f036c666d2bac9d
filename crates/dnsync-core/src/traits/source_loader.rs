// # Source Loader Trait
//
// Defines the interface for obtaining the desired state from external lists.
//
// ## Implementations
//
// - HTTP hosts-format lists: `dnsync-source-http` crate

use async_trait::async_trait;

use crate::desired::RewriteRoute;

/// Trait for loading desired entries from a set of source locations
///
/// Loaders are called once per run; the result is shared by every profile.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    /// Load the domains to block from every source, in source order
    async fn load_blocklist(&self, sources: &[String]) -> crate::Result<Vec<String>>;

    /// Load the rewrite routes from every source, in source order
    async fn load_rewrites(&self, sources: &[String]) -> crate::Result<Vec<RewriteRoute>>;
}
