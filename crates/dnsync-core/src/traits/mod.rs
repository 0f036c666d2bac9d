//! Core traits for the dnsync system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DenylistApi`] / [`RewriteApi`]: One profile's remote resources
//! - [`ProfileClientFactory`]: Builds the per-profile clients
//! - [`SourceLoader`]: Loads the desired block and override lists

pub mod profile_api;
pub mod source_loader;

pub use profile_api::{DenylistApi, ProfileClientFactory, RemoteEntry, RewriteApi};
pub use source_loader::SourceLoader;
