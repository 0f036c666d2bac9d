// # dnsync-core
//
// Core library for keeping remote DNS-filtering profiles in sync with
// externally supplied block and override lists.
//
// ## Architecture Overview
//
// - **DenylistApi / RewriteApi**: Traits for one profile's remote resources
// - **ProfileClientFactory**: Builds the per-profile clients
// - **SourceLoader**: Trait for loading the desired block/override lists
// - **BatchInvoker**: Paced, batched execution of remote mutations
// - **DenyReconciler / RewriteReconciler**: Diff desired vs. remote state
// - **SyncRunner**: Drives every configured profile through one run
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic knows nothing about HTTP
// 2. **Fresh State**: Every run diffs against the remote's current content
// 3. **Isolation**: A failing profile never stops the others
// 4. **Explicit Fatal Errors**: Rejected credentials surface as a distinct
//    error variant instead of terminating the process from inside the library

pub mod batch;
pub mod config;
pub mod desired;
pub mod error;
pub mod reconcile;
pub mod runner;
pub mod traits;

pub use batch::BatchInvoker;
pub use config::{ChannelConfig, Profile, RateLimitConfig, SyncConfig};
pub use desired::{DesiredSet, DesiredSources, RewriteRoute};
pub use error::{Error, Result};
pub use reconcile::{DenyReconciler, ReconcilePlan, ReconcileReport, RewriteReconciler};
pub use runner::{ProfileOutcome, ProfileReport, RunSummary, SyncEvent, SyncRunner};
pub use traits::{DenylistApi, ProfileClientFactory, RemoteEntry, RewriteApi, SourceLoader};
