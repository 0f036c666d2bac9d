//! Multi-profile sync runner
//!
//! The SyncRunner is responsible for:
//! - Building the profile-scoped clients for each configured profile
//! - Reconciling the denylist and rewrites of each profile
//! - Clearing both resources when no sources are configured at all
//! - Isolating failures per profile and summarizing the run
//!
//! ## Run Flow
//!
//! ```text
//! DesiredSources (loaded once)
//!        │
//!        ▼
//! ┌──────────────┐   per profile, sequentially
//! │  SyncRunner  │──────────────────────────────┐
//! └──────────────┘                              │
//!                                               ▼
//!                 ┌─────────────────┬──────────────────┬──────────────────┐
//!                 │ DenyReconciler  │ RewriteReconciler│ remove_all (both)│
//!                 │ (block sources) │ (rewrite sources)│ (no sources)     │
//!                 └─────────────────┴──────────────────┴──────────────────┘
//! ```
//!
//! A recoverable error ends the current profile only. A fatal error
//! (rejected credentials) ends the whole run.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::batch::BatchInvoker;
use crate::config::{Profile, SyncConfig};
use crate::desired::DesiredSources;
use crate::error::Result;
use crate::reconcile::{DenyReconciler, ReconcileReport, RewriteReconciler};
use crate::traits::ProfileClientFactory;

/// Capacity of the event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Events emitted by the SyncRunner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Run started
    RunStarted {
        profiles_count: usize,
    },

    /// Profile processing started
    ProfileStarted {
        client_id: String,
    },

    /// Profile processed without error
    ProfileSucceeded {
        client_id: String,
        report: ProfileReport,
    },

    /// Profile processing failed, the run continues
    ProfileFailed {
        client_id: String,
        error: String,
    },

    /// A fatal error stopped the run
    RunAborted {
        client_id: String,
        error: String,
    },

    /// Run finished
    RunFinished {
        succeeded: usize,
        failed: usize,
    },
}

/// What happened to one profile during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileReport {
    /// Denylist reconciliation, when block sources were configured
    pub deny: Option<ReconcileReport>,
    /// Rewrite reconciliation, when rewrite sources were configured
    pub rewrite: Option<ReconcileReport>,
    /// Denylist entries removed because no sources were configured
    pub removed_denies: Option<usize>,
    /// Rewrites removed because no sources were configured
    pub removed_rewrites: Option<usize>,
}

/// Result of one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOutcome {
    /// Profile identifier
    pub client_id: String,
    /// Name used in logs
    pub display_name: String,
    /// Report on success, error message on failure
    pub result: std::result::Result<ProfileReport, String>,
}

impl ProfileOutcome {
    /// Whether the profile was processed without error
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// One outcome per processed profile, in processing order
    pub outcomes: Vec<ProfileOutcome>,
}

impl RunSummary {
    /// Number of profiles processed without error
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of profiles that ended in error
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Whether every profile was processed without error
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Multi-profile sync runner
///
/// ## Lifecycle
///
/// 1. Create with [`SyncRunner::new()`]
/// 2. Load the [`DesiredSources`] once
/// 3. Call [`SyncRunner::run()`]
///
/// Profiles are processed strictly one after another.
pub struct SyncRunner {
    /// Builds the per-profile clients
    factory: Arc<dyn ProfileClientFactory>,

    /// Profiles to synchronize
    profiles: Vec<Profile>,

    /// Denylist reconciliation
    deny: DenyReconciler,

    /// Rewrite reconciliation
    rewrite: RewriteReconciler,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncRunner {
    /// Create a new runner
    ///
    /// # Returns
    ///
    /// A tuple of (runner, event_receiver) where event_receiver yields run events
    pub fn new(
        factory: Arc<dyn ProfileClientFactory>,
        config: &SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let invoker = BatchInvoker::from_config(&config.rate_limit);

        let runner = Self {
            factory,
            profiles: config.profiles.clone(),
            deny: DenyReconciler::new(invoker.clone(), config.force_rewrite),
            rewrite: RewriteReconciler::new(invoker, config.force_rewrite),
            event_tx: tx,
        };

        Ok((runner, rx))
    }

    /// Synchronize every profile against the shared desired sources
    ///
    /// # Returns
    ///
    /// - `Ok(RunSummary)`: Every profile was attempted; check
    ///   [`RunSummary::is_success()`] for per-profile failures
    /// - `Err(Error)`: A fatal error stopped the run
    pub async fn run(&self, sources: &DesiredSources) -> Result<RunSummary> {
        self.emit_event(SyncEvent::RunStarted {
            profiles_count: self.profiles.len(),
        });

        if sources.is_empty() {
            warn!("No sources provided: all denylist and rewrite entries will be removed");
        }

        let mut summary = RunSummary::default();
        let total = self.profiles.len();

        for (index, profile) in self.profiles.iter().enumerate() {
            let display_name = profile.display_name();
            info!("Processing profile {}/{}: {}", index + 1, total, display_name);
            self.emit_event(SyncEvent::ProfileStarted {
                client_id: profile.client_id.clone(),
            });

            let result = match self.process_profile(profile, sources).await {
                Ok(report) => {
                    info!("Profile {} processed successfully", display_name);
                    self.emit_event(SyncEvent::ProfileSucceeded {
                        client_id: profile.client_id.clone(),
                        report: report.clone(),
                    });
                    Ok(report)
                }
                Err(e) if e.is_fatal() => {
                    error!("Aborting run on profile {}: {}", display_name, e);
                    self.emit_event(SyncEvent::RunAborted {
                        client_id: profile.client_id.clone(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
                Err(e) => {
                    // Continue with the next profile
                    error!("Error processing profile {}: {}", display_name, e);
                    self.emit_event(SyncEvent::ProfileFailed {
                        client_id: profile.client_id.clone(),
                        error: e.to_string(),
                    });
                    Err(e.to_string())
                }
            };

            summary.outcomes.push(ProfileOutcome {
                client_id: profile.client_id.clone(),
                display_name,
                result,
            });
        }

        info!(
            "Summary: {} profiles processed successfully, {} with errors",
            summary.succeeded(),
            summary.failed()
        );
        self.emit_event(SyncEvent::RunFinished {
            succeeded: summary.succeeded(),
            failed: summary.failed(),
        });

        Ok(summary)
    }

    /// Reconcile one profile
    async fn process_profile(
        &self,
        profile: &Profile,
        sources: &DesiredSources,
    ) -> Result<ProfileReport> {
        let deny_client = self.factory.deny_client(profile)?;
        let rewrite_client = self.factory.rewrite_client(profile)?;
        let mut report = ProfileReport::default();

        if let Some(desired) = sources.deny_set() {
            info!("Processing denylist for profile {}", profile.client_id);
            report.deny = Some(self.deny.reconcile(deny_client.as_ref(), &desired).await?);
        }

        if let Some(desired) = sources.rewrite_set(profile) {
            info!("Processing rewrites for profile {}", profile.client_id);
            report.rewrite = Some(
                self.rewrite
                    .reconcile(rewrite_client.as_ref(), &desired)
                    .await?,
            );
        }

        if sources.is_empty() {
            info!("Removing settings for profile {}", profile.client_id);
            report.removed_denies = Some(self.deny.remove_all(deny_client.as_ref()).await?);
            report.removed_rewrites = Some(self.rewrite.remove_all(rewrite_client.as_ref()).await?);
        }

        Ok(report)
    }

    /// Emit a run event
    fn emit_event(&self, event: SyncEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event");
        }
    }
}
