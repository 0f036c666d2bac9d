use std::collections::HashSet;
use tracing::info;

use super::{ReconcilePlan, ReconcileReport};
use crate::batch::BatchInvoker;
use crate::desired::DesiredSet;
use crate::traits::{DenylistApi, RemoteEntry};

/// Keeps a profile's denylist in line with the desired domains
#[derive(Debug, Clone)]
pub struct DenyReconciler {
    invoker: BatchInvoker,
    force_rewrite: bool,
}

impl DenyReconciler {
    /// Create a reconciler
    ///
    /// With `force_rewrite` every remote entry is deleted and the whole
    /// desired set recreated.
    pub fn new(invoker: BatchInvoker, force_rewrite: bool) -> Self {
        Self {
            invoker,
            force_rewrite,
        }
    }

    /// Compute the operations for a desired set and the current remote entries
    ///
    /// Normal mode only adds domains: a desired domain with an active remote
    /// entry is left alone, and remote entries are never deleted.
    pub fn plan(&self, desired: &DesiredSet<()>, remote: &[RemoteEntry]) -> ReconcilePlan<String> {
        if self.force_rewrite {
            return ReconcilePlan {
                to_create: desired.domains().map(str::to_string).collect(),
                to_delete: remote.iter().map(|entry| entry.id.clone()).collect(),
                unchanged: 0,
            };
        }

        let active: HashSet<&str> = remote
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.domain.as_str())
            .collect();

        let to_create: Vec<String> = desired
            .domains()
            .filter(|domain| !active.contains(domain))
            .map(str::to_string)
            .collect();

        ReconcilePlan {
            unchanged: desired.len() - to_create.len(),
            to_create,
            to_delete: Vec::new(),
        }
    }

    /// Bring the remote denylist in line with `desired`
    pub async fn reconcile(
        &self,
        client: &dyn DenylistApi,
        desired: &DesiredSet<()>,
    ) -> crate::Result<ReconcileReport> {
        info!("Fetching existing denylist");
        let remote = client.list().await?;
        let plan = self.plan(desired, &remote);

        if !plan.to_delete.is_empty() {
            info!(
                "FORCE_REWRITE enabled: removing all {} existing denylist entries",
                plan.to_delete.len()
            );
            self.delete(client, plan.to_delete.clone()).await?;
        }

        info!(
            "Prepared {} domains to block ({} already blocked)",
            plan.to_create.len(),
            plan.unchanged
        );
        if !plan.to_create.is_empty() {
            info!("Saving {} new denylist entries...", plan.to_create.len());
            self.invoker
                .call_api(plan.to_create.clone(), |domain| async move {
                    client.create(&domain).await
                })
                .await?;
        }

        Ok(ReconcileReport::from(&plan))
    }

    /// Delete every denylist entry of the profile
    ///
    /// # Returns
    ///
    /// The number of deleted entries
    pub async fn remove_all(&self, client: &dyn DenylistApi) -> crate::Result<usize> {
        info!("Fetching existing denylist");
        let ids: Vec<String> = client.list().await?.into_iter().map(|entry| entry.id).collect();
        let count = ids.len();

        info!("Removing {} denylist entries", count);
        self.delete(client, ids).await?;
        Ok(count)
    }

    async fn delete(&self, client: &dyn DenylistApi, ids: Vec<String>) -> crate::Result<()> {
        self.invoker
            .call_api(ids, |id| async move { client.delete_by_id(&id).await })
            .await?;
        Ok(())
    }
}
