use std::collections::HashSet;
use std::net::IpAddr;
use tracing::{debug, info};

use super::{ReconcilePlan, ReconcileReport};
use crate::batch::BatchInvoker;
use crate::desired::{DesiredSet, RewriteRoute};
use crate::traits::{RemoteEntry, RewriteApi};

/// Keeps a profile's rewrites in line with the desired routes
#[derive(Debug, Clone)]
pub struct RewriteReconciler {
    invoker: BatchInvoker,
    force_rewrite: bool,
}

impl RewriteReconciler {
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
    /// In normal mode, for each remote entry whose domain is desired:
    /// - a different target marks the entry stale (deleted, desired route
    ///   recreated)
    /// - a matching target keeps it; any further exact duplicate is deleted
    ///
    /// Remote entries for domains that are not desired are left untouched.
    pub fn plan(
        &self,
        desired: &DesiredSet<IpAddr>,
        remote: &[RemoteEntry],
    ) -> ReconcilePlan<RewriteRoute> {
        if self.force_rewrite {
            return ReconcilePlan {
                to_create: desired
                    .iter()
                    .map(|(domain, ip)| RewriteRoute::new(*ip, domain))
                    .collect(),
                to_delete: remote.iter().map(|entry| entry.id.clone()).collect(),
                unchanged: 0,
            };
        }

        let mut satisfied: HashSet<&str> = HashSet::new();
        let mut to_delete = Vec::new();

        for entry in remote {
            let Some(ip) = desired.get(&entry.domain) else {
                continue;
            };

            if !target_matches(entry.target.as_deref(), ip) {
                debug!(
                    "Stale rewrite {} -> {:?} (want {})",
                    entry.domain, entry.target, ip
                );
                to_delete.push(entry.id.clone());
            } else if !satisfied.insert(entry.domain.as_str()) {
                debug!("Duplicate rewrite {} ({})", entry.domain, entry.id);
                to_delete.push(entry.id.clone());
            }
        }

        let to_create: Vec<RewriteRoute> = desired
            .iter()
            .filter(|(domain, _)| !satisfied.contains(domain))
            .map(|(domain, ip)| RewriteRoute::new(*ip, domain))
            .collect();

        ReconcilePlan {
            unchanged: satisfied.len(),
            to_create,
            to_delete,
        }
    }

    /// Bring the remote rewrites in line with `desired`
    pub async fn reconcile(
        &self,
        client: &dyn RewriteApi,
        desired: &DesiredSet<IpAddr>,
    ) -> crate::Result<ReconcileReport> {
        info!("Fetching existing rewrites");
        let remote = client.list().await?;
        let plan = self.plan(desired, &remote);

        if !plan.to_delete.is_empty() {
            if self.force_rewrite {
                info!(
                    "FORCE_REWRITE enabled: removing all {} existing rewrites",
                    plan.to_delete.len()
                );
            } else {
                info!("Removing {} outdated rewrites", plan.to_delete.len());
            }
            self.delete(client, plan.to_delete.clone()).await?;
        }

        info!(
            "Prepared {} domains to rewrite ({} already up to date)",
            plan.to_create.len(),
            plan.unchanged
        );
        if !plan.to_create.is_empty() {
            info!("Saving {} new rewrites...", plan.to_create.len());
            self.invoker
                .call_api(plan.to_create.clone(), |route| async move {
                    client.create(&route.domain, route.ip).await
                })
                .await?;
        }

        Ok(ReconcileReport::from(&plan))
    }

    /// Delete every rewrite of the profile
    ///
    /// # Returns
    ///
    /// The number of deleted entries
    pub async fn remove_all(&self, client: &dyn RewriteApi) -> crate::Result<usize> {
        info!("Fetching existing rewrites");
        let ids: Vec<String> = client.list().await?.into_iter().map(|entry| entry.id).collect();
        let count = ids.len();

        info!("Removing {} rewrites", count);
        self.delete(client, ids).await?;
        Ok(count)
    }

    async fn delete(&self, client: &dyn RewriteApi, ids: Vec<String>) -> crate::Result<()> {
        self.invoker
            .call_api(ids, |id| async move { client.delete_by_id(&id).await })
            .await?;
        Ok(())
    }
}

/// Remote targets are compared as addresses when they parse, so equivalent
/// spellings of the same IPv6 address match.
fn target_matches(remote: Option<&str>, desired: &IpAddr) -> bool {
    match remote {
        Some(target) => match target.parse::<IpAddr>() {
            Ok(ip) => ip == *desired,
            Err(_) => target == desired.to_string(),
        },
        None => false,
    }
}
