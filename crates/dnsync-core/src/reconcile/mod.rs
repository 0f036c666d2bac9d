//! Reconciliation of desired entries against a profile's remote state
//!
//! Both reconcilers follow the same shape:
//!
//! 1. List the remote entries
//! 2. Compute a [`ReconcilePlan`] (pure, see `plan()` on each reconciler)
//! 3. Execute deletions, then creations, through the [`crate::BatchInvoker`]
//!
//! In force mode the plan deletes every remote entry and recreates the whole
//! desired set, regardless of the current content.

mod deny;
mod rewrite;

pub use deny::DenyReconciler;
pub use rewrite::RewriteReconciler;

/// Operations needed to bring one resource in line with the desired set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan<C> {
    /// Entries to create, in desired-set order
    pub to_create: Vec<C>,
    /// Remote identifiers to delete
    pub to_delete: Vec<String>,
    /// Desired entries already present remotely
    pub unchanged: usize,
}

impl<C> ReconcilePlan<C> {
    /// Whether the plan requires no remote mutation
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Counts reported after a reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries created
    pub created: usize,
    /// Entries deleted
    pub deleted: usize,
    /// Desired entries that were already correct
    pub unchanged: usize,
}

impl<C> From<&ReconcilePlan<C>> for ReconcileReport {
    fn from(plan: &ReconcilePlan<C>) -> Self {
        Self {
            created: plan.to_create.len(),
            deleted: plan.to_delete.len(),
            unchanged: plan.unchanged,
        }
    }
}
