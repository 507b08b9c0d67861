//! Checkout operations - switching between branches and commits

use crate::error::{Result, ThicketError};
use crate::versioning::commit::{Snapshot, short_id};
use serde::{Deserialize, Serialize};

/// Result of checkout operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutResult {
    /// Branch active before the checkout
    pub previous: String,

    /// Branch name, or `HEAD-<short id>` when detached
    pub current: String,

    /// HEAD after the checkout
    pub head: Option<String>,

    /// Whether HEAD no longer matches the current branch pointer
    pub detached: bool,

    /// Copy of the data now at HEAD
    pub data: Option<Snapshot>,
}

/// Extension methods for Repository to handle checkout
impl super::repository::Repository {
    /// Checkout a branch or a commit
    ///
    /// Branch names take precedence over commit ids. Checking out a commit id
    /// leaves the current branch unchanged (detached HEAD); the next commit will
    /// move that branch to the new commit.
    ///
    /// # Arguments
    /// * `target` - Branch name or commit id
    ///
    /// # Errors
    /// Returns `BranchOrCommitNotFound` if the target matches neither
    pub fn checkout(&mut self, target: &str) -> Result<CheckoutResult> {
        let previous = self.current_branch.clone();

        if let Some(branch_head) = self.branches.get(target).cloned() {
            let data = self.data_at(branch_head.as_deref())?;
            self.current_branch = target.to_string();
            self.head = branch_head;

            tracing::debug!(branch = %target, head = ?self.head, "Checked out branch");
            return Ok(self.checkout_result(previous, target.to_string(), data));
        }

        if self.commits.contains_key(target) {
            let data = self.data_at(Some(target))?;
            self.head = Some(target.to_string());

            tracing::debug!(
                commit = %target,
                branch = %self.current_branch,
                "Checked out commit (detached HEAD)"
            );
            let label = format!("HEAD-{}", short_id(target, self.config.short_id_length));
            return Ok(self.checkout_result(previous, label, data));
        }

        Err(ThicketError::BranchOrCommitNotFound(target.to_string()))
    }

    /// Switch to a branch, creating it at HEAD if it does not exist
    ///
    /// # Arguments
    /// * `name` - Branch name
    pub fn switch_branch(&mut self, name: &str) -> Result<CheckoutResult> {
        let previous = self.current_branch.clone();
        let target_head = match self.branches.get(name) {
            Some(head) => head.clone(),
            None => self.head.clone(),
        };
        let data = self.data_at(target_head.as_deref())?;

        if !self.branches.contains_key(name) {
            self.branch(name)?;
        }

        self.current_branch = name.to_string();
        self.head = target_head;

        tracing::debug!(branch = %name, head = ?self.head, "Switched branch");
        Ok(self.checkout_result(previous, name.to_string(), data))
    }

    fn data_at(&self, id: Option<&str>) -> Result<Option<Snapshot>> {
        id.map(|id| self.get_commit(id)).transpose()
    }

    fn checkout_result(
        &self,
        previous: String,
        current: String,
        data: Option<Snapshot>,
    ) -> CheckoutResult {
        CheckoutResult {
            previous,
            current,
            head: self.head.clone(),
            detached: self.is_detached(),
            data,
        }
    }
}
