//! History operations - log, diff, revert and squash

use crate::diff::{DiffResult, diff};
use crate::error::{Result, ThicketError};
use crate::versioning::commit::{CommitSummary, Snapshot, short_id};

/// Extension methods for Repository to walk and rewrite history
impl super::repository::Repository {
    /// Commit history from HEAD, newest first
    ///
    /// Follows parent links until `limit` entries are collected or a root
    /// commit is reached. A parent missing from the store (possible after an
    /// unvalidated import) ends the walk early.
    ///
    /// # Arguments
    /// * `limit` - Maximum number of entries
    pub fn log(&self, limit: usize) -> Vec<CommitSummary> {
        let mut history = Vec::new();
        let mut current = self.head.clone();

        while let Some(id) = current {
            if history.len() >= limit {
                break;
            }

            let Some(commit) = self.commits.get(&id) else {
                tracing::warn!(commit = %id, "History references a missing commit");
                break;
            };

            history.push(commit.summary());
            current = commit.parent.clone();
        }

        history
    }

    /// Commit history limited by the configured `log_limit`
    pub fn log_default(&self) -> Vec<CommitSummary> {
        self.log(self.config.log_limit)
    }

    /// Structural diff between two stored commits
    ///
    /// # Errors
    /// Returns `CommitNotFound` if either id is absent
    pub fn diff_commits(&self, from: &str, to: &str) -> Result<DiffResult> {
        let old = self.commit_ref(from)?;
        let new = self.commit_ref(to)?;
        Ok(diff(&old.data, &new.data))
    }

    /// Structural diff from HEAD's data to `data`
    ///
    /// An empty repository is compared as if HEAD held `null`.
    pub fn diff_working(&self, data: &Snapshot) -> Result<DiffResult> {
        let head = self.get_data()?.unwrap_or(Snapshot::Null);
        Ok(diff(&head, data))
    }

    /// Re-commit the data of an older commit on top of HEAD
    ///
    /// # Arguments
    /// * `id` - Commit whose data should be restored
    ///
    /// # Returns
    /// New commit id
    ///
    /// # Errors
    /// Returns `CommitNotFound` if the id is absent
    pub fn revert(&mut self, id: &str) -> Result<String> {
        let data = self.get_commit(id)?;
        let message = format!("Revert to {}", short_id(id, self.config.short_id_length));
        Ok(self.commit(data, &message))
    }

    /// Fold recent commits into a single commit carrying HEAD's data
    ///
    /// Walks `count + 1` entries back from HEAD; the new commit's parent is the
    /// parent of the last entry reached, and every walked id is recorded in
    /// `squashed_commits`. Intermediate snapshots are discarded.
    ///
    /// # Arguments
    /// * `count` - Number of recent commits to squash
    /// * `message` - Message of the squashed commit
    ///
    /// # Returns
    /// New commit id
    ///
    /// # Errors
    /// Returns `NotEnoughCommits` if fewer than two commits are reachable
    pub fn squash(&mut self, count: usize, message: &str) -> Result<String> {
        let range = self.log(count.saturating_add(1));
        if range.len() < 2 {
            return Err(ThicketError::NotEnoughCommits {
                available: range.len(),
            });
        }

        let oldest = range
            .last()
            .map(|entry| entry.id.clone())
            .ok_or(ThicketError::NotEnoughCommits { available: 0 })?;
        let new_parent = self.commit_ref(&oldest)?.parent.clone();
        let data = self
            .get_data()?
            .ok_or(ThicketError::NotEnoughCommits { available: 0 })?;
        let squashed: Vec<String> = range.into_iter().map(|entry| entry.id).collect();

        tracing::debug!(
            squashed = squashed.len(),
            parent = ?new_parent,
            "Squashing commits"
        );

        Ok(self.create_commit(data, message, new_parent, Some(squashed)))
    }
}
