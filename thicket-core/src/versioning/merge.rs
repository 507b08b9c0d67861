//! Merge operations - merge, cherry-pick and rebase between repositories
//!
//! All of these work on whole snapshots. A merge commit carries the remote's
//! data verbatim and a rebase replays each local commit's original snapshot, so
//! local edits absent from the adopted snapshot are superseded rather than
//! combined. Every new commit has exactly one parent.

use crate::error::{Result, ThicketError};
use crate::versioning::commit::short_id;
use crate::versioning::fork::compare_forks;
use crate::versioning::repository::Repository;
use serde::{Deserialize, Serialize};

/// Merge result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    /// Merge commit created locally
    pub commit: String,

    /// Commits copied from the remote store
    pub copied: usize,

    /// Local-only commits at merge time
    pub ahead: usize,

    /// Remote-only commits at merge time
    pub behind: usize,
}

/// Cherry-pick result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CherryPickResult {
    /// New local commit
    pub commit: String,

    /// Commit picked from the remote
    pub source: String,
}

/// Rebase result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebaseResult {
    /// Histories had not diverged; nothing changed
    UpToDate,

    /// Local commits were replayed onto the target's HEAD
    Rebased {
        /// New base commit taken from the target
        onto: Option<String>,

        /// New commit ids in replay order, oldest first
        replayed: Vec<String>,

        /// Commits copied from the target store
        copied: usize,
    },
}

impl RebaseResult {
    /// Number of replayed commits
    pub fn replayed_count(&self) -> usize {
        match self {
            RebaseResult::UpToDate => 0,
            RebaseResult::Rebased { replayed, .. } => replayed.len(),
        }
    }
}

/// Extension methods for Repository to handle merges
impl Repository {
    /// Merge a remote repository into this one
    ///
    /// Copies every remote commit missing locally, then records a merge commit
    /// whose data is the remote's HEAD data.
    ///
    /// # Arguments
    /// * `remote` - Repository to merge from
    /// * `label` - Name recorded in the merge message
    ///
    /// # Errors
    /// Returns `EmptySource` if the remote has no HEAD
    pub fn merge(&mut self, remote: &Repository, label: &str) -> Result<MergeResult> {
        let comparison = compare_forks(self, remote);
        let data = remote.get_data()?.ok_or(ThicketError::EmptySource)?;

        let copied = self.copy_missing_from(remote);
        let commit = self.commit(data, &format!("Merge '{}'", label));

        tracing::info!(
            label = %label,
            commit = %commit,
            copied,
            ahead = comparison.ahead_count,
            behind = comparison.behind_count,
            "Merged remote"
        );

        Ok(MergeResult {
            commit,
            copied,
            ahead: comparison.ahead_count,
            behind: comparison.behind_count,
        })
    }

    /// Merge using the configured default label
    pub fn merge_default(&mut self, remote: &Repository) -> Result<MergeResult> {
        let label = self.config.merge_label.clone();
        self.merge(remote, &label)
    }

    /// Re-commit a single remote commit's data locally
    ///
    /// # Arguments
    /// * `remote` - Repository holding the commit
    /// * `id` - Commit to pick
    ///
    /// # Errors
    /// Returns `CommitNotFound` if the remote does not store `id`
    pub fn cherry_pick(&mut self, remote: &Repository, id: &str) -> Result<CherryPickResult> {
        let source = remote.commit_ref(id)?;
        let message = format!(
            "Cherry-pick: {} ({})",
            source.message,
            short_id(id, self.config.short_id_length)
        );
        let data = source.data.clone();

        let commit = self.commit(data, &message);
        tracing::debug!(source = %id, commit = %commit, "Cherry-picked commit");

        Ok(CherryPickResult {
            commit,
            source: id.to_string(),
        })
    }

    /// Replay local-only commits on top of the target's HEAD
    ///
    /// HEAD and the current branch are reset to the target's, the target's
    /// missing commits are copied in, and each previously ahead commit is
    /// re-created (oldest first) with its original data and message.
    ///
    /// # Arguments
    /// * `target` - Repository to rebase onto
    pub fn rebase(&mut self, target: &Repository) -> Result<RebaseResult> {
        let comparison = compare_forks(self, target);
        if !comparison.diverged {
            tracing::debug!("Rebase: already up to date");
            return Ok(RebaseResult::UpToDate);
        }

        let onto = target.head.clone();
        self.current_branch = target.current_branch.clone();
        let copied = self.copy_missing_from(target);
        self.advance_to(onto.clone());

        let replayed: Vec<String> = comparison
            .ahead
            .into_iter()
            .rev()
            .map(|commit| self.commit(commit.data, &commit.message))
            .collect();

        tracing::info!(
            onto = ?onto,
            replayed = replayed.len(),
            copied,
            "Rebased local commits"
        );

        Ok(RebaseResult::Rebased {
            onto,
            replayed,
            copied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdGenerator;
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_repo() -> Repository {
        Repository::builder()
            .id_generator(Arc::new(SequentialIdGenerator::new("c")))
            .build()
            .expect("Failed to create repository")
    }

    fn diverged_pair() -> (Repository, Repository) {
        let mut local = create_test_repo();
        local.commit(json!({"a": 1}), "root");
        let mut remote = local.fork(None).expect("Failed to fork");
        local.commit(json!({"a": 1, "local": true}), "local work");
        remote.commit(json!({"a": 2}), "remote work");
        (local, remote)
    }

    #[test]
    fn test_merge_takes_remote_snapshot() {
        let (mut local, remote) = diverged_pair();

        let result = local.merge(&remote, "origin").expect("Failed to merge");
        assert_eq!(result.copied, 1);
        assert_eq!(result.ahead, 1);
        assert_eq!(result.behind, 1);

        assert_eq!(local.get_data().expect("Failed to read data"), Some(json!({"a": 2})));
        let commit = local.get_commit_record(&result.commit).expect("Commit not found");
        assert_eq!(commit.message, "Merge 'origin'");
        assert_eq!(commit.parent.as_deref(), Some("c2"));
        assert!(local.contains_commit("c3"));
    }

    #[test]
    fn test_merge_empty_source() {
        let mut local = create_test_repo();
        local.commit(json!(1), "one");
        let remote = create_test_repo();

        let result = local.merge(&remote, "empty");
        assert!(matches!(result, Err(ThicketError::EmptySource)));
        assert_eq!(local.commit_count(), 1);
    }

    #[test]
    fn test_merge_default_label() {
        let (mut local, remote) = diverged_pair();
        let result = local.merge_default(&remote).expect("Failed to merge");
        let commit = local.get_commit_record(&result.commit).expect("Commit not found");
        assert_eq!(commit.message, "Merge 'remote'");
    }

    #[test]
    fn test_cherry_pick() {
        let (mut local, remote) = diverged_pair();
        let before = local.commit_count();

        let result = local.cherry_pick(&remote, "c3").expect("Failed to cherry-pick");
        let commit = local.get_commit_record(&result.commit).expect("Commit not found");

        assert_eq!(commit.data, json!({"a": 2}));
        assert_eq!(commit.message, "Cherry-pick: remote work (c3)");
        assert_eq!(local.commit_count(), before + 1);
        assert!(!local.contains_commit("c3"));
    }

    #[test]
    fn test_cherry_pick_missing() {
        let (mut local, remote) = diverged_pair();
        let result = local.cherry_pick(&remote, "missing");
        assert!(matches!(result, Err(ThicketError::CommitNotFound(_))));
    }

    #[test]
    fn test_rebase_up_to_date() {
        let mut local = create_test_repo();
        local.commit(json!(1), "one");
        let target = local.fork(None).expect("Failed to fork");
        let before = local.commit_count();

        let result = local.rebase(&target).expect("Failed to rebase");
        assert_eq!(result, RebaseResult::UpToDate);
        assert_eq!(result.replayed_count(), 0);
        assert_eq!(local.commit_count(), before);
    }

    #[test]
    fn test_rebase_replays_local_snapshots() {
        let mut local = create_test_repo();
        local.commit(json!({"a": 1}), "root");
        let mut target = local.fork(Some("upstream")).expect("Failed to fork");

        local.commit(json!({"a": 1, "x": 1}), "local one");
        local.commit(json!({"a": 1, "x": 2}), "local two");
        let target_head = target.commit(json!({"a": 5}), "upstream change");

        let result = local.rebase(&target).expect("Failed to rebase");
        let RebaseResult::Rebased { onto, replayed, copied } = result else {
            panic!("Expected a rebase");
        };

        assert_eq!(onto.as_deref(), Some(target_head.as_str()));
        assert_eq!(copied, 1);
        assert_eq!(replayed.len(), 2);
        assert_eq!(local.current_branch(), "upstream");

        let history = local.log(10);
        assert_eq!(history[0].message, "local two");
        assert_eq!(history[1].message, "local one");
        assert_eq!(history[2].id, target_head);

        // whole-snapshot replay: target's change is not combined in
        assert_eq!(
            local.get_data().expect("Failed to read data"),
            Some(json!({"a": 1, "x": 2}))
        );
    }
}
