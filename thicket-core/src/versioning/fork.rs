//! Fork comparison - common ancestor and ahead/behind sets between two repositories
//!
//! Only HEAD's parent chain is examined on each side. A shared commit that sits
//! on another branch of the walked repository is not considered.

use crate::versioning::commit::Commit;
use crate::versioning::repository::Repository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nearest commit on one repository's HEAD chain that the other also stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonAncestor {
    /// Commit id
    pub id: String,

    /// Commit record as stored in the walked repository
    pub commit: Commit,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

/// Relationship between a local and a remote history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkComparison {
    /// Shared commit, None when histories are unrelated or empty
    pub common_ancestor: Option<CommonAncestor>,

    /// Local-only commits, newest first
    pub ahead: Vec<Commit>,

    /// Remote-only commits, newest first
    pub behind: Vec<Commit>,

    /// Number of local-only commits
    pub ahead_count: usize,

    /// Number of remote-only commits
    pub behind_count: usize,

    /// Both sides have commits the other lacks
    pub diverged: bool,

    /// Local can adopt remote's HEAD without a new commit
    pub can_fast_forward: bool,
}

impl ForkComparison {
    /// Neither side has unique commits
    pub fn is_up_to_date(&self) -> bool {
        self.ahead_count == 0 && self.behind_count == 0
    }
}

/// Walk `a`'s HEAD chain until a commit also stored in `b` is found
pub fn find_common_ancestor(a: &Repository, b: &Repository) -> Option<CommonAncestor> {
    let mut current = a.head.clone();

    while let Some(id) = current {
        let commit = a.commits.get(&id)?;
        if b.commits.contains_key(&id) {
            return Some(CommonAncestor {
                id: id.clone(),
                timestamp: commit.timestamp,
                commit: commit.clone(),
            });
        }
        current = commit.parent.clone();
    }

    None
}

/// Commits on `a`'s HEAD chain newer than the common ancestor with `b`
///
/// Without a common ancestor this is `a`'s entire reachable history.
pub fn get_ahead_commits(a: &Repository, b: &Repository) -> Vec<Commit> {
    let stop_at = find_common_ancestor(a, b).map(|ancestor| ancestor.id);
    let mut ahead = Vec::new();
    let mut current = a.head.clone();

    while let Some(id) = current {
        if stop_at.as_deref() == Some(id.as_str()) {
            break;
        }
        let Some(commit) = a.commits.get(&id) else {
            tracing::warn!(commit = %id, "History references a missing commit");
            break;
        };
        ahead.push(commit.clone());
        current = commit.parent.clone();
    }

    ahead
}

/// Commits on `b`'s HEAD chain that `a` lacks
pub fn get_behind_commits(a: &Repository, b: &Repository) -> Vec<Commit> {
    get_ahead_commits(b, a)
}

/// Full comparison of `local` against `remote`
pub fn compare_forks(local: &Repository, remote: &Repository) -> ForkComparison {
    let common_ancestor = find_common_ancestor(local, remote);
    let ahead = get_ahead_commits(local, remote);
    let behind = get_behind_commits(local, remote);
    let ahead_count = ahead.len();
    let behind_count = behind.len();

    tracing::debug!(
        ancestor = ?common_ancestor.as_ref().map(|a| a.id.as_str()),
        ahead = ahead_count,
        behind = behind_count,
        "Compared forks"
    );

    ForkComparison {
        common_ancestor,
        ahead,
        behind,
        ahead_count,
        behind_count,
        diverged: ahead_count > 0 && behind_count > 0,
        can_fast_forward: ahead_count == 0 && behind_count > 0,
    }
}

impl Repository {
    /// Compare this repository against another
    pub fn compare_forks(&self, other: &Repository) -> ForkComparison {
        compare_forks(self, other)
    }

    /// Nearest commit on this HEAD chain that `other` also stores
    pub fn find_common_ancestor(&self, other: &Repository) -> Option<CommonAncestor> {
        find_common_ancestor(self, other)
    }

    /// Commits this repository has that `other` lacks, newest first
    pub fn get_ahead_commits(&self, other: &Repository) -> Vec<Commit> {
        get_ahead_commits(self, other)
    }

    /// Commits `other` has that this repository lacks, newest first
    pub fn get_behind_commits(&self, other: &Repository) -> Vec<Commit> {
        get_behind_commits(self, other)
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

    #[test]
    fn test_identical_forks_are_up_to_date() {
        let mut repo = create_test_repo();
        repo.commit(json!(1), "one");
        let forked = repo.fork(None).expect("Failed to fork");

        let comparison = repo.compare_forks(&forked);
        assert!(comparison.is_up_to_date());
        assert!(!comparison.diverged);
        assert!(!comparison.can_fast_forward);
        assert_eq!(comparison.common_ancestor.map(|a| a.id), Some("c1".to_string()));
    }

    #[test]
    fn test_diverged_after_independent_commits() {
        let mut a = create_test_repo();
        a.commit(json!({"a": 1}), "root");
        let mut b = a.fork(Some("f")).expect("Failed to fork");

        a.commit(json!({"a": 2}), "on a");
        b.commit(json!({"b": 2}), "on b");

        let comparison = a.compare_forks(&b);
        assert!(comparison.diverged);
        assert_eq!(comparison.ahead_count, 1);
        assert_eq!(comparison.behind_count, 1);
        assert_eq!(comparison.ahead[0].message, "on a");
        assert_eq!(comparison.behind[0].message, "on b");
    }

    #[test]
    fn test_can_fast_forward_when_only_behind() {
        let mut remote = create_test_repo();
        remote.commit(json!(1), "one");
        let local = remote.fork(None).expect("Failed to fork");
        remote.commit(json!(2), "two");
        remote.commit(json!(3), "three");

        let comparison = local.compare_forks(&remote);
        assert!(comparison.can_fast_forward);
        assert!(!comparison.diverged);
        assert_eq!(comparison.ahead_count, 0);
        assert_eq!(comparison.behind_count, 2);
        assert_eq!(comparison.behind[0].message, "three");

        let reverse = remote.compare_forks(&local);
        assert!(!reverse.can_fast_forward);
        assert_eq!(reverse.ahead_count, 2);
    }

    #[test]
    fn test_unrelated_histories() {
        let generator = Arc::new(SequentialIdGenerator::new("u"));
        let mut a = Repository::builder()
            .id_generator(generator.clone())
            .build()
            .expect("Failed to create repository");
        let mut b = Repository::builder()
            .id_generator(generator)
            .build()
            .expect("Failed to create repository");

        a.commit(json!(1), "a1");
        a.commit(json!(2), "a2");
        b.commit(json!(3), "b1");

        assert!(a.find_common_ancestor(&b).is_none());
        assert_eq!(a.get_ahead_commits(&b).len(), 2);
        assert_eq!(a.get_behind_commits(&b).len(), 1);
        assert!(a.compare_forks(&b).diverged);
    }

    #[test]
    fn test_empty_repositories() {
        let a = create_test_repo();
        let mut b = create_test_repo();
        assert!(find_common_ancestor(&a, &b).is_none());

        b.commit(json!(1), "one");
        let comparison = compare_forks(&a, &b);
        assert!(comparison.common_ancestor.is_none());
        assert!(comparison.can_fast_forward);
    }

    #[test]
    fn test_ancestor_on_other_branch_is_not_found() {
        let mut a = create_test_repo();
        a.commit(json!(1), "shared");
        let b = a.fork(None).expect("Failed to fork");

        // fresh root on another branch; "shared" is only reachable from main
        a.switch_branch("unrelated").expect("Failed to switch branch");
        a.head = None;
        a.commit(json!(2), "new root");

        assert!(a.find_common_ancestor(&b).is_none());
        a.checkout("main").expect("Failed to checkout");
        assert!(a.find_common_ancestor(&b).is_some());
    }
}
