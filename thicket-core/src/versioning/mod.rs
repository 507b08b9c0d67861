//! Repository versioning providing Git-style operations over snapshots
//!
//! This module provides:
//! - Commits: Immutable snapshots with a single parent
//! - Branches: Named pointers into the commit store
//! - Checkout: Switch between branches/commits (including detached HEAD)
//! - History: Log, revert and squash
//! - Stash: Uncommitted snapshots held outside the graph
//! - Forks: Common ancestor and ahead/behind between two repositories
//! - Merge/Sync: Merge, cherry-pick, rebase, pull, push and sync

pub mod checkout;
pub mod commit;
pub mod fork;
pub mod history;
pub mod merge;
pub mod repository;
pub mod stash;
pub mod state;
pub mod sync;


pub use checkout::CheckoutResult;
pub use commit::{Commit, CommitSummary, Snapshot, short_id};
pub use fork::{
    CommonAncestor, ForkComparison, compare_forks, find_common_ancestor, get_ahead_commits,
    get_behind_commits,
};
pub use merge::{CherryPickResult, MergeResult, RebaseResult};
pub use repository::{BranchInfo, DEFAULT_BRANCH, Repository, RepositoryBuilder};
pub use stash::{StashEntry, StashSummary};
pub use state::{RepositoryState, STATE_SCHEMA_VERSION};
pub use sync::{ConflictResolution, PullResult, PullStrategy, PushResult, SyncResult};
