//! # Thicket - embeddable version control for structured data
//!
//! Thicket tracks snapshots of tree-shaped values (anything representable as
//! JSON) as commits, with:
//! - Named branches and a HEAD that can be detached onto any commit
//! - Log, revert, squash and a LIFO stash
//! - Structural diffs between snapshots
//! - Fork comparison between two independent repositories
//! - Merge, cherry-pick, rebase, pull, push and sync between repositories
//!
//! Everything is in-memory and synchronous. A "remote" is simply another
//! `Repository` value, usually produced by `fork`.
//!
//! ## Quick Start
//!
//! ```rust
//! use thicket_core::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> Result<()> {
//! let mut repo = Repository::with_data(json!({"a": 1}));
//! repo.commit(json!({"a": 2}), "update");
//!
//! let mut fork = repo.fork(Some("experiment"))?;
//! fork.commit(json!({"a": 3}), "try something");
//!
//! let comparison = repo.compare_forks(&fork);
//! assert!(comparison.can_fast_forward);
//!
//! repo.pull(&fork, PullStrategy::Merge)?;
//! assert_eq!(repo.get_data()?, Some(json!({"a": 3})));
//! # Ok(())
//! # }
//! ```
//!
//! ## Reconciliation model
//!
//! Commits have a single parent. Merges and rebases work on whole snapshots:
//! a merge commit carries the remote's data, and a rebase replays each local
//! snapshot verbatim on top of the target. There is no field-level three-way
//! merge.

pub mod config;
pub mod diff;
pub mod error;
pub mod ids;
pub mod versioning;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigBuilder, IdConfig, IdStrategy, RepositoryConfig, ThicketConfig};
    pub use crate::diff::{DiffEntry, DiffResult, Modification, diff};
    pub use crate::error::{Result, ThicketError};
    pub use crate::ids::{
        ContentHashIdGenerator, IdGenerator, SequentialIdGenerator, UuidIdGenerator,
    };
    pub use crate::versioning::{
        BranchInfo, CheckoutResult, CherryPickResult, Commit, CommitSummary, CommonAncestor,
        ConflictResolution, ForkComparison, MergeResult, PullResult, PullStrategy, PushResult,
        RebaseResult, Repository, RepositoryBuilder, RepositoryState, Snapshot, StashEntry,
        StashSummary, SyncResult, compare_forks,
    };
}
