//! Pull, push and bidirectional sync between two repositories

use crate::error::{Result, ThicketError};
use crate::versioning::commit::Commit;
use crate::versioning::fork::compare_forks;
use crate::versioning::merge::{MergeResult, RebaseResult};
use crate::versioning::repository::Repository;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a diverged pull reconciles histories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullStrategy {
    /// Record a merge commit carrying the remote snapshot
    #[default]
    Merge,

    /// Replay local commits on top of the remote
    Rebase,
}

impl FromStr for PullStrategy {
    type Err = ThicketError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "merge" => Ok(PullStrategy::Merge),
            "rebase" => Ok(PullStrategy::Rebase),
            other => Err(ThicketError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Which side wins when a sync finds both histories diverged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    /// Keep local data in a merge commit
    Ours,

    /// Pull the remote's data
    #[default]
    Theirs,

    /// Refuse to resolve automatically
    Manual,
}

impl FromStr for ConflictResolution {
    type Err = ThicketError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ours" => Ok(ConflictResolution::Ours),
            "theirs" => Ok(ConflictResolution::Theirs),
            "manual" => Ok(ConflictResolution::Manual),
            other => Err(ThicketError::UnresolvableConflict(format!(
                "unknown conflict resolution '{}'",
                other
            ))),
        }
    }
}

/// Pull result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullResult {
    /// Nothing to pull
    UpToDate,

    /// HEAD moved to the remote's HEAD without a new commit
    FastForward {
        /// New HEAD
        head: Option<String>,

        /// Commits copied from the remote
        copied: usize,
    },

    /// Diverged histories reconciled with a merge commit
    Merged(MergeResult),

    /// Diverged histories reconciled by replaying local commits
    Rebased(RebaseResult),
}

/// Push report; nothing is applied to the remote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PushResult {
    /// No local-only commits
    NothingToPush,

    /// Commits the remote lacks
    Ready {
        /// Local-only commits, newest first
        commits: Vec<Commit>,

        /// Remote has no commits of its own and can fast-forward
        can_fast_forward: bool,
    },
}

/// Sync result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncResult {
    /// Both sides already match
    UpToDate,

    /// Local was behind or lost the conflict and pulled from the remote
    Pulled(PullResult),

    /// Remote was behind and was fast-forwarded in place
    Pushed {
        /// Remote's new HEAD
        head: Option<String>,

        /// Commits copied into the remote
        copied: usize,
    },

    /// Diverged histories merged keeping local data
    MergedOurs(MergeResult),
}

/// Extension methods for Repository to exchange commits with another instance
impl Repository {
    /// Bring remote changes into this repository
    ///
    /// Fast-forwards when only the remote has new commits; otherwise merges or
    /// rebases according to `strategy`.
    ///
    /// # Arguments
    /// * `remote` - Repository to pull from
    /// * `strategy` - Reconciliation used when histories diverged
    pub fn pull(&mut self, remote: &Repository, strategy: PullStrategy) -> Result<PullResult> {
        let comparison = compare_forks(self, remote);

        if !comparison.diverged && comparison.behind_count == 0 {
            tracing::debug!("Pull: already up to date");
            return Ok(PullResult::UpToDate);
        }

        if comparison.can_fast_forward {
            let copied = self.copy_missing_from(remote);
            self.advance_to(remote.head.clone());

            tracing::info!(head = ?self.head, copied, "Fast-forwarded to remote");
            return Ok(PullResult::FastForward {
                head: self.head.clone(),
                copied,
            });
        }

        match strategy {
            PullStrategy::Merge => {
                let label = self.config.merge_label.clone();
                self.merge(remote, &label).map(PullResult::Merged)
            }
            PullStrategy::Rebase => self.rebase(remote).map(PullResult::Rebased),
        }
    }

    /// Pull with a strategy given by name
    ///
    /// The name is only consulted once both histories have diverged, so an
    /// up-to-date or fast-forward pull succeeds whatever it is.
    ///
    /// # Errors
    /// Returns `UnknownStrategy` when diverged and the name is not "merge" or "rebase"
    pub fn pull_with(&mut self, remote: &Repository, strategy: &str) -> Result<PullResult> {
        let strategy = if compare_forks(self, remote).diverged {
            strategy.parse::<PullStrategy>()?
        } else {
            PullStrategy::default()
        };
        self.pull(remote, strategy)
    }

    /// Report which commits a push would send
    ///
    /// Neither repository is modified.
    pub fn push(&self, remote: &Repository) -> PushResult {
        let comparison = compare_forks(self, remote);

        if comparison.ahead_count == 0 {
            return PushResult::NothingToPush;
        }

        PushResult::Ready {
            can_fast_forward: comparison.behind_count == 0,
            commits: comparison.ahead,
        }
    }

    /// Reconcile both repositories
    ///
    /// Only a pair with no unique commits on either side counts as up to date;
    /// one-sided histories are pulled or pushed below.
    ///
    /// Up to date: nothing happens. Only the remote has new commits: pull.
    /// Only this side has new commits: the remote is fast-forwarded in place.
    /// Both diverged: `Ours` merges keeping local data, `Theirs` pulls, and
    /// `Manual` fails.
    ///
    /// # Arguments
    /// * `remote` - Repository to sync with
    /// * `resolution` - Policy applied when both sides diverged
    ///
    /// # Errors
    /// Returns `UnresolvableConflict` when diverged and `resolution` is `Manual`
    pub fn sync(
        &mut self,
        remote: &mut Repository,
        resolution: ConflictResolution,
    ) -> Result<SyncResult> {
        let comparison = compare_forks(self, remote);

        if comparison.is_up_to_date() {
            tracing::debug!("Sync: already up to date");
            return Ok(SyncResult::UpToDate);
        }

        if comparison.ahead_count == 0 {
            return self
                .pull(remote, PullStrategy::Merge)
                .map(SyncResult::Pulled);
        }

        if comparison.behind_count == 0 {
            let copied = remote.adopt_commits(comparison.ahead.iter());
            remote.advance_to(self.head.clone());

            tracing::info!(head = ?remote.head, copied, "Pushed to remote in place");
            return Ok(SyncResult::Pushed {
                head: remote.head.clone(),
                copied,
            });
        }

        match resolution {
            ConflictResolution::Ours => self.merge_ours(remote).map(SyncResult::MergedOurs),
            ConflictResolution::Theirs => self
                .pull(remote, PullStrategy::Merge)
                .map(SyncResult::Pulled),
            ConflictResolution::Manual => Err(ThicketError::UnresolvableConflict(format!(
                "{} local and {} remote commits diverged",
                comparison.ahead_count, comparison.behind_count
            ))),
        }
    }

    /// Sync with a conflict resolution given by name
    ///
    /// An unrecognised name only fails when both sides actually diverged.
    pub fn sync_with(&mut self, remote: &mut Repository, resolution: &str) -> Result<SyncResult> {
        let resolution = resolution
            .parse::<ConflictResolution>()
            .unwrap_or(ConflictResolution::Manual);
        self.sync(remote, resolution)
    }

    /// Copy the remote's commits and record a merge commit holding local data
    fn merge_ours(&mut self, remote: &Repository) -> Result<MergeResult> {
        let comparison = compare_forks(self, remote);
        if remote.head.is_none() {
            return Err(ThicketError::EmptySource);
        }
        let data = self.get_data()?.ok_or(ThicketError::EmptySource)?;

        let label = self.config.merge_label.clone();
        let copied = self.copy_missing_from(remote);
        let commit = self.commit(data, &format!("Merge '{}' (ours)", label));

        tracing::info!(commit = %commit, copied, "Merged remote keeping local data");

        Ok(MergeResult {
            commit,
            copied,
            ahead: comparison.ahead_count,
            behind: comparison.behind_count,
        })
    }
}
