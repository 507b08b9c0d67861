//! Export and import of a repository's full state

use crate::error::Result;
use crate::versioning::commit::Commit;
use crate::versioning::repository::Repository;
use crate::versioning::stash::StashEntry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Schema version written into exported documents
pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Serializable dump of a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryState {
    /// Schema version for forward compatibility
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Commit store
    pub commits: HashMap<String, Commit>,

    /// Branch table
    pub branches: BTreeMap<String, Option<String>>,

    /// Active branch
    pub current_branch: String,

    /// Current commit
    pub head: Option<String>,

    /// Stash stack, oldest first
    #[serde(default)]
    pub stash_stack: Vec<StashEntry>,
}

fn default_schema_version() -> u32 {
    STATE_SCHEMA_VERSION
}

/// Extension methods for Repository to export and import state
impl Repository {
    /// Snapshot of the repository's state
    pub fn to_state(&self) -> RepositoryState {
        RepositoryState {
            schema_version: STATE_SCHEMA_VERSION,
            commits: self.commits.clone(),
            branches: self.branches.clone(),
            current_branch: self.current_branch.clone(),
            head: self.head.clone(),
            stash_stack: self.stash_stack.clone(),
        }
    }

    /// Replace all state wholesale
    ///
    /// Every imported id is reported to the identifier generator so later
    /// commits cannot reuse one. References are not checked: a dangling parent, branch or HEAD is
    /// accepted and only surfaces as `CommitNotFound` when later read.
    pub fn restore_state(&mut self, state: RepositoryState) {
        self.commits = state.commits;
        self.branches = state.branches;
        self.current_branch = state.current_branch;
        self.head = state.head;
        self.stash_stack = state.stash_stack;
        for id in self.commits.keys() {
            self.id_generator.observe(id);
        }

        tracing::debug!(
            commits = self.commits.len(),
            branches = self.branches.len(),
            "Imported repository state"
        );
    }

    /// Build a repository from exported state with default configuration
    pub fn from_state(state: RepositoryState) -> Self {
        let mut repo = Repository::new();
        repo.restore_state(state);
        repo
    }

    /// Serialize the repository to pretty-printed JSON
    pub fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_state())?)
    }

    /// Replace all state from an exported JSON document
    ///
    /// # Errors
    /// Returns a serialization error if the document does not parse; the
    /// repository is left unchanged in that case.
    pub fn import(&mut self, serialized: &str) -> Result<()> {
        let state: RepositoryState = serde_json::from_str(serialized)?;
        self.restore_state(state);
        Ok(())
    }
}
