//! Repository core - commit store, branch table and HEAD

use crate::config::{RepositoryConfig, ThicketConfig};
use crate::error::{Result, ThicketError};
use crate::ids::IdGenerator;
use crate::versioning::commit::{Commit, Snapshot};
use crate::versioning::stash::StashEntry;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Name of the branch every repository starts with
pub const DEFAULT_BRANCH: &str = "main";

/// Versioned store of snapshots with named branches
///
/// Cloning a repository deep-copies its commit store, branch table and stash
/// stack. Only the identifier generator is shared, so the clone keeps producing
/// ids that cannot collide with the original's.
#[derive(Debug, Clone)]
pub struct Repository {
    /// Commit store (id -> commit), append-only
    pub(crate) commits: HashMap<String, Commit>,

    /// Branch table (name -> commit id)
    pub(crate) branches: BTreeMap<String, Option<String>>,

    /// Active branch name
    pub(crate) current_branch: String,

    /// Current commit, may differ from the branch pointer while detached
    pub(crate) head: Option<String>,

    /// Uncommitted snapshots, most recent last
    pub(crate) stash_stack: Vec<StashEntry>,

    /// Behaviour settings
    pub(crate) config: RepositoryConfig,

    /// Source of commit ids
    pub(crate) id_generator: Arc<dyn IdGenerator>,
}

/// Branch pointer as reported by `list_branches`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// Branch name
    pub name: String,

    /// Commit the branch points to
    pub head: Option<String>,

    /// Whether this is the active branch
    pub is_current: bool,
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    /// Create an empty repository with a `main` branch and default configuration
    pub fn new() -> Self {
        Self::with_config(ThicketConfig::default())
    }

    /// Create an empty repository from a configuration
    pub fn with_config(config: ThicketConfig) -> Self {
        let id_generator = config.ids.build_generator();
        Self::from_parts(config.repository, id_generator)
    }

    /// Create a repository with a root commit holding `data`
    pub fn with_data(data: Snapshot) -> Self {
        let mut repo = Self::new();
        let message = repo.config.initial_message.clone();
        repo.commit(data, &message);
        repo
    }

    /// Start building a repository
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::new()
    }

    pub(crate) fn from_parts(config: RepositoryConfig, id_generator: Arc<dyn IdGenerator>) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(DEFAULT_BRANCH.to_string(), None);

        Self {
            commits: HashMap::new(),
            branches,
            current_branch: DEFAULT_BRANCH.to_string(),
            head: None,
            stash_stack: Vec::new(),
            config,
            id_generator,
        }
    }

    /// Record a new commit on top of HEAD
    ///
    /// Advances HEAD and the current branch pointer. A detached HEAD is
    /// reattached here: the current branch is moved to the new commit even
    /// though the checkout left it pointing elsewhere.
    ///
    /// # Arguments
    /// * `data` - Snapshot to store
    /// * `message` - Commit message
    ///
    /// # Returns
    /// New commit id
    pub fn commit(&mut self, data: Snapshot, message: &str) -> String {
        let parent = self.head.clone();
        self.create_commit(data, message, parent, None)
    }

    pub(crate) fn create_commit(
        &mut self,
        data: Snapshot,
        message: &str,
        parent: Option<String>,
        squashed_commits: Option<Vec<String>>,
    ) -> String {
        let timestamp = Utc::now();
        let mut id = self.id_generator.next_id(&data, message, &timestamp);
        // A generator rebuilt after import may hand out ids already in the store
        while self.commits.contains_key(&id) {
            id = self.id_generator.next_id(&data, message, &timestamp);
        }

        let commit = Commit {
            id: id.clone(),
            data,
            message: message.to_string(),
            timestamp,
            parent,
            branch: self.current_branch.clone(),
            squashed_commits,
        };

        tracing::debug!(
            commit = %id,
            parent = ?commit.parent,
            branch = %self.current_branch,
            "Created commit"
        );

        self.commits.insert(id.clone(), commit);
        self.advance_to(Some(id.clone()));
        id
    }

    /// Shared handle to this repository's identifier generator
    ///
    /// Pass it to `RepositoryBuilder::id_generator` when building a second
    /// repository that will later exchange commits with this one.
    pub fn id_generator(&self) -> Arc<dyn IdGenerator> {
        Arc::clone(&self.id_generator)
    }

    /// Copy of HEAD's data, or None when there are no commits
    ///
    /// # Errors
    /// Returns `CommitNotFound` if HEAD refers to a commit missing from the store
    pub fn get_data(&self) -> Result<Option<Snapshot>> {
        match &self.head {
            None => Ok(None),
            Some(id) => self.get_commit(id).map(Some),
        }
    }

    /// Copy of a commit's data
    ///
    /// # Errors
    /// Returns `CommitNotFound` if the id is absent
    pub fn get_commit(&self, id: &str) -> Result<Snapshot> {
        self.commit_ref(id).map(|commit| commit.data.clone())
    }

    /// Copy of a full commit record
    ///
    /// # Errors
    /// Returns `CommitNotFound` if the id is absent
    pub fn get_commit_record(&self, id: &str) -> Result<Commit> {
        self.commit_ref(id).cloned()
    }

    pub(crate) fn commit_ref(&self, id: &str) -> Result<&Commit> {
        self.commits
            .get(id)
            .ok_or_else(|| ThicketError::CommitNotFound(id.to_string()))
    }

    /// Register a new branch pointing at HEAD
    ///
    /// # Errors
    /// Returns `BranchAlreadyExists` if the name is taken
    pub fn branch(&mut self, name: &str) -> Result<String> {
        if self.branches.contains_key(name) {
            return Err(ThicketError::BranchAlreadyExists(name.to_string()));
        }

        self.branches.insert(name.to_string(), self.head.clone());
        tracing::debug!(branch = %name, head = ?self.head, "Created branch");
        Ok(name.to_string())
    }

    /// All branches sorted by name
    pub fn list_branches(&self) -> Vec<BranchInfo> {
        self.branches
            .iter()
            .map(|(name, head)| BranchInfo {
                name: name.clone(),
                head: head.clone(),
                is_current: *name == self.current_branch,
            })
            .collect()
    }

    /// Commit a branch points to, None if the branch is unknown or empty
    pub fn branch_head(&self, name: &str) -> Option<&str> {
        self.branches.get(name).and_then(|head| head.as_deref())
    }

    /// Whether a branch with this name exists
    pub fn has_branch(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }

    /// Active branch name
    pub fn current_branch(&self) -> &str {
        &self.current_branch
    }

    /// Current HEAD commit id
    pub fn head(&self) -> Option<&str> {
        self.head.as_deref()
    }

    /// Whether HEAD differs from the current branch pointer
    pub fn is_detached(&self) -> bool {
        self.branches.get(&self.current_branch).cloned().flatten() != self.head
    }

    /// Number of commits in the store
    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    /// Whether the store holds a commit with this id
    pub fn contains_commit(&self, id: &str) -> bool {
        self.commits.contains_key(id)
    }

    /// Repository settings
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Independent copy, optionally switched to a new branch
    ///
    /// # Arguments
    /// * `branch` - Branch to create (or reuse) and switch to in the copy
    ///
    /// # Returns
    /// The forked repository; the original is left untouched
    pub fn fork(&self, branch: Option<&str>) -> Result<Repository> {
        let mut forked = self.clone();
        if let Some(name) = branch {
            forked.switch_branch(name)?;
        }

        tracing::debug!(
            branch = %forked.current_branch,
            commits = forked.commits.len(),
            "Forked repository"
        );
        Ok(forked)
    }

    /// Move HEAD and the current branch pointer together
    pub(crate) fn advance_to(&mut self, head: Option<String>) {
        self.branches
            .insert(self.current_branch.clone(), head.clone());
        self.head = head;
    }

    /// Copy every commit of `source` missing from this store
    ///
    /// # Returns
    /// Number of commits copied
    pub(crate) fn copy_missing_from(&mut self, source: &Repository) -> usize {
        self.adopt_commits(source.commits.values())
    }

    /// Insert commits verbatim, skipping ids already present
    pub(crate) fn adopt_commits<'a>(&mut self, commits: impl IntoIterator<Item = &'a Commit>) -> usize {
        let mut copied = 0;
        for commit in commits {
            if !self.commits.contains_key(&commit.id) {
                self.id_generator.observe(&commit.id);
                self.commits.insert(commit.id.clone(), commit.clone());
                copied += 1;
            }
        }
        copied
    }
}

/// Builder for Repository
pub struct RepositoryBuilder {
    config: ThicketConfig,
    id_generator: Option<Arc<dyn IdGenerator>>,
    initial_data: Option<Snapshot>,
}

impl RepositoryBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ThicketConfig::default(),
            id_generator: None,
            initial_data: None,
        }
    }

    /// Use this configuration
    pub fn config(mut self, config: ThicketConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the identifier generator built from configuration
    pub fn id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// Create a root commit holding this data
    pub fn initial_data(mut self, data: Snapshot) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Build the repository
    ///
    /// # Errors
    /// Returns a configuration error if the configuration does not validate
    pub fn build(self) -> Result<Repository> {
        self.config.validate()?;

        let id_generator = self
            .id_generator
            .unwrap_or_else(|| self.config.ids.build_generator());
        let mut repo = Repository::from_parts(self.config.repository, id_generator);

        if let Some(data) = self.initial_data {
            let message = repo.config.initial_message.clone();
            repo.commit(data, &message);
        }

        Ok(repo)
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdGenerator;
    use serde_json::json;

    fn create_test_repo() -> Repository {
        Repository::builder()
            .id_generator(Arc::new(SequentialIdGenerator::new("c")))
            .build()
            .expect("Failed to create repository")
    }

    #[test]
    fn test_repository_creation() {
        let repo = create_test_repo();

        assert_eq!(repo.current_branch(), "main");
        assert!(repo.head().is_none());
        assert_eq!(repo.commit_count(), 0);
        assert!(repo.get_data().expect("Failed to read data").is_none());

        let branches = repo.list_branches();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "main");
        assert!(branches[0].is_current);
    }

    #[test]
    fn test_with_data_creates_root_commit() {
        let repo = Repository::with_data(json!({"a": 1}));

        assert_eq!(repo.commit_count(), 1);
        assert_eq!(repo.get_data().expect("Failed to read data"), Some(json!({"a": 1})));

        let head = repo.head().expect("HEAD should be set");
        let root = repo.get_commit_record(head).expect("Commit not found");
        assert!(root.is_root());
        assert_eq!(root.message, "Initial commit");
    }

    #[test]
    fn test_commit_advances_head_and_branch() {
        let mut repo = create_test_repo();

        let first = repo.commit(json!({"a": 1}), "first");
        let second = repo.commit(json!({"a": 2}), "second");

        assert_eq!(first, "c1");
        assert_eq!(second, "c2");
        assert_eq!(repo.head(), Some("c2"));
        assert_eq!(repo.branch_head("main"), Some("c2"));

        let commit = repo.get_commit_record(&second).expect("Commit not found");
        assert_eq!(commit.parent.as_deref(), Some("c1"));
        assert_eq!(commit.branch, "main");
    }

    #[test]
    fn test_commit_accepts_unchanged_data() {
        let mut repo = create_test_repo();
        repo.commit(json!({"a": 1}), "first");
        repo.commit(json!({"a": 1}), "again");
        assert_eq!(repo.commit_count(), 2);
    }

    #[test]
    fn test_get_commit_missing() {
        let repo = create_test_repo();
        let result = repo.get_commit("nope");
        assert!(matches!(result, Err(ThicketError::CommitNotFound(id)) if id == "nope"));
    }

    #[test]
    fn test_returned_data_is_a_copy() {
        let mut repo = create_test_repo();
        let id = repo.commit(json!({"a": 1}), "first");

        let mut data = repo.get_commit(&id).expect("Commit not found");
        data["a"] = json!(99);

        assert_eq!(repo.get_commit(&id).expect("Commit not found"), json!({"a": 1}));
    }

    #[test]
    fn test_create_branch() {
        let mut repo = create_test_repo();
        repo.commit(json!({"a": 1}), "first");

        let name = repo.branch("feature").expect("Failed to create branch");
        assert_eq!(name, "feature");
        assert_eq!(repo.branch_head("feature"), Some("c1"));
        assert_eq!(repo.current_branch(), "main");
        assert_eq!(repo.list_branches().len(), 2);
    }

    #[test]
    fn test_create_duplicate_branch() {
        let mut repo = create_test_repo();
        repo.branch("feature").expect("Failed to create branch");

        let result = repo.branch("feature");
        assert!(matches!(result, Err(ThicketError::BranchAlreadyExists(_))));
        assert!(matches!(repo.branch("main"), Err(ThicketError::BranchAlreadyExists(_))));
    }

    #[test]
    fn test_fork_is_independent() {
        let mut repo = create_test_repo();
        repo.commit(json!({"a": 1}), "first");

        let mut forked = repo.fork(Some("f")).expect("Failed to fork");
        forked.commit(json!({"a": 2}), "on fork");
        forked.branch("extra").expect("Failed to create branch");

        assert_eq!(repo.commit_count(), 1);
        assert_eq!(repo.head(), Some("c1"));
        assert_eq!(repo.list_branches().len(), 1);
        assert_eq!(forked.current_branch(), "f");
        assert_eq!(forked.commit_count(), 2);
    }

    #[test]
    fn test_fork_shares_id_sequence() {
        let mut repo = create_test_repo();
        repo.commit(json!(1), "first");
        let mut forked = repo.fork(None).expect("Failed to fork");

        let a = repo.commit(json!(2), "a");
        let b = forked.commit(json!(3), "b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let config = crate::config::ConfigBuilder::new().short_id_length(0).build();
        assert!(Repository::builder().config(config).build().is_err());
    }

    #[test]
    fn test_restarted_generator_skips_stored_ids() {
        let mut original = create_test_repo();
        original.commit(json!(1), "one");
        original.commit(json!(2), "two");

        let mut reloaded = create_test_repo();
        reloaded.restore_state(original.to_state());
        let id = reloaded.commit(json!(3), "three");

        assert_eq!(id, "c3");
        assert_eq!(reloaded.commit_count(), 3);
        assert_eq!(reloaded.get_commit("c1").expect("Commit not found"), json!(1));
    }
}
