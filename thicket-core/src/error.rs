//! Error types for Thicket operations

/// Result type for Thicket operations
pub type Result<T> = std::result::Result<T, ThicketError>;

/// Error types for the versioning engine
#[derive(Debug, thiserror::Error)]
pub enum ThicketError {
    /// Commit id is absent from the store
    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    /// Checkout target matches neither a branch nor a commit
    #[error("Branch or commit not found: {0}")]
    BranchOrCommitNotFound(String),

    /// Branch name already registered
    #[error("Branch '{0}' already exists")]
    BranchAlreadyExists(String),

    /// Merge source has no HEAD
    #[error("Source repository has no commits")]
    EmptySource,

    /// Pull strategy is neither "merge" nor "rebase"
    #[error("Unknown pull strategy: {0}")]
    UnknownStrategy(String),

    /// Both sides diverged and the requested resolution cannot settle it
    #[error("Unresolvable conflict: {0}")]
    UnresolvableConflict(String),

    /// Squash needs at least two commits
    #[error("Not enough commits to squash: {available} available")]
    NotEnoughCommits {
        /// Commits reachable from HEAD within the requested range
        available: usize,
    },

    /// Stash stack is empty
    #[error("No stash available")]
    NoStashAvailable,

    /// Stash index out of range
    #[error("Stash not found at index {0}")]
    StashNotFound(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<figment::Error> for ThicketError {
    fn from(err: figment::Error) -> Self {
        ThicketError::Configuration(err.to_string())
    }
}
