//! Commit records and log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload committed at each revision
pub type Snapshot = serde_json::Value;

/// Immutable snapshot with a single parent reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Unique commit identifier
    pub id: String,

    /// Full copy of the committed value
    pub data: Snapshot,

    /// Commit message
    pub message: String,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,

    /// Preceding commit, or None for a root commit
    pub parent: Option<String>,

    /// Branch active when the commit was created (informational only)
    pub branch: String,

    /// Ids folded into this commit by a squash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squashed_commits: Option<Vec<String>>,
}

impl Commit {
    /// Whether this commit has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Metadata without the data payload
    pub fn summary(&self) -> CommitSummary {
        CommitSummary {
            id: self.id.clone(),
            message: self.message.clone(),
            timestamp: self.timestamp,
            branch: self.branch.clone(),
        }
    }
}

/// Log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Commit identifier
    pub id: String,

    /// Commit message
    pub message: String,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,

    /// Branch the commit was made on
    pub branch: String,
}

/// First `len` characters of an id
pub fn short_id(id: &str, len: usize) -> &str {
    match id.char_indices().nth(len) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
