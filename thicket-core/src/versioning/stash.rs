//! Stash - uncommitted snapshots held outside the commit graph

use crate::error::{Result, ThicketError};
use crate::versioning::commit::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stashed snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StashEntry {
    /// Stashed value
    pub data: Snapshot,

    /// Stash message
    pub message: String,

    /// When the entry was stashed
    pub timestamp: DateTime<Utc>,

    /// Branch active at stash time
    pub branch: String,

    /// HEAD at stash time
    pub head: Option<String>,
}

/// Stash metadata without the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashSummary {
    /// Position in the stack, 0 is the oldest
    pub index: usize,

    /// Stash message
    pub message: String,

    /// When the entry was stashed
    pub timestamp: DateTime<Utc>,

    /// Branch active at stash time
    pub branch: String,

    /// HEAD at stash time
    pub head: Option<String>,
}

/// Extension methods for Repository to handle the stash stack
impl super::repository::Repository {
    /// Push a snapshot onto the stash stack
    ///
    /// # Returns
    /// Index of the new entry
    pub fn stash(&mut self, data: Snapshot, message: &str) -> usize {
        self.stash_stack.push(StashEntry {
            data,
            message: message.to_string(),
            timestamp: Utc::now(),
            branch: self.current_branch.clone(),
            head: self.head.clone(),
        });

        let index = self.stash_stack.len() - 1;
        tracing::debug!(index, branch = %self.current_branch, "Stashed snapshot");
        index
    }

    /// Remove the most recent entry and return its data
    ///
    /// # Errors
    /// Returns `NoStashAvailable` if the stack is empty
    pub fn stash_pop(&mut self) -> Result<Snapshot> {
        self.stash_stack
            .pop()
            .map(|entry| entry.data)
            .ok_or(ThicketError::NoStashAvailable)
    }

    /// Copy of an entry's data, leaving the stack untouched
    ///
    /// # Arguments
    /// * `index` - Entry to apply, the most recent when None
    ///
    /// # Errors
    /// Returns `StashNotFound` if the index is out of range
    pub fn stash_apply(&self, index: Option<usize>) -> Result<Snapshot> {
        let index = match index {
            Some(index) => index,
            None => self
                .stash_stack
                .len()
                .checked_sub(1)
                .ok_or(ThicketError::StashNotFound(0))?,
        };

        self.stash_stack
            .get(index)
            .map(|entry| entry.data.clone())
            .ok_or(ThicketError::StashNotFound(index))
    }

    /// Metadata for every entry, oldest first
    pub fn stash_list(&self) -> Vec<StashSummary> {
        self.stash_stack
            .iter()
            .enumerate()
            .map(|(index, entry)| StashSummary {
                index,
                message: entry.message.clone(),
                timestamp: entry.timestamp,
                branch: entry.branch.clone(),
                head: entry.head.clone(),
            })
            .collect()
    }

    /// Remove an entry by index
    ///
    /// # Errors
    /// Returns `StashNotFound` if the index is out of range
    pub fn stash_drop(&mut self, index: usize) -> Result<StashEntry> {
        if index >= self.stash_stack.len() {
            return Err(ThicketError::StashNotFound(index));
        }
        Ok(self.stash_stack.remove(index))
    }

    /// Remove every entry
    pub fn stash_clear(&mut self) {
        self.stash_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ThicketError;
    use crate::versioning::repository::Repository;
    use serde_json::json;

    #[test]
    fn test_stash_is_lifo() {
        let mut repo = Repository::new();
        assert_eq!(repo.stash(json!({"draft": 1}), "first"), 0);
        assert_eq!(repo.stash(json!({"draft": 2}), "second"), 1);

        assert_eq!(repo.stash_pop().expect("Failed to pop"), json!({"draft": 2}));
        assert_eq!(repo.stash_pop().expect("Failed to pop"), json!({"draft": 1}));
        assert!(matches!(repo.stash_pop(), Err(ThicketError::NoStashAvailable)));
    }

    #[test]
    fn test_stash_apply_keeps_entry() {
        let mut repo = Repository::new();
        repo.stash(json!("a"), "a");
        repo.stash(json!("b"), "b");

        assert_eq!(repo.stash_apply(None).expect("Failed to apply"), json!("b"));
        assert_eq!(repo.stash_apply(Some(0)).expect("Failed to apply"), json!("a"));
        assert_eq!(repo.stash_list().len(), 2);
    }

    #[test]
    fn test_stash_apply_out_of_range() {
        let mut repo = Repository::new();
        assert!(matches!(repo.stash_apply(None), Err(ThicketError::StashNotFound(_))));

        repo.stash(json!(1), "one");
        assert!(matches!(repo.stash_apply(Some(3)), Err(ThicketError::StashNotFound(3))));
    }

    #[test]
    fn test_stash_list_records_context() {
        let mut repo = Repository::with_data(json!({"a": 1}));
        repo.switch_branch("wip").expect("Failed to switch branch");
        repo.stash(json!({"a": 2}), "half done");

        let list = repo.stash_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].index, 0);
        assert_eq!(list[0].message, "half done");
        assert_eq!(list[0].branch, "wip");
        assert_eq!(list[0].head.as_deref(), repo.head());
    }

    #[test]
    fn test_stash_drop_and_clear() {
        let mut repo = Repository::new();
        repo.stash(json!(1), "one");
        repo.stash(json!(2), "two");
        repo.stash(json!(3), "three");

        let dropped = repo.stash_drop(1).expect("Failed to drop");
        assert_eq!(dropped.message, "two");
        assert!(matches!(repo.stash_drop(5), Err(ThicketError::StashNotFound(5))));

        repo.stash_clear();
        assert!(repo.stash_list().is_empty());
    }
}
