//! Commit identifier generation
//!
//! Identifiers must be unique across every repository that may later exchange
//! commits. Forks and clones share their parent's generator so the counter or
//! hash nonce keeps advancing across both instances.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Produces commit identifiers
pub trait IdGenerator: Send + Sync + Debug {
    /// Generate the identifier for a commit about to be created
    fn next_id(&self, data: &Value, message: &str, timestamp: &DateTime<Utc>) -> String;

    /// Record an id that entered a store from elsewhere (import or copy)
    ///
    /// Generators whose output is predictable use this to stay ahead of ids
    /// they did not issue themselves.
    fn observe(&self, _id: &str) {}
}

/// Random v4 UUID identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self, _data: &Value, _message: &str, _timestamp: &DateTime<Utc>) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Prefixed monotonic counter (`c1`, `c2`, ...)
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    /// Create a generator whose first id is `{prefix}1`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("c")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, _data: &Value, _message: &str, _timestamp: &DateTime<Utc>) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{}", self.prefix, n)
    }

    fn observe(&self, id: &str) {
        let seen = id
            .strip_prefix(self.prefix.as_str())
            .and_then(|suffix| suffix.parse::<u64>().ok());
        if let Some(n) = seen {
            self.counter.fetch_max(n, Ordering::Relaxed);
        }
    }
}

/// SHA-256 over the commit content
///
/// A nonce is mixed in so two identical commits created within the same
/// timestamp still receive distinct ids.
#[derive(Debug, Default)]
pub struct ContentHashIdGenerator {
    nonce: AtomicU64,
}

impl ContentHashIdGenerator {
    /// Create a new content hash generator
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for ContentHashIdGenerator {
    fn next_id(&self, data: &Value, message: &str, timestamp: &DateTime<Utc>) -> String {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let commit_data = format!("{}{}{}{}", data, message, timestamp.to_rfc3339(), nonce);

        let mut hasher = Sha256::new();
        hasher.update(commit_data.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
