//! Structural diff between two snapshot values
//!
//! Objects and arrays are both compared as keyed collections: object keys and
//! array indices are enumerated the same way, so an array is diffed position by
//! position with no attempt to match moved elements. Any pair where at least one
//! side is a leaf (null, bool, number, string) is reported as a single
//! modification when unequal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value added or removed at a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Dotted path (`a.b.0`), empty for the root
    pub path: String,

    /// The value present on the side that has it
    pub value: Value,
}

/// A value changed at a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    /// Dotted path (`a.b.0`), empty for the root
    pub path: String,

    /// Value before
    pub old: Value,

    /// Value after
    pub new: Value,
}

/// Result of comparing two snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Paths present only in the second value
    pub added: Vec<DiffEntry>,

    /// Paths present only in the first value
    pub removed: Vec<DiffEntry>,

    /// Paths present in both with unequal values
    pub modified: Vec<Modification>,
}

impl DiffResult {
    /// True when the two values were structurally equal
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Total number of recorded changes
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// One line per change: `+ path`, `- path`, `~ path: old -> new`
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.len());
        for entry in &self.added {
            lines.push(format!("+ {}", display_path(&entry.path)));
        }
        for entry in &self.removed {
            lines.push(format!("- {}", display_path(&entry.path)));
        }
        for change in &self.modified {
            lines.push(format!(
                "~ {}: {} -> {}",
                display_path(&change.path),
                change.old,
                change.new
            ));
        }
        lines
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

/// Compare two snapshots
pub fn diff(old: &Value, new: &Value) -> DiffResult {
    let mut result = DiffResult::default();
    diff_at("", old, new, &mut result);
    result
}

fn is_collection(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Keys of a collection paired with their values, in enumeration order
fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", base, key)
    }
}

fn diff_at(path: &str, old: &Value, new: &Value, result: &mut DiffResult) {
    if old == new {
        return;
    }

    if !(is_collection(old) && is_collection(new)) {
        result.modified.push(Modification {
            path: path.to_string(),
            old: old.clone(),
            new: new.clone(),
        });
        return;
    }

    for (key, old_value) in entries(old) {
        let child = join(path, &key);
        match lookup(new, &key) {
            None => result.removed.push(DiffEntry {
                path: child,
                value: old_value.clone(),
            }),
            Some(new_value) => diff_at(&child, old_value, new_value, result),
        }
    }

    for (key, new_value) in entries(new) {
        if lookup(old, &key).is_none() {
            result.added.push(DiffEntry {
                path: join(path, &key),
                value: new_value.clone(),
            });
        }
    }
}
