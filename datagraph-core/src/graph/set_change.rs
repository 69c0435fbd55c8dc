//! Set Differences
//!
//! Reconciling children and dynamic dependencies both come down to comparing
//! the set a node had before a pass with the set it reports after.

use std::hash::Hash;

use indexmap::IndexSet;

/// Elements added to and removed from a set between two observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetChange<T: Hash + Eq> {
    pub added: IndexSet<T>,
    pub removed: IndexSet<T>,
}

impl<T: Hash + Eq + Clone> SetChange<T> {
    /// Compute the change from `before` to `after`.
    pub fn calculate(before: &IndexSet<T>, after: &IndexSet<T>) -> Self {
        let mut change = Self::default();
        change.recalculate(before, after);
        change
    }

    /// Overwrite this change in place with the change from `before` to `after`.
    pub fn recalculate(&mut self, before: &IndexSet<T>, after: &IndexSet<T>) {
        self.added.clear();
        self.removed.clear();

        self.removed
            .extend(before.iter().filter(|item| !after.contains(*item)).cloned());
        self.added
            .extend(after.iter().filter(|item| !before.contains(*item)).cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl<T: Hash + Eq> Default for SetChange<T> {
    fn default() -> Self {
        Self {
            added: IndexSet::new(),
            removed: IndexSet::new(),
        }
    }
}

/// Add every element of `source` to `target`.
pub fn merge_set<T: Hash + Eq + Clone>(target: &mut IndexSet<T>, source: &IndexSet<T>) {
    target.extend(source.iter().cloned());
}
