// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered index of the currently active actions.
//!
//! Entries are keyed by action ID and ordered by `(z, insertion)`, so
//! iteration yields render order: lowest z first, ties in the order the
//! actions entered.

use crate::action::ActionId;
use std::collections::{BTreeMap, HashMap};

/// Active action index ordered by z
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    /// Render order -> action
    order: BTreeMap<(i32, u64), ActionId>,
    /// Action -> render order key
    keys: HashMap<ActionId, (i32, u64)>,
    /// Insertion counter for tie-breaking
    seq: u64,
}

impl ActiveSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an action with its z-order.
    ///
    /// Returns `false` if the action is already active; its position is kept.
    pub fn insert(&mut self, id: ActionId, z: i32) -> bool {
        if self.keys.contains_key(&id) {
            return false;
        }
        let key = (z, self.seq);
        self.seq += 1;
        self.order.insert(key, id.clone());
        self.keys.insert(id, key);
        true
    }

    /// Remove an action, returning its z-order
    pub fn remove(&mut self, id: &ActionId) -> Option<i32> {
        let key = self.keys.remove(id)?;
        self.order.remove(&key);
        Some(key.0)
    }

    /// Whether the action is active
    pub fn contains(&self, id: &ActionId) -> bool {
        self.keys.contains_key(id)
    }

    /// Z-order of an active action
    pub fn get(&self, id: &ActionId) -> Option<i32> {
        self.keys.get(id).map(|k| k.0)
    }

    /// Number of active actions
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is active
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate `(id, z)` in ascending render order
    pub fn iter(&self) -> impl Iterator<Item = (&ActionId, i32)> {
        self.order.iter().map(|(k, id)| (id, k.0))
    }

    /// Snapshot of the active IDs in render order
    pub fn ids(&self) -> Vec<ActionId> {
        self.order.values().cloned().collect()
    }

    /// The entry that renders first
    pub fn first(&self) -> Option<(&ActionId, i32)> {
        self.order.first_key_value().map(|(k, id)| (id, k.0))
    }

    /// Remove and return the entry that renders first
    pub fn pop_first(&mut self) -> Option<(ActionId, i32)> {
        let ((z, _), id) = self.order.pop_first()?;
        self.keys.remove(&id);
        Some((id, z))
    }
}
