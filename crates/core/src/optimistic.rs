//! Optimistic state mutation as an explicit command/result state machine.
//!
//! A caller applies a tentative change to a keyed collection, performs the
//! remote operation it stands for, then either confirms the change or rolls
//! it back, which restores the value the key held before:
//!
//! ```text
//! apply ──> Pending ──confirm──> Confirmed
//!              │
//!              └──roll_back──> RolledBack
//! ```
//!
//! At most one mutation per key may be pending at a time, so a rollback never
//! clobbers a newer tentative value.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::CoreError;

/// Lifecycle of a single tentative mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Confirmed,
    RolledBack,
}

/// Handle returned by [`OptimisticMap::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

#[derive(Debug)]
struct Mutation<K, V> {
    key: K,
    previous: Option<V>,
    state: MutationState,
}

/// Keyed collection supporting tentative writes with compensation.
#[derive(Debug)]
pub struct OptimisticMap<K, V> {
    entries: HashMap<K, V>,
    mutations: HashMap<MutationId, Mutation<K, V>>,
    next_id: u64,
}

impl<K, V> Default for OptimisticMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            mutations: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<K, V> OptimisticMap<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `key`, tentative or not.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` has an unresolved mutation.
    pub fn is_pending(&self, key: &K) -> bool {
        self.mutations
            .values()
            .any(|m| m.state == MutationState::Pending && &m.key == key)
    }

    /// Apply a tentative write. `None` removes the key.
    ///
    /// Fails with [`CoreError::Conflict`] when `key` already has a pending
    /// mutation.
    pub fn apply(&mut self, key: K, value: Option<V>) -> Result<MutationId, CoreError> {
        if self.is_pending(&key) {
            return Err(CoreError::Conflict(format!(
                "A mutation for {key:?} is already pending"
            )));
        }

        let previous = match value {
            Some(value) => self.entries.insert(key.clone(), value),
            None => self.entries.remove(&key),
        };

        let id = MutationId(self.next_id);
        self.next_id += 1;
        self.mutations.insert(
            id,
            Mutation {
                key,
                previous,
                state: MutationState::Pending,
            },
        );
        Ok(id)
    }

    /// Confirm a pending mutation; the tentative value becomes permanent.
    pub fn confirm(&mut self, id: MutationId) -> Result<(), CoreError> {
        let mutation = self.pending_mut(id)?;
        mutation.state = MutationState::Confirmed;
        mutation.previous = None;
        Ok(())
    }

    /// Roll back a pending mutation, restoring the key's previous value.
    pub fn roll_back(&mut self, id: MutationId) -> Result<(), CoreError> {
        let mutation = self.pending_mut(id)?;
        mutation.state = MutationState::RolledBack;
        let key = mutation.key.clone();
        match mutation.previous.take() {
            Some(previous) => {
                self.entries.insert(key, previous);
            }
            None => {
                self.entries.remove(&key);
            }
        }
        Ok(())
    }

    /// State of a mutation, or `None` if the id was never issued.
    pub fn state(&self, id: MutationId) -> Option<MutationState> {
        self.mutations.get(&id).map(|m| m.state)
    }

    /// Keep only the entries for which `keep` returns `true`. Keys with a
    /// pending mutation are always kept.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) {
        let pending: Vec<K> = self
            .mutations
            .values()
            .filter(|m| m.state == MutationState::Pending)
            .map(|m| m.key.clone())
            .collect();
        self.entries
            .retain(|k, v| pending.contains(k) || keep(k, v));
    }

    /// Drop bookkeeping for resolved mutations.
    pub fn prune_resolved(&mut self) {
        self.mutations
            .retain(|_, m| m.state == MutationState::Pending);
    }

    fn pending_mut(&mut self, id: MutationId) -> Result<&mut Mutation<K, V>, CoreError> {
        let mutation = self
            .mutations
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("Mutation", id.0))?;
        if mutation.state != MutationState::Pending {
            return Err(CoreError::Conflict(format!(
                "Mutation {} is already {:?}",
                id.0, mutation.state
            )));
        }
        Ok(mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn confirm_keeps_tentative_value() {
        let mut map = OptimisticMap::new();
        let id = map.apply("a", Some(1)).unwrap();
        assert_eq!(map.state(id), Some(MutationState::Pending));
        map.confirm(id).unwrap();
        assert_eq!(map.get(&"a"), Some(&1));
        assert_eq!(map.state(id), Some(MutationState::Confirmed));
    }

    #[test]
    fn roll_back_restores_previous_value() {
        let mut map = OptimisticMap::new();
        let first = map.apply("a", Some(1)).unwrap();
        map.confirm(first).unwrap();

        let second = map.apply("a", Some(2)).unwrap();
        assert_eq!(map.get(&"a"), Some(&2));
        map.roll_back(second).unwrap();
        assert_eq!(map.get(&"a"), Some(&1));
        assert_eq!(map.state(second), Some(MutationState::RolledBack));
    }

    #[test]
    fn roll_back_of_insert_removes_key() {
        let mut map: OptimisticMap<&str, i32> = OptimisticMap::new();
        let id = map.apply("a", Some(1)).unwrap();
        map.roll_back(id).unwrap();
        assert_eq!(map.get(&"a"), None);
    }

    #[test]
    fn roll_back_of_removal_restores_entry() {
        let mut map = OptimisticMap::new();
        let id = map.apply("a", Some(1)).unwrap();
        map.confirm(id).unwrap();
        let removal = map.apply("a", None).unwrap();
        assert_eq!(map.get(&"a"), None);
        map.roll_back(removal).unwrap();
        assert_eq!(map.get(&"a"), Some(&1));
    }

    #[test]
    fn second_pending_mutation_on_key_conflicts() {
        let mut map = OptimisticMap::new();
        map.apply("a", Some(1)).unwrap();
        assert_matches!(map.apply("a", Some(2)), Err(CoreError::Conflict(_)));
        assert!(map.apply("b", Some(2)).is_ok());
    }

    #[test]
    fn resolved_mutation_cannot_be_resolved_again() {
        let mut map = OptimisticMap::new();
        let id = map.apply("a", Some(1)).unwrap();
        map.confirm(id).unwrap();
        assert_matches!(map.roll_back(id), Err(CoreError::Conflict(_)));
        assert_matches!(map.confirm(id), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn retain_spares_pending_keys() {
        let mut map = OptimisticMap::new();
        let settled = map.apply("a", Some(1)).unwrap();
        map.confirm(settled).unwrap();
        let pending = map.apply("b", Some(2)).unwrap();

        map.retain(|_, _| false);
        assert_eq!(map.get(&"a"), None);
        assert_eq!(map.get(&"b"), Some(&2));

        map.roll_back(pending).unwrap();
        assert_eq!(map.get(&"b"), None);
    }

    #[test]
    fn prune_forgets_resolved_mutations() {
        let mut map = OptimisticMap::new();
        let id = map.apply("a", Some(1)).unwrap();
        map.confirm(id).unwrap();
        map.prune_resolved();
        assert_eq!(map.state(id), None);
        assert_eq!(map.get(&"a"), Some(&1));
    }
}
