use crate::model::{RecordIdentity, Value};
use derive_more::Deref;
use std::collections::BTreeSet;

///
/// InstanceSet
///
/// Identities of one model type scheduled for deletion.
///
/// - Uniqueness is enforced on insertion; first-seen order is preserved so
///   later ordering passes stay deterministic.
/// - All members share a model type; membership is keyed by primary key.
/// - `sort_keys` replaces discovery order with ascending primary-key order
///   before execution.
///

#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct InstanceSet {
    #[deref]
    rows: Vec<RecordIdentity>,
    seen: BTreeSet<Value>,
}

impl InstanceSet {
    /// Create an empty instance set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: Vec::new(),
            seen: BTreeSet::new(),
        }
    }

    /// Return the number of identities in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return an iterator over the identities.
    pub fn iter(&self) -> std::slice::Iter<'_, RecordIdentity> {
        self.rows.iter()
    }

    /// Returns `true` if the set contains an identity with this key.
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.seen.contains(key)
    }

    /// Insert an identity, returning `true` if it was newly inserted.
    pub fn insert(&mut self, identity: RecordIdentity) -> bool {
        if !self.seen.insert(identity.key.clone()) {
            return false;
        }
        self.rows.push(identity);

        true
    }

    /// Insert a batch, returning the newly-inserted subset in batch order.
    pub fn insert_new(&mut self, batch: Vec<RecordIdentity>) -> Vec<RecordIdentity> {
        batch
            .into_iter()
            .filter(|identity| self.insert(identity.clone()))
            .collect()
    }

    /// Re-order the set by ascending primary key.
    pub fn sort_keys(&mut self) {
        self.rows.sort_by(|a, b| a.key.cmp(&b.key));
    }
}

impl IntoIterator for InstanceSet {
    type Item = RecordIdentity;
    type IntoIter = std::vec::IntoIter<RecordIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a InstanceSet {
    type Item = &'a RecordIdentity;
    type IntoIter = std::slice::Iter<'a, RecordIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
