use crate::{
    error::StorageError,
    model::{ModelType, ParentLink, RecordIdentity, Value},
    store::{BulkDeleteSpec, RelationFilter, Store, TransactionHost},
};
use std::{cell::RefCell, collections::BTreeMap};

///
/// Row
///
/// Field map for one stored record. The primary key is the table key, not a
/// row field, so identity resolution never depends on row contents.
///

pub type Row = BTreeMap<&'static str, Value>;

type Tables = BTreeMap<ModelType, BTreeMap<Value, Row>>;

///
/// MemoryStore
///
/// In-memory reference backend implementing both storage seams.
///
/// Transactions are a savepoint stack of full-table snapshots: `begin`
/// pushes a snapshot, `rollback` restores it, `commit` discards it. Cheap
/// for fixture-sized data; not intended for large row counts.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RefCell<Tables>,
    savepoints: RefCell<Vec<Tables>>,
    deferred_constraints: bool,
    max_batch_rows: Option<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report deferred-constraint support, letting deletion run in
    /// discovery order.
    #[must_use]
    pub fn with_deferred_constraints(mut self) -> Self {
        self.deferred_constraints = true;
        self
    }

    /// Override the per-statement row bound.
    #[must_use]
    pub const fn with_max_batch_rows(mut self, max: usize) -> Self {
        self.max_batch_rows = Some(max);
        self
    }

    /// Insert or replace one row.
    pub fn insert(&self, model: ModelType, key: Value, row: Row) {
        self.tables
            .borrow_mut()
            .entry(model)
            .or_default()
            .insert(key, row);
    }

    /// Number of rows currently stored for `model`.
    #[must_use]
    pub fn row_count(&self, model: ModelType) -> usize {
        self.tables
            .borrow()
            .get(&model)
            .map_or(0, BTreeMap::len)
    }

    /// Total number of rows across all tables.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.tables.borrow().values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if a row with `key` exists for `model`.
    #[must_use]
    pub fn contains(&self, model: ModelType, key: &Value) -> bool {
        self.tables
            .borrow()
            .get(&model)
            .is_some_and(|table| table.contains_key(key))
    }

    /// Current value of one field on one row.
    #[must_use]
    pub fn field_value(&self, model: ModelType, key: &Value, field: &str) -> Option<Value> {
        self.tables
            .borrow()
            .get(&model)?
            .get(key)?
            .get(field)
            .cloned()
    }

    fn matching_keys(&self, filter: &RelationFilter) -> Vec<Value> {
        self.tables
            .borrow()
            .get(&filter.model)
            .map_or_else(Vec::new, |table| {
                table
                    .iter()
                    .filter(|(_, row)| {
                        row.get(filter.field)
                            .is_some_and(|value| filter.keys.contains(value))
                    })
                    .map(|(key, _)| key.clone())
                    .collect()
            })
    }
}

impl Store for MemoryStore {
    fn select_related(&self, filter: &RelationFilter) -> Result<Vec<RecordIdentity>, StorageError> {
        Ok(self
            .matching_keys(filter)
            .into_iter()
            .map(|key| RecordIdentity::new(filter.model, key))
            .collect())
    }

    fn select_parents(
        &self,
        link: &ParentLink,
        children: &[Value],
    ) -> Result<Vec<RecordIdentity>, StorageError> {
        let tables = self.tables.borrow();
        let Some(table) = tables.get(&link.child) else {
            return Ok(Vec::new());
        };

        let mut parents = Vec::new();
        for child in children {
            let Some(row) = table.get(child) else {
                continue;
            };
            match row.get(link.field) {
                Some(value) if !value.is_null() => {
                    parents.push(RecordIdentity::new(link.parent, value.clone()));
                }
                _ => {}
            }
        }

        Ok(parents)
    }

    fn delete_by_ids(&self, model: ModelType, ids: &[Value]) -> Result<u64, StorageError> {
        let mut tables = self.tables.borrow_mut();
        let Some(table) = tables.get_mut(&model) else {
            return Ok(0);
        };

        let mut removed = 0;
        for id in ids {
            if table.remove(id).is_some() {
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn bulk_delete(&self, spec: &BulkDeleteSpec) -> Result<u64, StorageError> {
        match spec {
            BulkDeleteSpec::ByIds { model, ids } => self.delete_by_ids(*model, ids),
            BulkDeleteSpec::ByFilter(filter) => {
                let keys = self.matching_keys(filter);
                self.delete_by_ids(filter.model, &keys)
            }
        }
    }

    fn bulk_update(
        &self,
        model: ModelType,
        ids: &[Value],
        field: &'static str,
        value: &Value,
    ) -> Result<u64, StorageError> {
        let mut tables = self.tables.borrow_mut();
        let Some(table) = tables.get_mut(&model) else {
            return Ok(0);
        };

        let mut updated = 0;
        for id in ids {
            if let Some(row) = table.get_mut(id) {
                row.insert(field, value.clone());
                updated += 1;
            }
        }

        Ok(updated)
    }

    fn max_batch_rows(&self) -> usize {
        self.max_batch_rows
            .unwrap_or(super::DEFAULT_MAX_BATCH_ROWS)
    }
}

impl TransactionHost for MemoryStore {
    fn begin(&self) -> Result<(), StorageError> {
        let snapshot = self.tables.borrow().clone();
        self.savepoints.borrow_mut().push(snapshot);
        Ok(())
    }

    fn commit(&self) -> Result<(), StorageError> {
        self.savepoints
            .borrow_mut()
            .pop()
            .map(|_| ())
            .ok_or_else(|| StorageError::backend("commit without an open transaction"))
    }

    fn rollback(&self) -> Result<(), StorageError> {
        let snapshot = self
            .savepoints
            .borrow_mut()
            .pop()
            .ok_or_else(|| StorageError::backend("rollback without an open transaction"))?;
        *self.tables.borrow_mut() = snapshot;
        Ok(())
    }

    fn supports_deferred_constraints(&self) -> bool {
        self.deferred_constraints
    }
}
