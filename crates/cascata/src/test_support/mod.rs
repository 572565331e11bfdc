pub mod fixtures;

use crate::{
    error::StorageError,
    hook::HookSink,
    model::{ModelType, ParentLink, RecordIdentity, Value},
    store::{BulkDeleteSpec, MemoryStore, RelationFilter, Store, TransactionHost},
};
use std::{
    cell::{Cell, RefCell},
    collections::BTreeSet,
};

///
/// RecordingHooks
///
/// Hook sink that records every notification in arrival order. Models in
/// `listeners` additionally report registered listeners, which keeps their
/// branches off the fast-delete path.
///

#[derive(Debug, Default)]
pub struct RecordingHooks {
    listeners: BTreeSet<ModelType>,
    log: RefCell<Vec<(&'static str, RecordIdentity)>>,
}

impl RecordingHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn listening_to(models: &[ModelType]) -> Self {
        Self {
            listeners: models.iter().copied().collect(),
            log: RefCell::new(Vec::new()),
        }
    }

    /// Recorded (phase, identity) pairs in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<(&'static str, RecordIdentity)> {
        self.log.borrow().clone()
    }

    /// Recorded model paths for one phase, in arrival order.
    #[must_use]
    pub fn models_for(&self, phase: &str) -> Vec<&'static str> {
        self.log
            .borrow()
            .iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, identity)| identity.model.path())
            .collect()
    }
}

impl HookSink for RecordingHooks {
    fn has_listeners(&self, model: ModelType) -> bool {
        self.listeners.contains(&model)
    }

    fn pre_delete(&self, identity: &RecordIdentity) {
        self.log.borrow_mut().push(("pre", identity.clone()));
    }

    fn post_delete(&self, identity: &RecordIdentity) {
        self.log.borrow_mut().push(("post", identity.clone()));
    }
}

///
/// FailingStore
///
/// Memory store wrapper that fails the nth `delete_by_ids` call, for
/// rollback coverage.
///

#[derive(Debug)]
pub struct FailingStore {
    pub inner: MemoryStore,
    remaining_deletes: Cell<usize>,
}

impl FailingStore {
    /// Fail once `fail_after` delete statements have succeeded.
    #[must_use]
    pub const fn new(inner: MemoryStore, fail_after: usize) -> Self {
        Self {
            inner,
            remaining_deletes: Cell::new(fail_after),
        }
    }
}

impl Store for FailingStore {
    fn select_related(&self, filter: &RelationFilter) -> Result<Vec<RecordIdentity>, StorageError> {
        self.inner.select_related(filter)
    }

    fn select_parents(
        &self,
        link: &ParentLink,
        children: &[Value],
    ) -> Result<Vec<RecordIdentity>, StorageError> {
        self.inner.select_parents(link, children)
    }

    fn delete_by_ids(&self, model: ModelType, ids: &[Value]) -> Result<u64, StorageError> {
        let remaining = self.remaining_deletes.get();
        if remaining == 0 {
            return Err(StorageError::Constraint {
                message: "injected delete failure".to_string(),
            });
        }
        self.remaining_deletes.set(remaining - 1);
        self.inner.delete_by_ids(model, ids)
    }

    fn bulk_delete(&self, spec: &BulkDeleteSpec) -> Result<u64, StorageError> {
        self.inner.bulk_delete(spec)
    }

    fn bulk_update(
        &self,
        model: ModelType,
        ids: &[Value],
        field: &'static str,
        value: &Value,
    ) -> Result<u64, StorageError> {
        self.inner.bulk_update(model, ids, field, value)
    }

    fn max_batch_rows(&self) -> usize {
        self.inner.max_batch_rows()
    }
}

impl TransactionHost for FailingStore {
    fn begin(&self) -> Result<(), StorageError> {
        self.inner.begin()
    }

    fn commit(&self) -> Result<(), StorageError> {
        self.inner.commit()
    }

    fn rollback(&self) -> Result<(), StorageError> {
        self.inner.rollback()
    }

    fn supports_deferred_constraints(&self) -> bool {
        self.inner.supports_deferred_constraints()
    }
}

///
/// ProbeStore
///
/// Memory store wrapper that records per-statement row counts, for
/// chunking coverage.
///

#[derive(Debug)]
pub struct ProbeStore {
    pub inner: MemoryStore,
    select_batches: RefCell<Vec<usize>>,
    delete_batches: RefCell<Vec<usize>>,
    update_batches: RefCell<Vec<usize>>,
}

impl ProbeStore {
    #[must_use]
    pub const fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            select_batches: RefCell::new(Vec::new()),
            delete_batches: RefCell::new(Vec::new()),
            update_batches: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn select_batches(&self) -> Vec<usize> {
        self.select_batches.borrow().clone()
    }

    #[must_use]
    pub fn delete_batches(&self) -> Vec<usize> {
        self.delete_batches.borrow().clone()
    }

    #[must_use]
    pub fn update_batches(&self) -> Vec<usize> {
        self.update_batches.borrow().clone()
    }
}

impl Store for ProbeStore {
    fn select_related(&self, filter: &RelationFilter) -> Result<Vec<RecordIdentity>, StorageError> {
        self.select_batches.borrow_mut().push(filter.keys.len());
        self.inner.select_related(filter)
    }

    fn select_parents(
        &self,
        link: &ParentLink,
        children: &[Value],
    ) -> Result<Vec<RecordIdentity>, StorageError> {
        self.inner.select_parents(link, children)
    }

    fn delete_by_ids(&self, model: ModelType, ids: &[Value]) -> Result<u64, StorageError> {
        self.delete_batches.borrow_mut().push(ids.len());
        self.inner.delete_by_ids(model, ids)
    }

    fn bulk_delete(&self, spec: &BulkDeleteSpec) -> Result<u64, StorageError> {
        self.inner.bulk_delete(spec)
    }

    fn bulk_update(
        &self,
        model: ModelType,
        ids: &[Value],
        field: &'static str,
        value: &Value,
    ) -> Result<u64, StorageError> {
        self.update_batches.borrow_mut().push(ids.len());
        self.inner.bulk_update(model, ids, field, value)
    }

    fn max_batch_rows(&self) -> usize {
        self.inner.max_batch_rows()
    }
}

impl TransactionHost for ProbeStore {
    fn begin(&self) -> Result<(), StorageError> {
        self.inner.begin()
    }

    fn commit(&self) -> Result<(), StorageError> {
        self.inner.commit()
    }

    fn rollback(&self) -> Result<(), StorageError> {
        self.inner.rollback()
    }

    fn supports_deferred_constraints(&self) -> bool {
        self.inner.supports_deferred_constraints()
    }
}
