//! Storage seams consumed by the resolver.
//!
//! The resolver never builds SQL; it speaks to the storage layer through
//! `Store` (row selection and bulk mutation) and `TransactionHost`
//! (transaction boundary plus the deferred-constraints capability flag).
//! `MemoryStore` implements both and serves as the reference backend.

mod memory;

pub use memory::*;

use crate::{
    error::StorageError,
    model::{ModelType, ParentLink, RecordIdentity, Value},
};
use serde::Serialize;

/// Default upper bound on rows referenced per statement, sized to the
/// smallest common backend parameter limit.
pub const DEFAULT_MAX_BATCH_ROWS: usize = 999;

///
/// RelationFilter
///
/// Rows of `model` whose `field` holds one of `keys`. This is the lazy form
/// a cascading branch travels in until something forces materialization.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RelationFilter {
    /// Referencing model whose rows are selected.
    pub model: ModelType,
    pub field: &'static str,
    /// Referenced primary-key values.
    pub keys: Vec<Value>,
}

impl RelationFilter {
    #[must_use]
    pub const fn new(model: ModelType, field: &'static str, keys: Vec<Value>) -> Self {
        Self { model, field, keys }
    }
}

///
/// BulkDeleteSpec
///
/// Opaque "delete where" specification emitted by the fast-delete planner.
/// Executed as a single statement, without materializing rows and without
/// firing hooks.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum BulkDeleteSpec {
    ByIds { model: ModelType, ids: Vec<Value> },
    ByFilter(RelationFilter),
}

impl BulkDeleteSpec {
    #[must_use]
    pub const fn model(&self) -> ModelType {
        match self {
            Self::ByIds { model, .. } => *model,
            Self::ByFilter(filter) => filter.model,
        }
    }
}

///
/// Store
///
/// Query-layer contract: identity resolution and bulk mutation. All methods
/// take `&self`; backends use interior mutability or connection handles.
///

pub trait Store {
    /// Resolve identities of rows matching a relation filter.
    fn select_related(&self, filter: &RelationFilter) -> Result<Vec<RecordIdentity>, StorageError>;

    /// Resolve parent-row identities for child rows through an inheritance
    /// link. `children` holds child primary keys.
    fn select_parents(
        &self,
        link: &ParentLink,
        children: &[Value],
    ) -> Result<Vec<RecordIdentity>, StorageError>;

    /// Delete rows by primary key. Returns the number of rows removed.
    fn delete_by_ids(&self, model: ModelType, ids: &[Value]) -> Result<u64, StorageError>;

    /// Execute a planner-emitted bulk delete. Returns the number of rows
    /// removed.
    fn bulk_delete(&self, spec: &BulkDeleteSpec) -> Result<u64, StorageError>;

    /// Set `field` to `value` on every row in `ids`. Returns the number of
    /// rows updated.
    fn bulk_update(
        &self,
        model: ModelType,
        ids: &[Value],
        field: &'static str,
        value: &Value,
    ) -> Result<u64, StorageError>;

    /// Upper bound on rows referenced per statement.
    fn max_batch_rows(&self) -> usize {
        DEFAULT_MAX_BATCH_ROWS
    }
}

///
/// TransactionHost
///
/// Transaction-manager contract. `begin` opens a nested scope (savepoint)
/// when a transaction is already active.
///

pub trait TransactionHost {
    fn begin(&self) -> Result<(), StorageError>;

    fn commit(&self) -> Result<(), StorageError>;

    fn rollback(&self) -> Result<(), StorageError>;

    /// True when the backend defers constraint checks to commit time, which
    /// lets deletion run in natural discovery order.
    fn supports_deferred_constraints(&self) -> bool {
        false
    }
}
