use crate::model::{ModelType, RecordIdentity, Value};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

///
/// RecordMut
///
/// Caller-held, in-memory representation of a stored record. After a run
/// commits, `DeleteOutcome::apply_to` walks these to null out primary keys
/// of deleted records and replay field updates, so callers do not keep
/// stale copies. Storage is never touched through this trait.
///

pub trait RecordMut {
    fn identity(&self) -> RecordIdentity;

    fn clear_primary_key(&mut self);

    fn set_field(&mut self, field: &'static str, value: &Value);
}

///
/// FieldWrite
///
/// One committed (model, field, value) update and the rows it touched.
///

#[derive(Clone, Debug, Serialize)]
pub struct FieldWrite {
    pub model: ModelType,
    pub field: &'static str,
    pub value: Value,
    pub rows: Vec<RecordIdentity>,
}

///
/// DeleteOutcome
///
/// Result summary of one committed deletion run: total and per-model row
/// counts, plus the data needed to reconcile caller-held records.
///

#[derive(Debug, Default, Serialize)]
pub struct DeleteOutcome {
    pub(crate) total: u64,
    pub(crate) per_model: BTreeMap<ModelType, u64>,
    /// Primary keys of instance-deleted rows; bulk-deleted rows are never
    /// materialized and so never appear here.
    pub(crate) deleted: BTreeMap<ModelType, BTreeSet<Value>>,
    pub(crate) updates: Vec<FieldWrite>,
}

impl DeleteOutcome {
    /// Total rows removed across all models.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Per-model deletion counts.
    #[must_use]
    pub const fn per_model(&self) -> &BTreeMap<ModelType, u64> {
        &self.per_model
    }

    /// Rows removed for one model.
    #[must_use]
    pub fn count_for(&self, model: ModelType) -> u64 {
        self.per_model.get(&model).copied().unwrap_or_default()
    }

    /// Per-model counts keyed by model path label.
    #[must_use]
    pub fn labelled_counts(&self) -> BTreeMap<&'static str, u64> {
        self.per_model
            .iter()
            .map(|(model, count)| (model.path(), *count))
            .collect()
    }

    /// Committed field updates.
    #[must_use]
    pub fn updates(&self) -> &[FieldWrite] {
        &self.updates
    }

    /// Reconcile caller-held records with the committed run: deleted records
    /// lose their primary key, updated records replay their field writes.
    /// In-memory only; runs after commit by construction.
    pub fn apply_to<'r, I>(&self, records: I)
    where
        I: IntoIterator<Item = &'r mut dyn RecordMut>,
    {
        for record in records {
            let identity = record.identity();

            if self
                .deleted
                .get(&identity.model)
                .is_some_and(|keys| keys.contains(&identity.key))
            {
                record.clear_primary_key();
            }

            for write in &self.updates {
                if write.model == identity.model && write.rows.contains(&identity) {
                    record.set_field(write.field, &write.value);
                }
            }
        }
    }
}
