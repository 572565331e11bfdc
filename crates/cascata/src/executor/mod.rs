//! Execution phase.
//!
//! Atomicity invariant:
//! All fallible policy decisions complete before the transaction opens; the
//! executor only applies a prevalidated plan. Any storage failure inside
//! the transaction rolls back every mutation of the run, so partial
//! deletion across model types is never visible.


use crate::{
    collector::CollectorState,
    error::DeleteError,
    hook::HookSink,
    model::{ModelType, RecordIdentity, Value},
    obs::sink::{DeleteEvent, record},
    outcome::{DeleteOutcome, FieldWrite},
    schema::Schema,
    store::{Store, TransactionHost},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// DeleteExecutor
///
/// Runs a populated `CollectorState` inside one transaction, in phase
/// order: pre-delete hooks, planned bulk deletes, grouped field updates,
/// per-type instance deletes with post-delete hooks, commit.
///

pub(crate) struct DeleteExecutor<'a, S, H>
where
    S: Store + TransactionHost,
    H: HookSink,
{
    schema: &'a Schema,
    store: &'a S,
    hooks: &'a H,
    debug: bool,
}

impl<'a, S, H> DeleteExecutor<'a, S, H>
where
    S: Store + TransactionHost,
    H: HookSink,
{
    #[must_use]
    pub(crate) const fn new(schema: &'a Schema, store: &'a S, hooks: &'a H, debug: bool) -> Self {
        Self {
            schema,
            store,
            hooks,
            debug,
        }
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.debug {
            println!("[debug] {}", s.into());
        }
    }

    pub(crate) fn execute(&self, mut state: CollectorState) -> Result<DeleteOutcome, DeleteError> {
        // Deterministic per-type ordering for hook invocation and chunking.
        for set in state.collected.values_mut() {
            set.sort_keys();
        }

        // A backend that defers constraint checks to commit time needs no
        // model ordering; discovery order is already fine.
        let order = if self.store.supports_deferred_constraints() {
            state.discovery.clone()
        } else {
            self.state_order(&state)
        };

        self.store.begin()?;
        let result = self.run_phases(&order, &state);
        match result {
            Ok(outcome) => {
                self.store.commit()?;
                self.debug_log(format!("delete committed -> {} rows", outcome.total()));
                Ok(outcome)
            }
            Err(err) => {
                // Surface the original failure even when rollback itself
                // reports one.
                if let Err(rollback_err) = self.store.rollback() {
                    self.debug_log(format!("rollback failed after delete error: {rollback_err}"));
                }
                Err(err)
            }
        }
    }

    fn state_order(&self, state: &CollectorState) -> Vec<ModelType> {
        state.dependencies.sort(&state.discovery).map_or_else(
            || {
                self.debug_log("dependency sort stalled on a cycle; using discovery order");
                state.discovery.clone()
            },
            |order| order,
        )
    }

    fn run_phases(
        &self,
        order: &[ModelType],
        state: &CollectorState,
    ) -> Result<DeleteOutcome, DeleteError> {
        let mut counter: BTreeMap<ModelType, u64> = BTreeMap::new();
        let max_rows = self.store.max_batch_rows().max(1);

        // Pre-delete hooks fire before any row is touched, in deletion
        // order across models, ascending pk within a model. Auto-created
        // join records never notify.
        for model in order {
            if self.schema.model(*model)?.auto_created {
                continue;
            }
            let Some(set) = state.collected.get(model) else {
                continue;
            };
            for identity in set {
                self.hooks.pre_delete(identity);
            }
        }

        // Planned bulk deletes; no hooks fire for these by construction.
        for spec in &state.fast_deletes {
            let rows = self.store.bulk_delete(spec)?;
            record(DeleteEvent::RowsDeleted {
                entity: spec.model(),
                rows,
            });
            if rows > 0 {
                *counter.entry(spec.model()).or_default() += rows;
            }
        }

        // One UPDATE per (model, field, value) triple, chunked to the
        // statement bound.
        let mut updates: Vec<FieldWrite> = Vec::new();
        for (model, fields) in &state.field_updates {
            for ((field, value), rows) in fields {
                let field = *field;
                let ids: Vec<Value> = rows.iter().map(|identity| identity.key.clone()).collect();
                let mut updated = 0_u64;
                for chunk in ids.chunks(max_rows) {
                    updated += self.store.bulk_update(*model, chunk, field, value)?;
                }
                record(DeleteEvent::RowsUpdated {
                    entity: *model,
                    rows: updated,
                });
                updates.push(FieldWrite {
                    model: *model,
                    field,
                    value: value.clone(),
                    rows: rows.iter().cloned().collect(),
                });
            }
        }

        // Instance deletes: within a model the sorted list is reversed,
        // then chunked; once a model's rows are gone, post-delete hooks
        // fire per instance in that reversed order.
        for model in order {
            let Some(set) = state.collected.get(model) else {
                continue;
            };
            if set.is_empty() {
                continue;
            }
            let reversed: Vec<RecordIdentity> = set.iter().rev().cloned().collect();
            let ids: Vec<Value> = reversed
                .iter()
                .map(|identity| identity.key.clone())
                .collect();

            let mut removed = 0_u64;
            for chunk in ids.chunks(max_rows) {
                removed += self.store.delete_by_ids(*model, chunk)?;
            }
            record(DeleteEvent::RowsDeleted {
                entity: *model,
                rows: removed,
            });
            if removed > 0 {
                *counter.entry(*model).or_default() += removed;
            }

            if !self.schema.model(*model)?.auto_created {
                for identity in &reversed {
                    self.hooks.post_delete(identity);
                }
            }
        }

        let deleted: BTreeMap<ModelType, BTreeSet<Value>> = state
            .collected
            .iter()
            .map(|(model, set)| {
                let keys = set.iter().map(|identity| identity.key.clone()).collect();
                (*model, keys)
            })
            .collect();

        Ok(DeleteOutcome {
            total: counter.values().sum(),
            per_model: counter,
            deleted,
            updates,
        })
    }
}
