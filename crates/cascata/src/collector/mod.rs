//! Collection phase.
//!
//! The collector walks the relation graph from a root batch and produces
//! everything the executor needs: instance sets per model, delete-after
//! dependency edges, pending field updates, and bulk fast-delete specs.
//!
//! Atomicity invariant:
//! Collection performs reads only. Every policy failure (protect, restrict,
//! malformed metadata) surfaces here, before the executor opens a
//! transaction, so a failed run leaves storage untouched rather than
//! rolled back.

mod fast;
mod graph;
mod set;


pub use graph::DependencyGraph;
pub use set::InstanceSet;

use crate::{
    error::{ConfigError, DeleteError, PolicyViolation, StorageError},
    hook::HookSink,
    model::{ModelType, RecordIdentity, RelationDescriptor, RelationPolicy, Value},
    obs::sink::{DeleteEvent, record},
    schema::Schema,
    store::{BulkDeleteSpec, RelationFilter, Store},
};
use std::collections::BTreeMap;

///
/// Batch
///
/// One unit of traversal: a homogeneous set of candidate rows, either
/// already materialized or still a lazy relation filter. Filters stay lazy
/// until the fast-delete check has had its chance to bulk-delete them
/// without materialization.
///

#[derive(Clone, Debug)]
pub enum Batch {
    Instances {
        model: ModelType,
        rows: Vec<RecordIdentity>,
    },
    Filter {
        filter: RelationFilter,
    },
}

impl Batch {
    #[must_use]
    pub const fn model(&self) -> ModelType {
        match self {
            Self::Instances { model, .. } => *model,
            Self::Filter { filter } => filter.model,
        }
    }

    /// Whether the batch is expressible as a storage-layer filter. A single
    /// materialized row is a trivial pk filter; larger materialized batches
    /// are not re-expressed.
    #[must_use]
    pub const fn is_filterable(&self) -> bool {
        match self {
            Self::Instances { rows, .. } => rows.len() == 1,
            Self::Filter { .. } => true,
        }
    }

    fn into_spec(self) -> BulkDeleteSpec {
        match self {
            Self::Instances { model, rows } => BulkDeleteSpec::ByIds {
                model,
                ids: rows.into_iter().map(|identity| identity.key).collect(),
            },
            Self::Filter { filter } => BulkDeleteSpec::ByFilter(filter),
        }
    }
}

///
/// CollectorState
///
/// Working data of one deletion run. Created fresh per call, populated
/// entirely by `Collector::collect`, consumed entirely by the executor,
/// never shared across calls.
///

#[derive(Debug, Default)]
pub struct CollectorState {
    /// Records to delete, grouped by model. An identity appears in at most
    /// one set; first-seen order is preserved until the executor re-sorts.
    pub(crate) collected: BTreeMap<ModelType, InstanceSet>,
    /// Model types in first-seen order; the explicit fallback when the
    /// dependency sort stalls on a cycle.
    pub(crate) discovery: Vec<ModelType>,
    pub(crate) dependencies: DependencyGraph,
    /// Pending set-null/set-default/set mutations, grouped so one UPDATE
    /// per (model, field, value) triple suffices.
    pub(crate) field_updates: BTreeMap<ModelType, BTreeMap<(&'static str, Value), InstanceSet>>,
    pub(crate) fast_deletes: Vec<BulkDeleteSpec>,
}

impl CollectorState {
    /// Instances collected for one model.
    #[must_use]
    pub fn collected(&self, model: ModelType) -> Option<&InstanceSet> {
        self.collected.get(&model)
    }

    /// Total number of collected instances across all models.
    #[must_use]
    pub fn total_instances(&self) -> usize {
        self.collected.values().map(InstanceSet::len).sum()
    }

    /// Model types in first-seen order.
    #[must_use]
    pub fn discovery(&self) -> &[ModelType] {
        &self.discovery
    }

    #[must_use]
    pub const fn dependencies(&self) -> &DependencyGraph {
        &self.dependencies
    }

    /// Planned bulk deletions.
    #[must_use]
    pub fn fast_deletes(&self) -> &[BulkDeleteSpec] {
        &self.fast_deletes
    }

    /// Pending field updates for one model.
    #[must_use]
    pub fn field_updates(
        &self,
        model: ModelType,
    ) -> Option<&BTreeMap<(&'static str, Value), InstanceSet>> {
        self.field_updates.get(&model)
    }

    fn is_collected(&self, identity: &RecordIdentity) -> bool {
        self.collected
            .get(&identity.model)
            .is_some_and(|set| set.contains_key(&identity.key))
    }

    fn register(&mut self, model: ModelType, rows: Vec<RecordIdentity>) -> Vec<RecordIdentity> {
        if !self.collected.contains_key(&model) {
            self.discovery.push(model);
        }
        self.collected.entry(model).or_default().insert_new(rows)
    }
}

///
/// Collector
///
/// Orchestrates graph traversal for one deletion run. Dedup inside
/// `CollectorState` is the sole recursion guard: a batch whose every row is
/// already collected expands no further, which terminates self-referential
/// and mutually-referential cycles.
///

pub struct Collector<'a, S, H>
where
    S: Store,
    H: HookSink,
{
    schema: &'a Schema,
    store: &'a S,
    hooks: &'a H,
    debug: bool,
    state: CollectorState,
    restricted: BTreeMap<(ModelType, &'static str), (RelationDescriptor, InstanceSet)>,
}

impl<'a, S, H> Collector<'a, S, H>
where
    S: Store,
    H: HookSink,
{
    #[must_use]
    pub fn new(schema: &'a Schema, store: &'a S, hooks: &'a H, debug: bool) -> Self {
        Self {
            schema,
            store,
            hooks,
            debug,
            state: CollectorState::default(),
            restricted: BTreeMap::new(),
        }
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.debug {
            println!("[debug] {}", s.into());
        }
    }

    /// Collect a root batch and everything reachable from it, then resolve
    /// deferred restriction checks against the full graph.
    pub fn collect(&mut self, batch: Batch) -> Result<(), DeleteError> {
        self.collect_batch(batch, None, false, None, false, true)?;
        self.resolve_restricted()
    }

    /// Consume the collector, yielding the populated state.
    #[must_use]
    pub fn finish(self) -> CollectorState {
        self.state
    }

    fn collect_batch(
        &mut self,
        batch: Batch,
        source: Option<ModelType>,
        nullable: bool,
        via: Option<&RelationDescriptor>,
        reverse_dependency: bool,
        collect_related: bool,
    ) -> Result<(), DeleteError> {
        let schema = self.schema;
        let model = batch.model();
        schema.model(model)?;
        record(DeleteEvent::CollectCall { entity: model });

        // Fast-delete check: a qualifying branch becomes one bulk statement
        // and is neither materialized nor expanded.
        if fast::can_fast_delete(self.schema, self.hooks, &batch, via) {
            self.debug_log(format!("fast delete planned for {model}"));
            record(DeleteEvent::FastDeletePlanned { entity: model });
            self.state.fast_deletes.push(batch.into_spec());
            return Ok(());
        }

        let rows = match batch {
            Batch::Instances { rows, .. } => rows,
            Batch::Filter { filter } => self.store.select_related(&filter)?,
        };
        if rows.is_empty() {
            return Ok(());
        }

        // Dedup and register; an empty new subset means this branch was
        // already reached on another path (cycle or diamond) and stops here.
        // Nullable relationships record no edge: they are nulled before
        // deletion and cannot constrain the order. The edge lands even for
        // an already-collected batch, so cycles closed late still shape the
        // final order.
        let new_rows = self.state.register(model, rows);
        if let Some(source) = source
            && !nullable
        {
            if reverse_dependency {
                self.state.dependencies.add(model, source);
            } else {
                self.state.dependencies.add(source, model);
            }
        }
        if new_rows.is_empty() {
            return Ok(());
        }
        record(DeleteEvent::Collected {
            entity: model,
            rows: new_rows.len() as u64,
        });

        // Inheritance parents ride along with their children but are never
        // cascaded-from here; their own referencing relations fan out only
        // when the parent type is collected as a target in its own right.
        let new_keys: Vec<Value> = new_rows.iter().map(|row| row.key.clone()).collect();
        for link in schema.parent_links(model) {
            let mut parents = Vec::new();
            for chunk in chunks(&new_keys, self.store.max_batch_rows()) {
                parents.extend(self.store.select_parents(link, chunk)?);
            }
            self.collect_batch(
                Batch::Instances {
                    model: link.parent,
                    rows: parents,
                },
                Some(model),
                false,
                None,
                true,
                false,
            )?;
        }

        if !collect_related {
            return Ok(());
        }

        self.fan_out(model, &new_keys)
    }

    // Relation fan-out: apply each targeting relation's policy to the rows
    // referencing the newly-collected keys.
    fn fan_out(&mut self, model: ModelType, new_keys: &[Value]) -> Result<(), DeleteError> {
        let schema = self.schema;

        for relation in schema.relations_targeting(model) {
            match &relation.policy {
                RelationPolicy::DoNothing => {}

                RelationPolicy::Cascade => {
                    // Synthetic references resolve like nullable cascades:
                    // nothing at the storage layer orders them.
                    let nullable = relation.nullable || relation.synthetic;
                    for chunk in chunks(new_keys, self.store.max_batch_rows()) {
                        let filter =
                            RelationFilter::new(relation.source, relation.field, chunk.to_vec());
                        self.collect_batch(
                            Batch::Filter { filter },
                            Some(model),
                            nullable,
                            Some(relation),
                            false,
                            true,
                        )?;
                    }
                }

                RelationPolicy::Protect => {
                    let related = self.resolve_related(relation, new_keys)?;
                    if !related.is_empty() {
                        self.debug_log(format!(
                            "protect violation on {}.{}",
                            relation.source, relation.field
                        ));
                        record(DeleteEvent::BlockedDelete {
                            entity: relation.source,
                        });
                        return Err(PolicyViolation::protected(relation, related).into());
                    }
                }

                RelationPolicy::Restrict => {
                    let related = self.resolve_related(relation, new_keys)?;
                    if !related.is_empty() {
                        let entry = self
                            .restricted
                            .entry((relation.source, relation.field))
                            .or_insert_with(|| (relation.clone(), InstanceSet::new()));
                        for identity in related {
                            entry.1.insert(identity);
                        }
                    }
                }

                RelationPolicy::SetNull => {
                    self.add_field_update(relation, Value::Null, new_keys)?;
                }

                RelationPolicy::SetDefault => {
                    let value = schema
                        .default_value(relation.source, relation.field)
                        .cloned()
                        .ok_or(ConfigError::MissingDefault {
                            source_model: relation.source,
                            field: relation.field,
                        })?;
                    self.add_field_update(relation, value, new_keys)?;
                }

                RelationPolicy::Set(set_value) => {
                    let value = set_value.resolve();
                    self.add_field_update(relation, value, new_keys)?;
                }
            }
        }

        Ok(())
    }

    // Resolve referencing identities for one relation, chunked to the
    // store's statement bound.
    fn resolve_related(
        &self,
        relation: &RelationDescriptor,
        referenced: &[Value],
    ) -> Result<Vec<RecordIdentity>, StorageError> {
        let mut related = Vec::new();
        for chunk in chunks(referenced, self.store.max_batch_rows()) {
            let filter = RelationFilter::new(relation.source, relation.field, chunk.to_vec());
            related.extend(self.store.select_related(&filter)?);
        }

        Ok(related)
    }

    // Register a pending field mutation. Mutated rows are not deleted and
    // are never recursed into.
    fn add_field_update(
        &mut self,
        relation: &RelationDescriptor,
        value: Value,
        referenced: &[Value],
    ) -> Result<(), DeleteError> {
        let related = self.resolve_related(relation, referenced)?;
        if related.is_empty() {
            return Ok(());
        }

        let entry = self
            .state
            .field_updates
            .entry(relation.source)
            .or_default()
            .entry((relation.field, value))
            .or_default();
        for identity in related {
            entry.insert(identity);
        }

        Ok(())
    }

    // Deferred restriction checks run after the whole reachable graph is
    // known: a referencing row discovered late on a cascading path still
    // unblocks a restriction recorded early.
    fn resolve_restricted(&mut self) -> Result<(), DeleteError> {
        let restricted = std::mem::take(&mut self.restricted);
        if restricted.is_empty() {
            return Ok(());
        }

        // Rows scheduled through a planned bulk delete satisfy restrictions
        // the same way collected rows do. Only specs whose model appears in
        // the restricted ledger are resolved.
        let needed: std::collections::BTreeSet<ModelType> = restricted
            .values()
            .map(|(relation, _)| relation.source)
            .collect();
        let mut fast_covered: BTreeMap<ModelType, std::collections::BTreeSet<Value>> =
            BTreeMap::new();
        for spec in &self.state.fast_deletes {
            let model = spec.model();
            if !needed.contains(&model) {
                continue;
            }
            let keys: Vec<Value> = match spec {
                BulkDeleteSpec::ByIds { ids, .. } => ids.clone(),
                BulkDeleteSpec::ByFilter(filter) => self
                    .store
                    .select_related(filter)?
                    .into_iter()
                    .map(|identity| identity.key)
                    .collect(),
            };
            fast_covered.entry(model).or_default().extend(keys);
        }

        for (relation, rows) in restricted.into_values() {
            let violating: Vec<RecordIdentity> = rows
                .into_iter()
                .filter(|identity| {
                    !self.state.is_collected(identity)
                        && !fast_covered
                            .get(&identity.model)
                            .is_some_and(|keys| keys.contains(&identity.key))
                })
                .collect();
            if !violating.is_empty() {
                self.debug_log(format!(
                    "restrict violation on {}.{}",
                    relation.source, relation.field
                ));
                record(DeleteEvent::BlockedDelete {
                    entity: relation.source,
                });
                return Err(PolicyViolation::restricted(&relation, violating).into());
            }
        }

        Ok(())
    }
}

// Chunk a key list to the store's statement bound. A zero bound would loop
// forever, so it is clamped to one.
fn chunks(keys: &[Value], max_rows: usize) -> std::slice::Chunks<'_, Value> {
    keys.chunks(max_rows.max(1))
}
