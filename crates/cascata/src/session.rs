use crate::{
    collector::{Batch, Collector},
    error::{ConfigError, DeleteError},
    executor::DeleteExecutor,
    hook::{HookSink, NoHooks},
    model::RecordIdentity,
    obs::sink::{DeleteEvent, record},
    outcome::DeleteOutcome,
    schema::Schema,
    store::{RelationFilter, Store, TransactionHost},
};

///
/// DeleteSession
///
/// Caller-facing deletion surface: schema, store, and hook handles plus a
/// debug flag that controls collector/executor verbosity. Each call owns
/// its working state end to end; sessions hold no cross-call state and may
/// be shared freely.
///

pub struct DeleteSession<'a, S, H = NoHooks>
where
    S: Store + TransactionHost,
    H: HookSink,
{
    schema: &'a Schema,
    store: &'a S,
    hooks: &'a H,
    debug: bool,
}

impl<'a, S> DeleteSession<'a, S, NoHooks>
where
    S: Store + TransactionHost,
{
    /// Session without hook delivery.
    #[must_use]
    pub const fn new(schema: &'a Schema, store: &'a S) -> Self {
        Self {
            schema,
            store,
            hooks: &NoHooks,
            debug: false,
        }
    }
}

impl<'a, S, H> DeleteSession<'a, S, H>
where
    S: Store + TransactionHost,
    H: HookSink,
{
    /// Session with a hook sink capability.
    #[must_use]
    pub const fn with_hooks(schema: &'a Schema, store: &'a S, hooks: &'a H) -> Self {
        Self {
            schema,
            store,
            hooks,
            debug: false,
        }
    }

    /// Enable `[debug]` progress lines for this session.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Delete a homogeneous batch of records and everything that must go
    /// with them. Returns total and per-model deletion counts.
    pub fn delete(&self, roots: &[RecordIdentity]) -> Result<DeleteOutcome, DeleteError> {
        let Some(first) = roots.first() else {
            return Ok(DeleteOutcome::default());
        };
        let model = first.model;
        for identity in roots {
            if identity.model != model {
                return Err(ConfigError::MixedRootModels {
                    first: model,
                    second: identity.model,
                }
                .into());
            }
        }
        self.schema.model(model)?;

        self.run(Batch::Instances {
            model,
            rows: roots.to_vec(),
        })
    }

    /// Delete every record matching a storage-layer filter. The roots stay
    /// unmaterialized, so a branch with no policies, hooks, or inheritance
    /// reduces to a single bulk statement.
    pub fn delete_where(&self, filter: RelationFilter) -> Result<DeleteOutcome, DeleteError> {
        self.schema.model(filter.model)?;

        self.run(Batch::Filter { filter })
    }

    fn run(&self, batch: Batch) -> Result<DeleteOutcome, DeleteError> {
        record(DeleteEvent::DeleteStart);
        if self.debug {
            println!("[debug] delete run on {}", batch.model());
        }

        let mut collector = Collector::new(self.schema, self.store, self.hooks, self.debug);
        collector.collect(batch)?;
        let state = collector.finish();
        if self.debug {
            println!(
                "[debug] collected {} instances across {} models, {} bulk deletes planned",
                state.total_instances(),
                state.discovery().len(),
                state.fast_deletes().len()
            );
        }

        DeleteExecutor::new(self.schema, self.store, self.hooks, self.debug).execute(state)
    }
}
