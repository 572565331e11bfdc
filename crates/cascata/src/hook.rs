//! Hook boundary.
//!
//! Hook delivery is a capability handed to the session, not a process-wide
//! registry, so test doubles and concurrent callers cannot interfere. The
//! executor fires hooks at fixed protocol points; `has_listeners` also
//! gates fast-delete eligibility, because bulk deletion never materializes
//! the instances a callback would receive.

use crate::model::{ModelType, RecordIdentity};

///
/// HookSink
///

pub trait HookSink {
    /// True when a pre- or post-delete listener is registered for the model.
    fn has_listeners(&self, model: ModelType) -> bool;

    /// Fired once per instance, before any row of the run is mutated.
    fn pre_delete(&self, identity: &RecordIdentity);

    /// Fired once per instance, after the instance's model batch is deleted.
    fn post_delete(&self, identity: &RecordIdentity);
}

///
/// NoHooks
///
/// Null hook sink: no listeners, every notification is dropped.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl HookSink for NoHooks {
    fn has_listeners(&self, _model: ModelType) -> bool {
        false
    }

    fn pre_delete(&self, _identity: &RecordIdentity) {}

    fn post_delete(&self, _identity: &RecordIdentity) {}
}
