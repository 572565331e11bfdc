//! Event sink boundary.
//!
//! Resolver logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through DeleteEvent and EventSink.
//!
//! This module is the only allowed bridge between collection/execution
//! logic and the global metrics state.

use crate::{model::ModelType, obs::metrics};
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn EventSink>> = const { RefCell::new(None) };
}

///
/// DeleteEvent
///

#[derive(Clone, Copy, Debug)]
pub enum DeleteEvent {
    DeleteStart,
    CollectCall {
        entity: ModelType,
    },
    Collected {
        entity: ModelType,
        rows: u64,
    },
    FastDeletePlanned {
        entity: ModelType,
    },
    BlockedDelete {
        entity: ModelType,
    },
    RowsDeleted {
        entity: ModelType,
        rows: u64,
    },
    RowsUpdated {
        entity: ModelType,
        rows: u64,
    },
}

///
/// EventSink
///

pub trait EventSink {
    fn record(&self, event: DeleteEvent);
}

/// GlobalEventSink
/// Default process-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalEventSink;

impl EventSink for GlobalEventSink {
    fn record(&self, event: DeleteEvent) {
        match event {
            DeleteEvent::DeleteStart => {
                metrics::with_state_mut(|m| {
                    m.ops.delete_calls = m.ops.delete_calls.saturating_add(1);
                });
            }

            DeleteEvent::CollectCall { entity: _ } => {
                metrics::with_state_mut(|m| {
                    m.ops.collect_calls = m.ops.collect_calls.saturating_add(1);
                });
            }

            DeleteEvent::Collected { entity, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_collected = m.ops.rows_collected.saturating_add(rows);
                    let entry = m.entities.entry(entity.path().to_string()).or_default();
                    entry.rows_collected = entry.rows_collected.saturating_add(rows);
                });
            }

            DeleteEvent::FastDeletePlanned { entity } => {
                metrics::with_state_mut(|m| {
                    m.ops.fast_delete_plans = m.ops.fast_delete_plans.saturating_add(1);
                    let entry = m.entities.entry(entity.path().to_string()).or_default();
                    entry.fast_delete_plans = entry.fast_delete_plans.saturating_add(1);
                });
            }

            DeleteEvent::BlockedDelete { entity } => {
                metrics::with_state_mut(|m| {
                    m.ops.blocked_deletes = m.ops.blocked_deletes.saturating_add(1);
                    let entry = m.entities.entry(entity.path().to_string()).or_default();
                    entry.blocked_deletes = entry.blocked_deletes.saturating_add(1);
                });
            }

            DeleteEvent::RowsDeleted { entity, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_deleted = m.ops.rows_deleted.saturating_add(rows);
                    let entry = m.entities.entry(entity.path().to_string()).or_default();
                    entry.rows_deleted = entry.rows_deleted.saturating_add(rows);
                });
            }

            DeleteEvent::RowsUpdated { entity, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_updated = m.ops.rows_updated.saturating_add(rows);
                    let entry = m.entities.entry(entity.path().to_string()).or_default();
                    entry.rows_updated = entry.rows_updated.saturating_add(rows);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_EVENT_SINK: GlobalEventSink = GlobalEventSink;

pub(crate) fn record(event: DeleteEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // Preconditions:
        // - `ptr` was produced from a valid `&dyn EventSink` in `with_event_sink`.
        // - `with_event_sink` always restores the previous pointer before returning,
        //   including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        //
        // Aliasing:
        // - We materialize only a shared reference (`&dyn EventSink`), matching the
        //   original shared borrow used to install the override.
        // - No mutable alias to the same sink is created here.
        //
        // What would break this:
        // - If `with_event_sink` failed to restore on all exits (normal + panic),
        //   `ptr` could outlive the borrowed sink and become dangling.
        // - If `record` were changed to store or dispatch asynchronously using `ptr`,
        //   lifetime assumptions would no longer hold.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_EVENT_SINK.record(event);
    }
}

/// Snapshot the current metrics state for endpoint/test plumbing.
#[must_use]
pub fn metrics_snapshot() -> metrics::EventState {
    metrics::snapshot()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary event sink override.
pub fn with_event_sink<T>(sink: &dyn EventSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn EventSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // Preconditions:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` always restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    //
    // Aliasing:
    // - We erase lifetime to a raw pointer, but still only expose shared access.
    // - No mutable alias to the same sink is introduced by this conversion.
    //
    // What would break this:
    // - Any async/deferred use of `sink_ptr` beyond this scope.
    // - Any path that bypasses Guard restoration.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn EventSink, *const dyn EventSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}
