use serde::Serialize;
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for deletion runs.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct EventOps {
    // Session entrypoints
    pub delete_calls: u64,

    // Collection
    pub collect_calls: u64,
    pub rows_collected: u64,
    pub fast_delete_plans: u64,
    pub blocked_deletes: u64,

    // Execution
    pub rows_deleted: u64,
    pub rows_updated: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct EntityCounters {
    pub rows_collected: u64,
    pub fast_delete_plans: u64,
    pub blocked_deletes: u64,
    pub rows_deleted: u64,
    pub rows_updated: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|cell| f(&cell.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|cell| f(&mut cell.borrow_mut()))
}

/// Snapshot the current counter state.
#[must_use]
pub fn snapshot() -> EventState {
    with_state(Clone::clone)
}

/// Reset all counters.
pub fn reset_all() {
    with_state_mut(|state| *state = EventState::default());
}
