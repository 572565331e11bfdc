//! Cascata: cascading deletion resolver for relational persistence layers.
//!
//! Given a set of root records, the resolver discovers every record that
//! must be deleted or updated as a consequence of typed relationships,
//! orders the work so referential constraints hold, and executes it as one
//! atomic operation with pre/post-delete hooks at fixed points.
//!
//! The storage layer, relation metadata, and hook delivery are
//! collaborators behind seams (`store::Store`, `store::TransactionHost`,
//! `schema::Schema`, `hook::HookSink`); `session::DeleteSession` wires them
//! together for callers.
#![warn(unreachable_pub)]

pub mod collector;
pub mod error;
pub mod hook;
pub mod model;
pub mod obs;
pub mod outcome;
pub mod schema;
pub mod session;
pub mod store;

pub(crate) mod executor;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary and the session surface.
/// No errors, executors, stores, or sinks are re-exported here.
///

pub mod prelude {
    pub use crate::{
        model::{
            ModelType, ParentLink, RecordIdentity, RelationDescriptor, RelationPolicy, SetValue,
            Value,
        },
        outcome::DeleteOutcome,
        schema::{Schema, SchemaBuilder},
        session::DeleteSession,
    };
}
