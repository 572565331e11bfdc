use crate::model::Value;
use serde::Serialize;
use std::fmt;

///
/// ModelType
///
/// Identifies a record type by its canonical path.
/// Paths are static and unique per registered model; every runtime surface
/// (collection maps, dependency edges, counters) keys off this type.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ModelType(&'static str);

impl ModelType {
    #[must_use]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[must_use]
    pub const fn path(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// RecordIdentity
///
/// A (model type, primary key) pair naming one record for the duration of a
/// deletion run. Identities are never mutated; graph traversal holds these
/// instead of object references, so cyclic relationships cannot create
/// ownership cycles.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RecordIdentity {
    pub model: ModelType,
    pub key: Value,
}

impl RecordIdentity {
    #[must_use]
    pub const fn new(model: ModelType, key: Value) -> Self {
        Self { model, key }
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.model, self.key)
    }
}
