use crate::model::Ulid;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Value
///
/// Closed scalar surface for primary keys and referencing fields.
///
/// - Total ordering is canonical (variant, then payload) so values can key
///   sorted sets and maps; ordering across variants carries no domain meaning.
/// - `Null` is a real member: nullable references resolve to it and
///   set-null updates write it.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
    Ulid(Ulid),
}

impl Value {
    /// Returns `true` if the value is `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Ulid(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Ulid> for Value {
    fn from(v: Ulid) -> Self {
        Self::Ulid(v)
    }
}
