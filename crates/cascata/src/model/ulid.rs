use derive_more::{Deref, Display, FromStr};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ulid::Ulid as WrappedUlid;

///
/// Ulid
///
/// Storage-facing ULID wrapper.
/// Serialized as the underlying 128-bit integer so key bytes stay canonical
/// across backends that do not understand the crockford text form.
///

#[derive(Clone, Copy, Debug, Deref, Display, Eq, FromStr, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Ulid(WrappedUlid);

impl Ulid {
    #[must_use]
    pub const fn nil() -> Self {
        Self(WrappedUlid::nil())
    }

    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(WrappedUlid(value))
    }

    #[must_use]
    pub const fn to_u128(self) -> u128 {
        self.0.0
    }
}

impl From<WrappedUlid> for Ulid {
    fn from(ulid: WrappedUlid) -> Self {
        Self(ulid)
    }
}

impl Serialize for Ulid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u128(self.to_u128())
    }
}

impl<'de> Deserialize<'de> for Ulid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u128::deserialize(deserializer).map(Self::from_u128)
    }
}
