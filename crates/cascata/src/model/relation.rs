use crate::model::{ModelType, Value};

///
/// RelationPolicy
///
/// Closed set of behaviors applied to referencing records when the record
/// they reference is deleted. Every fan-out site matches exhaustively, so a
/// new policy is a compile-time-checked, single-point change.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RelationPolicy {
    /// Delete the referencing records too.
    Cascade,
    /// Abort the whole operation if any referencing record exists.
    Protect,
    /// Like `Protect`, unless every referencing record is also scheduled for
    /// deletion through a cascading path from the same roots.
    Restrict,
    /// Null out the referencing field instead of deleting the record.
    SetNull,
    /// Set the referencing field to its registered default value.
    SetDefault,
    /// Set the referencing field to a fixed value or a provider result.
    Set(SetValue),
    /// Leave the referencing record alone; the storage layer is on its own.
    DoNothing,
}

impl RelationPolicy {
    /// Stable lowercase label for diagnostics and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::Protect => "protect",
            Self::Restrict => "restrict",
            Self::SetNull => "set_null",
            Self::SetDefault => "set_default",
            Self::Set(_) => "set",
            Self::DoNothing => "do_nothing",
        }
    }
}

///
/// SetValue
///
/// Replacement source for the `Set` policy: a fixed value, or a provider
/// invoked once per relation encounter during collection.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SetValue {
    Fixed(Value),
    Provider(fn() -> Value),
}

impl SetValue {
    /// Resolve the replacement value.
    #[must_use]
    pub fn resolve(&self) -> Value {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::Provider(provider) => provider(),
        }
    }
}

///
/// RelationDescriptor
///
/// Static relation metadata owned by the schema: a foreign reference from
/// `source.field` to rows of `target`, tagged with nullability and a
/// deletion policy. Read-only during a deletion run.
///
/// Synthetic relations model computed or polymorphic references that are not
/// plain foreign-key columns; they always cascade-collect as if nullable and
/// disqualify fast deletion of their target.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationDescriptor {
    /// Referencing model (the side holding the foreign reference).
    pub source: ModelType,
    /// Referenced model (the side being deleted).
    pub target: ModelType,
    /// Referencing field on `source`.
    pub field: &'static str,
    /// Whether the referencing field may hold null.
    pub nullable: bool,
    pub policy: RelationPolicy,
    pub synthetic: bool,
}

impl RelationDescriptor {
    #[must_use]
    pub const fn new(
        source: ModelType,
        field: &'static str,
        target: ModelType,
        nullable: bool,
        policy: RelationPolicy,
    ) -> Self {
        Self {
            source,
            target,
            field,
            nullable,
            policy,
            synthetic: false,
        }
    }

    /// Mark the relation as a computed or polymorphic reference.
    #[must_use]
    pub const fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }
}

///
/// ParentLink
///
/// Multi-table-inheritance link: each `child` row has a 1:1 parent row in
/// `parent`'s table, referenced through `field`. Parent rows are collected
/// alongside their children and deleted strictly after them.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParentLink {
    pub child: ModelType,
    pub parent: ModelType,
    /// Link field on the child row holding the parent primary key.
    pub field: &'static str,
}

impl ParentLink {
    #[must_use]
    pub const fn new(child: ModelType, field: &'static str, parent: ModelType) -> Self {
        Self {
            child,
            parent,
            field,
        }
    }
}
