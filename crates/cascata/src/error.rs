use crate::model::{ModelType, RecordIdentity, RelationDescriptor};
use std::fmt;
use thiserror::Error as ThisError;

/// Upper bound on violating identities carried inside a policy violation.
/// Diagnostics stay readable and error values stay cheap to move even when
/// millions of rows reference the deleted target.
pub const VIOLATION_SAMPLE_MAX: usize = 16;

///
/// DeleteError
///
/// Top-level error surface of a deletion run.
///
/// - `Policy` and `Config` are deterministic and raised strictly before any
///   storage mutation.
/// - `Storage` is surfaced unchanged from the store and always follows a
///   full rollback. No variant is retried here; retrying is the caller's
///   decision.
///

#[derive(Debug, ThisError)]
pub enum DeleteError {
    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DeleteError {
    #[must_use]
    pub const fn is_policy_violation(&self) -> bool {
        matches!(self, Self::Policy(_))
    }
}

///
/// PolicyViolation
///
/// A protect or restrict policy blocked the run. Carries the offending
/// relation's coordinates and a bounded sample of violating identities.
///

#[derive(Debug, ThisError)]
pub enum PolicyViolation {
    #[error(
        "delete blocked by protected relation: source={source_model} field={field} target={target} violating={}; action=delete or retarget the referencing rows before deleting the target",
        display_sample(.violating)
    )]
    Protected {
        source_model: ModelType,
        field: &'static str,
        target: ModelType,
        violating: Vec<RecordIdentity>,
    },

    #[error(
        "delete blocked by restricted relation: source={source_model} field={field} target={target} violating={}; action=include the referencing rows in a cascading path or delete them first",
        display_sample(.violating)
    )]
    Restricted {
        source_model: ModelType,
        field: &'static str,
        target: ModelType,
        violating: Vec<RecordIdentity>,
    },
}

impl PolicyViolation {
    pub(crate) fn protected(relation: &RelationDescriptor, violating: Vec<RecordIdentity>) -> Self {
        Self::Protected {
            source_model: relation.source,
            field: relation.field,
            target: relation.target,
            violating: sample(violating),
        }
    }

    pub(crate) fn restricted(relation: &RelationDescriptor, violating: Vec<RecordIdentity>) -> Self {
        Self::Restricted {
            source_model: relation.source,
            field: relation.field,
            target: relation.target,
            violating: sample(violating),
        }
    }

    /// The sampled violating identities.
    #[must_use]
    pub fn violating(&self) -> &[RecordIdentity] {
        match self {
            Self::Protected { violating, .. } | Self::Restricted { violating, .. } => violating,
        }
    }
}

fn sample(mut violating: Vec<RecordIdentity>) -> Vec<RecordIdentity> {
    violating.truncate(VIOLATION_SAMPLE_MAX);
    violating
}

fn display_sample(violating: &[RecordIdentity]) -> String {
    let rows = violating
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    format!("[{rows}]")
}

///
/// StorageError
///
/// Store-origin failure, surfaced unchanged. Any storage error after
/// mutations began triggers a full rollback of the run's transaction.
///

#[derive(Clone, Debug, ThisError)]
pub enum StorageError {
    #[error("constraint violation: {message}")]
    Constraint { message: String },

    #[error("storage backend failure: {message}")]
    Backend { message: String },
}

impl StorageError {
    pub(crate) fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

///
/// ConfigError
///
/// Programmer error in relation metadata. Raised when the schema is built
/// or when a run is set up, always before traversal starts.
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("model type not registered: '{0}'")]
    UnknownModel(ModelType),

    #[error("model type registered twice: '{0}'")]
    DuplicateModel(ModelType),

    #[error("relation endpoint not registered: source={source_model} field={field} target={target}")]
    UnregisteredEndpoint {
        source_model: ModelType,
        field: &'static str,
        target: ModelType,
    },

    #[error("parent link endpoint not registered: child={child} parent={parent}")]
    UnregisteredParent { child: ModelType, parent: ModelType },

    #[error(
        "set-default relation without a registered default: source={source_model} field={field}; action=register a default for the field or change the policy"
    )]
    MissingDefault { source_model: ModelType, field: &'static str },

    #[error("set-null relation on a non-nullable field: source={source_model} field={field}")]
    SetNullNotNullable { source_model: ModelType, field: &'static str },

    #[error(
        "synthetic relation must cascade: source={source_model} field={field} policy={policy}"
    )]
    SyntheticPolicy {
        source_model: ModelType,
        field: &'static str,
        policy: &'static str,
    },

    #[error("root batch mixes model types: {first} and {second}")]
    MixedRootModels { first: ModelType, second: ModelType },
}

///
/// DeleteErrorClass
/// Coarse classification for logging and metrics labels.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteErrorClass {
    Policy,
    Storage,
    Config,
}

impl fmt::Display for DeleteErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Policy => "policy",
            Self::Storage => "storage",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

impl DeleteError {
    #[must_use]
    pub const fn class(&self) -> DeleteErrorClass {
        match self {
            Self::Policy(_) => DeleteErrorClass::Policy,
            Self::Storage(_) => DeleteErrorClass::Storage,
            Self::Config(_) => DeleteErrorClass::Config,
        }
    }
}
