//! Relation-metadata registry.
//!
//! The schema owns every `RelationDescriptor` and parent link and indexes
//! relations by *target* model, the direction deletion fans out in. It is
//! built once, validated eagerly, and read-only afterwards; a deletion run
//! never mutates it.

use crate::{
    error::ConfigError,
    model::{ModelType, ParentLink, RelationDescriptor, RelationPolicy, Value},
};
use std::collections::BTreeMap;

///
/// ModelInfo
///
/// Per-model registration record.
///

#[derive(Clone, Debug)]
pub struct ModelInfo {
    pub model: ModelType,
    /// Primary-key field name, used when a bulk filter must name it.
    pub pk_field: &'static str,
    /// Auto-generated join/through record type. Pre/post-delete hooks are
    /// never fired for these.
    pub auto_created: bool,
}

///
/// Schema
///
/// Validated, immutable relation registry for one model domain.
///

#[derive(Debug, Default)]
pub struct Schema {
    models: BTreeMap<ModelType, ModelInfo>,
    /// Relations indexed by the model they reference.
    targeting: BTreeMap<ModelType, Vec<RelationDescriptor>>,
    parents: BTreeMap<ModelType, Vec<ParentLink>>,
    defaults: BTreeMap<(ModelType, &'static str), Value>,
}

impl Schema {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Look up a registered model.
    pub fn model(&self, model: ModelType) -> Result<&ModelInfo, ConfigError> {
        self.models
            .get(&model)
            .ok_or(ConfigError::UnknownModel(model))
    }

    /// Returns `true` if the model is registered.
    #[must_use]
    pub fn contains(&self, model: ModelType) -> bool {
        self.models.contains_key(&model)
    }

    /// All relations whose foreign reference points at `model`.
    #[must_use]
    pub fn relations_targeting(&self, model: ModelType) -> &[RelationDescriptor] {
        self.targeting.get(&model).map_or(&[], Vec::as_slice)
    }

    /// Multi-table-inheritance links from `model` up to its parent rows.
    #[must_use]
    pub fn parent_links(&self, model: ModelType) -> &[ParentLink] {
        self.parents.get(&model).map_or(&[], Vec::as_slice)
    }

    /// Registered default for a (model, field) pair, if any.
    #[must_use]
    pub fn default_value(&self, model: ModelType, field: &'static str) -> Option<&Value> {
        self.defaults.get(&(model, field))
    }
}

///
/// SchemaBuilder
///
/// Accumulates registrations, then checks the whole metadata set in
/// `build()`. Malformed metadata is a `ConfigError` here, before any
/// deletion run can observe it.
///

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    models: Vec<ModelInfo>,
    relations: Vec<RelationDescriptor>,
    parents: Vec<ParentLink>,
    defaults: Vec<(ModelType, &'static str, Value)>,
}

impl SchemaBuilder {
    /// Register a model with its primary-key field.
    #[must_use]
    pub fn model(mut self, model: ModelType, pk_field: &'static str) -> Self {
        self.models.push(ModelInfo {
            model,
            pk_field,
            auto_created: false,
        });
        self
    }

    /// Register an auto-generated join/through model.
    #[must_use]
    pub fn join_model(mut self, model: ModelType, pk_field: &'static str) -> Self {
        self.models.push(ModelInfo {
            model,
            pk_field,
            auto_created: true,
        });
        self
    }

    /// Register a foreign reference from `source.field` to `target`.
    #[must_use]
    pub fn relation(
        self,
        source: ModelType,
        field: &'static str,
        target: ModelType,
        nullable: bool,
        policy: RelationPolicy,
    ) -> Self {
        self.relation_descriptor(RelationDescriptor::new(
            source, field, target, nullable, policy,
        ))
    }

    /// Register a fully-built relation descriptor.
    #[must_use]
    pub fn relation_descriptor(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    /// Register a multi-table-inheritance link.
    ///
    /// The upward link also registers the downward cascade: deleting a
    /// parent row always deletes its child row, and the cascade keeps the
    /// parent ineligible for bulk fast deletion.
    #[must_use]
    pub fn parent_link(
        mut self,
        child: ModelType,
        field: &'static str,
        parent: ModelType,
    ) -> Self {
        self.parents.push(ParentLink::new(child, field, parent));
        self.relations.push(RelationDescriptor::new(
            child,
            field,
            parent,
            false,
            RelationPolicy::Cascade,
        ));
        self
    }

    /// Register the default value a `SetDefault` relation writes.
    #[must_use]
    pub fn default_value(mut self, model: ModelType, field: &'static str, value: Value) -> Self {
        self.defaults.push((model, field, value));
        self
    }

    /// Validate the metadata set and freeze it.
    pub fn build(self) -> Result<Schema, ConfigError> {
        let mut schema = Schema::default();

        for info in self.models {
            if schema.models.contains_key(&info.model) {
                return Err(ConfigError::DuplicateModel(info.model));
            }
            schema.models.insert(info.model, info);
        }

        for (model, field, value) in self.defaults {
            if !schema.models.contains_key(&model) {
                return Err(ConfigError::UnknownModel(model));
            }
            schema.defaults.insert((model, field), value);
        }

        for link in self.parents {
            if !schema.models.contains_key(&link.child) || !schema.models.contains_key(&link.parent)
            {
                return Err(ConfigError::UnregisteredParent {
                    child: link.child,
                    parent: link.parent,
                });
            }
            schema.parents.entry(link.child).or_default().push(link);
        }

        for relation in self.relations {
            validate_relation(&schema, &relation)?;
            schema
                .targeting
                .entry(relation.target)
                .or_default()
                .push(relation);
        }

        Ok(schema)
    }
}

// Per-relation metadata checks. Endpoint existence first, then the
// policy/field constraints that depend on it.
fn validate_relation(schema: &Schema, relation: &RelationDescriptor) -> Result<(), ConfigError> {
    if !schema.models.contains_key(&relation.source) || !schema.models.contains_key(&relation.target)
    {
        return Err(ConfigError::UnregisteredEndpoint {
            source_model: relation.source,
            field: relation.field,
            target: relation.target,
        });
    }

    if relation.synthetic && relation.policy != RelationPolicy::Cascade {
        return Err(ConfigError::SyntheticPolicy {
            source_model: relation.source,
            field: relation.field,
            policy: relation.policy.label(),
        });
    }

    match relation.policy {
        RelationPolicy::SetNull if !relation.nullable => Err(ConfigError::SetNullNotNullable {
            source_model: relation.source,
            field: relation.field,
        }),
        RelationPolicy::SetDefault
            if schema
                .default_value(relation.source, relation.field)
                .is_none() =>
        {
            Err(ConfigError::MissingDefault {
                source_model: relation.source,
                field: relation.field,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT: ModelType = ModelType::new("test::Left");
    const RIGHT: ModelType = ModelType::new("test::Right");

    #[test]
    fn build_accepts_well_formed_metadata() {
        let schema = Schema::builder()
            .model(LEFT, "id")
            .model(RIGHT, "id")
            .relation(LEFT, "right", RIGHT, false, RelationPolicy::Cascade)
            .build()
            .expect("well-formed schema should build");

        assert_eq!(
            schema.relations_targeting(RIGHT).len(),
            1,
            "relation should be indexed by target"
        );
        assert!(
            schema.relations_targeting(LEFT).is_empty(),
            "nothing targets the referencing side"
        );
    }

    #[test]
    fn build_rejects_duplicate_model() {
        let err = Schema::builder()
            .model(LEFT, "id")
            .model(LEFT, "id")
            .build()
            .expect_err("duplicate model should be rejected");

        assert!(matches!(err, ConfigError::DuplicateModel(model) if model == LEFT));
    }

    #[test]
    fn build_rejects_unregistered_relation_endpoint() {
        let err = Schema::builder()
            .model(LEFT, "id")
            .relation(LEFT, "right", RIGHT, false, RelationPolicy::Cascade)
            .build()
            .expect_err("missing target model should be rejected");

        assert!(matches!(err, ConfigError::UnregisteredEndpoint { .. }));
    }

    #[test]
    fn build_rejects_set_default_without_default() {
        let err = Schema::builder()
            .model(LEFT, "id")
            .model(RIGHT, "id")
            .relation(LEFT, "right", RIGHT, true, RelationPolicy::SetDefault)
            .build()
            .expect_err("set-default without a default should be rejected");

        assert!(matches!(err, ConfigError::MissingDefault { .. }));
    }

    #[test]
    fn build_rejects_set_null_on_non_nullable_field() {
        let err = Schema::builder()
            .model(LEFT, "id")
            .model(RIGHT, "id")
            .relation(LEFT, "right", RIGHT, false, RelationPolicy::SetNull)
            .build()
            .expect_err("set-null on a non-nullable field should be rejected");

        assert!(matches!(err, ConfigError::SetNullNotNullable { .. }));
    }

    #[test]
    fn build_rejects_non_cascading_synthetic_relation() {
        let err = Schema::builder()
            .model(LEFT, "id")
            .model(RIGHT, "id")
            .relation_descriptor(
                RelationDescriptor::new(LEFT, "right", RIGHT, true, RelationPolicy::SetNull)
                    .synthetic(),
            )
            .build()
            .expect_err("synthetic relation must cascade");

        assert!(matches!(err, ConfigError::SyntheticPolicy { .. }));
    }

    #[test]
    fn parent_link_registers_downward_cascade() {
        let schema = Schema::builder()
            .model(LEFT, "id")
            .model(RIGHT, "id")
            .parent_link(LEFT, "right_id", RIGHT)
            .build()
            .expect("parent link should build");

        assert_eq!(schema.parent_links(LEFT).len(), 1, "upward link registered");
        let downward = schema.relations_targeting(RIGHT);
        assert_eq!(downward.len(), 1, "downward cascade registered");
        assert_eq!(
            downward[0].policy,
            RelationPolicy::Cascade,
            "parent link cascades on parent delete"
        );
        assert!(!downward[0].nullable, "parent link is non-nullable");
    }
}
