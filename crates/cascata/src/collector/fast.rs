use crate::{
    collector::Batch,
    hook::HookSink,
    model::{RelationDescriptor, RelationPolicy},
    schema::Schema,
};

/// Decide whether a candidate batch can be deleted as one bulk statement,
/// skipping materialization, graph expansion, and hooks.
///
/// `via` is the relation the batch was reached through (`None` for roots).
/// Every check must hold:
/// 1. the batch is expressible as a storage-layer filter;
/// 2. no delete hook is registered for the model (hooks need materialized
///    instances);
/// 3. the batch was reached through a cascading relation, if any;
/// 4. every inheritance parent of the model is reachable only through the
///    link the batch came in on (anything else would skip a parent cascade);
/// 5. every relation targeting the model is `DoNothing`, and none of them
///    is synthetic (all other policies need to know which rows are involved).
pub(crate) fn can_fast_delete(
    schema: &Schema,
    hooks: &dyn HookSink,
    batch: &Batch,
    via: Option<&RelationDescriptor>,
) -> bool {
    let model = batch.model();

    if !batch.is_filterable() {
        return false;
    }

    if hooks.has_listeners(model) {
        return false;
    }

    if let Some(relation) = via
        && relation.policy != RelationPolicy::Cascade
    {
        return false;
    }

    let parents_covered = schema.parent_links(model).iter().all(|link| {
        via.is_some_and(|relation| {
            relation.source == link.child
                && relation.field == link.field
                && relation.target == link.parent
        })
    });
    if !parents_covered {
        return false;
    }

    schema
        .relations_targeting(model)
        .iter()
        .all(|relation| !relation.synthetic && relation.policy == RelationPolicy::DoNothing)
}
