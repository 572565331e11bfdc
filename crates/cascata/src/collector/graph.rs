use crate::model::ModelType;
use std::collections::{BTreeMap, BTreeSet};

///
/// DependencyGraph
///
/// Delete-after ordering over model types. An edge `after -> before` means
/// rows of `after` must be deleted strictly after rows of `before`; edges
/// are recorded only for non-nullable cascades and inheritance links, the
/// cases where the storage layer would reject the wrong order outright.
///

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<ModelType, BTreeSet<ModelType>>,
}

impl DependencyGraph {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            edges: BTreeMap::new(),
        }
    }

    /// Record that `after` must be deleted strictly after `before`.
    pub fn add(&mut self, after: ModelType, before: ModelType) {
        if after == before {
            // Self-references order within one type, not across types.
            return;
        }
        self.edges.entry(after).or_default().insert(before);
    }

    /// Returns `true` if no edges have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Types `after` must wait for, if any.
    #[must_use]
    pub fn deleted_before(&self, after: ModelType) -> Option<&BTreeSet<ModelType>> {
        self.edges.get(&after)
    }

    /// Best-effort topological order over `discovered`.
    ///
    /// Each pass appends every type whose wait-set is already fully ordered.
    /// A pass that makes no progress means a hard cycle with non-nullable
    /// edges on both sides; the sort returns `None` and the caller decides
    /// on a fallback order instead of receiving a silently-partial one.
    #[must_use]
    pub fn sort(&self, discovered: &[ModelType]) -> Option<Vec<ModelType>> {
        let mut ordered: Vec<ModelType> = Vec::with_capacity(discovered.len());
        let mut placed: BTreeSet<ModelType> = BTreeSet::new();

        while ordered.len() < discovered.len() {
            let mut progressed = false;

            for model in discovered {
                if placed.contains(model) {
                    continue;
                }
                let ready = self.edges.get(model).is_none_or(|waits| {
                    waits
                        .iter()
                        .all(|dep| placed.contains(dep) || !discovered.contains(dep))
                });
                if ready {
                    ordered.push(*model);
                    placed.insert(*model);
                    progressed = true;
                }
            }

            if !progressed {
                return None;
            }
        }

        Some(ordered)
    }
}
