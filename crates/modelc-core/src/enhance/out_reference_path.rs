//! Enumeration of reference paths from each entity down to leaf entities.

use crate::error::Result;
use crate::model::{EntityId, ModelEnvironment, PropertyId, ReferencePath};
use crate::pipeline::{Enhancer, EnhancerResult};
use tracing::info;

/// Records, for every entity, each distinct path of referential properties
/// leading from it to an entity with no outgoing references.
///
/// The walk starts at leaf entities and follows `in_references` backward,
/// prepending each traversed property. Entities already on the current path
/// are skipped, so cycles terminate while diamonds still yield every path.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutReferencePathEnhancer;

impl Enhancer for OutReferencePathEnhancer {
    fn name(&self) -> &'static str {
        "OutReferencePathEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> Result<EnhancerResult> {
        let leaves: Vec<EntityId> = env
            .entity_ids()
            .into_iter()
            .filter(|id| env.entity(*id).out_references.is_empty())
            .collect();

        let mut recorded = 0usize;
        for leaf in leaves {
            let referencing = env.entity(leaf).in_references.clone();
            for property in referencing {
                recorded += walk(env, property, &[], &[leaf]);
            }
        }

        info!(recorded, "Enumerated out-reference paths");
        Ok(EnhancerResult::ok(self.name()))
    }
}

/// Record `property ++ suffix` on the property's owner, then continue into
/// every property referencing that owner.
fn walk(env: &mut ModelEnvironment, property: PropertyId, suffix: &[PropertyId], on_path: &[EntityId]) -> usize {
    let owner = env.property(property).parent_entity;
    if on_path.contains(&owner) {
        return 0;
    }

    let mut path: ReferencePath = Vec::with_capacity(suffix.len() + 1);
    path.push(property);
    path.extend_from_slice(suffix);

    if !record(env, owner, &path) {
        return 0;
    }

    let mut on_path = on_path.to_vec();
    on_path.push(owner);

    let mut recorded = 1;
    for next in env.entity(owner).in_references.clone() {
        recorded += walk(env, next, &path, &on_path);
    }
    recorded
}

/// Add a path to an entity and its lookup maps, returning false when the
/// entity already has it.
fn record(env: &mut ModelEnvironment, owner: EntityId, path: &ReferencePath) -> bool {
    if env.entity(owner).out_reference_paths.contains(path) {
        return false;
    }
    let touched: Vec<EntityId> = path
        .iter()
        .filter_map(|p| env.property(*p).referenced_entity.entity())
        .collect();

    let entity = env.entity_mut(owner);
    entity.out_reference_paths.push(path.clone());
    for target in &touched {
        entity
            .out_reference_entities_map
            .entry(*target)
            .or_default()
            .push(path.clone());
    }
    if let Some(endpoint) = touched.last() {
        entity
            .out_reference_entity_endpoints_map
            .entry(*endpoint)
            .or_default()
            .push(path.clone());
    }
    true
}
