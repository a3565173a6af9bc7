//! Merge directive resolution.

use crate::error::Result;
use crate::model::{EntityId, EntityRef, MergeLink, ModelEnvironment, PropertyId};
use crate::pipeline::{Enhancer, EnhancerResult};
use tracing::{debug, info};

/// Outcome of walking one merge path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathResolution {
    /// Property the whole path resolved to.
    pub property: Option<PropertyId>,
    /// Properties matched segment by segment, partial when resolution failed.
    pub chain: Vec<PropertyId>,
}

/// Find a property by full name on an entity, its extensions, then its base
/// entity chain.
pub fn find_property(env: &ModelEnvironment, entity: EntityId, full_name: &str) -> Option<PropertyId> {
    let mut visited = Vec::new();
    let mut current = Some(entity);
    while let Some(id) = current {
        if visited.contains(&id) {
            break;
        }
        visited.push(id);

        if let Some(found) = env.property_by_full_name(id, full_name) {
            return Some(found);
        }
        let found = env
            .entity(id)
            .extended_by
            .iter()
            .find_map(|extension| env.property_by_full_name(*extension, full_name));
        if found.is_some() {
            return found;
        }
        current = env.entity(id).base_entity.entity();
    }
    None
}

/// Walk a merge path one segment at a time, starting at `entity`.
///
/// Every segment but the last must land on a referential property with a
/// bound referenced entity. The last segment may be any property.
pub fn resolve_path(env: &ModelEnvironment, entity: EntityId, path: &[String]) -> PathResolution {
    let mut resolution = PathResolution::default();
    let mut current = entity;

    for (index, segment) in path.iter().enumerate() {
        let Some(found) = find_property(env, current, segment) else {
            return resolution;
        };
        resolution.chain.push(found);

        if index + 1 == path.len() {
            resolution.property = Some(found);
            return resolution;
        }

        let property = env.property(found);
        match property.referenced_entity {
            EntityRef::Entity(next) if property.kind.is_referential() => current = next,
            _ => return resolution,
        }
    }
    resolution
}

/// Resolves both paths of every merge directive against the declaring
/// property's owning entity and records `merge_sourced_by` and
/// `merge_targeted_by` on the resolved properties.
#[derive(Debug, Default, Clone, Copy)]
pub struct MergeDirectiveEnhancer;

impl Enhancer for MergeDirectiveEnhancer {
    fn name(&self) -> &'static str {
        "MergeDirectiveEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> Result<EnhancerResult> {
        let owners = env.property_index.matching(super::is_reference_kind);
        let mut unresolved = 0usize;

        for owner in owners {
            let property = env.property(owner);
            if property.merge_directives.is_empty() {
                continue;
            }
            let entity = property.parent_entity;
            let resolutions: Vec<(PathResolution, PathResolution)> = property
                .merge_directives
                .iter()
                .map(|d| {
                    (
                        resolve_path(env, entity, &d.source_path),
                        resolve_path(env, entity, &d.target_path),
                    )
                })
                .collect();

            for (index, (source, target)) in resolutions.into_iter().enumerate() {
                let link = MergeLink {
                    owner,
                    directive: index,
                };
                if let Some(resolved) = source.property {
                    let links = &mut env.property_mut(resolved).merge_sourced_by;
                    if !links.contains(&link) {
                        links.push(link);
                    }
                }
                if let Some(resolved) = target.property {
                    let links = &mut env.property_mut(resolved).merge_targeted_by;
                    if !links.contains(&link) {
                        links.push(link);
                    }
                }

                let directive = &mut env.property_mut(owner).merge_directives[index];
                directive.source_property = source.property;
                directive.source_property_chain = source.chain;
                directive.target_property = target.property;
                directive.target_property_chain = target.chain;
                if !directive.is_resolved() {
                    debug!(
                        source = %directive.source_path_string(),
                        target = %directive.target_path_string(),
                        "Merge directive unresolved"
                    );
                    unresolved += 1;
                }
            }
        }

        info!(unresolved, "Resolved merge directives");
        Ok(EnhancerResult::ok(self.name()))
    }
}
