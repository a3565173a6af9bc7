//! Binding of referential and shared simple properties.

use crate::error::Result;
use crate::model::{EntityRef, ModelEnvironment, PropertyKind};
use crate::pipeline::{Enhancer, EnhancerResult};
use crate::resolve::resolve;
use tracing::{debug, info};

/// Resolves `referenced_entity` of every referential and shared simple
/// property, then records the edge as an out-reference on the owner and an
/// in-reference on the referenced entity.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferencedEntityEnhancer;

impl Enhancer for ReferencedEntityEnhancer {
    fn name(&self) -> &'static str {
        "ReferencedEntityEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> Result<EnhancerResult> {
        let properties = env.property_index.matching(is_reference_kind);
        let mut unresolved = 0usize;

        for id in properties {
            let property = env.property(id);
            let target = resolve(
                env,
                &property.name,
                property.referenced_namespace_name.as_deref(),
                property.namespace,
                property.kind.referenced_kinds(),
            );
            let owner = property.parent_entity;
            env.property_mut(id).referenced_entity = target;

            let EntityRef::Entity(target) = target else {
                debug!(property = %env.property(id).name, "Referenced entity unresolved");
                unresolved += 1;
                continue;
            };

            let out_references = &mut env.entity_mut(owner).out_references;
            if !out_references.contains(&id) {
                out_references.push(id);
            }
            let in_references = &mut env.entity_mut(target).in_references;
            if !in_references.contains(&id) {
                in_references.push(id);
            }
        }

        info!(unresolved, "Bound referenced entities");
        Ok(EnhancerResult::ok(self.name()))
    }
}

/// Check whether a property kind carries a referenced entity.
pub fn is_reference_kind(kind: PropertyKind) -> bool {
    kind.is_referential() || kind.is_shared_simple()
}
