//! Binding of subclass and extension entities to their base entities.

use crate::error::Result;
use crate::model::{BaseLink, EntityRef, ModelEnvironment};
use crate::pipeline::{Enhancer, EnhancerResult};
use crate::resolve::resolve;
use tracing::{debug, info};

/// Resolves `base_entity_name` of every subclass and extension entity and
/// records the child on the base's `extended_by` or `subclassed_by`.
///
/// Unresolved bases stay at [`EntityRef::NoEntity`]; reporting them is left
/// to [`BaseEntityMustExist`](crate::validate::BaseEntityMustExist).
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseEntityEnhancer;

impl Enhancer for BaseEntityEnhancer {
    fn name(&self) -> &'static str {
        "BaseEntityEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> Result<EnhancerResult> {
        let mut bound = 0usize;

        for child in env.entity_ids() {
            let entity = env.entity(child);
            let Some(link) = entity.kind.base_link() else {
                continue;
            };
            let base = resolve(
                env,
                &entity.base_entity_name,
                entity.base_entity_namespace_name.as_deref(),
                entity.namespace,
                entity.kind.base_kinds(),
            );
            env.entity_mut(child).base_entity = base;

            let EntityRef::Entity(base) = base else {
                debug!(entity = %env.entity(child).name, "Base entity unresolved");
                continue;
            };
            let parent = env.entity_mut(base);
            let children = match link {
                BaseLink::ExtendedBy => &mut parent.extended_by,
                BaseLink::SubclassedBy => &mut parent.subclassed_by,
            };
            if !children.contains(&child) {
                children.push(child);
            }
            bound += 1;
        }

        info!(bound, "Bound base entities");
        Ok(EnhancerResult::ok(self.name()))
    }
}
