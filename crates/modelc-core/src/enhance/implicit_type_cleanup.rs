//! Pruning of generated simple types duplicated into extension namespaces.

use crate::error::Result;
use crate::model::{EntityId, ModelEnvironment};
use crate::pipeline::{Enhancer, EnhancerResult};
use crate::resolve::candidate_namespaces;
use tracing::debug;

/// Removes generated simple types from extension namespaces when a visible
/// dependency namespace already defines the same kind and name.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImplicitTypeCleanupEnhancer;

impl Enhancer for ImplicitTypeCleanupEnhancer {
    fn name(&self) -> &'static str {
        "ImplicitTypeCleanupEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> Result<EnhancerResult> {
        let mut duplicates: Vec<EntityId> = Vec::new();

        for namespace in env.namespaces().filter(|n| n.is_extension) {
            let dependencies: Vec<_> = candidate_namespaces(env, namespace.id)
                .into_iter()
                .skip(1)
                .collect();

            for id in namespace.entities.ids() {
                let entity = env.entity(id);
                if !entity.kind.is_implicit_simple_type() {
                    continue;
                }
                let shadowed = dependencies
                    .iter()
                    .any(|dep| env.namespace(*dep).entities.get(entity.kind, &entity.name).is_some());
                if shadowed {
                    debug!(
                        namespace = %namespace.name,
                        entity = %entity.name,
                        kind = %entity.kind,
                        "Pruning duplicate generated type"
                    );
                    duplicates.push(id);
                }
            }
        }

        for id in duplicates {
            env.remove_entity(id);
        }
        Ok(EnhancerResult::ok(self.name()))
    }
}
