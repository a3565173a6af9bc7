//! Cross-namespace reference resolution.
//!
//! A namespace sees its own entities and those of the namespaces it declares
//! as dependencies, never the other way around.

use crate::model::{EntityKind, EntityRef, ModelEnvironment, NamespaceId};

/// Namespaces visible from `requesting`: itself first, then its dependencies
/// in declared order.
pub fn candidate_namespaces(env: &ModelEnvironment, requesting: NamespaceId) -> Vec<NamespaceId> {
    let mut candidates = vec![requesting];
    for dependency in &env.namespace(requesting).dependencies {
        if !candidates.contains(dependency) {
            candidates.push(*dependency);
        }
    }
    candidates
}

/// Resolve an entity name as seen from a namespace.
///
/// When `namespace_name` is given, only a visible namespace with that name is
/// searched. Within each candidate namespace, kinds are tried in the order
/// given, so a name matching two kinds resolves deterministically.
pub fn resolve(
    env: &ModelEnvironment,
    name: &str,
    namespace_name: Option<&str>,
    requesting: NamespaceId,
    kinds: &[EntityKind],
) -> EntityRef {
    let candidates = candidate_namespaces(env, requesting);
    let restricted = candidates.into_iter().filter(|ns| match namespace_name {
        Some(wanted) => env.namespace(*ns).name == wanted,
        None => true,
    });

    for ns in restricted {
        let repository = &env.namespace(ns).entities;
        for kind in kinds {
            if let Some(id) = repository.get(*kind, name) {
                return EntityRef::Entity(id);
            }
        }
    }
    EntityRef::NoEntity
}
