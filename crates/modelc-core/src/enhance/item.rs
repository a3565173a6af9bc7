//! Binding of domain, subdomain and interchange items.

use crate::error::Result;
use crate::model::{EntityKind, EntityRef, ModelEnvironment};
use crate::pipeline::{Enhancer, EnhancerResult};
use crate::resolve::resolve;

const ITEM_OWNERS: [EntityKind; 4] = [
    EntityKind::Domain,
    EntityKind::Subdomain,
    EntityKind::Interchange,
    EntityKind::InterchangeExtension,
];

/// Resolves the entities named by items and the parent domain of subdomains.
#[derive(Debug, Default, Clone, Copy)]
pub struct ItemEnhancer;

impl Enhancer for ItemEnhancer {
    fn name(&self) -> &'static str {
        "ItemEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> Result<EnhancerResult> {
        for owner in env.entity_ids_of_kinds(&ITEM_OWNERS) {
            let entity = env.entity(owner);
            let resolved: Vec<EntityRef> = entity
                .items
                .iter()
                .map(|item| {
                    let kinds = match item.kind.item_lookup_kinds() {
                        [] => std::slice::from_ref(&item.kind),
                        kinds => kinds,
                    };
                    resolve(env, &item.name, item.namespace_name.as_deref(), entity.namespace, kinds)
                })
                .collect();
            let parent = match &entity.parent_domain_name {
                Some(name) => resolve(env, name, None, entity.namespace, &[EntityKind::Domain]),
                None => EntityRef::NoEntity,
            };

            let entity = env.entity_mut(owner);
            for (item, target) in entity.items.iter_mut().zip(resolved) {
                item.referenced_entity = target;
            }
            entity.parent_domain = parent;
        }
        Ok(EnhancerResult::ok(self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelItem, TopLevelEntity};

    #[test]
    fn test_binds_items_and_parent_domain() {
        let mut env = ModelEnvironment::new();
        let core = env.add_namespace("EdFi", false, &[]);
        let school = env
            .add_entity(core, TopLevelEntity::new(EntityKind::DomainEntitySubclass, "School"))
            .unwrap();
        let domain = env
            .add_entity(
                core,
                TopLevelEntity::new(EntityKind::Domain, "Enrollment")
                    .with_item(ModelItem::new(EntityKind::DomainEntity, "School"))
                    .with_item(ModelItem::new(EntityKind::Association, "Missing")),
            )
            .unwrap();
        let subdomain = env
            .add_entity(
                core,
                TopLevelEntity::new(EntityKind::Subdomain, "Attendance").with_parent_domain("Enrollment"),
            )
            .unwrap();

        ItemEnhancer.enhance(&mut env).unwrap();

        let items = &env.entity(domain).items;
        assert_eq!(items[0].referenced_entity, EntityRef::Entity(school));
        assert_eq!(items[1].referenced_entity, EntityRef::NoEntity);
        assert_eq!(env.entity(subdomain).parent_domain, EntityRef::Entity(domain));
    }
}
