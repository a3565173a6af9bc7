//! Unified validators.
//!
//! Each reports the unresolved links an enhancer left at their sentinel.

use crate::enhance::is_reference_kind;
use crate::model::{EntityKind, EntityRef, ModelEnvironment};
use crate::pipeline::Validator;
use crate::validation::ValidationFailure;

/// Every subclass and extension entity must have a bound base entity.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseEntityMustExist;

impl Validator for BaseEntityMustExist {
    fn name(&self) -> &'static str {
        "BaseEntityMustExist"
    }

    fn validate(&self, env: &ModelEnvironment) -> Vec<ValidationFailure> {
        env.entity_ids()
            .into_iter()
            .map(|id| env.entity(id))
            .filter(|entity| entity.has_base() && entity.base_entity == EntityRef::NoEntity)
            .map(|entity| {
                let qualified = match &entity.base_entity_namespace_name {
                    Some(ns) => format!("{ns}.{}", entity.base_entity_name),
                    None => entity.base_entity_name.clone(),
                };
                ValidationFailure::error(
                    self.name(),
                    format!(
                        "{} '{}' in namespace '{}' has base entity '{}' that cannot be found",
                        entity.kind,
                        entity.name,
                        env.namespace(entity.namespace).name,
                        qualified
                    ),
                )
                .at(&entity.source_location)
            })
            .collect()
    }
}

/// Every referential and shared simple property must resolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferencedEntityMustExist;

impl Validator for ReferencedEntityMustExist {
    fn name(&self) -> &'static str {
        "ReferencedEntityMustExist"
    }

    fn validate(&self, env: &ModelEnvironment) -> Vec<ValidationFailure> {
        env.property_index
            .matching(is_reference_kind)
            .into_iter()
            .map(|id| env.property(id))
            .filter(|property| property.referenced_entity == EntityRef::NoEntity)
            .map(|property| {
                ValidationFailure::error(
                    self.name(),
                    format!(
                        "{} property '{}' on '{}' does not match any visible {}",
                        property.kind,
                        property.full_property_name(),
                        env.entity(property.parent_entity).name,
                        kinds_list(property.kind.referenced_kinds())
                    ),
                )
                .at(&property.source_location)
            })
            .collect()
    }
}

/// Both paths of every merge directive must resolve, reported separately.
#[derive(Debug, Default, Clone, Copy)]
pub struct MergeDirectivePathMustExist;

impl Validator for MergeDirectivePathMustExist {
    fn name(&self) -> &'static str {
        "MergeDirectivePathMustExist"
    }

    fn validate(&self, env: &ModelEnvironment) -> Vec<ValidationFailure> {
        let mut failures = Vec::new();
        for id in env.property_index.matching(is_reference_kind) {
            let property = env.property(id);
            let owner = &env.entity(property.parent_entity).name;
            for directive in &property.merge_directives {
                if directive.source_property.is_none() {
                    failures.push(
                        ValidationFailure::error(
                            self.name(),
                            format!(
                                "merge source path '{}' on '{}.{}' cannot be resolved",
                                directive.source_path_string(),
                                owner,
                                property.full_property_name()
                            ),
                        )
                        .at(&directive.source_location),
                    );
                }
                if directive.target_property.is_none() {
                    failures.push(
                        ValidationFailure::error(
                            self.name(),
                            format!(
                                "merge target path '{}' on '{}.{}' cannot be resolved",
                                directive.target_path_string(),
                                owner,
                                property.full_property_name()
                            ),
                        )
                        .at(&directive.source_location),
                    );
                }
            }
        }
        failures
    }
}

/// Every item of a domain, subdomain or interchange must resolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct ItemMustExist;

impl Validator for ItemMustExist {
    fn name(&self) -> &'static str {
        "ItemMustExist"
    }

    fn validate(&self, env: &ModelEnvironment) -> Vec<ValidationFailure> {
        let owners = env.entity_ids_of_kinds(&[
            EntityKind::Domain,
            EntityKind::Subdomain,
            EntityKind::Interchange,
            EntityKind::InterchangeExtension,
        ]);

        let mut failures = Vec::new();
        for owner in owners {
            let entity = env.entity(owner);
            for item in &entity.items {
                if item.referenced_entity.is_resolved() {
                    continue;
                }
                failures.push(
                    ValidationFailure::error(
                        self.name(),
                        format!("{} item '{}' on {} '{}' cannot be found", item.kind, item.name, entity.kind, entity.name),
                    )
                    .at(&item.source_location),
                );
            }
            if entity.parent_domain_name.is_some() && !entity.parent_domain.is_resolved() {
                failures.push(
                    ValidationFailure::error(
                        self.name(),
                        format!("parent domain of subdomain '{}' cannot be found", entity.name),
                    )
                    .at(&entity.source_location),
                );
            }
        }
        failures
    }
}

fn kinds_list(kinds: &[EntityKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}
