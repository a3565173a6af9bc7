//! Relational annotations on entities and properties.
//!
//! [`RelationalAnnotationEnhancer`] runs first in the relational plugin and
//! decides table ids, schemas and table strategies, and how identity
//! updates cascade through references.

use crate::config::RelationalConfig;
use crate::error::{RelationalError, Result};
use crate::model::{TableIdentity, TableStrategy};
use crate::RELATIONAL_PLUGIN;
use modelc_core::model::Annotation;
use modelc_core::{
    EntityId, EntityKind, Enhancer, EnhancerResult, EntityRef, ModelEnvironment, PropertyId,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Relational data attached to every entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalEntityData {
    /// Id of the entity's main table.
    pub table_id: String,
    /// Schema of the entity's namespace.
    pub schema: String,
    /// Where sub-tables and extensions key to.
    pub table_strategy: TableStrategy,
    /// Identity updates cascade into this entity's table.
    pub cascade_primary_key_updates: bool,
}

impl Annotation for RelationalEntityData {
    const PLUGIN: &'static str = RELATIONAL_PLUGIN;
}

/// Relational data attached to every property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationalPropertyData {
    /// Shorten-to if present, else role name.
    pub context_prefix: String,
    /// Foreign keys through this property cascade deletes.
    pub delete_cascade_primary_key: bool,
    /// Cascading updates through this property would reach a row twice.
    pub causes_cyclic_update_cascade: bool,
}

impl Annotation for RelationalPropertyData {
    const PLUGIN: &'static str = RELATIONAL_PLUGIN;
}

/// Relational data of an entity.
pub fn entity_data(env: &ModelEnvironment, id: EntityId) -> Result<&RelationalEntityData> {
    env.entity(id)
        .data
        .get::<RelationalEntityData>()
        .ok_or_else(|| RelationalError::MissingAnnotation(env.entity(id).name.clone()))
}

/// Relational data of a property, or the defaults when not annotated.
pub fn property_data(env: &ModelEnvironment, id: PropertyId) -> RelationalPropertyData {
    env.property(id)
        .data
        .get::<RelationalPropertyData>()
        .cloned()
        .unwrap_or_default()
}

/// Kinds whose identity updates may cascade.
const CASCADE_KINDS: &[EntityKind] = &[
    EntityKind::DomainEntity,
    EntityKind::DomainEntitySubclass,
    EntityKind::Association,
    EntityKind::AssociationSubclass,
];

/// Table id of an entity's main table, ignoring extensions.
pub fn base_table_id(kind: EntityKind, name: &str) -> String {
    match kind {
        EntityKind::Descriptor => format!("{name}Descriptor"),
        EntityKind::Enumeration if name.ends_with("Type") => name.to_string(),
        EntityKind::Enumeration => format!("{name}Type"),
        EntityKind::SchoolYearEnumeration => "SchoolYearType".to_string(),
        _ => name.to_string(),
    }
}

/// Attaches [`RelationalEntityData`] and [`RelationalPropertyData`].
#[derive(Debug, Clone, Default)]
pub struct RelationalAnnotationEnhancer {
    config: RelationalConfig,
}

impl RelationalAnnotationEnhancer {
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    fn annotate_entities(&self, env: &mut ModelEnvironment) {
        let (extensions, others): (Vec<EntityId>, Vec<EntityId>) = env
            .entity_ids()
            .into_iter()
            .partition(|id| env.entity(*id).kind.is_extension());

        // Extensions name their table after the base, so bases go first.
        for id in others.into_iter().chain(extensions) {
            let entity = env.entity(id);
            let namespace = env.namespace(entity.namespace).name.clone();
            let schema = self.config.schema_for(&namespace);

            let base = entity.base_entity.entity();
            let (table_id, table_strategy) = match base {
                Some(base) if entity.kind.is_extension() => {
                    let base_table = env
                        .entity(base)
                        .data
                        .get::<RelationalEntityData>()
                        .map(|data| data.table_id.clone())
                        .unwrap_or_else(|| env.entity(base).name.clone());
                    (
                        format!("{base_table}{}", self.config.extension_table_suffix),
                        TableStrategy::Delegating { base },
                    )
                }
                _ => {
                    let table_id = base_table_id(entity.kind, &entity.name);
                    let identity = TableIdentity::new(&schema, &namespace, &table_id);
                    (table_id, TableStrategy::Default(identity))
                }
            };

            debug!(entity = %entity.name, table = %table_id, schema = %schema, "Annotating entity");
            let previous_cascade = entity
                .data
                .get::<RelationalEntityData>()
                .map(|data| data.cascade_primary_key_updates)
                .unwrap_or(false);
            env.entity_mut(id).data.insert(RelationalEntityData {
                table_id,
                schema,
                table_strategy,
                cascade_primary_key_updates: previous_cascade,
            });
        }
    }

    fn annotate_properties(&self, env: &mut ModelEnvironment) {
        for entity in env.entity_ids() {
            for property in env.entity(entity).properties.clone() {
                let p = env.property(property);
                let context_prefix = p.context_prefix().to_string();
                let delete_cascade_primary_key = p.is_delete_cascade;
                let data = env
                    .property_mut(property)
                    .data
                    .get_or_insert_default::<RelationalPropertyData>();
                data.context_prefix = context_prefix;
                data.delete_cascade_primary_key = delete_cascade_primary_key;
                data.causes_cyclic_update_cascade = false;
            }
        }
    }
}

/// Targets of an entity's identity references, in property order.
fn identity_reference_targets(env: &ModelEnvironment, id: EntityId) -> Vec<(PropertyId, EntityId)> {
    env.identity_properties(id)
        .into_iter()
        .filter_map(|p| {
            let property = env.property(p);
            if !property.kind.is_entity_reference() {
                return None;
            }
            match property.referenced_entity {
                EntityRef::Entity(target) => Some((p, target)),
                EntityRef::NoEntity => None,
            }
        })
        .collect()
}

/// Entities whose identity a subclass or entity depends on for cascades:
/// identity reference targets plus the base of a subclass.
fn cascade_dependencies(env: &ModelEnvironment, id: EntityId) -> Vec<EntityId> {
    let entity = env.entity(id);
    let mut dependencies: Vec<EntityId> = identity_reference_targets(env, id)
        .into_iter()
        .map(|(_, target)| target)
        .collect();
    if entity.kind.is_subclass() {
        if let Some(base) = entity.base_entity.entity() {
            dependencies.push(base);
        }
    }
    dependencies
}

/// Compute which entities cascade identity updates: an entity cascades if
/// it allows identity updates or depends on one that cascades.
pub fn cascading_entities(env: &ModelEnvironment) -> BTreeSet<EntityId> {
    let candidates = env.entity_ids_of_kinds(CASCADE_KINDS);
    let mut cascading: BTreeSet<EntityId> = candidates
        .iter()
        .copied()
        .filter(|id| env.entity(*id).allow_primary_key_updates)
        .collect();

    loop {
        let mut changed = false;
        for id in &candidates {
            if cascading.contains(id) {
                continue;
            }
            if cascade_dependencies(env, *id).iter().any(|d| cascading.contains(d)) {
                cascading.insert(*id);
                changed = true;
            }
        }
        if !changed {
            return cascading;
        }
    }
}

/// Entities allowing identity updates whose cascades reach `id`.
fn cascade_origins(
    env: &ModelEnvironment,
    id: EntityId,
    memo: &mut BTreeMap<EntityId, BTreeSet<EntityId>>,
    on_path: &mut BTreeSet<EntityId>,
) -> BTreeSet<EntityId> {
    if let Some(origins) = memo.get(&id) {
        return origins.clone();
    }
    let mut origins = BTreeSet::new();
    if !on_path.insert(id) {
        return origins;
    }
    if env.entity(id).allow_primary_key_updates {
        origins.insert(id);
    }
    for dependency in cascade_dependencies(env, id) {
        origins.extend(cascade_origins(env, dependency, memo, on_path));
    }
    on_path.remove(&id);
    memo.insert(id, origins.clone());
    origins
}

impl Enhancer for RelationalAnnotationEnhancer {
    fn name(&self) -> &'static str {
        "RelationalAnnotationEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> modelc_core::Result<EnhancerResult> {
        self.annotate_entities(env);
        self.annotate_properties(env);

        let cascading = cascading_entities(env);
        for id in env.entity_ids() {
            let cascades = cascading.contains(&id);
            if let Some(data) = env.entity_mut(id).data.get_mut::<RelationalEntityData>() {
                data.cascade_primary_key_updates = cascades;
            }
        }

        // A second cascading path from an origin already covered by an
        // earlier identity reference would update the same row twice.
        let mut memo = BTreeMap::new();
        let mut cyclic = Vec::new();
        for id in env.entity_ids_of_kinds(CASCADE_KINDS) {
            let mut covered: BTreeSet<EntityId> = BTreeSet::new();
            for (property, target) in identity_reference_targets(env, id) {
                if !cascading.contains(&target) {
                    continue;
                }
                let origins = cascade_origins(env, target, &mut memo, &mut BTreeSet::new());
                if origins.iter().any(|o| covered.contains(o)) {
                    cyclic.push(property);
                }
                covered.extend(origins);
            }
        }
        for property in &cyclic {
            env.property_mut(*property)
                .data
                .get_or_insert_default::<RelationalPropertyData>()
                .causes_cyclic_update_cascade = true;
        }

        info!(
            entities = env.entity_ids().len(),
            cascading = cascading.len(),
            cyclic = cyclic.len(),
            "Annotated entities for relational derivation"
        );
        Ok(EnhancerResult::ok(self.name()))
    }
}
