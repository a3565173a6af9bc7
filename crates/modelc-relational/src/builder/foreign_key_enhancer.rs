//! Foreign keys for reference and lookup properties.
//!
//! Columns are grouped by the reference property that contributed them
//! directly and the parent context it was built under, so a common reused
//! under two role names keys twice. Each primary key column of the
//! referenced table is matched to a column of the group by shared source
//! property, then by identical id, then by merged reference context, then
//! by a single parent-context prefix. Columns dropped by a merge directive
//! are found through the directive's target instead.
//!
//! A group with no match for some key gets no foreign key; the skip is
//! logged and the run continues.

use super::{find_table, tables};
use crate::annotation::{entity_data, property_data};
use crate::error::{RelationalError, Result};
use crate::model::{
    Column, ColumnPair, ForeignKey, ForeignKeySource, ForeignKeySourceReference, ForeignKeyStrategy,
    ForeignKeyStrategyLayer, Table,
};
use indexmap::IndexMap;
use modelc_core::{EntityKind, EntityProperty, Enhancer, EnhancerResult, ModelEnvironment, PropertyId, PropertyKind};
use tracing::{debug, info, warn};

/// Whether a property's columns point at a single-key lookup table.
fn is_lookup(kind: PropertyKind) -> bool {
    matches!(
        kind,
        PropertyKind::Descriptor | PropertyKind::Enumeration | PropertyKind::SchoolYearEnumeration
    )
}

/// Match a referenced primary key column to one of `candidates`.
fn match_column<'t>(property: &EntityProperty, target: &Column, candidates: &[&'t Column]) -> Option<&'t Column> {
    let sharing: Vec<&Column> = candidates
        .iter()
        .copied()
        .filter(|c| c.shares_source_with(target))
        .collect();
    match sharing.as_slice() {
        [] => return None,
        [only] => return Some(*only),
        _ => {}
    }

    if let Some(same_id) = sharing.iter().find(|c| c.column_id == target.column_id) {
        return Some(*same_id);
    }

    let context = format!("{}{}", property.full_property_name(), target.reference_context);
    if let Some(by_context) = sharing
        .iter()
        .find(|c| c.merged_reference_contexts.iter().any(|m| *m == context))
    {
        return Some(*by_context);
    }

    let prefixed: Vec<&&Column> = sharing
        .iter()
        .filter(|c| target.differs_by_parent_context_prefix(c))
        .collect();
    match prefixed.as_slice() {
        [only] => Some(**only),
        _ => None,
    }
}

/// Source properties a merge target stands for: the primary key sources of
/// the referenced table for a reference, else the target itself.
fn expanded_merge_targets(env: &ModelEnvironment, merged_into: PropertyId) -> Vec<PropertyId> {
    let p = env.property(merged_into);
    let referenced_keys = p
        .referenced_entity
        .entity()
        .filter(|_| p.kind.is_entity_reference())
        .and_then(|target| entity_data(env, target).ok())
        .and_then(|data| data.table_strategy.resolve(env).ok())
        .and_then(|identity| find_table(env, &identity));
    let Some(referenced) = referenced_keys else {
        return vec![merged_into];
    };

    let mut expanded = Vec::new();
    for key in referenced.primary_keys() {
        for source in &key.source_entity_properties {
            if !expanded.contains(source) {
                expanded.push(*source);
            }
        }
    }
    expanded
}

/// Reference context prefixes a merge target's column may carry in `table`.
///
/// Parent keys copied into a sub-table have the owner's table id in front.
fn merge_target_contexts(
    env: &ModelEnvironment,
    table: &Table,
    property: &EntityProperty,
    target_path: String,
) -> Vec<String> {
    let owner = env.entity(property.parent_entity);
    let owner_table = entity_data(env, property.parent_entity)
        .ok()
        .and_then(|data| data.table_strategy.resolve(env).ok())
        .map(|identity| identity.table_id);
    match owner_table {
        Some(owner_table) if owner.kind != EntityKind::Choice && owner_table != table.table_id => {
            vec![format!("{owner_table}{target_path}"), target_path]
        }
        _ => vec![target_path],
    }
}

/// Find the column a merge directive folded `target` into.
fn merged_column<'t>(
    env: &ModelEnvironment,
    table: &'t Table,
    property: &EntityProperty,
    target: &Column,
) -> Option<&'t Column> {
    for directive in &property.merge_directives {
        let Some(merged_into) = directive.target_property else {
            continue;
        };
        let source_tail = directive.source_path.get(1..).unwrap_or_default().concat();
        let applies = directive
            .source_property
            .is_some_and(|source| target.source_entity_properties.contains(&source))
            || (!source_tail.is_empty()
                && target
                    .merged_reference_contexts
                    .iter()
                    .any(|context| context.starts_with(&source_tail)));
        if !applies {
            continue;
        }

        let expanded = expanded_merge_targets(env, merged_into);
        let target_source = match expanded.as_slice() {
            [only] => Some(*only),
            _ => expanded
                .iter()
                .copied()
                .find(|p| target.source_entity_properties.contains(p)),
        };
        let Some(target_source) = target_source else {
            continue;
        };

        for context in merge_target_contexts(env, table, property, directive.target_path.concat()) {
            let found = table.columns.iter().find(|c| {
                c.source_entity_properties.contains(&target_source)
                    && c.merged_reference_contexts.iter().any(|m| m.starts_with(&context))
            });
            if let Some(column) = found {
                debug!(
                    table = %table.table_id,
                    column = %column.column_id,
                    directive = %directive.source_path_string(),
                    "Matched merged column"
                );
                return Some(column);
            }
        }
    }
    None
}

/// Adds foreign keys from each table's reference and lookup columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignKeyEnhancer;

impl ForeignKeyEnhancer {
    /// Foreign keys a table needs, before naming.
    pub fn foreign_keys_for(&self, env: &ModelEnvironment, table: &Table) -> Result<Vec<ForeignKey>> {
        let mut groups: IndexMap<&ForeignKeySource, Vec<&Column>> = IndexMap::new();
        for column in &table.columns {
            for source in &column.foreign_key_sources {
                groups.entry(source).or_default().push(column);
            }
        }

        let mut foreign_keys = Vec::new();
        'groups: for (source, columns) in groups {
            let property = source.property;
            let p = env.property(property);
            let eligible = is_lookup(p.kind) || (p.kind.is_entity_reference() && !p.is_weak);
            if !eligible {
                continue;
            }
            let Some(target) = p.referenced_entity.entity() else {
                continue;
            };
            let target_data = entity_data(env, target)?;
            let identity = target_data.table_strategy.resolve(env)?;
            let foreign_table = find_table(env, &identity).ok_or_else(|| RelationalError::MissingTable {
                entity: env.entity(target).name.clone(),
                table_id: identity.table_id.clone(),
            })?;

            let unmatched = |column: &str| RelationalError::UnmatchedForeignKeyColumn {
                table: table.identity().to_string(),
                property: p.full_property_name(),
                foreign_table: identity.to_string(),
                column: column.to_string(),
            };

            let mut foreign_key = ForeignKey::new(identity.clone()).with_source_reference(ForeignKeySourceReference::from_property(p));
            let target_keys = foreign_table.primary_keys();
            if is_lookup(p.kind) {
                let ([column], [key]) = (columns.as_slice(), target_keys.as_slice()) else {
                    let key = target_keys.first().map(|k| k.column_id.as_str()).unwrap_or_default();
                    warn!(error = %unmatched(key), context = %source.context, "Skipping foreign key");
                    continue;
                };
                foreign_key.add_column_pair(ColumnPair::new(&column.column_id, &key.column_id));
            } else {
                for key in target_keys {
                    let Some(matched) = match_column(p, key, &columns).or_else(|| merged_column(env, table, p, key))
                    else {
                        warn!(error = %unmatched(&key.column_id), context = %source.context, "Skipping foreign key");
                        continue 'groups;
                    };
                    foreign_key.add_column_pair(ColumnPair::new(&matched.column_id, &key.column_id));
                }
            }

            let data = property_data(env, property);
            let strategy = ForeignKeyStrategy::unchanged()
                .then_if(data.delete_cascade_primary_key, ForeignKeyStrategyLayer::CascadeDelete)
                .then_if(
                    target_data.cascade_primary_key_updates && !data.causes_cyclic_update_cascade,
                    ForeignKeyStrategyLayer::CascadeUpdate,
                );
            foreign_keys.push(strategy.apply(foreign_key));
        }
        Ok(foreign_keys)
    }
}

impl Enhancer for ForeignKeyEnhancer {
    fn name(&self) -> &'static str {
        "ForeignKeyEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> modelc_core::Result<EnhancerResult> {
        let mut pending = Vec::new();
        for namespace in env.namespace_ids() {
            let Some(derived) = tables(env, namespace) else {
                continue;
            };
            for table in derived.values() {
                let foreign_keys = self
                    .foreign_keys_for(env, table)
                    .map_err(|e| e.into_enhancer_error(self.name()))?;
                pending.push((namespace, table.table_id.clone(), foreign_keys));
            }
        }

        let mut added = 0;
        for (namespace, table_id, foreign_keys) in pending {
            let Some(table) = env
                .namespace_mut(namespace)
                .data
                .get_mut::<super::NamespaceTables>()
                .and_then(|derived| derived.tables.get_mut(&table_id))
            else {
                continue;
            };
            for foreign_key in foreign_keys {
                if table.has_equivalent_foreign_key(&foreign_key) {
                    continue;
                }
                table.add_foreign_key(foreign_key);
                added += 1;
            }
        }

        info!(foreign_keys = added, "Added reference foreign keys");
        Ok(EnhancerResult::ok(self.name()))
    }
}
