//! Entity-level table building.
//!
//! Every domain entity, association and descriptor gets a main table,
//! subclasses get a table keyed on the base identity, extensions add a
//! table keyed on their base and enumerations get a type table. Results
//! replace the [`NamespaceTables`] of every namespace on each run.

use super::build_strategy::BuildStrategy;
use super::column_creator::ColumnCreator;
use super::table_builder::{ParentTable, TableBuilder};
use super::NamespaceTables;
use crate::annotation::entity_data;
use crate::config::RelationalConfig;
use crate::error::Result;
use crate::model::{
    Column, ColumnPair, ColumnTransform, ColumnType, ForeignKey, ForeignKeySourceReference,
    ForeignKeyStrategy, ForeignKeyStrategyLayer, NameComponent, NameSource, Table, TableIdentity,
};
use indexmap::IndexMap;
use modelc_core::{EntityId, EntityKind, Enhancer, EnhancerResult, ModelEnvironment, PropertyKind};
use tracing::{debug, info};

/// Builds every derived table.
#[derive(Debug, Clone, Default)]
pub struct TableBuildingEnhancer {
    config: RelationalConfig,
}

/// Tables built for one entity plus any base tables needing a
/// discriminator.
#[derive(Default)]
struct EntityTables {
    tables: Vec<Table>,
    discriminated: Option<TableIdentity>,
}

/// Whether a property's columns were already added as table keys.
fn is_key_property(env: &ModelEnvironment, property: modelc_core::PropertyId) -> bool {
    let p = env.property(property);
    p.is_part_of_identity
        && !p.is_collection()
        && !matches!(p.kind, PropertyKind::Common | PropertyKind::InlineCommon | PropertyKind::Choice)
}

impl TableBuildingEnhancer {
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    fn build_entity(&self, env: &ModelEnvironment, id: EntityId) -> Result<EntityTables> {
        match env.entity(id).kind {
            EntityKind::DomainEntity | EntityKind::Association | EntityKind::Descriptor => {
                self.main_tables(env, id)
            }
            EntityKind::DomainEntitySubclass | EntityKind::AssociationSubclass => self.subclass_tables(env, id),
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension => {
                self.extension_tables(env, id)
            }
            EntityKind::Enumeration | EntityKind::SchoolYearEnumeration => Ok(EntityTables {
                tables: vec![self.type_table(env, id)?],
                discriminated: None,
            }),
            EntityKind::CommonExtension => {
                debug!(entity = %env.entity(id).name, "Common extensions produce no tables");
                Ok(EntityTables::default())
            }
            _ => Ok(EntityTables::default()),
        }
    }

    /// Start an entity's own table, keyed by `keys`.
    fn keyed_table(&self, env: &ModelEnvironment, id: EntityId, keys: &[Column]) -> Result<Table> {
        let e = env.entity(id);
        let identity = entity_data(env, id)?.table_strategy.resolve(env)?;
        let mut table = Table::new(identity)
            .with_name_components(vec![NameComponent::new(&e.name, NameSource::Name)])
            .with_description(&e.documentation)
            .with_parent_entity(id);
        table.is_entity_main_table = true;
        table.add_columns(keys, &ColumnTransform::unchanged());
        Ok(table)
    }

    /// Build the remaining properties of `id` into `table` and collect its
    /// sub-tables.
    fn finish(
        &self,
        env: &ModelEnvironment,
        id: EntityId,
        mut table: Table,
        parent: ParentTable,
    ) -> Vec<Table> {
        let mut builder = TableBuilder::new(env, &self.config);
        let strategy = BuildStrategy::new();
        for property in env.entity(id).properties.clone() {
            if is_key_property(env, property) {
                continue;
            }
            builder.build_property(&mut table, &parent, property, &strategy);
        }
        if self.config.sort_columns {
            table.sort_columns(&[]);
        }
        let mut tables = vec![table];
        tables.extend(builder.into_tables());
        tables
    }

    fn parent_of(&self, table: &Table, name_prefix: &str, entity: EntityId) -> ParentTable {
        ParentTable {
            name_prefix: name_prefix.to_string(),
            identity: table.identity(),
            primary_keys: table.primary_keys().into_iter().cloned().collect(),
            schema: table.schema.clone(),
            namespace: table.namespace.clone(),
            entity,
        }
    }

    fn main_tables(&self, env: &ModelEnvironment, id: EntityId) -> Result<EntityTables> {
        let e = env.entity(id);
        let data = entity_data(env, id)?;
        let creator = ColumnCreator::new(env);

        let mut keys = Vec::new();
        if e.kind == EntityKind::Descriptor {
            keys.push(
                Column::new(format!("{}Id", data.table_id), ColumnType::Integer)
                    .with_name_components(vec![NameComponent::new(
                        format!("{}Id", data.table_id),
                        NameSource::DerivedFromName,
                    )])
                    .with_description(&e.documentation)
                    .primary_key(),
            );
        }
        keys.extend(creator.identity_columns(id, &BuildStrategy::new()));

        let table = self.keyed_table(env, id, &keys)?;
        let parent = self.parent_of(&table, &data.table_id, id);
        Ok(EntityTables {
            tables: self.finish(env, id, table, parent),
            discriminated: None,
        })
    }

    fn subclass_tables(&self, env: &ModelEnvironment, id: EntityId) -> Result<EntityTables> {
        let e = env.entity(id);
        let Some(base) = e.base_entity.entity() else {
            debug!(entity = %e.name, "Unresolved subclass builds as a plain table");
            return self.main_tables(env, id);
        };
        let data = entity_data(env, id)?;
        let creator = ColumnCreator::new(env);
        let strategy = BuildStrategy::new();

        let keys = creator.identity_columns(id, &strategy);
        let mut table = self.keyed_table(env, id, &keys)?;
        table.is_subclass_table = true;

        let base_identity = entity_data(env, base)?.table_strategy.resolve(env)?;
        let mut to_base = ForeignKey::new(base_identity.clone()).with_source_reference(ForeignKeySourceReference::subclass());
        for key in table.primary_keys() {
            to_base.add_column_pair(ColumnPair::new(&key.column_id, &key.column_id));
        }
        let mut fk_strategy = ForeignKeyStrategy::unchanged().then(ForeignKeyStrategyLayer::CascadeDelete);
        for rename in env.identity_properties(id) {
            let p = env.property(rename);
            if !p.is_identity_rename {
                continue;
            }
            let Some(base_key) = env.property_by_full_name(base, &p.base_key_name) else {
                continue;
            };
            let base_columns = creator.create_columns(base_key, &strategy);
            let renamed = creator.create_columns(rename, &strategy);
            for (from, to) in renamed.iter().zip(&base_columns) {
                fk_strategy = fk_strategy.then(ForeignKeyStrategyLayer::RenameForeignColumn {
                    from: from.column_id.clone(),
                    to: to.column_id.clone(),
                });
            }
        }
        table.add_foreign_key(fk_strategy.apply(to_base));

        let parent = self.parent_of(&table, &data.table_id, id);
        Ok(EntityTables {
            tables: self.finish(env, id, table, parent),
            discriminated: Some(base_identity),
        })
    }

    fn extension_tables(&self, env: &ModelEnvironment, id: EntityId) -> Result<EntityTables> {
        let e = env.entity(id);
        let Some(base) = e.base_entity.entity() else {
            debug!(entity = %e.name, "Unresolved extension produces no tables");
            return Ok(EntityTables::default());
        };
        let data = entity_data(env, id)?;
        let base_data = entity_data(env, base)?;
        let base_identity = data.table_strategy.resolve(env)?;
        let namespace = env.namespace(e.namespace).name.clone();
        let creator = ColumnCreator::new(env);

        let keys: Vec<Column> = creator
            .identity_columns(base, &BuildStrategy::new())
            .into_iter()
            .map(|mut column| {
                column.foreign_key_sources.clear();
                column
            })
            .collect();

        let mut table = Table::new(TableIdentity::new(&data.schema, &namespace, &data.table_id))
            .with_name_components(vec![
                NameComponent::new(&base_data.table_id, NameSource::ParentTableName),
                NameComponent::new(&self.config.extension_table_suffix, NameSource::ExtensionSuffix),
            ])
            .with_description(&e.documentation)
            .with_parent_entity(id);
        table.is_extension_table = true;
        table.add_columns(&keys, &ColumnTransform::unchanged());

        // Sub-tables are named off and keyed to the base table.
        let parent = ParentTable {
            name_prefix: base_data.table_id.clone(),
            identity: base_identity.clone(),
            primary_keys: keys,
            schema: data.schema.clone(),
            namespace,
            entity: id,
        };
        let mut tables = self.finish(env, id, table, parent);

        if tables[0].non_primary_keys().is_empty() {
            debug!(table = %tables[0].table_id, "Extension adds no columns to its base");
            tables.remove(0);
        } else {
            let table = &mut tables[0];
            let mut to_base =
                ForeignKey::new(base_identity).with_source_reference(ForeignKeySourceReference::extension());
            for key in table.primary_keys() {
                to_base.add_column_pair(ColumnPair::new(&key.column_id, &key.column_id));
            }
            table.add_foreign_key(
                ForeignKeyStrategy::unchanged()
                    .then(ForeignKeyStrategyLayer::CascadeDelete)
                    .apply(to_base),
            );
        }
        Ok(EntityTables {
            tables,
            discriminated: None,
        })
    }

    fn type_table(&self, env: &ModelEnvironment, id: EntityId) -> Result<Table> {
        let e = env.entity(id);
        let data = entity_data(env, id)?;
        let identity = data.table_strategy.resolve(env)?;
        let mut table = Table::new(identity)
            .with_name_components(vec![NameComponent::new(&data.table_id, NameSource::DerivedFromName)])
            .with_description(&e.documentation)
            .with_parent_entity(id);
        table.is_type_table = true;

        let columns = if e.kind == EntityKind::SchoolYearEnumeration {
            vec![
                Column::new("SchoolYear", ColumnType::Short).primary_key(),
                Column::new("SchoolYearDescription", ColumnType::String { max_length: Some(50) }),
                Column::new("CurrentSchoolYear", ColumnType::Boolean),
            ]
        } else {
            vec![
                Column::new(format!("{}Id", data.table_id), ColumnType::Integer).primary_key(),
                Column::new("CodeValue", ColumnType::String { max_length: Some(50) }),
                Column::new("Description", ColumnType::String { max_length: Some(1024) }),
                Column::new("ShortDescription", ColumnType::String { max_length: Some(450) }),
            ]
        };
        table.add_columns(&columns, &ColumnTransform::unchanged());
        Ok(table)
    }
}

impl Enhancer for TableBuildingEnhancer {
    fn name(&self) -> &'static str {
        "TableBuildingEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> modelc_core::Result<EnhancerResult> {
        let mut by_namespace: IndexMap<String, NamespaceTables> = env
            .namespaces()
            .map(|ns| (ns.name.clone(), NamespaceTables::default()))
            .collect();
        let mut discriminated = Vec::new();

        for id in env.entity_ids() {
            let built = self
                .build_entity(env, id)
                .map_err(|e| e.into_enhancer_error(self.name()))?;
            discriminated.extend(built.discriminated);
            for table in built.tables {
                by_namespace.entry(table.namespace.clone()).or_default().insert(table);
            }
        }

        for identity in discriminated {
            if let Some(table) = by_namespace
                .get_mut(&identity.namespace)
                .and_then(|derived| derived.tables.get_mut(&identity.table_id))
            {
                table.has_discriminator_column = true;
            }
        }

        let mut total = 0;
        for (name, derived) in by_namespace {
            let Some(namespace) = env.namespace_by_name(&name) else {
                continue;
            };
            debug!(namespace = %name, tables = derived.tables.len(), "Derived namespace tables");
            total += derived.tables.len();
            env.namespace_mut(namespace).data.insert(derived);
        }

        info!(tables = total, "Built tables");
        Ok(EnhancerResult::ok(self.name()))
    }
}
