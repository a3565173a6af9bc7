//! Property recursion: columns into the current table, collections and
//! commons into sub-tables.

use super::build_strategy::BuildStrategy;
use super::column_creator::ColumnCreator;
use crate::config::RelationalConfig;
use crate::model::{
    Column, ColumnPair, ColumnTransform, ForeignKey, ForeignKeySourceReference, ForeignKeyStrategy,
    ForeignKeyStrategyLayer, NameComponent, NameSource, Table, TableIdentity,
};
use modelc_core::{Cardinality, EntityId, ModelEnvironment, PropertyId, PropertyKind};
use tracing::{debug, trace};

/// The table a property's columns or sub-tables hang off.
#[derive(Debug, Clone)]
pub struct ParentTable {
    /// Prefix of sub-table ids.
    pub name_prefix: String,
    /// Table sub-table foreign keys point at.
    pub identity: TableIdentity,
    /// Keys copied into every sub-table.
    pub primary_keys: Vec<Column>,
    /// Schema of created sub-tables.
    pub schema: String,
    /// Namespace of created sub-tables.
    pub namespace: String,
    /// Entity being built.
    pub entity: EntityId,
}

/// Builds the columns and sub-tables of an entity's properties.
pub struct TableBuilder<'a> {
    env: &'a ModelEnvironment,
    creator: ColumnCreator<'a>,
    config: &'a RelationalConfig,
    tables: Vec<Table>,
}

impl<'a> TableBuilder<'a> {
    pub fn new(env: &'a ModelEnvironment, config: &'a RelationalConfig) -> Self {
        Self {
            env,
            creator: ColumnCreator::new(env),
            config,
            tables: Vec::new(),
        }
    }

    /// Sub-tables built so far, in completion order.
    pub fn into_tables(self) -> Vec<Table> {
        self.tables
    }

    /// Build one property into `table`, or into new sub-tables.
    pub fn build_property(
        &mut self,
        table: &mut Table,
        parent: &ParentTable,
        property: PropertyId,
        strategy: &BuildStrategy,
    ) {
        let env = self.env;
        let p = env.property(property);
        let is_common = matches!(p.kind, PropertyKind::Common | PropertyKind::InlineCommon | PropertyKind::Choice);

        if p.is_collection() || p.kind == PropertyKind::Common {
            self.build_sub_table(parent, property, strategy);
            return;
        }

        if is_common {
            self.flatten(table, parent, property, strategy);
            return;
        }

        let columns = self.creator.create_columns(property, strategy);
        trace!(table = %table.table_id, property = %p.full_property_name(), columns = columns.len(), "Adding columns");
        table.add_columns(&columns, &strategy.leaf_transform(ColumnTransform::unchanged()));
    }

    /// Inline commons and choices put their columns in the current table
    /// under the property's context.
    fn flatten(&mut self, table: &mut Table, parent: &ParentTable, property: PropertyId, strategy: &BuildStrategy) {
        let env = self.env;
        let p = env.property(property);
        let full_name = p.full_property_name();
        if !strategy.build_columns(&full_name) {
            return;
        }
        let Some(inner) = p.referenced_entity.entity() else {
            debug!(property = %full_name, "Unresolved common produces no columns");
            return;
        };

        let mut inner_strategy = strategy
            .descend(&full_name)
            .append_parent_context(property, p.context_prefix());
        if p.kind == PropertyKind::Choice || p.is_optional() {
            inner_strategy = inner_strategy.leaf_columns_nullable();
        }
        for nested in env.entity(inner).properties.clone() {
            self.build_property(table, parent, nested, &inner_strategy);
        }
    }

    /// Build a sub-table keyed on the parent's keys plus the item's own.
    fn build_sub_table(&mut self, parent: &ParentTable, property: PropertyId, strategy: &BuildStrategy) {
        let env = self.env;
        let p = env.property(property);
        let full_name = p.full_property_name();
        if !strategy.build_columns(&full_name) {
            return;
        }

        let mut name_components = vec![NameComponent::new(&parent.name_prefix, NameSource::ParentTableName)];
        name_components.extend(strategy.parent_context_components());
        name_components.push(if p.shorten_to.is_empty() {
            NameComponent::new(&full_name, NameSource::Name).from_property(property)
        } else {
            NameComponent::new(&p.shorten_to, NameSource::ShortenTo).from_property(property)
        });
        let table_id: String = name_components.iter().map(|c| c.name.as_str()).collect();
        let identity = TableIdentity::new(&parent.schema, &parent.namespace, &table_id);

        let mut table = Table::new(identity.clone())
            .with_name_components(name_components)
            .with_description(&p.documentation)
            .with_parent_entity(parent.entity);
        table.source_property = Some(property);
        table.is_required_collection_table = p.cardinality == Cardinality::RequiredCollection;

        let parent_keys: Vec<Column> = parent
            .primary_keys
            .iter()
            .cloned()
            .map(|mut column| {
                column.foreign_key_sources.clear();
                column
            })
            .collect();
        table.add_columns(
            &parent_keys,
            &ColumnTransform::primary_key_with_reference_context(&parent.name_prefix),
        );

        let mut to_parent = ForeignKey::new(parent.identity.clone()).with_source_reference(ForeignKeySourceReference::subtable(p));
        for key in &parent.primary_keys {
            to_parent.add_column_pair(ColumnPair::new(&key.column_id, &key.column_id));
        }
        table.add_foreign_key(
            ForeignKeyStrategy::unchanged()
                .then(ForeignKeyStrategyLayer::CascadeDelete)
                .apply(to_parent),
        );

        let item_strategy = strategy
            .descend(&full_name)
            .without_parent_context()
            .without_leaf_columns_nullable()
            .without_suppressed_primary_key();

        match p.kind {
            PropertyKind::Common | PropertyKind::InlineCommon | PropertyKind::Choice => {
                let Some(common) = p.referenced_entity.entity() else {
                    debug!(property = %full_name, "Unresolved common produces no sub-table");
                    return;
                };
                // A single common row is keyed by its parent alone.
                let item_strategy = if p.is_collection() {
                    item_strategy
                } else {
                    item_strategy.suppressing_primary_key()
                };
                let (identity_properties, other_properties): (Vec<PropertyId>, Vec<PropertyId>) = env
                    .entity(common)
                    .properties
                    .iter()
                    .copied()
                    .partition(|q| env.property(*q).is_part_of_identity);

                let mut child = ParentTable {
                    name_prefix: table_id.clone(),
                    identity,
                    primary_keys: Vec::new(),
                    schema: parent.schema.clone(),
                    namespace: parent.namespace.clone(),
                    entity: parent.entity,
                };
                for q in identity_properties {
                    self.build_property(&mut table, &child, q, &item_strategy);
                }
                child.primary_keys = table.primary_keys().into_iter().cloned().collect();
                for q in other_properties {
                    self.build_property(&mut table, &child, q, &item_strategy);
                }
            }
            _ => {
                let items = self.creator.create_columns(property, &item_strategy.ignoring_role_name());
                table.add_columns(&items, &ColumnTransform::primary_key());
            }
        }

        if self.config.sort_columns {
            let parent_ids: Vec<String> = parent.primary_keys.iter().map(|c| c.column_id.clone()).collect();
            table.sort_columns(&parent_ids);
        }
        debug!(table = %table.table_id, parent = %parent.identity, columns = table.columns.len(), "Built sub-table");
        self.tables.push(table);
    }
}
