//! Derived tables.

use super::column::{Column, NameComponent};
use super::column_transform::ColumnTransform;
use super::foreign_key::{ForeignKey, TableIdentity};
use modelc_core::{EntityId, PropertyId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Two property paths that produced the same column on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConflict {
    pub column_id: String,
    pub first_path: String,
    pub second_path: String,
}

/// A derived table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Table identifier, unique within its schema.
    pub table_id: String,
    /// Name components in naming order.
    pub name_components: Vec<NameComponent>,
    pub schema: String,
    /// Owning namespace name.
    pub namespace: String,
    pub description: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Entity the table was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_entity: Option<EntityId>,
    /// Collection or common property implemented by this table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_property: Option<PropertyId>,
    pub is_entity_main_table: bool,
    pub is_required_collection_table: bool,
    pub is_subclass_table: bool,
    pub is_extension_table: bool,
    pub is_type_table: bool,
    pub has_discriminator_column: bool,
    /// Duplicate columns merged while building.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_conflicts: Vec<ColumnConflict>,
    #[serde(skip)]
    primary_key_cache: Option<Vec<String>>,
}

impl Table {
    /// Create an empty table.
    pub fn new(identity: TableIdentity) -> Self {
        Self {
            name_components: Vec::new(),
            table_id: identity.table_id,
            schema: identity.schema,
            namespace: identity.namespace,
            description: String::new(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            parent_entity: None,
            source_property: None,
            is_entity_main_table: false,
            is_required_collection_table: false,
            is_subclass_table: false,
            is_extension_table: false,
            is_type_table: false,
            has_discriminator_column: false,
            column_conflicts: Vec::new(),
            primary_key_cache: None,
        }
    }

    pub fn with_name_components(mut self, components: Vec<NameComponent>) -> Self {
        self.name_components = components;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parent_entity(mut self, entity: EntityId) -> Self {
        self.parent_entity = Some(entity);
        self
    }

    /// Physical identity of this table.
    pub fn identity(&self) -> TableIdentity {
        TableIdentity::new(&self.schema, &self.namespace, &self.table_id)
    }

    /// Look up a column by id.
    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.column_id == column_id)
    }

    /// Add a column. A column with the same id is merged in place by
    /// constraint strength and the conflict recorded.
    pub fn add_column(&mut self, column: Column) {
        self.primary_key_cache = None;
        let Some(index) = self.columns.iter().position(|c| c.column_id == column.column_id) else {
            self.columns.push(column);
            return;
        };

        debug!(table = %self.table_id, column = %column.column_id, "Merging duplicate column");
        let existing = &self.columns[index];
        if existing.property_path != column.property_path {
            self.column_conflicts.push(ColumnConflict {
                column_id: column.column_id.clone(),
                first_path: existing.property_path.clone(),
                second_path: column.property_path.clone(),
            });
        }
        self.columns[index] = existing.constraint_merge(&column);
    }

    /// Transform columns and add them in order.
    pub fn add_columns(&mut self, columns: &[Column], transform: &ColumnTransform) {
        for column in transform.apply(columns) {
            self.add_column(column);
        }
    }

    /// Primary key columns: the cached order when cached, otherwise by
    /// column id.
    pub fn primary_keys(&self) -> Vec<&Column> {
        if let Some(ids) = &self.primary_key_cache {
            return ids.iter().filter_map(|id| self.column(id)).collect();
        }
        let mut keys: Vec<&Column> = self.columns.iter().filter(|c| c.is_part_of_primary_key).collect();
        keys.sort_by(|a, b| a.column_id.cmp(&b.column_id));
        keys
    }

    /// Freeze the current primary key order.
    pub fn cache_primary_keys(&mut self) {
        let ids = self.primary_keys().into_iter().map(|c| c.column_id.clone()).collect();
        self.primary_key_cache = Some(ids);
    }

    /// Check whether primary keys have been cached.
    pub fn has_cached_primary_keys(&self) -> bool {
        self.primary_key_cache.is_some()
    }

    pub fn non_primary_keys(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| !c.is_part_of_primary_key).collect()
    }

    /// Primary keys followed by the remaining columns.
    pub fn all_columns(&self) -> Vec<&Column> {
        let mut all = self.primary_keys();
        all.extend(self.non_primary_keys());
        all
    }

    pub fn alternate_keys(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_part_of_alternate_key).collect()
    }

    pub fn unique_indexes(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_unique_index).collect()
    }

    /// Sort columns: parent primary keys in their current order, then other
    /// primary keys by id, then the rest by id.
    pub fn sort_columns(&mut self, parent_primary_keys: &[String]) {
        self.primary_key_cache = None;
        let rank = |column: &Column| {
            if parent_primary_keys.contains(&column.column_id) {
                0
            } else if column.is_part_of_primary_key {
                1
            } else {
                2
            }
        };
        self.columns.sort_by(|a, b| {
            let (ra, rb) = (rank(a), rank(b));
            if ra == 0 && rb == 0 {
                return std::cmp::Ordering::Equal;
            }
            ra.cmp(&rb).then_with(|| a.column_id.cmp(&b.column_id))
        });
    }

    /// Add a foreign key, naming it `FK_<table>_<target><suffix>`.
    ///
    /// The suffix is empty for the first key to a target and otherwise one
    /// more than the highest suffix already used for that target, so earlier
    /// names never change.
    pub fn add_foreign_key(&mut self, mut foreign_key: ForeignKey) -> &ForeignKey {
        let existing: Vec<u32> = self
            .foreign_keys
            .iter()
            .filter(|fk| fk.foreign_table.table_id == foreign_key.foreign_table.table_id)
            .map(|fk| fk.suffix)
            .collect();
        foreign_key.suffix = existing.iter().max().map_or(0, |highest| highest + 1);
        foreign_key.parent_table_id = self.table_id.clone();
        foreign_key.name = ForeignKey::compose_name(
            &self.table_id,
            &foreign_key.foreign_table.table_id,
            foreign_key.suffix,
        );
        debug!(table = %self.table_id, foreign_key = %foreign_key.name, "Adding foreign key");
        self.foreign_keys.push(foreign_key);
        &self.foreign_keys[self.foreign_keys.len() - 1]
    }

    /// Check whether an equivalent foreign key already exists.
    pub fn has_equivalent_foreign_key(&self, foreign_key: &ForeignKey) -> bool {
        self.foreign_keys.iter().any(|fk| fk.is_equivalent(foreign_key))
    }
}
