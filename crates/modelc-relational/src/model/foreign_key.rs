//! Foreign keys between derived tables.

use modelc_core::{Cardinality, EntityProperty, PropertyKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Physical identity of a table: schema, namespace and table id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableIdentity {
    pub schema: String,
    pub namespace: String,
    pub table_id: String,
}

impl TableIdentity {
    pub fn new(schema: impl Into<String>, namespace: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            namespace: namespace.into(),
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table_id)
    }
}

/// A parent column paired with the foreign column it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPair {
    pub parent_table_column_id: String,
    pub foreign_table_column_id: String,
}

impl ColumnPair {
    pub fn new(parent: impl Into<String>, foreign: impl Into<String>) -> Self {
        Self {
            parent_table_column_id: parent.into(),
            foreign_table_column_id: foreign.into(),
        }
    }
}

/// What produced a foreign key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeySourceReference {
    pub is_part_of_identity: bool,
    pub is_required: bool,
    pub is_optional: bool,
    pub is_required_collection: bool,
    pub is_optional_collection: bool,
    /// From a subclass table to its base table.
    pub is_subclass_relationship: bool,
    /// From an extension table to its base table.
    pub is_extension_relationship: bool,
    /// From a collection or common table to its parent.
    pub is_subtable_relationship: bool,
    /// Not traceable to a single property.
    pub is_synthetic_relationship: bool,
    /// Kind of the originating property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_kind: Option<PropertyKind>,
}

impl ForeignKeySourceReference {
    /// Source reference for a property-derived foreign key.
    pub fn from_property(property: &EntityProperty) -> Self {
        Self {
            is_part_of_identity: property.is_part_of_identity,
            is_required: property.cardinality == Cardinality::Required,
            is_optional: property.cardinality == Cardinality::Optional,
            is_required_collection: property.cardinality == Cardinality::RequiredCollection,
            is_optional_collection: property.cardinality == Cardinality::OptionalCollection,
            property_kind: Some(property.kind),
            ..Self::default()
        }
    }

    /// Source reference for a sub-table's key to its parent.
    pub fn subtable(property: &EntityProperty) -> Self {
        Self {
            is_subtable_relationship: true,
            ..Self::from_property(property)
        }
    }

    /// Source reference for a subclass table's key to its base.
    pub fn subclass() -> Self {
        Self {
            is_subclass_relationship: true,
            is_part_of_identity: true,
            is_required: true,
            ..Self::default()
        }
    }

    /// Source reference for an extension table's key to its base.
    pub fn extension() -> Self {
        Self {
            is_extension_relationship: true,
            is_part_of_identity: true,
            is_required: true,
            ..Self::default()
        }
    }
}

/// A foreign key from a parent table to a foreign table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    /// `FK_<parent>_<target><suffix>`, assigned when added to a table.
    pub name: String,
    /// Disambiguating suffix; zero is not rendered.
    pub suffix: u32,
    pub parent_table_id: String,
    pub foreign_table: TableIdentity,
    pub column_pairs: Vec<ColumnPair>,
    pub with_delete_cascade: bool,
    pub with_update_cascade: bool,
    pub source_reference: ForeignKeySourceReference,
}

impl ForeignKey {
    /// Create an unnamed foreign key to a table.
    pub fn new(foreign_table: TableIdentity) -> Self {
        Self {
            name: String::new(),
            suffix: 0,
            parent_table_id: String::new(),
            foreign_table,
            column_pairs: Vec::new(),
            with_delete_cascade: false,
            with_update_cascade: false,
            source_reference: ForeignKeySourceReference::default(),
        }
    }

    pub fn with_source_reference(mut self, source_reference: ForeignKeySourceReference) -> Self {
        self.source_reference = source_reference;
        self
    }

    /// Add a column pair; a pair already present is logged and rejected.
    pub fn add_column_pair(&mut self, pair: ColumnPair) -> bool {
        if self.column_pairs.contains(&pair) {
            debug!(
                parent = %pair.parent_table_column_id,
                foreign = %pair.foreign_table_column_id,
                "Rejecting duplicate foreign key column pair"
            );
            return false;
        }
        self.column_pairs.push(pair);
        true
    }

    pub fn with_column_pair(mut self, parent: impl Into<String>, foreign: impl Into<String>) -> Self {
        self.add_column_pair(ColumnPair::new(parent, foreign));
        self
    }

    /// Parent column ids in pair order.
    pub fn parent_column_ids(&self) -> Vec<&str> {
        self.column_pairs
            .iter()
            .map(|p| p.parent_table_column_id.as_str())
            .collect()
    }

    /// Foreign column ids in pair order.
    pub fn foreign_column_ids(&self) -> Vec<&str> {
        self.column_pairs
            .iter()
            .map(|p| p.foreign_table_column_id.as_str())
            .collect()
    }

    /// Check whether another key joins the same columns to the same table.
    pub fn is_equivalent(&self, other: &ForeignKey) -> bool {
        self.foreign_table == other.foreign_table && self.column_pairs == other.column_pairs
    }

    /// Name for this key on `parent_table_id` with `suffix`.
    pub fn compose_name(parent_table_id: &str, foreign_table_id: &str, suffix: u32) -> String {
        if suffix == 0 {
            format!("FK_{parent_table_id}_{foreign_table_id}")
        } else {
            format!("FK_{parent_table_id}_{foreign_table_id}{suffix}")
        }
    }
}
