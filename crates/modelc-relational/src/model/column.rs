//! Derived table columns and the constraint-strength merge.

use modelc_core::PropertyId;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Where a column or table name component came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NameSource {
    /// A property's name.
    Name,
    /// Derived from a name, such as an entity name plus `Descriptor`.
    DerivedFromName,
    /// A property's role name.
    RoleName,
    /// A property's shorten-to directive.
    ShortenTo,
    /// A role name or shorten-to from a property further up the chain.
    ParentContext,
    /// The id of the parent table.
    ParentTableName,
    /// The extension table suffix.
    ExtensionSuffix,
    /// Hardcoded.
    Synthetic,
}

/// One component of a derived name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameComponent {
    /// Component text.
    pub name: String,
    /// Origin of the text.
    pub source: NameSource,
    /// Property the text came from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_property: Option<PropertyId>,
}

impl NameComponent {
    /// Create a component.
    pub fn new(name: impl Into<String>, source: NameSource) -> Self {
        Self {
            name: name.into(),
            source,
            source_property: None,
        }
    }

    /// Record the originating property.
    pub fn from_property(mut self, property: PropertyId) -> Self {
        self.source_property = Some(property);
        self
    }
}

/// Physical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ColumnType {
    Boolean,
    Currency,
    Date,
    DateTime,
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Duration,
    Integer,
    Percent,
    Short,
    String {
        max_length: Option<u32>,
    },
    Time,
    Year,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Boolean => f.write_str("boolean"),
            ColumnType::Currency => f.write_str("currency"),
            ColumnType::Date => f.write_str("date"),
            ColumnType::DateTime => f.write_str("datetime"),
            ColumnType::Decimal {
                precision: Some(p),
                scale: Some(s),
            } => write!(f, "decimal({p},{s})"),
            ColumnType::Decimal { precision: Some(p), .. } => write!(f, "decimal({p})"),
            ColumnType::Decimal { .. } => f.write_str("decimal"),
            ColumnType::Duration => f.write_str("duration"),
            ColumnType::Integer => f.write_str("integer"),
            ColumnType::Percent => f.write_str("percent"),
            ColumnType::Short => f.write_str("short"),
            ColumnType::String { max_length: Some(n) } => write!(f, "string({n})"),
            ColumnType::String { max_length: None } => f.write_str("string"),
            ColumnType::Time => f.write_str("time"),
            ColumnType::Year => f.write_str("year"),
        }
    }
}

/// A reference or lookup property a column is keyed through, with the
/// parent context it was built under.
///
/// An inline common reused under two role names yields the same property
/// twice in one table; the context tells the two foreign keys apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeySource {
    pub property: PropertyId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

impl ForeignKeySource {
    pub fn new(property: PropertyId, context: impl Into<String>) -> Self {
        Self {
            property,
            context: context.into(),
        }
    }
}

/// A derived table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column identifier, unique within its table.
    pub column_id: String,
    /// Name components in naming order.
    pub name_components: Vec<NameComponent>,
    /// Physical type.
    pub column_type: ColumnType,
    pub description: String,
    pub is_nullable: bool,
    pub is_part_of_primary_key: bool,
    pub is_part_of_alternate_key: bool,
    pub is_unique_index: bool,
    /// Derived through a reference property.
    pub is_from_reference_property: bool,
    /// Dotted property path that produced the column; empty when synthetic.
    pub property_path: String,
    /// Concatenated full names of the reference properties traversed.
    pub reference_context: String,
    /// Reference contexts of every column merged into this one.
    pub merged_reference_contexts: Vec<String>,
    /// Properties contributing to this column.
    pub source_entity_properties: Vec<PropertyId>,
    /// Reference or lookup properties declared directly on the table's
    /// entity whose foreign key this column participates in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_key_sources: Vec<ForeignKeySource>,
}

impl Column {
    /// Create a not-null, non-key column.
    pub fn new(column_id: impl Into<String>, column_type: ColumnType) -> Self {
        let column_id = column_id.into();
        Self {
            name_components: vec![NameComponent::new(column_id.clone(), NameSource::Synthetic)],
            column_id,
            column_type,
            description: String::new(),
            is_nullable: false,
            is_part_of_primary_key: false,
            is_part_of_alternate_key: false,
            is_unique_index: false,
            is_from_reference_property: false,
            property_path: String::new(),
            reference_context: String::new(),
            merged_reference_contexts: vec![String::new()],
            source_entity_properties: Vec::new(),
            foreign_key_sources: Vec::new(),
        }
    }

    /// Replace the name components, keeping the column id.
    pub fn with_name_components(mut self, components: Vec<NameComponent>) -> Self {
        self.name_components = components;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark as part of the primary key (and therefore not null).
    pub fn primary_key(mut self) -> Self {
        self.is_part_of_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn with_property_path(mut self, path: impl Into<String>) -> Self {
        self.property_path = path.into();
        self
    }

    /// Set the reference context, resetting merged contexts to it.
    pub fn with_reference_context(mut self, context: impl Into<String>) -> Self {
        self.reference_context = context.into();
        self.merged_reference_contexts = vec![self.reference_context.clone()];
        self
    }

    /// Add a contributing property.
    pub fn with_source(mut self, property: PropertyId) -> Self {
        self.add_source_entity_property(property);
        self
    }

    /// Replace the foreign key sources with a single property built under
    /// `context`.
    pub fn with_foreign_key_source(mut self, property: PropertyId, context: impl Into<String>) -> Self {
        self.foreign_key_sources = vec![ForeignKeySource::new(property, context)];
        self
    }

    /// Add a contributing property; a repeated add is logged and ignored.
    pub fn add_source_entity_property(&mut self, property: PropertyId) {
        if self.source_entity_properties.contains(&property) {
            debug!(
                column = %self.column_id,
                property = %property,
                "Ignoring duplicate source entity property"
            );
            return;
        }
        self.source_entity_properties.push(property);
    }

    /// Add a merged reference context; a repeated add is logged and ignored.
    pub fn add_merged_reference_context(&mut self, context: &str) {
        if self.merged_reference_contexts.iter().any(|c| c == context) {
            debug!(column = %self.column_id, context, "Ignoring duplicate merged reference context");
            return;
        }
        self.merged_reference_contexts.push(context.to_string());
    }

    /// Merge `received` into a copy of this column, strongest constraint
    /// winning.
    ///
    /// Sources and merged contexts are unioned. Alternate key, unique index
    /// and reference origin are set if either side sets them. A primary key
    /// on either side makes the result a not-null primary key; otherwise the
    /// result is nullable only if both sides are.
    pub fn constraint_merge(&self, received: &Column) -> Column {
        let mut merged = self.clone();
        for context in &received.merged_reference_contexts {
            if !merged.merged_reference_contexts.contains(context) {
                merged.merged_reference_contexts.push(context.clone());
            }
        }
        for property in &received.source_entity_properties {
            if !merged.source_entity_properties.contains(property) {
                merged.source_entity_properties.push(*property);
            }
        }
        for source in &received.foreign_key_sources {
            if !merged.foreign_key_sources.contains(source) {
                merged.foreign_key_sources.push(source.clone());
            }
        }

        merged.is_part_of_alternate_key |= received.is_part_of_alternate_key;
        merged.is_unique_index |= received.is_unique_index;
        merged.is_from_reference_property |= received.is_from_reference_property;

        if merged.is_part_of_primary_key || received.is_part_of_primary_key {
            merged.is_part_of_primary_key = true;
            merged.is_nullable = false;
        } else {
            merged.is_nullable = merged.is_nullable && received.is_nullable;
        }

        if merged.description.is_empty() {
            merged.description = received.description.clone();
        }
        merged
    }

    /// Check whether this column shares a contributing property with another.
    pub fn shares_source_with(&self, other: &Column) -> bool {
        self.source_entity_properties
            .iter()
            .any(|p| other.source_entity_properties.contains(p))
    }

    /// Check whether `candidate` is this column with exactly one extra
    /// parent-context component in front.
    pub fn differs_by_parent_context_prefix(&self, candidate: &Column) -> bool {
        let Some((first, rest)) = candidate.name_components.split_first() else {
            return false;
        };
        if rest.is_empty() || first.source != NameSource::ParentContext {
            return false;
        }
        rest.len() == self.name_components.len()
            && rest
                .iter()
                .zip(&self.name_components)
                .all(|(a, b)| a.name == b.name)
    }
}
