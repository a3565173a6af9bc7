//! Column creation for properties that live in their parent's table.
//!
//! Simple, shared simple and lookup properties become one column each.
//! Entity references expand to the referenced entity's identity columns,
//! renamed with the reference's context and constrained by the reference's
//! own cardinality.

use super::build_strategy::BuildStrategy;
use crate::annotation::base_table_id;
use crate::model::{
    Column, ColumnTransform, ColumnTransformLayer, ColumnType, ForeignKeySource, NameComponent, NameSource,
};
use modelc_core::model::ValueFacets;
use modelc_core::{EntityId, EntityKind, EntityProperty, ModelEnvironment, PropertyId, PropertyKind};
use tracing::debug;

/// Physical type of a simple property.
pub fn simple_column_type(kind: PropertyKind, facets: &ValueFacets) -> Option<ColumnType> {
    let column_type = match kind {
        PropertyKind::Boolean => ColumnType::Boolean,
        PropertyKind::Currency => ColumnType::Currency,
        PropertyKind::Date => ColumnType::Date,
        PropertyKind::DateTime => ColumnType::DateTime,
        PropertyKind::Decimal | PropertyKind::SharedDecimal => ColumnType::Decimal {
            precision: facets.total_digits,
            scale: facets.decimal_places,
        },
        PropertyKind::Duration => ColumnType::Duration,
        PropertyKind::Integer | PropertyKind::SharedInteger => ColumnType::Integer,
        PropertyKind::Percent => ColumnType::Percent,
        PropertyKind::Short | PropertyKind::SharedShort => ColumnType::Short,
        PropertyKind::String | PropertyKind::SharedString => ColumnType::String {
            max_length: facets.max_length,
        },
        PropertyKind::Time => ColumnType::Time,
        PropertyKind::Year => ColumnType::Year,
        _ => return None,
    };
    Some(column_type)
}

/// Facets of a shared simple property: the referenced type's, with the
/// property's own filling any gaps.
fn shared_facets(env: &ModelEnvironment, property: &EntityProperty) -> ValueFacets {
    let Some(shared) = property.referenced_entity.entity() else {
        return property.facets.clone();
    };
    let declared = &env.entity(shared).facets;
    ValueFacets {
        min_length: declared.min_length.or(property.facets.min_length),
        max_length: declared.max_length.or(property.facets.max_length),
        total_digits: declared.total_digits.or(property.facets.total_digits),
        decimal_places: declared.decimal_places.or(property.facets.decimal_places),
        min_value: declared.min_value.clone().or_else(|| property.facets.min_value.clone()),
        max_value: declared.max_value.clone().or_else(|| property.facets.max_value.clone()),
    }
}

/// Role component of a property's column names, if it has one.
///
/// A role name equal to the property name collapses, as it does in full
/// property names.
fn role_component(property: &EntityProperty) -> Option<NameComponent> {
    if !property.shorten_to.is_empty() {
        return Some(NameComponent::new(&property.shorten_to, NameSource::ShortenTo).from_property(property.id));
    }
    if property.role_name.is_empty() || property.role_name == property.name {
        return None;
    }
    Some(NameComponent::new(&property.role_name, NameSource::RoleName).from_property(property.id))
}

/// Creates the columns of column-producing properties.
#[derive(Clone, Copy)]
pub struct ColumnCreator<'a> {
    env: &'a ModelEnvironment,
}

impl<'a> ColumnCreator<'a> {
    pub fn new(env: &'a ModelEnvironment) -> Self {
        Self { env }
    }

    /// Columns for a property under a strategy. Commons, inline commons and
    /// choices produce none here; the table builder flattens or splits
    /// them.
    pub fn create_columns(&self, property: PropertyId, strategy: &BuildStrategy) -> Vec<Column> {
        let p = self.env.property(property);
        let full_name = p.full_property_name();
        if !strategy.build_columns(&full_name) {
            debug!(property = %full_name, "Skipping merged property");
            return Vec::new();
        }

        match p.kind {
            PropertyKind::DomainEntity | PropertyKind::Association => self.reference_columns(p, strategy),
            PropertyKind::Descriptor => {
                let base = NameComponent::new(format!("{}DescriptorId", p.name), NameSource::DerivedFromName);
                vec![self.lookup_column(p, strategy, base, ColumnType::Integer)]
            }
            PropertyKind::Enumeration => {
                let table_id = base_table_id(EntityKind::Enumeration, &p.name);
                let base = NameComponent::new(format!("{table_id}Id"), NameSource::DerivedFromName);
                vec![self.lookup_column(p, strategy, base, ColumnType::Integer)]
            }
            PropertyKind::SchoolYearEnumeration => {
                let base = NameComponent::new(&p.name, NameSource::Name);
                vec![self.lookup_column(p, strategy, base, ColumnType::Short)]
            }
            PropertyKind::Common | PropertyKind::InlineCommon | PropertyKind::Choice => Vec::new(),
            kind if kind.is_shared_simple() => {
                let facets = shared_facets(self.env, p);
                simple_column_type(kind, &facets)
                    .map(|column_type| vec![self.simple_column(p, strategy, column_type)])
                    .unwrap_or_default()
            }
            kind => simple_column_type(kind, &p.facets)
                .map(|column_type| vec![self.simple_column(p, strategy, column_type)])
                .unwrap_or_default(),
        }
    }

    /// Identity columns of an entity, as its own table keys them.
    ///
    /// A subclass keys on its base's identity with renamed base keys
    /// replaced by the renaming property's columns.
    pub fn identity_columns(&self, entity: EntityId, strategy: &BuildStrategy) -> Vec<Column> {
        let e = self.env.entity(entity);
        let mut columns: Vec<Column> = Vec::new();

        if e.kind.is_subclass() {
            if let Some(base) = e.base_entity.entity() {
                columns = self.identity_columns(base, strategy);
                for rename in self.env.identity_properties(entity) {
                    let p = self.env.property(rename);
                    if !p.is_identity_rename {
                        continue;
                    }
                    let renamed = self.create_columns(rename, strategy);
                    let base_key = self.env.property_by_full_name(base, &p.base_key_name);
                    let position = columns
                        .iter()
                        .position(|c| base_key.is_some_and(|k| c.source_entity_properties.contains(&k)));
                    match position {
                        Some(index) => {
                            columns.retain(|c| !base_key.is_some_and(|k| c.source_entity_properties.contains(&k)));
                            let index = index.min(columns.len());
                            columns.splice(index..index, renamed);
                        }
                        None => columns.extend(renamed),
                    }
                }
            }
        }

        for property in self.env.identity_properties(entity) {
            if self.env.property(property).is_identity_rename && e.kind.is_subclass() {
                continue;
            }
            for column in self.create_columns(property, strategy) {
                merge_column(&mut columns, column);
            }
        }
        columns
    }

    fn base_column(
        &self,
        p: &EntityProperty,
        strategy: &BuildStrategy,
        base: NameComponent,
        column_type: ColumnType,
    ) -> Column {
        let (column_id, components) = strategy.column_naming(role_component(p), base);
        let mut column = Column::new(column_id, column_type)
            .with_name_components(components)
            .with_description(&p.documentation)
            .with_property_path(strategy.property_path(&p.full_property_name()))
            .with_source(p.id);
        if p.is_part_of_identity && !strategy.suppress_primary_key() {
            column = column.primary_key();
        } else if p.is_optional() {
            column = column.nullable();
        }
        column
    }

    fn simple_column(&self, p: &EntityProperty, strategy: &BuildStrategy, column_type: ColumnType) -> Column {
        let base = NameComponent::new(&p.name, NameSource::Name).from_property(p.id);
        self.base_column(p, strategy, base, column_type)
    }

    fn lookup_column(
        &self,
        p: &EntityProperty,
        strategy: &BuildStrategy,
        base: NameComponent,
        column_type: ColumnType,
    ) -> Column {
        let mut column = self
            .base_column(p, strategy, base.from_property(p.id), column_type)
            .with_foreign_key_source(p.id, strategy.parent_context());
        column.is_from_reference_property = true;
        column
    }

    fn reference_columns(&self, p: &EntityProperty, strategy: &BuildStrategy) -> Vec<Column> {
        let Some(target) = p.referenced_entity.entity() else {
            debug!(property = %p.full_property_name(), "Unresolved reference produces no columns");
            return Vec::new();
        };
        let full_name = p.full_property_name();

        // Merge directive source paths start at this property. An unresolved
        // directive keeps its columns; validation reports it.
        let merged_away = p
            .merge_directives
            .iter()
            .filter(|d| d.is_resolved() && d.source_path.len() > 1)
            .map(|d| d.source_path[1..].to_vec());
        let foreign_key_source = ForeignKeySource::new(p.id, strategy.parent_context());
        let inner_strategy = strategy
            .descend(&full_name)
            .without_parent_context()
            .without_leaf_columns_nullable()
            .suppressing_primary_key()
            .skipping_paths(merged_away);

        let inner: Vec<Column> = self
            .identity_columns(target, &inner_strategy)
            .into_iter()
            .map(|mut column| {
                column.is_from_reference_property = true;
                column.add_source_entity_property(p.id);
                column.foreign_key_sources = vec![foreign_key_source.clone()];
                column
            })
            .collect();

        let constraint = if p.is_part_of_identity && !strategy.suppress_primary_key() {
            ColumnTransformLayer::MakePrimaryKey
        } else if p.is_optional() {
            ColumnTransformLayer::MakeNull
        } else {
            ColumnTransformLayer::MakeNotNull
        };

        let mut transform = ColumnTransform::of(constraint);
        for component in strategy.parent_context_components() {
            transform = transform.then(ColumnTransformLayer::PrefixContext(component));
        }
        if let Some(role) = role_component(p).filter(|_| !strategy.ignores_role_name()) {
            let context = NameComponent::new(role.name, NameSource::ParentContext).from_property(p.id);
            transform = transform.then(ColumnTransformLayer::PrefixContext(context));
        }
        transform = transform.then(ColumnTransformLayer::PrependReferenceContext(full_name));
        transform.apply(&inner)
    }
}

/// Add a column to a list, merging with a same-id column already there.
pub fn merge_column(columns: &mut Vec<Column>, column: Column) {
    match columns.iter_mut().find(|c| c.column_id == column.column_id) {
        Some(existing) => *existing = existing.constraint_merge(&column),
        None => columns.push(column),
    }
}
