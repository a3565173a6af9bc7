//! Entity property definitions.

use super::data::DataBag;
use super::entity::EntityKind;
use super::ids::{EntityId, EntityRef, NamespaceId, PropertyId};
use super::merge_directive::{MergeDirective, MergeLink};
use super::source::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag of an entity property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    // Simple scalars.
    Boolean,
    Currency,
    Date,
    DateTime,
    Decimal,
    Duration,
    Integer,
    Percent,
    Short,
    String,
    Time,
    Year,
    // References to other entities.
    Association,
    Choice,
    Common,
    DomainEntity,
    InlineCommon,
    Descriptor,
    Enumeration,
    SchoolYearEnumeration,
    // References to shared simple type definitions.
    SharedDecimal,
    SharedInteger,
    SharedShort,
    SharedString,
}

impl PropertyKind {
    /// Source-language name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Boolean => "boolean",
            PropertyKind::Currency => "currency",
            PropertyKind::Date => "date",
            PropertyKind::DateTime => "datetime",
            PropertyKind::Decimal => "decimal",
            PropertyKind::Duration => "duration",
            PropertyKind::Integer => "integer",
            PropertyKind::Percent => "percent",
            PropertyKind::Short => "short",
            PropertyKind::String => "string",
            PropertyKind::Time => "time",
            PropertyKind::Year => "year",
            PropertyKind::Association => "association",
            PropertyKind::Choice => "choice",
            PropertyKind::Common => "common",
            PropertyKind::DomainEntity => "domainEntity",
            PropertyKind::InlineCommon => "inlineCommon",
            PropertyKind::Descriptor => "descriptor",
            PropertyKind::Enumeration => "enumeration",
            PropertyKind::SchoolYearEnumeration => "schoolYearEnumeration",
            PropertyKind::SharedDecimal => "sharedDecimal",
            PropertyKind::SharedInteger => "sharedInteger",
            PropertyKind::SharedShort => "sharedShort",
            PropertyKind::SharedString => "sharedString",
        }
    }

    /// Check whether the property references another top level entity.
    pub fn is_referential(self) -> bool {
        matches!(
            self,
            PropertyKind::Association
                | PropertyKind::Choice
                | PropertyKind::Common
                | PropertyKind::DomainEntity
                | PropertyKind::InlineCommon
                | PropertyKind::Descriptor
                | PropertyKind::Enumeration
                | PropertyKind::SchoolYearEnumeration
        )
    }

    /// Check whether the property references a shared simple type.
    pub fn is_shared_simple(self) -> bool {
        matches!(
            self,
            PropertyKind::SharedDecimal
                | PropertyKind::SharedInteger
                | PropertyKind::SharedShort
                | PropertyKind::SharedString
        )
    }

    /// Check whether the property is a plain scalar.
    pub fn is_simple(self) -> bool {
        !self.is_referential() && !self.is_shared_simple()
    }

    /// Check whether the property references an identity-bearing entity
    /// whose table rows are the target of a foreign key.
    pub fn is_entity_reference(self) -> bool {
        matches!(self, PropertyKind::Association | PropertyKind::DomainEntity)
    }

    /// Entity kinds this property may reference, in resolution priority order.
    pub fn referenced_kinds(self) -> &'static [EntityKind] {
        match self {
            PropertyKind::Association => &[EntityKind::Association, EntityKind::AssociationSubclass],
            PropertyKind::Choice => &[EntityKind::Choice],
            PropertyKind::Common | PropertyKind::InlineCommon => &[EntityKind::Common],
            PropertyKind::DomainEntity => {
                &[EntityKind::DomainEntity, EntityKind::DomainEntitySubclass]
            }
            PropertyKind::Descriptor => &[EntityKind::Descriptor],
            PropertyKind::Enumeration => &[EntityKind::Enumeration],
            PropertyKind::SchoolYearEnumeration => &[EntityKind::SchoolYearEnumeration],
            PropertyKind::SharedDecimal => &[EntityKind::SharedDecimal],
            PropertyKind::SharedInteger | PropertyKind::SharedShort => &[EntityKind::SharedInteger],
            PropertyKind::SharedString => &[EntityKind::SharedString],
            _ => &[],
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    /// Exactly one value.
    #[default]
    Required,
    /// Zero or one value.
    Optional,
    /// One or more values.
    RequiredCollection,
    /// Zero or more values.
    OptionalCollection,
}

impl Cardinality {
    /// Check whether the property holds many values.
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            Cardinality::RequiredCollection | Cardinality::OptionalCollection
        )
    }

    /// Check whether the property may be absent.
    pub fn is_optional(self) -> bool {
        matches!(self, Cardinality::Optional | Cardinality::OptionalCollection)
    }
}

/// Value restrictions on simple and shared simple types.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFacets {
    /// Minimum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    /// Maximum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Total decimal digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_digits: Option<u32>,
    /// Digits after the decimal point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
    /// Minimum value as written in source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<String>,
    /// Maximum value as written in source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<String>,
}

/// A property of a top level entity.
#[derive(Debug)]
pub struct EntityProperty {
    /// Arena id, assigned when added to an environment.
    pub id: PropertyId,
    /// Kind tag.
    pub kind: PropertyKind,
    /// Property name; for referential kinds also the referenced entity name.
    pub name: String,
    /// Role name (context prefix), empty when absent.
    pub role_name: String,
    /// Shortened context prefix, empty when absent.
    pub shorten_to: String,
    /// Owning entity, assigned when added to an environment.
    pub parent_entity: EntityId,
    /// Owning namespace, assigned when added to an environment.
    pub namespace: NamespaceId,
    /// Documentation text.
    pub documentation: String,
    /// Whether documentation comes from the referenced entity.
    pub documentation_inherited: bool,
    /// Cardinality.
    pub cardinality: Cardinality,
    /// Part of the owning entity's identity.
    pub is_part_of_identity: bool,
    /// Identity property renamed from the base entity's identity property.
    pub is_identity_rename: bool,
    /// Base identity property name this property renames.
    pub base_key_name: String,
    /// Weak reference (no foreign key).
    pub is_weak: bool,
    /// Deleting the referenced row deletes the referencing row.
    pub is_delete_cascade: bool,
    /// Namespace qualifier on the referenced entity, as written in source.
    pub referenced_namespace_name: Option<String>,
    /// Bound referenced entity.
    pub referenced_entity: EntityRef,
    /// Merge directives declared on this property.
    pub merge_directives: Vec<MergeDirective>,
    /// Directives whose source path resolved to this property.
    pub merge_sourced_by: Vec<MergeLink>,
    /// Directives whose target path resolved to this property.
    pub merge_targeted_by: Vec<MergeLink>,
    /// Value facets of simple kinds.
    pub facets: ValueFacets,
    /// Source position.
    pub source_location: SourceLocation,
    /// Plugin annotations.
    pub data: DataBag,
}

impl EntityProperty {
    /// Create a required property, not yet added to an environment.
    pub fn new(kind: PropertyKind, name: impl Into<String>) -> Self {
        Self {
            id: PropertyId(0),
            kind,
            name: name.into(),
            role_name: String::new(),
            shorten_to: String::new(),
            parent_entity: EntityId(0),
            namespace: NamespaceId(0),
            documentation: String::new(),
            documentation_inherited: false,
            cardinality: Cardinality::Required,
            is_part_of_identity: false,
            is_identity_rename: false,
            base_key_name: String::new(),
            is_weak: false,
            is_delete_cascade: false,
            referenced_namespace_name: None,
            referenced_entity: EntityRef::NoEntity,
            merge_directives: Vec::new(),
            merge_sourced_by: Vec::new(),
            merge_targeted_by: Vec::new(),
            facets: ValueFacets::default(),
            source_location: SourceLocation::default(),
            data: DataBag::new(),
        }
    }

    /// Mark as part of the identity.
    pub fn identity(mut self) -> Self {
        self.is_part_of_identity = true;
        self.cardinality = Cardinality::Required;
        self
    }

    /// Make optional.
    pub fn optional(mut self) -> Self {
        self.cardinality = Cardinality::Optional;
        self
    }

    /// Make a required collection.
    pub fn required_collection(mut self) -> Self {
        self.cardinality = Cardinality::RequiredCollection;
        self
    }

    /// Make an optional collection.
    pub fn optional_collection(mut self) -> Self {
        self.cardinality = Cardinality::OptionalCollection;
        self
    }

    /// Set the role name.
    pub fn with_role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = role_name.into();
        self
    }

    /// Set the shortened context prefix.
    pub fn with_shorten_to(mut self, shorten_to: impl Into<String>) -> Self {
        self.shorten_to = shorten_to.into();
        self
    }

    /// Qualify the referenced entity with a namespace name.
    pub fn with_referenced_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.referenced_namespace_name = Some(namespace.into());
        self
    }

    /// Add a merge directive.
    pub fn with_merge_directive(mut self, directive: MergeDirective) -> Self {
        self.merge_directives.push(directive);
        self
    }

    /// Set documentation.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Inherit documentation from the referenced entity.
    pub fn inherit_documentation(mut self) -> Self {
        self.documentation_inherited = true;
        self
    }

    /// Rename a base identity property.
    pub fn renames_identity(mut self, base_key_name: impl Into<String>) -> Self {
        self.is_identity_rename = true;
        self.is_part_of_identity = true;
        self.base_key_name = base_key_name.into();
        self
    }

    /// Mark as a weak reference.
    pub fn weak(mut self) -> Self {
        self.is_weak = true;
        self
    }

    /// Cascade deletes of the referenced row.
    pub fn delete_cascade(mut self) -> Self {
        self.is_delete_cascade = true;
        self
    }

    /// Set value facets.
    pub fn with_facets(mut self, facets: ValueFacets) -> Self {
        self.facets = facets;
        self
    }

    /// Set the source position.
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.source_location = location;
        self
    }

    /// Role name plus name, with a role name equal to the name collapsed.
    pub fn full_property_name(&self) -> String {
        if self.role_name == self.name {
            self.name.clone()
        } else {
            format!("{}{}", self.role_name, self.name)
        }
    }

    /// Context prefix used for derived names: shortened prefix, else role name.
    pub fn context_prefix(&self) -> &str {
        if self.shorten_to.is_empty() {
            &self.role_name
        } else {
            &self.shorten_to
        }
    }

    /// Check whether merge directives may be declared on this property.
    pub fn accepts_merge_directives(&self) -> bool {
        self.kind.is_referential() || self.kind.is_shared_simple()
    }

    /// Check whether the property is a collection.
    pub fn is_collection(&self) -> bool {
        self.cardinality.is_collection()
    }

    /// Check whether the property is optional (single or collection).
    pub fn is_optional(&self) -> bool {
        self.cardinality.is_optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_property_name() {
        let plain = EntityProperty::new(PropertyKind::DomainEntity, "School");
        assert_eq!(plain.full_property_name(), "School");

        let role = EntityProperty::new(PropertyKind::DomainEntity, "School").with_role_name("Prior");
        assert_eq!(role.full_property_name(), "PriorSchool");

        let same = EntityProperty::new(PropertyKind::DomainEntity, "School").with_role_name("School");
        assert_eq!(same.full_property_name(), "School");
    }

    #[test]
    fn test_context_prefix_prefers_shorten_to() {
        let property = EntityProperty::new(PropertyKind::Integer, "Count")
            .with_role_name("Responsible")
            .with_shorten_to("Resp");
        assert_eq!(property.context_prefix(), "Resp");
    }

    #[test]
    fn test_kind_classification() {
        assert!(PropertyKind::InlineCommon.is_referential());
        assert!(PropertyKind::SharedShort.is_shared_simple());
        assert!(PropertyKind::Year.is_simple());
        assert_eq!(
            PropertyKind::SharedShort.referenced_kinds(),
            &[EntityKind::SharedInteger]
        );
        assert!(PropertyKind::String.referenced_kinds().is_empty());
    }

    #[test]
    fn test_cardinality_builders() {
        let property = EntityProperty::new(PropertyKind::Descriptor, "Grade").optional_collection();
        assert!(property.is_collection());
        assert!(property.is_optional());

        let identity = EntityProperty::new(PropertyKind::Integer, "Id").optional().identity();
        assert_eq!(identity.cardinality, Cardinality::Required);
        assert!(identity.is_part_of_identity);
    }
}
