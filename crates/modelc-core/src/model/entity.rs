//! Top level entity definitions.

use super::data::DataBag;
use super::ids::{EntityId, EntityRef, NamespaceId, PropertyId};
use super::property::ValueFacets;
use super::source::SourceLocation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag of a top level entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    DomainEntity,
    DomainEntitySubclass,
    DomainEntityExtension,
    Association,
    AssociationSubclass,
    AssociationExtension,
    Common,
    CommonExtension,
    Choice,
    Descriptor,
    Enumeration,
    SchoolYearEnumeration,
    Domain,
    Subdomain,
    Interchange,
    InterchangeExtension,
    SharedDecimal,
    SharedInteger,
    SharedString,
    /// Generated simple type backing a decimal property.
    DecimalType,
    /// Generated simple type backing an integer property.
    IntegerType,
    /// Generated simple type backing a string property.
    StringType,
}

/// Which back-link collection a bound child is recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseLink {
    /// The base entity's `extended_by`.
    ExtendedBy,
    /// The base entity's `subclassed_by`.
    SubclassedBy,
}

impl EntityKind {
    /// Every entity kind, in declaration order.
    pub const ALL: [EntityKind; 22] = [
        EntityKind::DomainEntity,
        EntityKind::DomainEntitySubclass,
        EntityKind::DomainEntityExtension,
        EntityKind::Association,
        EntityKind::AssociationSubclass,
        EntityKind::AssociationExtension,
        EntityKind::Common,
        EntityKind::CommonExtension,
        EntityKind::Choice,
        EntityKind::Descriptor,
        EntityKind::Enumeration,
        EntityKind::SchoolYearEnumeration,
        EntityKind::Domain,
        EntityKind::Subdomain,
        EntityKind::Interchange,
        EntityKind::InterchangeExtension,
        EntityKind::SharedDecimal,
        EntityKind::SharedInteger,
        EntityKind::SharedString,
        EntityKind::DecimalType,
        EntityKind::IntegerType,
        EntityKind::StringType,
    ];

    /// Source-language name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::DomainEntity => "domainEntity",
            EntityKind::DomainEntitySubclass => "domainEntitySubclass",
            EntityKind::DomainEntityExtension => "domainEntityExtension",
            EntityKind::Association => "association",
            EntityKind::AssociationSubclass => "associationSubclass",
            EntityKind::AssociationExtension => "associationExtension",
            EntityKind::Common => "common",
            EntityKind::CommonExtension => "commonExtension",
            EntityKind::Choice => "choice",
            EntityKind::Descriptor => "descriptor",
            EntityKind::Enumeration => "enumeration",
            EntityKind::SchoolYearEnumeration => "schoolYearEnumeration",
            EntityKind::Domain => "domain",
            EntityKind::Subdomain => "subdomain",
            EntityKind::Interchange => "interchange",
            EntityKind::InterchangeExtension => "interchangeExtension",
            EntityKind::SharedDecimal => "sharedDecimal",
            EntityKind::SharedInteger => "sharedInteger",
            EntityKind::SharedString => "sharedString",
            EntityKind::DecimalType => "decimalType",
            EntityKind::IntegerType => "integerType",
            EntityKind::StringType => "stringType",
        }
    }

    /// Kinds a child of this kind may bind to as its base, in priority order.
    ///
    /// Empty for kinds that have no base entity.
    pub fn base_kinds(self) -> &'static [EntityKind] {
        match self {
            EntityKind::DomainEntitySubclass => &[EntityKind::DomainEntity],
            EntityKind::DomainEntityExtension => {
                &[EntityKind::DomainEntity, EntityKind::DomainEntitySubclass]
            }
            EntityKind::AssociationSubclass => &[EntityKind::Association],
            EntityKind::AssociationExtension => {
                &[EntityKind::Association, EntityKind::AssociationSubclass]
            }
            EntityKind::CommonExtension => &[EntityKind::Common],
            EntityKind::InterchangeExtension => &[EntityKind::Interchange],
            _ => &[],
        }
    }

    /// Back-link collection this kind is recorded in on its base.
    pub fn base_link(self) -> Option<BaseLink> {
        match self {
            EntityKind::DomainEntitySubclass | EntityKind::AssociationSubclass => {
                Some(BaseLink::SubclassedBy)
            }
            EntityKind::DomainEntityExtension
            | EntityKind::AssociationExtension
            | EntityKind::CommonExtension
            | EntityKind::InterchangeExtension => Some(BaseLink::ExtendedBy),
            _ => None,
        }
    }

    /// Check whether this is a subclass kind.
    pub fn is_subclass(self) -> bool {
        self.base_link() == Some(BaseLink::SubclassedBy)
    }

    /// Check whether this is an extension kind.
    pub fn is_extension(self) -> bool {
        self.base_link() == Some(BaseLink::ExtendedBy)
    }

    /// Check whether this is a generated simple type.
    pub fn is_implicit_simple_type(self) -> bool {
        matches!(
            self,
            EntityKind::DecimalType | EntityKind::IntegerType | EntityKind::StringType
        )
    }

    /// Kinds an item naming this kind may resolve to, in priority order.
    pub fn item_lookup_kinds(self) -> &'static [EntityKind] {
        match self {
            EntityKind::DomainEntity => &[EntityKind::DomainEntity, EntityKind::DomainEntitySubclass],
            EntityKind::Association => &[EntityKind::Association, EntityKind::AssociationSubclass],
            EntityKind::Common => &[EntityKind::Common],
            EntityKind::Descriptor => &[EntityKind::Descriptor],
            EntityKind::Domain => &[EntityKind::Domain],
            EntityKind::DomainEntitySubclass => &[EntityKind::DomainEntitySubclass],
            EntityKind::AssociationSubclass => &[EntityKind::AssociationSubclass],
            EntityKind::Enumeration => &[EntityKind::Enumeration],
            _ => &[],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path of referential properties, ordered from the owning entity outward.
pub type ReferencePath = Vec<PropertyId>;

/// A top level entity in the model graph.
#[derive(Debug)]
pub struct TopLevelEntity {
    /// Arena id, assigned when added to an environment.
    pub id: EntityId,
    /// Kind tag.
    pub kind: EntityKind,
    /// Entity name, unique within its (namespace, kind).
    pub name: String,
    /// Owning namespace, assigned when added to an environment.
    pub namespace: NamespaceId,
    /// Documentation text.
    pub documentation: String,
    /// Whether the entity is abstract.
    pub is_abstract: bool,
    /// Whether identity updates cascade to referencing rows.
    pub allow_primary_key_updates: bool,
    /// Properties in declaration order.
    pub properties: Vec<PropertyId>,

    /// Base entity name as written in source.
    pub base_entity_name: String,
    /// Base entity namespace name as written in source, if qualified.
    pub base_entity_namespace_name: Option<String>,
    /// Bound base entity.
    pub base_entity: EntityRef,
    /// Extensions bound to this entity.
    pub extended_by: Vec<EntityId>,
    /// Subclasses bound to this entity.
    pub subclassed_by: Vec<EntityId>,

    /// Referential properties of other entities that reference this one.
    pub in_references: Vec<PropertyId>,
    /// This entity's own bound referential properties.
    pub out_references: Vec<PropertyId>,
    /// Paths from this entity down to leaf entities.
    pub out_reference_paths: Vec<ReferencePath>,
    /// Paths keyed by every entity they pass through.
    pub out_reference_entities_map: IndexMap<EntityId, Vec<ReferencePath>>,
    /// Paths keyed by the entity they end at.
    pub out_reference_entity_endpoints_map: IndexMap<EntityId, Vec<ReferencePath>>,

    /// Items of a domain, subdomain or interchange.
    pub items: Vec<ModelItem>,
    /// Parent domain name of a subdomain.
    pub parent_domain_name: Option<String>,
    /// Bound parent domain of a subdomain.
    pub parent_domain: EntityRef,
    /// Items of an enumeration.
    pub enumeration_items: Vec<EnumerationItem>,
    /// Value facets of a shared or generated simple type.
    pub facets: ValueFacets,

    /// Source position.
    pub source_location: SourceLocation,
    /// Plugin annotations.
    pub data: DataBag,
}

impl TopLevelEntity {
    /// Create a new entity, not yet added to an environment.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: EntityId(0),
            kind,
            name: name.into(),
            namespace: NamespaceId(0),
            documentation: String::new(),
            is_abstract: false,
            allow_primary_key_updates: false,
            properties: Vec::new(),
            base_entity_name: String::new(),
            base_entity_namespace_name: None,
            base_entity: EntityRef::NoEntity,
            extended_by: Vec::new(),
            subclassed_by: Vec::new(),
            in_references: Vec::new(),
            out_references: Vec::new(),
            out_reference_paths: Vec::new(),
            out_reference_entities_map: IndexMap::new(),
            out_reference_entity_endpoints_map: IndexMap::new(),
            items: Vec::new(),
            parent_domain_name: None,
            parent_domain: EntityRef::NoEntity,
            enumeration_items: Vec::new(),
            facets: ValueFacets::default(),
            source_location: SourceLocation::default(),
            data: DataBag::new(),
        }
    }

    /// Set the base entity name.
    pub fn with_base(mut self, name: impl Into<String>) -> Self {
        self.base_entity_name = name.into();
        self
    }

    /// Set a namespace-qualified base entity name.
    pub fn with_qualified_base(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.base_entity_namespace_name = Some(namespace.into());
        self.base_entity_name = name.into();
        self
    }

    /// Set documentation.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Add an item.
    pub fn with_item(mut self, item: ModelItem) -> Self {
        self.items.push(item);
        self
    }

    /// Add an enumeration item.
    pub fn with_enumeration_item(mut self, item: EnumerationItem) -> Self {
        self.enumeration_items.push(item);
        self
    }

    /// Set the parent domain of a subdomain.
    pub fn with_parent_domain(mut self, name: impl Into<String>) -> Self {
        self.parent_domain_name = Some(name.into());
        self
    }

    /// Allow identity updates to cascade.
    pub fn with_primary_key_updates(mut self) -> Self {
        self.allow_primary_key_updates = true;
        self
    }

    /// Mark the entity abstract.
    pub fn abstract_entity(mut self) -> Self {
        self.is_abstract = true;
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

    /// Check whether the entity has a base entity name to bind.
    pub fn has_base(&self) -> bool {
        !self.kind.base_kinds().is_empty()
    }
}

/// A named member of a domain, subdomain or interchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelItem {
    /// Kind of entity the item names.
    pub kind: EntityKind,
    /// Name of the entity.
    pub name: String,
    /// Namespace qualifier as written in source.
    pub namespace_name: Option<String>,
    /// Bound entity.
    pub referenced_entity: EntityRef,
    /// Source position.
    pub source_location: SourceLocation,
}

impl ModelItem {
    /// Create an unbound item.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace_name: None,
            referenced_entity: EntityRef::NoEntity,
            source_location: SourceLocation::default(),
        }
    }

    /// Qualify the item with a namespace name.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace_name = Some(namespace.into());
        self
    }
}

/// A value of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationItem {
    /// Short description, also used as the code value.
    pub short_description: String,
    /// Documentation text.
    #[serde(default)]
    pub documentation: String,
}

impl EnumerationItem {
    /// Create an enumeration item.
    pub fn new(short_description: impl Into<String>) -> Self {
        Self {
            short_description: short_description.into(),
            documentation: String::new(),
        }
    }
}
