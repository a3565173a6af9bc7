//! Model documents: the serialized, unresolved graph handed over by a front end.
//!
//! A document lists namespaces with their entities and properties exactly as
//! written in source, including raw base names and dotted merge paths.
//! [`ModelDocument::load`] builds a [`ModelEnvironment`] from it.

use crate::error::{Error, Result};
use crate::model::{
    Cardinality, EntityKind, EntityProperty, EnumerationItem, MergeDirective, ModelEnvironment,
    ModelItem, NamespaceId, PropertyKind, SourceLocation, TopLevelEntity, ValueFacets,
};
use crate::validation::ValidationFailure;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Validator name recorded for duplicate entities dropped while loading.
pub const DUPLICATE_ENTITY_NAME: &str = "DuplicateEntityName";

/// Root of a model document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDocument {
    /// Namespaces, in any order.
    #[serde(default)]
    pub namespaces: Vec<NamespaceDocument>,
}

/// A namespace in a model document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceDocument {
    /// Namespace name.
    pub name: String,
    /// Whether this is an extension namespace.
    #[serde(default)]
    pub is_extension: bool,
    /// Names of namespaces this one depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Entities declared in the namespace.
    #[serde(default)]
    pub entities: Vec<EntityDocument>,
}

/// A top level entity in a model document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDocument {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity name.
    pub name: String,
    /// Documentation text.
    #[serde(default)]
    pub documentation: String,
    /// Base entity name of a subclass or extension.
    #[serde(default)]
    pub base_entity: Option<String>,
    /// Namespace qualifier of the base entity name.
    #[serde(default)]
    pub base_namespace: Option<String>,
    /// Abstract entity.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Identity updates cascade to referencing rows.
    #[serde(default)]
    pub allow_primary_key_updates: bool,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<PropertyDocument>,
    /// Items of a domain, subdomain or interchange.
    #[serde(default)]
    pub items: Vec<ItemDocument>,
    /// Parent domain of a subdomain.
    #[serde(default)]
    pub parent_domain: Option<String>,
    /// Values of an enumeration.
    #[serde(default)]
    pub enumeration_items: Vec<EnumerationItem>,
    /// Facets of a shared or generated simple type.
    #[serde(default)]
    pub facets: ValueFacets,
    /// Source position.
    #[serde(default)]
    pub location: SourceLocation,
}

/// An entity property in a model document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDocument {
    /// Property kind.
    pub kind: PropertyKind,
    /// Property name.
    pub name: String,
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub shorten_to: String,
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Part of the owning entity's identity.
    #[serde(default)]
    pub identity: bool,
    /// Base identity property name this property renames.
    #[serde(default)]
    pub renames_identity: Option<String>,
    #[serde(default)]
    pub weak: bool,
    #[serde(default)]
    pub delete_cascade: bool,
    /// Namespace qualifier of the referenced entity.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub inherit_documentation: bool,
    #[serde(default)]
    pub merge_directives: Vec<MergeDirectiveDocument>,
    #[serde(default)]
    pub facets: ValueFacets,
    #[serde(default)]
    pub location: SourceLocation,
}

/// A merge directive with dotted paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDirectiveDocument {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub location: SourceLocation,
}

/// An item of a domain, subdomain or interchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub kind: EntityKind,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl ModelDocument {
    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a document file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Build an environment from the document.
    ///
    /// Namespaces are added in dependency order. Duplicate entities are
    /// dropped and reported as validation failures.
    pub fn load(&self) -> Result<ModelEnvironment> {
        let mut env = ModelEnvironment::new();

        for namespace in self.dependency_order()? {
            let dependencies: Vec<NamespaceId> = namespace
                .dependencies
                .iter()
                .filter_map(|name| env.namespace_by_name(name))
                .collect();
            let ns = env.add_namespace(&namespace.name, namespace.is_extension, &dependencies);

            for entity in &namespace.entities {
                load_entity(&mut env, ns, entity)?;
            }
        }

        info!(
            namespaces = env.namespace_ids().len(),
            entities = env.entity_ids().len(),
            properties = env.property_index.len(),
            "Loaded model document"
        );
        Ok(env)
    }

    /// Namespaces ordered so each follows all of its dependencies, keeping
    /// document order among independent namespaces.
    fn dependency_order(&self) -> Result<Vec<&NamespaceDocument>> {
        for namespace in &self.namespaces {
            for dependency in &namespace.dependencies {
                if !self.namespaces.iter().any(|n| &n.name == dependency) {
                    return Err(Error::UnknownNamespace {
                        namespace: namespace.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let mut ordered: Vec<&NamespaceDocument> = Vec::with_capacity(self.namespaces.len());
        let mut pending: Vec<&NamespaceDocument> = self.namespaces.iter().collect();
        while !pending.is_empty() {
            let ready = pending.iter().position(|candidate| {
                candidate
                    .dependencies
                    .iter()
                    .all(|dep| ordered.iter().any(|done| &done.name == dep))
            });
            match ready {
                Some(index) => ordered.push(pending.remove(index)),
                None => return Err(Error::DependencyCycle(pending[0].name.clone())),
            }
        }
        Ok(ordered)
    }
}

fn load_entity(env: &mut ModelEnvironment, ns: NamespaceId, doc: &EntityDocument) -> Result<()> {
    let mut entity = TopLevelEntity::new(doc.kind, &doc.name)
        .with_documentation(&doc.documentation)
        .with_facets(doc.facets.clone())
        .at(doc.location.clone());
    entity.is_abstract = doc.is_abstract;
    entity.allow_primary_key_updates = doc.allow_primary_key_updates;
    entity.base_entity_name = doc.base_entity.clone().unwrap_or_default();
    entity.base_entity_namespace_name = doc.base_namespace.clone();
    entity.parent_domain_name = doc.parent_domain.clone();
    entity.enumeration_items = doc.enumeration_items.clone();
    entity.items = doc
        .items
        .iter()
        .map(|item| ModelItem {
            namespace_name: item.namespace.clone(),
            source_location: item.location.clone(),
            ..ModelItem::new(item.kind, &item.name)
        })
        .collect();

    let id = match env.add_entity(ns, entity) {
        Ok(id) => id,
        Err(err @ Error::DuplicateEntity { .. }) => {
            warn!(error = %err, "Dropping duplicate entity");
            let failure =
                ValidationFailure::error(DUPLICATE_ENTITY_NAME, err.to_string()).at(&doc.location);
            env.validation_failures.push(failure);
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    for property in &doc.properties {
        env.add_property(id, property_from(property));
    }
    Ok(())
}

fn property_from(doc: &PropertyDocument) -> EntityProperty {
    let mut property = EntityProperty::new(doc.kind, &doc.name)
        .with_role_name(&doc.role_name)
        .with_shorten_to(&doc.shorten_to)
        .with_documentation(&doc.documentation)
        .with_facets(doc.facets.clone())
        .at(doc.location.clone());
    property.cardinality = doc.cardinality;
    property.is_part_of_identity = doc.identity;
    property.is_weak = doc.weak;
    property.is_delete_cascade = doc.delete_cascade;
    property.documentation_inherited = doc.inherit_documentation;
    property.referenced_namespace_name = doc.namespace.clone();
    if let Some(base_key_name) = &doc.renames_identity {
        property = property.renames_identity(base_key_name);
    }
    property.merge_directives = doc
        .merge_directives
        .iter()
        .map(|d| MergeDirective::new(&d.source, &d.target).at(d.location.clone()))
        .collect();
    property
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOCUMENT: &str = r#"{
        "namespaces": [
            {
                "name": "Extension",
                "isExtension": true,
                "dependencies": ["EdFi"],
                "entities": [
                    {
                        "kind": "domainEntityExtension",
                        "name": "School",
                        "baseEntity": "School",
                        "baseNamespace": "EdFi",
                        "properties": [
                            { "kind": "string", "name": "Motto", "cardinality": "optional",
                              "facets": { "maxLength": 30 } }
                        ]
                    }
                ]
            },
            {
                "name": "EdFi",
                "entities": [
                    {
                        "kind": "domainEntity",
                        "name": "School",
                        "documentation": "A school.",
                        "properties": [
                            { "kind": "integer", "name": "SchoolId", "identity": true },
                            { "kind": "domainEntity", "name": "School", "roleName": "Feeder",
                              "cardinality": "optionalCollection",
                              "mergeDirectives": [ { "source": "FeederSchool.SchoolId", "target": "SchoolId" } ] }
                        ]
                    },
                    { "kind": "domainEntity", "name": "School" }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_load_orders_namespaces_by_dependency() {
        let env = ModelDocument::from_json(DOCUMENT).unwrap().load().unwrap();

        let names: Vec<_> = env.namespaces().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["EdFi", "Extension"]);

        let extension = env.namespace_by_name("Extension").unwrap();
        let core = env.namespace_by_name("EdFi").unwrap();
        assert_eq!(env.namespace(extension).dependencies, vec![core]);
        assert!(env.namespace(extension).is_extension);
    }

    #[test]
    fn test_load_builds_properties() {
        let env = ModelDocument::from_json(DOCUMENT).unwrap().load().unwrap();
        let school = env.find_entity("EdFi", EntityKind::DomainEntity, "School").unwrap();

        let feeder = env.property_by_full_name(school, "FeederSchool").unwrap();
        let feeder = env.property(feeder);
        assert_eq!(feeder.cardinality, Cardinality::OptionalCollection);
        assert_eq!(feeder.merge_directives[0].source_path, vec!["FeederSchool", "SchoolId"]);

        let extension = env
            .find_entity("Extension", EntityKind::DomainEntityExtension, "School")
            .unwrap();
        let motto = env.property(env.entity(extension).properties[0]);
        assert_eq!(motto.facets.max_length, Some(30));
        assert_eq!(
            env.entity(extension).base_entity_namespace_name.as_deref(),
            Some("EdFi")
        );
    }

    #[test]
    fn test_duplicate_entity_becomes_failure() {
        let env = ModelDocument::from_json(DOCUMENT).unwrap().load().unwrap();
        assert_eq!(env.validation_failures.len(), 1);
        assert_eq!(env.validation_failures[0].validator_name, DUPLICATE_ENTITY_NAME);
    }

    #[test]
    fn test_unknown_dependency_and_cycle() {
        let unknown = r#"{ "namespaces": [ { "name": "A", "dependencies": ["Z"] } ] }"#;
        let err = ModelDocument::from_json(unknown).unwrap().load().unwrap_err();
        assert!(matches!(err, Error::UnknownNamespace { .. }));

        let cycle = r#"{ "namespaces": [
            { "name": "A", "dependencies": ["B"] },
            { "name": "B", "dependencies": ["A"] }
        ] }"#;
        let err = ModelDocument::from_json(cycle).unwrap().load().unwrap_err();
        assert!(matches!(err, Error::DependencyCycle(name) if name == "A"));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            ModelDocument::from_json("{ \"namespaces\": 3 }"),
            Err(Error::Document(_))
        ));
    }
}
