//! The model environment: arenas for the whole entity graph.

use super::data::DataBag;
use super::entity::{EntityKind, TopLevelEntity};
use super::ids::{EntityId, NamespaceId, PropertyId};
use super::namespace::Namespace;
use super::property::{EntityProperty, PropertyKind};
use super::property_index::PropertyIndex;
use crate::error::{Error, Result};
use crate::validation::ValidationFailure;
use tracing::debug;

/// Owner of every namespace, entity and property of one compilation.
///
/// Cross-links between model elements are arena ids. Namespaces are kept in
/// insertion order, which is also dependency order since a namespace can only
/// depend on namespaces added before it.
#[derive(Debug, Default)]
pub struct ModelEnvironment {
    namespaces: Vec<Namespace>,
    entities: Vec<TopLevelEntity>,
    properties: Vec<EntityProperty>,
    /// Every live property grouped by kind.
    pub property_index: PropertyIndex,
    /// Accumulated validation failures.
    pub validation_failures: Vec<ValidationFailure>,
    /// Environment-level plugin annotations.
    pub data: DataBag,
}

impl ModelEnvironment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace depending on already-added namespaces.
    pub fn add_namespace(
        &mut self,
        name: impl Into<String>,
        is_extension: bool,
        dependencies: &[NamespaceId],
    ) -> NamespaceId {
        let id = NamespaceId::from_index(self.namespaces.len());
        let name = name.into();
        debug!(namespace = %name, dependencies = dependencies.len(), "Adding namespace");
        self.namespaces
            .push(Namespace::new(id, name, is_extension, dependencies.to_vec()));
        id
    }

    /// Get a namespace.
    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.index()]
    }

    /// Get a namespace mutably.
    pub fn namespace_mut(&mut self, id: NamespaceId) -> &mut Namespace {
        &mut self.namespaces[id.index()]
    }

    /// All namespaces in dependency order.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.iter()
    }

    /// Namespace ids in dependency order.
    pub fn namespace_ids(&self) -> Vec<NamespaceId> {
        self.namespaces.iter().map(|n| n.id).collect()
    }

    /// Find a namespace by name.
    pub fn namespace_by_name(&self, name: &str) -> Option<NamespaceId> {
        self.namespaces.iter().find(|n| n.name == name).map(|n| n.id)
    }

    /// Add an entity to a namespace.
    ///
    /// Fails with [`Error::DuplicateEntity`] when the namespace already holds an
    /// entity of the same kind and name.
    pub fn add_entity(&mut self, namespace: NamespaceId, mut entity: TopLevelEntity) -> Result<EntityId> {
        let id = EntityId::from_index(self.entities.len());
        let ns = &mut self.namespaces[namespace.index()];
        if ns.entities.insert(entity.kind, &entity.name, id).is_err() {
            return Err(Error::DuplicateEntity {
                kind: entity.kind,
                name: entity.name,
                namespace: ns.name.clone(),
            });
        }
        entity.id = id;
        entity.namespace = namespace;
        self.entities.push(entity);
        Ok(id)
    }

    /// Add a property to the end of an entity's property list.
    pub fn add_property(&mut self, entity: EntityId, mut property: EntityProperty) -> PropertyId {
        let id = PropertyId::from_index(self.properties.len());
        let owner = &mut self.entities[entity.index()];
        property.id = id;
        property.parent_entity = entity;
        property.namespace = owner.namespace;
        owner.properties.push(id);
        self.property_index.insert(property.kind, id);
        self.properties.push(property);
        id
    }

    /// Remove an entity from its namespace and its properties from the index.
    ///
    /// The arena slot is kept so existing ids stay valid, but the entity is no
    /// longer reachable through lookups or iteration.
    pub fn remove_entity(&mut self, id: EntityId) {
        let entity = &self.entities[id.index()];
        let (kind, name, namespace) = (entity.kind, entity.name.clone(), entity.namespace);
        for property in entity.properties.clone() {
            let kind = self.properties[property.index()].kind;
            self.property_index.remove(kind, property);
        }
        self.namespaces[namespace.index()].entities.remove(kind, &name);
    }

    /// Get an entity.
    pub fn entity(&self, id: EntityId) -> &TopLevelEntity {
        &self.entities[id.index()]
    }

    /// Get an entity mutably.
    pub fn entity_mut(&mut self, id: EntityId) -> &mut TopLevelEntity {
        &mut self.entities[id.index()]
    }

    /// Live entity ids, namespace by namespace, in insertion order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.namespaces
            .iter()
            .flat_map(|n| n.entities.ids())
            .collect()
    }

    /// Live entity ids of the given kinds, namespace by namespace.
    pub fn entity_ids_of_kinds(&self, kinds: &[EntityKind]) -> Vec<EntityId> {
        self.entity_ids()
            .into_iter()
            .filter(|id| kinds.contains(&self.entity(*id).kind))
            .collect()
    }

    /// Find an entity by namespace name, kind and name.
    pub fn find_entity(&self, namespace: &str, kind: EntityKind, name: &str) -> Option<EntityId> {
        let ns = self.namespace_by_name(namespace)?;
        self.namespace(ns).entities.get(kind, name)
    }

    /// Get a property.
    pub fn property(&self, id: PropertyId) -> &EntityProperty {
        &self.properties[id.index()]
    }

    /// Get a property mutably.
    pub fn property_mut(&mut self, id: PropertyId) -> &mut EntityProperty {
        &mut self.properties[id.index()]
    }

    /// Live property ids of one kind.
    pub fn properties_of_kind(&self, kind: PropertyKind) -> Vec<PropertyId> {
        self.property_index.of_kind(kind).to_vec()
    }

    /// Find a property of an entity by its full property name.
    pub fn property_by_full_name(&self, entity: EntityId, full_name: &str) -> Option<PropertyId> {
        self.entity(entity)
            .properties
            .iter()
            .copied()
            .find(|p| self.property(*p).full_property_name() == full_name)
    }

    /// Identity properties of an entity, in declaration order.
    pub fn identity_properties(&self, entity: EntityId) -> Vec<PropertyId> {
        self.entity(entity)
            .properties
            .iter()
            .copied()
            .filter(|p| self.property(*p).is_part_of_identity)
            .collect()
    }

    /// Check whether any error-category validation failure was recorded.
    pub fn has_errors(&self) -> bool {
        self.validation_failures.iter().any(ValidationFailure::is_error)
    }
}
