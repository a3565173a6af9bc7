//! Namespaces and their entity repositories.

use super::data::DataBag;
use super::entity::EntityKind;
use super::ids::{EntityId, NamespaceId};
use indexmap::IndexMap;

/// Per-namespace map from (kind, name) to entity.
#[derive(Debug, Default)]
pub struct EntityRepository {
    entries: IndexMap<(EntityKind, String), EntityId>,
}

impl EntityRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entity by kind and name.
    pub fn get(&self, kind: EntityKind, name: &str) -> Option<EntityId> {
        self.entries.get(&(kind, name.to_string())).copied()
    }

    /// Register an entity, returning the existing id on a name clash.
    pub fn insert(&mut self, kind: EntityKind, name: &str, id: EntityId) -> Result<(), EntityId> {
        let key = (kind, name.to_string());
        if let Some(existing) = self.entries.get(&key) {
            return Err(*existing);
        }
        self.entries.insert(key, id);
        Ok(())
    }

    /// Unregister an entity, keeping the order of the rest.
    pub fn remove(&mut self, kind: EntityKind, name: &str) -> Option<EntityId> {
        self.entries.shift_remove(&(kind, name.to_string()))
    }

    /// Entity ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.values().copied()
    }

    /// Entity ids of one kind, in insertion order.
    pub fn ids_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityId> + '_ {
        self.entries
            .iter()
            .filter(move |((k, _), _)| *k == kind)
            .map(|(_, id)| *id)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the repository is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named, dependency-ordered partition of the entity graph.
#[derive(Debug)]
pub struct Namespace {
    /// Arena id.
    pub id: NamespaceId,
    /// Namespace name.
    pub name: String,
    /// Whether this is an extension namespace.
    pub is_extension: bool,
    /// Namespaces whose entities this one may reference, in declared order.
    pub dependencies: Vec<NamespaceId>,
    /// Entities owned by this namespace.
    pub entities: EntityRepository,
    /// Plugin annotations.
    pub data: DataBag,
}

impl Namespace {
    pub(crate) fn new(id: NamespaceId, name: String, is_extension: bool, dependencies: Vec<NamespaceId>) -> Self {
        Self {
            id,
            name,
            is_extension,
            dependencies,
            entities: EntityRepository::new(),
            data: DataBag::new(),
        }
    }
}
