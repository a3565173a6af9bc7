//! Arena identifiers and the typed "no entity" sentinel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a namespace within a [`ModelEnvironment`](super::ModelEnvironment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceId(pub(crate) u32);

/// Identifier of a top level entity within a [`ModelEnvironment`](super::ModelEnvironment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub(crate) u32);

/// Identifier of an entity property within a [`ModelEnvironment`](super::ModelEnvironment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub(crate) u32);

macro_rules! arena_index {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            /// Position of this id in its arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u32> for $ty {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_index!(NamespaceId, "namespace");
arena_index!(EntityId, "entity");
arena_index!(PropertyId, "property");

/// A resolvable link to a top level entity.
///
/// Every reference field in the graph always holds a value: unresolved
/// links are the explicit `NoEntity` variant rather than an absent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityRef {
    /// The link has not been (or could not be) resolved.
    #[default]
    NoEntity,
    /// The link resolved to this entity.
    Entity(EntityId),
}

impl EntityRef {
    /// The resolved entity, if any.
    pub fn entity(self) -> Option<EntityId> {
        match self {
            EntityRef::Entity(id) => Some(id),
            EntityRef::NoEntity => None,
        }
    }

    /// Check whether the link resolved.
    pub fn is_resolved(self) -> bool {
        matches!(self, EntityRef::Entity(_))
    }
}

impl From<EntityId> for EntityRef {
    fn from(id: EntityId) -> Self {
        EntityRef::Entity(id)
    }
}

impl From<Option<EntityId>> for EntityRef {
    fn from(id: Option<EntityId>) -> Self {
        id.map_or(EntityRef::NoEntity, EntityRef::Entity)
    }
}
