//! The entity graph.
//!
//! All model elements live in arenas owned by [`ModelEnvironment`] and link
//! to each other through copyable ids.

pub mod data;
pub mod entity;
pub mod environment;
pub mod ids;
pub mod merge_directive;
pub mod namespace;
pub mod property;
pub mod property_index;
pub mod source;

pub use data::{Annotation, DataBag};
pub use entity::{BaseLink, EntityKind, EnumerationItem, ModelItem, ReferencePath, TopLevelEntity};
pub use environment::ModelEnvironment;
pub use ids::{EntityId, EntityRef, NamespaceId, PropertyId};
pub use merge_directive::{MergeDirective, MergeLink};
pub use namespace::{EntityRepository, Namespace};
pub use property::{Cardinality, EntityProperty, PropertyKind, ValueFacets};
pub use property_index::PropertyIndex;
pub use source::SourceLocation;
