//! modelc core - entity graph, reference resolution, and the unified enhancer pipeline.
//!
//! A front end hands over an unresolved graph (see [`document`]); the
//! [`Pipeline`] then binds base entities, references, items and merge
//! directives and enumerates reference paths, reporting domain problems as
//! [`ValidationFailure`]s.

pub mod document;
pub mod enhance;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod validate;
pub mod validation;

pub use document::ModelDocument;
pub use enhance::unified_plugin;
pub use error::{Error, Result};
pub use model::{
    Annotation, Cardinality, DataBag, EntityId, EntityKind, EntityProperty, EntityRef,
    MergeDirective, MergeLink, ModelEnvironment, NamespaceId, PropertyId, PropertyKind,
    SourceLocation, TopLevelEntity,
};
pub use pipeline::{Enhancer, EnhancerResult, Pipeline, Plugin, Validator};
pub use resolve::resolve;
pub use validation::{FailureCategory, ValidationFailure};
