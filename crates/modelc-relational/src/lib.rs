//! modelc relational - derives tables, columns and foreign keys from a
//! resolved domain model.
//!
//! The derivation runs as a plugin on the core pipeline, after the unified
//! enhancers have bound references and merge directives:
//!
//! 1. [`RelationalAnnotationEnhancer`] decides table ids, schemas, table
//!    strategies and which identity updates cascade.
//! 2. [`TableBuildingEnhancer`] builds every table with its columns and the
//!    structural foreign keys (sub-table, subclass and extension keys).
//! 3. [`ForeignKeyEnhancer`] adds foreign keys for reference and lookup
//!    properties.
//! 4. [`SchemaContainerEnhancer`] assembles one sorted
//!    [`SchemaContainer`] per namespace.
//!
//! ```ignore
//! use modelc_core::{unified_plugin, Pipeline};
//! use modelc_relational::{relational_plugin, RelationalConfig};
//!
//! Pipeline::new()
//!     .with_plugin(unified_plugin())
//!     .with_plugin(relational_plugin(RelationalConfig::default()))
//!     .run(&mut env)?;
//! ```

pub mod annotation;
pub mod builder;
pub mod config;
pub mod error;
pub mod model;
pub mod schema_container;

pub use annotation::{RelationalAnnotationEnhancer, RelationalEntityData, RelationalPropertyData};
pub use builder::{tables, ForeignKeyEnhancer, NamespaceTables, TableBuildingEnhancer};
pub use config::RelationalConfig;
pub use error::{RelationalError, Result};
pub use model::{Column, ColumnType, ForeignKey, Table, TableIdentity};
pub use schema_container::{schema_container, EnumerationRow, SchemaContainer, SchemaContainerEnhancer};

use modelc_core::Plugin;

/// Annotation owner id of the relational plugin.
pub const RELATIONAL_PLUGIN: &str = "relational";

/// The relational plugin: annotation, table building, foreign keys and
/// schema containers, in that order.
pub fn relational_plugin(config: RelationalConfig) -> Plugin {
    Plugin::new(RELATIONAL_PLUGIN)
        .with_enhancer(RelationalAnnotationEnhancer::new(config.clone()))
        .with_enhancer(TableBuildingEnhancer::new(config.clone()))
        .with_enhancer(ForeignKeyEnhancer)
        .with_enhancer(SchemaContainerEnhancer::new(config))
}
