//! Unified enhancers.
//!
//! [`unified_plugin`] assembles them, with the unified validators, in the
//! order they must run.

mod base_entity;
mod documentation;
mod implicit_type_cleanup;
mod item;
mod merge_directive;
mod out_reference_path;
mod referenced_entity;

pub use base_entity::BaseEntityEnhancer;
pub use documentation::DocumentationInheritanceEnhancer;
pub use implicit_type_cleanup::ImplicitTypeCleanupEnhancer;
pub use item::ItemEnhancer;
pub use merge_directive::{find_property, resolve_path, MergeDirectiveEnhancer, PathResolution};
pub use out_reference_path::OutReferencePathEnhancer;
pub use referenced_entity::{is_reference_kind, ReferencedEntityEnhancer};

use crate::pipeline::Plugin;
use crate::validate::{
    BaseEntityMustExist, ItemMustExist, MergeDirectivePathMustExist, ReferencedEntityMustExist,
};

/// Name of the unified plugin.
pub const UNIFIED_PLUGIN: &str = "unified";

/// The unified enhancers and validators in execution order.
pub fn unified_plugin() -> Plugin {
    Plugin::new(UNIFIED_PLUGIN)
        .with_enhancer(ImplicitTypeCleanupEnhancer)
        .with_enhancer(BaseEntityEnhancer)
        .with_enhancer(ReferencedEntityEnhancer)
        .with_enhancer(DocumentationInheritanceEnhancer)
        .with_enhancer(ItemEnhancer)
        .with_enhancer(MergeDirectiveEnhancer)
        .with_enhancer(OutReferencePathEnhancer)
        .with_validator(BaseEntityMustExist)
        .with_validator(ReferencedEntityMustExist)
        .with_validator(MergeDirectivePathMustExist)
        .with_validator(ItemMustExist)
}
