//! Documentation inheritance.

use crate::error::Result;
use crate::model::{EntityRef, ModelEnvironment};
use crate::pipeline::{Enhancer, EnhancerResult};

/// Copies the referenced entity's documentation onto properties declared
/// with inherited documentation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentationInheritanceEnhancer;

impl Enhancer for DocumentationInheritanceEnhancer {
    fn name(&self) -> &'static str {
        "DocumentationInheritanceEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> Result<EnhancerResult> {
        let properties = env.property_index.matching(super::is_reference_kind);
        for id in properties {
            let property = env.property(id);
            if !property.documentation_inherited {
                continue;
            }
            if let EntityRef::Entity(target) = property.referenced_entity {
                let documentation = env.entity(target).documentation.clone();
                env.property_mut(id).documentation = documentation;
            }
        }
        Ok(EnhancerResult::ok(self.name()))
    }
}
