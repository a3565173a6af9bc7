//! Build strategies: how columns are named and constrained while walking
//! properties.
//!
//! Strategies are immutable values; every configuration method returns a
//! modified copy.

use crate::model::{ColumnTransform, ColumnTransformLayer, NameComponent, NameSource};
use modelc_core::PropertyId;

/// A property whose context prefix is carried into nested column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentContext {
    pub property: PropertyId,
    pub prefix: String,
}

/// Column building configuration threaded through property recursion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStrategy {
    parent_contexts: Vec<ParentContext>,
    ignore_role_name: bool,
    leaf_columns_nullable: bool,
    suppress_primary_key: bool,
    skip_paths: Vec<Vec<String>>,
    property_path: Vec<String>,
}

impl BuildStrategy {
    /// Default strategy: no context, role names used, primary keys created.
    pub fn new() -> Self {
        Self::default()
    }

    /// Carry a property's context prefix into nested names.
    pub fn append_parent_context(&self, property: PropertyId, prefix: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.parent_contexts.push(ParentContext {
            property,
            prefix: prefix.into(),
        });
        next
    }

    /// Drop all carried parent contexts.
    pub fn without_parent_context(&self) -> Self {
        let mut next = self.clone();
        next.parent_contexts.clear();
        next
    }

    /// Name columns without their property's role name.
    pub fn ignoring_role_name(&self) -> Self {
        let mut next = self.clone();
        next.ignore_role_name = true;
        next
    }

    /// Make every leaf column nullable.
    pub fn leaf_columns_nullable(&self) -> Self {
        let mut next = self.clone();
        next.leaf_columns_nullable = true;
        next
    }

    pub fn without_leaf_columns_nullable(&self) -> Self {
        let mut next = self.clone();
        next.leaf_columns_nullable = false;
        next
    }

    /// Never mark columns as primary key from identity properties.
    pub fn suppressing_primary_key(&self) -> Self {
        let mut next = self.clone();
        next.suppress_primary_key = true;
        next
    }

    pub fn without_suppressed_primary_key(&self) -> Self {
        let mut next = self.clone();
        next.suppress_primary_key = false;
        next
    }

    /// Skip properties at the end of these full-name paths.
    pub fn skipping_paths(&self, paths: impl IntoIterator<Item = Vec<String>>) -> Self {
        let mut next = self.clone();
        next.skip_paths
            .extend(paths.into_iter().filter(|path| !path.is_empty()));
        next
    }

    /// Whether a property with this full name produces columns: it does
    /// unless a skip path ends exactly at it.
    pub fn build_columns(&self, full_name: &str) -> bool {
        let on_path: Vec<&Vec<String>> = self
            .skip_paths
            .iter()
            .filter(|path| path.first().is_some_and(|first| first == full_name))
            .collect();
        on_path.is_empty() || on_path.iter().any(|path| path.len() > 1)
    }

    /// Strategy for the properties nested under `full_name`: skip paths
    /// through it are narrowed by one segment, all others dropped.
    pub fn descend(&self, full_name: &str) -> Self {
        let mut next = self.clone();
        next.skip_paths = self
            .skip_paths
            .iter()
            .filter(|path| path.len() > 1 && path[0] == full_name)
            .map(|path| path[1..].to_vec())
            .collect();
        next.property_path.push(full_name.to_string());
        next
    }

    /// Concatenated parent context prefixes.
    pub fn parent_context(&self) -> String {
        self.parent_contexts.iter().map(|c| c.prefix.as_str()).collect()
    }

    pub fn parent_contexts(&self) -> &[ParentContext] {
        &self.parent_contexts
    }

    pub fn suppress_primary_key(&self) -> bool {
        self.suppress_primary_key
    }

    pub fn ignores_role_name(&self) -> bool {
        self.ignore_role_name
    }

    pub fn is_leaf_nullable(&self) -> bool {
        self.leaf_columns_nullable
    }

    /// Dotted path to a property named `full_name` under this strategy.
    pub fn property_path(&self, full_name: &str) -> String {
        let mut segments = self.property_path.clone();
        segments.push(full_name.to_string());
        segments.join(".")
    }

    /// Wrap a transform for leaf columns.
    pub fn leaf_transform(&self, transform: ColumnTransform) -> ColumnTransform {
        if self.leaf_columns_nullable {
            transform.wrapped_in(ColumnTransformLayer::MakeNull)
        } else {
            transform
        }
    }

    /// Parent context name components, skipping empty prefixes.
    pub fn parent_context_components(&self) -> Vec<NameComponent> {
        self.parent_contexts
            .iter()
            .filter(|c| !c.prefix.is_empty())
            .map(|c| NameComponent::new(&c.prefix, NameSource::ParentContext).from_property(c.property))
            .collect()
    }

    /// Column id and name components: parent context, then role (unless
    /// ignored), then base name.
    pub fn column_naming(&self, role: Option<NameComponent>, base: NameComponent) -> (String, Vec<NameComponent>) {
        let mut components = self.parent_context_components();
        if let Some(role) = role {
            if !self.ignore_role_name && !role.name.is_empty() {
                components.push(role);
            }
        }
        if !base.name.is_empty() {
            components.push(base);
        }
        let column_id = components.iter().map(|c| c.name.as_str()).collect();
        (column_id, components)
    }
}
