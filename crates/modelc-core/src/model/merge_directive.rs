//! Merge directives.

use super::ids::PropertyId;
use super::source::SourceLocation;

/// An assertion that two property paths denote the same data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeDirective {
    /// Source path segments.
    pub source_path: Vec<String>,
    /// Target path segments.
    pub target_path: Vec<String>,
    /// Property the source path resolved to.
    pub source_property: Option<PropertyId>,
    /// Property the target path resolved to.
    pub target_property: Option<PropertyId>,
    /// Properties walked while resolving the source path.
    pub source_property_chain: Vec<PropertyId>,
    /// Properties walked while resolving the target path.
    pub target_property_chain: Vec<PropertyId>,
    /// Source position.
    pub source_location: SourceLocation,
}

impl MergeDirective {
    /// Create a directive from dotted path strings.
    pub fn new(source_path: &str, target_path: &str) -> Self {
        Self {
            source_path: split_path(source_path),
            target_path: split_path(target_path),
            source_property: None,
            target_property: None,
            source_property_chain: Vec::new(),
            target_property_chain: Vec::new(),
            source_location: SourceLocation::default(),
        }
    }

    /// Set the source position.
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.source_location = location;
        self
    }

    /// Dotted source path.
    pub fn source_path_string(&self) -> String {
        self.source_path.join(".")
    }

    /// Dotted target path.
    pub fn target_path_string(&self) -> String {
        self.target_path.join(".")
    }

    /// Check whether both sides resolved.
    pub fn is_resolved(&self) -> bool {
        self.source_property.is_some() && self.target_property.is_some()
    }
}

/// Back-link from a resolved property to the directive naming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeLink {
    /// Property declaring the directive.
    pub owner: PropertyId,
    /// Index into the owner's `merge_directives`.
    pub directive: usize,
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_split_at_ingestion() {
        let directive = MergeDirective::new("Session.School", "School");
        assert_eq!(directive.source_path, vec!["Session", "School"]);
        assert_eq!(directive.target_path, vec!["School"]);
        assert_eq!(directive.source_path_string(), "Session.School");
        assert!(!directive.is_resolved());
    }
}
