//! Whole-graph property index grouped by kind.

use super::ids::PropertyId;
use super::property::PropertyKind;
use std::collections::BTreeMap;

/// Every property in the graph, grouped by kind, independent of owner.
#[derive(Debug, Default)]
pub struct PropertyIndex {
    by_kind: BTreeMap<PropertyKind, Vec<PropertyId>>,
}

impl PropertyIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a property.
    pub fn insert(&mut self, kind: PropertyKind, id: PropertyId) {
        self.by_kind.entry(kind).or_default().push(id);
    }

    /// Drop a property.
    pub fn remove(&mut self, kind: PropertyKind, id: PropertyId) {
        if let Some(ids) = self.by_kind.get_mut(&kind) {
            ids.retain(|existing| *existing != id);
        }
    }

    /// Properties of one kind, in insertion order.
    pub fn of_kind(&self, kind: PropertyKind) -> &[PropertyId] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Properties of every kind matching a predicate.
    pub fn matching(&self, predicate: impl Fn(PropertyKind) -> bool) -> Vec<PropertyId> {
        self.by_kind
            .iter()
            .filter(|(kind, _)| predicate(**kind))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Total number of indexed properties.
    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    /// Check whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_by_kind() {
        let mut index = PropertyIndex::new();
        index.insert(PropertyKind::Integer, PropertyId(0));
        index.insert(PropertyKind::DomainEntity, PropertyId(1));
        index.insert(PropertyKind::Integer, PropertyId(2));

        assert_eq!(index.of_kind(PropertyKind::Integer), &[PropertyId(0), PropertyId(2)]);
        assert!(index.of_kind(PropertyKind::Choice).is_empty());
        assert_eq!(index.matching(PropertyKind::is_referential), vec![PropertyId(1)]);

        index.remove(PropertyKind::Integer, PropertyId(0));
        assert_eq!(index.len(), 2);
    }
}
