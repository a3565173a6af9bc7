//! Foreign key strategy chains.
//!
//! Same discipline as column transforms: layers are declared outer to inner
//! and applied inner to outer.

use super::foreign_key::ForeignKey;

/// One layer of a foreign key strategy chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKeyStrategyLayer {
    /// Delete referencing rows with the referenced row.
    CascadeDelete,
    /// Propagate identity updates to referencing rows.
    CascadeUpdate,
    /// Pair parent columns with a differently named foreign column.
    RenameForeignColumn {
        /// Foreign column id before renaming.
        from: String,
        /// Foreign column id after renaming.
        to: String,
    },
}

impl ForeignKeyStrategyLayer {
    fn apply(&self, mut foreign_key: ForeignKey) -> ForeignKey {
        match self {
            ForeignKeyStrategyLayer::CascadeDelete => foreign_key.with_delete_cascade = true,
            ForeignKeyStrategyLayer::CascadeUpdate => foreign_key.with_update_cascade = true,
            ForeignKeyStrategyLayer::RenameForeignColumn { from, to } => {
                for pair in &mut foreign_key.column_pairs {
                    if &pair.foreign_table_column_id == from {
                        pair.foreign_table_column_id = to.clone();
                    }
                }
            }
        }
        foreign_key
    }
}

/// An ordered chain of foreign key strategy layers, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignKeyStrategy {
    layers: Vec<ForeignKeyStrategyLayer>,
}

impl ForeignKeyStrategy {
    /// A chain that leaves the key unchanged.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Add a layer inside the existing ones.
    pub fn then(mut self, layer: ForeignKeyStrategyLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Add a layer only when `condition` holds.
    pub fn then_if(self, condition: bool, layer: ForeignKeyStrategyLayer) -> Self {
        if condition {
            self.then(layer)
        } else {
            self
        }
    }

    pub fn layers(&self) -> &[ForeignKeyStrategyLayer] {
        &self.layers
    }

    /// Apply the chain, innermost layer first.
    pub fn apply(&self, foreign_key: ForeignKey) -> ForeignKey {
        let mut stack: Vec<&ForeignKeyStrategyLayer> = self.layers.iter().collect();
        let mut current = foreign_key;
        while let Some(layer) = stack.pop() {
            current = layer.apply(current);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::foreign_key::TableIdentity;

    fn foreign_key() -> ForeignKey {
        ForeignKey::new(TableIdentity::new("edfi", "EdFi", "EducationOrganization"))
            .with_column_pair("SchoolId", "SchoolId")
    }

    #[test]
    fn test_unchanged() {
        let fk = foreign_key();
        assert_eq!(ForeignKeyStrategy::unchanged().apply(fk.clone()), fk);
    }

    #[test]
    fn test_cascades() {
        let fk = ForeignKeyStrategy::unchanged()
            .then(ForeignKeyStrategyLayer::CascadeDelete)
            .then_if(false, ForeignKeyStrategyLayer::CascadeUpdate)
            .apply(foreign_key());
        assert!(fk.with_delete_cascade);
        assert!(!fk.with_update_cascade);
    }

    #[test]
    fn test_rename_foreign_column() {
        let fk = ForeignKeyStrategy::unchanged()
            .then(ForeignKeyStrategyLayer::RenameForeignColumn {
                from: "SchoolId".into(),
                to: "EducationOrganizationId".into(),
            })
            .apply(foreign_key());
        assert_eq!(fk.parent_column_ids(), vec!["SchoolId"]);
        assert_eq!(fk.foreign_column_ids(), vec!["EducationOrganizationId"]);
    }

    #[test]
    fn test_inner_rename_applies_first() {
        // Inner A -> B runs before outer B -> C.
        let fk = ForeignKeyStrategy::unchanged()
            .then(ForeignKeyStrategyLayer::RenameForeignColumn {
                from: "B".into(),
                to: "C".into(),
            })
            .then(ForeignKeyStrategyLayer::RenameForeignColumn {
                from: "SchoolId".into(),
                to: "B".into(),
            })
            .apply(foreign_key());
        assert_eq!(fk.foreign_column_ids(), vec!["C"]);
    }
}
