//! Column transform chains.
//!
//! A [`ColumnTransform`] is declared outer to inner ("primary key, with
//! context prefix X") and applied inner to outer: [`ColumnTransform::apply`]
//! inverts the layers into a stack once, then pops each layer and applies it
//! to a fresh clone of the column list.

use super::column::{Column, NameComponent};

/// One layer of a column transform chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTransformLayer {
    /// No change.
    Unchanged,
    /// Nullable and not part of the primary key.
    MakeNull,
    /// Not nullable.
    MakeNotNull,
    /// Part of the primary key and not nullable.
    MakePrimaryKey,
    /// Prepend a name component to the column id and name.
    PrefixContext(NameComponent),
    /// Prepend to the reference context and every merged context.
    PrependReferenceContext(String),
}

impl ColumnTransformLayer {
    fn transform(&self, column: &Column) -> Column {
        let mut column = column.clone();
        match self {
            ColumnTransformLayer::Unchanged => {}
            ColumnTransformLayer::MakeNull => {
                column.is_nullable = true;
                column.is_part_of_primary_key = false;
            }
            ColumnTransformLayer::MakeNotNull => {
                column.is_nullable = false;
            }
            ColumnTransformLayer::MakePrimaryKey => {
                column.is_part_of_primary_key = true;
                column.is_nullable = false;
            }
            ColumnTransformLayer::PrefixContext(component) => {
                if !component.name.is_empty() {
                    column.column_id = format!("{}{}", component.name, column.column_id);
                    column.name_components.insert(0, component.clone());
                }
            }
            ColumnTransformLayer::PrependReferenceContext(context) => {
                column.reference_context = format!("{context}{}", column.reference_context);
                for merged in &mut column.merged_reference_contexts {
                    *merged = format!("{context}{merged}");
                }
            }
        }
        column
    }
}

/// An ordered chain of column transform layers, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTransform {
    layers: Vec<ColumnTransformLayer>,
}

impl ColumnTransform {
    /// A chain that leaves columns unchanged.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// A chain of a single layer.
    pub fn of(layer: ColumnTransformLayer) -> Self {
        Self { layers: vec![layer] }
    }

    /// Primary key columns.
    pub fn primary_key() -> Self {
        Self::of(ColumnTransformLayer::MakePrimaryKey)
    }

    /// Primary key columns with a new reference context prepended.
    pub fn primary_key_with_reference_context(context: impl Into<String>) -> Self {
        Self::primary_key().then(ColumnTransformLayer::PrependReferenceContext(context.into()))
    }

    /// Add a layer inside the existing ones; it will be applied before them.
    pub fn then(mut self, layer: ColumnTransformLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Add a layer outside the existing ones; it will be applied after them.
    pub fn wrapped_in(mut self, layer: ColumnTransformLayer) -> Self {
        self.layers.insert(0, layer);
        self
    }

    /// Layers, outermost first.
    pub fn layers(&self) -> &[ColumnTransformLayer] {
        &self.layers
    }

    /// Apply the chain, innermost layer first.
    pub fn apply(&self, columns: &[Column]) -> Vec<Column> {
        // Popping yields the innermost layer first.
        let mut stack: Vec<_> = self.layers.iter().collect();

        let mut current = columns.to_vec();
        while let Some(layer) = stack.pop() {
            current = current.iter().map(|column| layer.transform(column)).collect();
        }
        current
    }
}
