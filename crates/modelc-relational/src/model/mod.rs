//! Relational model: tables, columns, foreign keys, and the transform and
//! strategy chains that shape them.

pub mod column;
pub mod column_transform;
pub mod foreign_key;
pub mod foreign_key_strategy;
pub mod table;
pub mod table_strategy;

pub use column::{Column, ColumnType, ForeignKeySource, NameComponent, NameSource};
pub use column_transform::{ColumnTransform, ColumnTransformLayer};
pub use foreign_key::{ColumnPair, ForeignKey, ForeignKeySourceReference, TableIdentity};
pub use foreign_key_strategy::{ForeignKeyStrategy, ForeignKeyStrategyLayer};
pub use table::{ColumnConflict, Table};
pub use table_strategy::TableStrategy;
