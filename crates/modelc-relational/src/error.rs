//! Relational derivation errors.

use thiserror::Error;

/// Internal faults raised while deriving tables and foreign keys.
///
/// A correctly validated model never produces these.
#[derive(Debug, Error)]
pub enum RelationalError {
    /// No parent column could be paired with a primary key column of the
    /// referenced table. Logged when the foreign key is skipped.
    #[error(
        "no column on {table} matches {foreign_table}.{column} for reference property '{property}'"
    )]
    UnmatchedForeignKeyColumn {
        /// Qualified parent table.
        table: String,
        /// Full name of the reference property.
        property: String,
        /// Qualified referenced table.
        foreign_table: String,
        /// Primary key column of the referenced table.
        column: String,
    },

    /// A referenced entity has no derived table.
    #[error("entity '{entity}' has no derived table '{table_id}'")]
    MissingTable {
        /// Referenced entity name.
        entity: String,
        /// Expected table id.
        table_id: String,
    },

    /// An entity was reached before the annotation pass ran.
    #[error("entity '{0}' has no relational annotation")]
    MissingAnnotation(String),

    /// Table strategies delegate in a cycle.
    #[error("table strategy delegation cycle through entity '{0}'")]
    DelegationCycle(String),

    /// Core fault surfaced while deriving.
    #[error(transparent)]
    Core(#[from] modelc_core::Error),
}

/// Result type for relational operations.
pub type Result<T> = std::result::Result<T, RelationalError>;

impl RelationalError {
    /// Wrap this fault as a core enhancer error.
    pub fn into_enhancer_error(self, enhancer: &str) -> modelc_core::Error {
        match self {
            RelationalError::Core(inner) => inner,
            other => modelc_core::Error::enhancer(enhancer, other.to_string()),
        }
    }
}
