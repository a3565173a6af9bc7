//! Table and foreign key derivation.

pub mod build_strategy;
pub mod column_creator;
pub mod foreign_key_enhancer;
pub mod table_builder;
pub mod table_enhancer;

pub use build_strategy::BuildStrategy;
pub use column_creator::ColumnCreator;
pub use foreign_key_enhancer::ForeignKeyEnhancer;
pub use table_builder::{ParentTable, TableBuilder};
pub use table_enhancer::TableBuildingEnhancer;

use crate::model::{Table, TableIdentity};
use crate::RELATIONAL_PLUGIN;
use indexmap::IndexMap;
use modelc_core::model::Annotation;
use modelc_core::{ModelEnvironment, NamespaceId};

/// Tables derived for one namespace, keyed by table id in build order.
#[derive(Debug, Clone, Default)]
pub struct NamespaceTables {
    pub tables: IndexMap<String, Table>,
}

impl Annotation for NamespaceTables {
    const PLUGIN: &'static str = RELATIONAL_PLUGIN;
}

impl NamespaceTables {
    /// Insert a table, replacing one with the same id.
    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.table_id.clone(), table);
    }
}

/// Derived tables of a namespace, if the table builder has run.
pub fn tables(env: &ModelEnvironment, namespace: NamespaceId) -> Option<&IndexMap<String, Table>> {
    env.namespace(namespace)
        .data
        .get::<NamespaceTables>()
        .map(|derived| &derived.tables)
}

/// Find a derived table by physical identity.
pub fn find_table<'a>(env: &'a ModelEnvironment, identity: &TableIdentity) -> Option<&'a Table> {
    let namespace = env.namespace_by_name(&identity.namespace)?;
    tables(env, namespace)?.get(&identity.table_id)
}
