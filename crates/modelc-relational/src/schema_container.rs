//! Per-namespace schema containers: the finished relational output.

use crate::builder::tables;
use crate::config::RelationalConfig;
use crate::model::{ForeignKey, Table};
use crate::RELATIONAL_PLUGIN;
use modelc_core::model::Annotation;
use modelc_core::{EntityKind, Enhancer, EnhancerResult, ModelEnvironment, NamespaceId};
use serde::Serialize;
use tracing::{debug, info};

/// One row of an enumeration type table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationRow {
    pub table_id: String,
    pub code_value: String,
    pub description: String,
    pub short_description: String,
}

/// Tables, foreign keys and enumeration rows of one namespace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaContainer {
    pub namespace: String,
    pub schema: String,
    /// Tables sorted by id, primary keys cached.
    pub tables: Vec<Table>,
    /// Every foreign key, sorted by parent table then name.
    pub foreign_keys: Vec<ForeignKey>,
    pub enumeration_rows: Vec<EnumerationRow>,
}

impl Annotation for SchemaContainer {
    const PLUGIN: &'static str = RELATIONAL_PLUGIN;
}

impl SchemaContainer {
    /// Look up a table by id.
    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.table_id == table_id)
    }

    /// Foreign keys whose parent is `table_id`.
    pub fn foreign_keys_of(&self, table_id: &str) -> impl Iterator<Item = &ForeignKey> {
        let table_id = table_id.to_string();
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.parent_table_id == table_id)
    }
}

/// Schema container of a namespace, if the relational plugin has run.
pub fn schema_container(env: &ModelEnvironment, namespace: NamespaceId) -> Option<&SchemaContainer> {
    env.namespace(namespace).data.get::<SchemaContainer>()
}

/// Assembles a [`SchemaContainer`] for every namespace with derived tables.
#[derive(Debug, Clone, Default)]
pub struct SchemaContainerEnhancer {
    config: RelationalConfig,
}

impl SchemaContainerEnhancer {
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    fn enumeration_rows(&self, env: &ModelEnvironment, namespace: NamespaceId) -> Vec<EnumerationRow> {
        let mut rows = Vec::new();
        for id in env.namespace(namespace).entities.ids() {
            let entity = env.entity(id);
            if !matches!(entity.kind, EntityKind::Enumeration | EntityKind::SchoolYearEnumeration) {
                continue;
            }
            let table_id = crate::annotation::base_table_id(entity.kind, &entity.name);
            for item in &entity.enumeration_items {
                let description = if item.documentation.is_empty() {
                    item.short_description.clone()
                } else {
                    item.documentation.clone()
                };
                rows.push(EnumerationRow {
                    table_id: table_id.clone(),
                    code_value: item.short_description.clone(),
                    description,
                    short_description: item.short_description.clone(),
                });
            }
        }
        rows
    }

    fn container(&self, env: &ModelEnvironment, namespace: NamespaceId) -> Option<SchemaContainer> {
        let derived = tables(env, namespace)?;
        let name = env.namespace(namespace).name.clone();

        let mut tables: Vec<Table> = derived.values().cloned().collect();
        tables.sort_by(|a, b| a.table_id.cmp(&b.table_id));
        for table in &mut tables {
            table.cache_primary_keys();
        }

        let mut foreign_keys: Vec<ForeignKey> = tables.iter().flat_map(|t| t.foreign_keys.iter().cloned()).collect();
        foreign_keys.sort_by(|a, b| {
            a.parent_table_id
                .cmp(&b.parent_table_id)
                .then_with(|| a.name.cmp(&b.name))
        });

        Some(SchemaContainer {
            schema: self.config.schema_for(&name),
            enumeration_rows: self.enumeration_rows(env, namespace),
            namespace: name,
            tables,
            foreign_keys,
        })
    }
}

impl Enhancer for SchemaContainerEnhancer {
    fn name(&self) -> &'static str {
        "SchemaContainerEnhancer"
    }

    fn enhance(&self, env: &mut ModelEnvironment) -> modelc_core::Result<EnhancerResult> {
        let mut built = 0;
        for namespace in env.namespace_ids() {
            let Some(container) = self.container(env, namespace) else {
                continue;
            };
            debug!(
                namespace = %container.namespace,
                tables = container.tables.len(),
                foreign_keys = container.foreign_keys.len(),
                "Assembled schema container"
            );
            env.namespace_mut(namespace).data.insert(container);
            built += 1;
        }
        info!(containers = built, "Assembled schema containers");
        Ok(EnhancerResult::ok(self.name()))
    }
}
