//! Build and validate commands.

use crate::config::ModelcConfig;
use anyhow::{bail, Context};
use modelc_core::{unified_plugin, EnhancerResult, ModelDocument, ModelEnvironment, Pipeline, ValidationFailure};
use modelc_relational::{relational_plugin, schema_container, SchemaContainer};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Everything a command reports back.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub enhancer_results: Vec<EnhancerResult>,
    pub validation_failures: Vec<ValidationFailure>,
    pub schema_containers: Vec<SchemaContainer>,
}

impl Report {
    /// Check whether any error-category failure was reported.
    pub fn has_errors(&self) -> bool {
        self.validation_failures.iter().any(ValidationFailure::is_error)
    }
}

fn load_model(path: &Path) -> anyhow::Result<ModelEnvironment> {
    let document = ModelDocument::from_path(path).with_context(|| format!("failed to read model {}", path.display()))?;
    let env = document
        .load()
        .with_context(|| format!("failed to load model {}", path.display()))?;
    info!(
        model = %path.display(),
        namespaces = env.namespace_ids().len(),
        entities = env.entity_ids().len(),
        "Loaded model"
    );
    Ok(env)
}

fn schema_containers(env: &ModelEnvironment, namespace: Option<&str>) -> anyhow::Result<Vec<SchemaContainer>> {
    let namespaces = match namespace {
        Some(name) => match env.namespace_by_name(name) {
            Some(id) => vec![id],
            None => bail!("unknown namespace {name}"),
        },
        None => env.namespace_ids(),
    };
    Ok(namespaces
        .into_iter()
        .filter_map(|id| schema_container(env, id).cloned())
        .collect())
}

/// Run the unified passes and, unless disabled, the relational plugin.
pub fn build(model: &Path, config: &ModelcConfig, namespace: Option<&str>) -> anyhow::Result<Report> {
    let mut env = load_model(model)?;

    let mut pipeline = Pipeline::new().with_plugin(unified_plugin());
    if config.pipeline.relational {
        pipeline = pipeline.with_plugin(relational_plugin(config.relational.clone()));
    }
    if !config.pipeline.validate {
        pipeline = pipeline.without_validation();
    }
    let enhancer_results = pipeline.run(&mut env).context("pipeline aborted")?;

    Ok(Report {
        enhancer_results,
        schema_containers: schema_containers(&env, namespace)?,
        validation_failures: env.validation_failures,
    })
}

/// Run the unified passes and validators only.
pub fn validate(model: &Path) -> anyhow::Result<Report> {
    let mut env = load_model(model)?;
    let enhancer_results = Pipeline::new()
        .with_plugin(unified_plugin())
        .run(&mut env)
        .context("pipeline aborted")?;

    Ok(Report {
        enhancer_results,
        validation_failures: env.validation_failures,
        schema_containers: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const MODEL: &str = r#"{
        "namespaces": [
            {
                "name": "EdFi",
                "entities": [
                    { "kind": "descriptor", "name": "GradeLevel" },
                    {
                        "kind": "domainEntity",
                        "name": "School",
                        "properties": [
                            { "kind": "integer", "name": "SchoolId", "identity": true },
                            { "kind": "descriptor", "name": "GradeLevel", "cardinality": "requiredCollection" }
                        ]
                    }
                ]
            },
            {
                "name": "Sample",
                "isExtension": true,
                "dependencies": ["EdFi"],
                "entities": [
                    {
                        "kind": "domainEntityExtension",
                        "name": "School",
                        "baseEntity": "School",
                        "properties": [
                            { "kind": "string", "name": "Motto", "cardinality": "optional",
                              "facets": { "maxLength": 30 } }
                        ]
                    }
                ]
            }
        ]
    }"#;

    const BROKEN: &str = r#"{
        "namespaces": [
            {
                "name": "EdFi",
                "entities": [
                    {
                        "kind": "domainEntity",
                        "name": "Section",
                        "properties": [
                            { "kind": "domainEntity", "name": "Course", "identity": true }
                        ]
                    }
                ]
            }
        ]
    }"#;

    fn model_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    fn table_ids(container: &SchemaContainer) -> Vec<&str> {
        container.tables.iter().map(|t| t.table_id.as_str()).collect()
    }

    #[test]
    fn test_build_all_namespaces() {
        let model = model_file(MODEL);
        let report = build(model.path(), &ModelcConfig::default(), None).unwrap();

        assert!(!report.has_errors());
        assert!(report.enhancer_results.iter().all(|r| r.success));
        assert_eq!(report.schema_containers.len(), 2);
        assert_eq!(
            table_ids(&report.schema_containers[0]),
            vec!["GradeLevelDescriptor", "School", "SchoolGradeLevel"]
        );
        assert_eq!(table_ids(&report.schema_containers[1]), vec!["SchoolExtension"]);
    }

    #[test]
    fn test_build_single_namespace() {
        let model = model_file(MODEL);
        let report = build(model.path(), &ModelcConfig::default(), Some("Sample")).unwrap();
        assert_eq!(report.schema_containers.len(), 1);
        assert_eq!(report.schema_containers[0].schema, "sample");

        let err = build(model.path(), &ModelcConfig::default(), Some("Missing")).unwrap_err();
        assert_eq!(err.to_string(), "unknown namespace Missing");
    }

    #[test]
    fn test_build_without_relational() {
        let model = model_file(MODEL);
        let config = ModelcConfig {
            pipeline: PipelineConfig {
                relational: false,
                validate: true,
            },
            ..ModelcConfig::default()
        };
        let report = build(model.path(), &config, None).unwrap();
        assert!(report.schema_containers.is_empty());
        assert!(report
            .enhancer_results
            .iter()
            .all(|r| r.enhancer_name != "TableBuildingEnhancer"));
    }

    #[test]
    fn test_validate_reports_unresolved_reference() {
        let model = model_file(BROKEN);
        let report = validate(model.path()).unwrap();
        assert!(report.has_errors());
        assert!(report.schema_containers.is_empty());
        assert!(report.validation_failures.iter().any(|f| f.message.contains("Course")));
    }

    #[test]
    fn test_skipping_validation_hides_failures() {
        let model = model_file(BROKEN);
        let config = ModelcConfig {
            pipeline: PipelineConfig {
                relational: false,
                validate: false,
            },
            ..ModelcConfig::default()
        };
        let report = build(model.path(), &config, None).unwrap();
        assert!(!report.has_errors());
    }

    #[test]
    fn test_unreadable_model() {
        let model = model_file("not json");
        let err = validate(model.path()).unwrap_err();
        assert!(err.to_string().starts_with("failed to read model"));
    }
}
