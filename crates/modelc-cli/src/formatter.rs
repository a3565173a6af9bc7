//! Output formatters for command reports.

use crate::commands::Report;
use clap::ValueEnum;
use comfy_table::{Cell, Table};
use modelc_core::{EnhancerResult, ValidationFailure};
use modelc_relational::SchemaContainer;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a whole report.
    fn format_report(&self, report: &Report) -> String;

    /// Format enhancer results.
    fn format_results(&self, results: &[EnhancerResult]) -> String;

    /// Format validation failures.
    fn format_failures(&self, failures: &[ValidationFailure]) -> String;

    /// Format one namespace's tables and foreign keys.
    fn format_container(&self, container: &SchemaContainer) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        ""
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_report(&self, report: &Report) -> String {
        let mut sections = vec![
            self.format_results(&report.enhancer_results),
            self.format_failures(&report.validation_failures),
        ];
        sections.extend(report.schema_containers.iter().map(|c| self.format_container(c)));
        sections.join("\n\n")
    }

    fn format_results(&self, results: &[EnhancerResult]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Enhancer", "Success"]);
        for result in results {
            table.add_row(vec![result.enhancer_name.as_str(), yes_no(result.success)]);
        }
        table.to_string()
    }

    fn format_failures(&self, failures: &[ValidationFailure]) -> String {
        if failures.is_empty() {
            return "No validation failures".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["Category", "Validator", "Message", "Location"]);
        for failure in failures {
            let location = failure
                .source_location
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(failure.category),
                Cell::new(&failure.validator_name),
                Cell::new(&failure.message),
                Cell::new(location),
            ]);
        }
        table.to_string()
    }

    fn format_container(&self, container: &SchemaContainer) -> String {
        let mut output = format!("Schema {} ({})", container.schema, container.namespace);
        if container.tables.is_empty() {
            output.push_str("\nNo tables");
            return output;
        }

        let mut columns = Table::new();
        columns.set_header(vec!["Table", "Column", "Type", "PK", "Nullable"]);
        for table in &container.tables {
            for column in &table.columns {
                columns.add_row(vec![
                    Cell::new(&table.table_id),
                    Cell::new(&column.column_id),
                    Cell::new(&column.column_type),
                    Cell::new(yes_no(column.is_part_of_primary_key)),
                    Cell::new(yes_no(column.is_nullable)),
                ]);
            }
        }
        output.push('\n');
        output.push_str(&columns.to_string());

        if !container.foreign_keys.is_empty() {
            let mut keys = Table::new();
            keys.set_header(vec!["Foreign Key", "Columns", "References", "Cascade"]);
            for fk in &container.foreign_keys {
                let cascade = match (fk.with_delete_cascade, fk.with_update_cascade) {
                    (true, true) => "delete, update",
                    (true, false) => "delete",
                    (false, true) => "update",
                    (false, false) => "",
                };
                keys.add_row(vec![
                    Cell::new(&fk.name),
                    Cell::new(fk.parent_column_ids().join(", ")),
                    Cell::new(format!("{} ({})", fk.foreign_table, fk.foreign_column_ids().join(", "))),
                    Cell::new(cascade),
                ]);
            }
            output.push('\n');
            output.push_str(&keys.to_string());
        }

        if !container.enumeration_rows.is_empty() {
            let mut rows = Table::new();
            rows.set_header(vec!["Type Table", "Code Value", "Description"]);
            for row in &container.enumeration_rows {
                rows.add_row(vec![&row.table_id, &row.code_value, &row.description]);
            }
            output.push('\n');
            output.push_str(&rows.to_string());
        }

        output
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_report(&self, report: &Report) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_results(&self, results: &[EnhancerResult]) -> String {
        serde_json::to_string_pretty(results).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_failures(&self, failures: &[ValidationFailure]) -> String {
        serde_json::to_string_pretty(failures).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_container(&self, container: &SchemaContainer) -> String {
        serde_json::to_string_pretty(container).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelc_relational::{Column, ColumnType, ForeignKey, Table as RelationalTable, TableIdentity};

    fn container() -> SchemaContainer {
        let mut school = RelationalTable::new(TableIdentity::new("edfi", "EdFi", "School"));
        school.add_column(Column::new("SchoolId", ColumnType::Integer).primary_key());
        let mut grade = RelationalTable::new(TableIdentity::new("edfi", "EdFi", "SchoolGradeLevel"));
        grade.add_column(Column::new("SchoolId", ColumnType::Integer).primary_key());
        grade.add_foreign_key(ForeignKey::new(school.identity()).with_column_pair("SchoolId", "SchoolId"));
        let foreign_keys = grade.foreign_keys.clone();

        SchemaContainer {
            namespace: "EdFi".to_string(),
            schema: "edfi".to_string(),
            tables: vec![school, grade],
            foreign_keys,
            enumeration_rows: Vec::new(),
        }
    }

    fn report() -> Report {
        Report {
            enhancer_results: vec![EnhancerResult::ok("BaseEntityEnhancer")],
            validation_failures: vec![ValidationFailure::error("ReferencedEntityMustExist", "missing 'Course'")],
            schema_containers: vec![container()],
        }
    }

    #[test]
    fn test_table_report() {
        let output = TableFormatter.format_report(&report());
        assert!(output.contains("BaseEntityEnhancer"));
        assert!(output.contains("missing 'Course'"));
        assert!(output.contains("Schema edfi (EdFi)"));
        assert!(output.contains("FK_SchoolGradeLevel_School"));
    }

    #[test]
    fn test_table_without_failures() {
        assert_eq!(TableFormatter.format_failures(&[]), "No validation failures");
    }

    #[test]
    fn test_json_report() {
        let output = JsonFormatter.format_report(&report());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["enhancerResults"][0]["enhancerName"], "BaseEntityEnhancer");
        assert_eq!(value["validationFailures"][0]["category"], "error");
        assert_eq!(value["schemaContainers"][0]["tables"][1]["tableId"], "SchoolGradeLevel");
    }

    #[test]
    fn test_create_formatter() {
        let formatter = create_formatter(OutputFormat::Json);
        assert_eq!(formatter.format_results(&[]), "[]");
        assert_eq!(OutputFormat::Table.to_string(), "table");
    }
}
