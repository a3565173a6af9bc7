//! Integration tests deriving relational schemas through the full pipeline.

use modelc_core::model::EnumerationItem;
use modelc_core::{
    unified_plugin, EntityKind, EntityProperty, MergeDirective, ModelEnvironment, Pipeline, PropertyKind,
    TopLevelEntity,
};
use modelc_relational::{relational_plugin, schema_container, RelationalConfig, SchemaContainer, Table};
use pretty_assertions::assert_eq;

fn run(env: &mut ModelEnvironment) {
    Pipeline::new()
        .with_plugin(unified_plugin())
        .with_plugin(relational_plugin(RelationalConfig::default()))
        .run(env)
        .expect("pipeline should not fault");
}

fn container<'a>(env: &'a ModelEnvironment, namespace: &str) -> &'a SchemaContainer {
    let ns = env.namespace_by_name(namespace).unwrap();
    schema_container(env, ns).expect("relational plugin should assemble a container")
}

fn table<'a>(env: &'a ModelEnvironment, namespace: &str, id: &str) -> &'a Table {
    container(env, namespace)
        .table(id)
        .unwrap_or_else(|| panic!("missing table {id}"))
}

fn column_ids(table: &Table) -> Vec<&str> {
    table.columns.iter().map(|c| c.column_id.as_str()).collect()
}

fn foreign_key_names(table: &Table) -> Vec<&str> {
    table.foreign_keys.iter().map(|fk| fk.name.as_str()).collect()
}

fn pairs(table: &Table, name: &str) -> Vec<(String, String)> {
    table
        .foreign_keys
        .iter()
        .find(|fk| fk.name == name)
        .unwrap_or_else(|| panic!("missing foreign key {name}"))
        .column_pairs
        .iter()
        .map(|p| (p.parent_table_column_id.clone(), p.foreign_table_column_id.clone()))
        .collect()
}

fn pair(parent: &str, foreign: &str) -> (String, String) {
    (parent.to_string(), foreign.to_string())
}

/// A small school model: education organizations, sessions, sections,
/// students and their section enrollments, plus a `Sample` extension of
/// `Student`.
fn school_model() -> ModelEnvironment {
    let mut env = ModelEnvironment::new();
    let ns = env.add_namespace("EdFi", false, &[]);
    let mut entity = |env: &mut ModelEnvironment, e: TopLevelEntity| env.add_entity(ns, e).unwrap();

    entity(&mut env, TopLevelEntity::new(EntityKind::Descriptor, "Term"));
    entity(&mut env, TopLevelEntity::new(EntityKind::Descriptor, "Language"));
    entity(
        &mut env,
        TopLevelEntity::new(EntityKind::Enumeration, "Calendar")
            .with_enumeration_item(EnumerationItem::new("Student Specific"))
            .with_enumeration_item(EnumerationItem::new("School")),
    );

    let edorg = entity(
        &mut env,
        TopLevelEntity::new(EntityKind::DomainEntity, "EducationOrganization").abstract_entity(),
    );
    env.add_property(edorg, EntityProperty::new(PropertyKind::Integer, "EducationOrganizationId").identity());
    env.add_property(edorg, EntityProperty::new(PropertyKind::String, "NameOfInstitution"));

    let school = entity(
        &mut env,
        TopLevelEntity::new(EntityKind::DomainEntitySubclass, "School").with_base("EducationOrganization"),
    );
    env.add_property(
        school,
        EntityProperty::new(PropertyKind::Integer, "SchoolId").renames_identity("EducationOrganizationId"),
    );

    let session = entity(&mut env, TopLevelEntity::new(EntityKind::DomainEntity, "Session"));
    env.add_property(session, EntityProperty::new(PropertyKind::DomainEntity, "School").identity());
    env.add_property(session, EntityProperty::new(PropertyKind::String, "SessionName").identity());
    env.add_property(session, EntityProperty::new(PropertyKind::Descriptor, "Term").identity());

    let section = entity(
        &mut env,
        TopLevelEntity::new(EntityKind::DomainEntity, "Section").with_primary_key_updates(),
    );
    env.add_property(
        section,
        EntityProperty::new(PropertyKind::DomainEntity, "Session")
            .identity()
            .with_merge_directive(MergeDirective::new("Session.School", "School")),
    );
    env.add_property(section, EntityProperty::new(PropertyKind::DomainEntity, "School").identity());
    env.add_property(section, EntityProperty::new(PropertyKind::String, "SectionIdentifier").identity());
    env.add_property(
        section,
        EntityProperty::new(PropertyKind::DomainEntity, "School")
            .with_role_name("Home")
            .optional(),
    );

    let student = entity(&mut env, TopLevelEntity::new(EntityKind::DomainEntity, "Student"));
    env.add_property(student, EntityProperty::new(PropertyKind::Integer, "StudentUSI").identity());
    env.add_property(
        student,
        EntityProperty::new(PropertyKind::Descriptor, "Language").optional_collection(),
    );
    env.add_property(
        student,
        EntityProperty::new(PropertyKind::DomainEntity, "School")
            .with_role_name("Previous")
            .optional()
            .weak(),
    );

    let enrollment = entity(
        &mut env,
        TopLevelEntity::new(EntityKind::Association, "StudentSectionAssociation"),
    );
    env.add_property(
        enrollment,
        EntityProperty::new(PropertyKind::DomainEntity, "Student")
            .identity()
            .delete_cascade(),
    );
    env.add_property(enrollment, EntityProperty::new(PropertyKind::DomainEntity, "Section").identity());
    env.add_property(enrollment, EntityProperty::new(PropertyKind::Date, "BeginDate").identity());

    let sample = env.add_namespace("Sample", true, &[ns]);
    let extension = env
        .add_entity(
            sample,
            TopLevelEntity::new(EntityKind::DomainEntityExtension, "Student").with_base("Student"),
        )
        .unwrap();
    env.add_property(extension, EntityProperty::new(PropertyKind::String, "PetName").optional());
    env.add_property(
        extension,
        EntityProperty::new(PropertyKind::String, "FavoriteColor").optional_collection(),
    );

    env
}

#[test]
fn test_subclass_keys_on_renamed_base_identity() {
    let mut env = school_model();
    run(&mut env);

    let school = table(&env, "EdFi", "School");
    assert_eq!(column_ids(school), vec!["SchoolId"]);
    assert_eq!(foreign_key_names(school), vec!["FK_School_EducationOrganization"]);
    assert_eq!(
        pairs(school, "FK_School_EducationOrganization"),
        vec![pair("SchoolId", "EducationOrganizationId")]
    );
    assert!(table(&env, "EdFi", "EducationOrganization").has_discriminator_column);
}

#[test]
fn test_reference_and_descriptor_foreign_keys() {
    let mut env = school_model();
    run(&mut env);

    let session = table(&env, "EdFi", "Session");
    assert_eq!(column_ids(session), vec!["SchoolId", "SessionName", "TermDescriptorId"]);
    assert_eq!(
        foreign_key_names(session),
        vec!["FK_Session_School", "FK_Session_TermDescriptor"]
    );
    assert_eq!(pairs(session, "FK_Session_School"), vec![pair("SchoolId", "SchoolId")]);
}

#[test]
fn test_merge_directive_shares_one_column() {
    let mut env = school_model();
    run(&mut env);

    let section = table(&env, "EdFi", "Section");
    assert_eq!(
        column_ids(section),
        vec!["SchoolId", "SectionIdentifier", "SessionName", "TermDescriptorId", "HomeSchoolId"]
    );
    assert!(section.column_conflicts.is_empty());
    assert!(section.column("HomeSchoolId").unwrap().is_nullable);

    assert_eq!(
        foreign_key_names(section),
        vec!["FK_Section_School", "FK_Section_Session", "FK_Section_School1"]
    );
    assert_eq!(
        pairs(section, "FK_Section_Session"),
        vec![
            pair("SchoolId", "SchoolId"),
            pair("SessionName", "SessionName"),
            pair("TermDescriptorId", "TermDescriptorId"),
        ]
    );
    assert_eq!(pairs(section, "FK_Section_School1"), vec![pair("HomeSchoolId", "SchoolId")]);
}

#[test]
fn test_cascades_on_association_foreign_keys() {
    let mut env = school_model();
    run(&mut env);

    let enrollment = table(&env, "EdFi", "StudentSectionAssociation");
    assert_eq!(
        column_ids(enrollment),
        vec!["BeginDate", "SchoolId", "SectionIdentifier", "SessionName", "StudentUSI", "TermDescriptorId"]
    );

    let to_section = enrollment
        .foreign_keys
        .iter()
        .find(|fk| fk.foreign_table.table_id == "Section")
        .unwrap();
    assert!(to_section.with_update_cascade);
    assert!(!to_section.with_delete_cascade);

    let to_student = enrollment
        .foreign_keys
        .iter()
        .find(|fk| fk.foreign_table.table_id == "Student")
        .unwrap();
    assert!(to_student.with_delete_cascade);
    assert!(!to_student.with_update_cascade);
}

#[test]
fn test_weak_reference_has_columns_but_no_foreign_key() {
    let mut env = school_model();
    run(&mut env);

    let student = table(&env, "EdFi", "Student");
    assert_eq!(column_ids(student), vec!["StudentUSI", "PreviousSchoolId"]);
    assert!(student.foreign_keys.is_empty());
}

#[test]
fn test_descriptor_collection_sub_table() {
    let mut env = school_model();
    run(&mut env);

    let languages = table(&env, "EdFi", "StudentLanguage");
    assert_eq!(column_ids(languages), vec!["StudentUSI", "LanguageDescriptorId"]);
    assert!(languages.columns.iter().all(|c| c.is_part_of_primary_key));
    assert_eq!(
        foreign_key_names(languages),
        vec!["FK_StudentLanguage_Student", "FK_StudentLanguage_LanguageDescriptor"]
    );
    assert!(languages.foreign_keys[0].with_delete_cascade);
}

#[test]
fn test_extension_tables_live_in_extension_schema() {
    let mut env = school_model();
    run(&mut env);

    let sample = container(&env, "Sample");
    assert_eq!(sample.schema, "sample");
    let ids: Vec<&str> = sample.tables.iter().map(|t| t.table_id.as_str()).collect();
    assert_eq!(ids, vec!["StudentExtension", "StudentFavoriteColor"]);

    let extension = table(&env, "Sample", "StudentExtension");
    assert_eq!(column_ids(extension), vec!["StudentUSI", "PetName"]);
    assert_eq!(pairs(extension, "FK_StudentExtension_Student"), vec![pair("StudentUSI", "StudentUSI")]);

    let colors = table(&env, "Sample", "StudentFavoriteColor");
    assert_eq!(colors.foreign_keys[0].foreign_table.schema, "edfi");
    assert!(colors.foreign_keys[0].source_reference.is_subtable_relationship);
}

#[test]
fn test_enumeration_rows() {
    let mut env = school_model();
    run(&mut env);

    let edfi = container(&env, "EdFi");
    let codes: Vec<&str> = edfi.enumeration_rows.iter().map(|r| r.code_value.as_str()).collect();
    assert_eq!(codes, vec!["Student Specific", "School"]);
    assert!(edfi.table("CalendarType").unwrap().is_type_table);
}

#[test]
fn test_foreign_keys_sorted_in_container() {
    let mut env = school_model();
    run(&mut env);

    let edfi = container(&env, "EdFi");
    let keys: Vec<(&str, &str)> = edfi
        .foreign_keys
        .iter()
        .map(|fk| (fk.parent_table_id.as_str(), fk.name.as_str()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_rerun_is_idempotent() {
    let mut env = school_model();
    run(&mut env);
    let before = container(&env, "EdFi").clone();

    Pipeline::new()
        .with_plugin(relational_plugin(RelationalConfig::default()))
        .without_validation()
        .run(&mut env)
        .expect("rerun should not fault");

    assert_eq!(container(&env, "EdFi"), &before);
}

/// Sections keyed through a session, with a class period collection whose
/// school is merged into the section's own school. `session_merge_target`
/// is the target path of the session's merge directive.
fn section_model(session_merge_target: &str) -> ModelEnvironment {
    let mut env = ModelEnvironment::new();
    let ns = env.add_namespace("EdFi", false, &[]);
    let mut entity = |env: &mut ModelEnvironment, e: TopLevelEntity| env.add_entity(ns, e).unwrap();

    entity(&mut env, TopLevelEntity::new(EntityKind::Descriptor, "Term"));
    let school = entity(&mut env, TopLevelEntity::new(EntityKind::DomainEntity, "School"));
    env.add_property(school, EntityProperty::new(PropertyKind::Integer, "SchoolId").identity());

    let session = entity(&mut env, TopLevelEntity::new(EntityKind::DomainEntity, "Session"));
    env.add_property(session, EntityProperty::new(PropertyKind::DomainEntity, "School").identity());
    env.add_property(session, EntityProperty::new(PropertyKind::String, "SessionName").identity());
    env.add_property(session, EntityProperty::new(PropertyKind::Descriptor, "Term").identity());

    let class_period = entity(&mut env, TopLevelEntity::new(EntityKind::DomainEntity, "ClassPeriod"));
    env.add_property(class_period, EntityProperty::new(PropertyKind::DomainEntity, "School").identity());
    env.add_property(class_period, EntityProperty::new(PropertyKind::String, "ClassPeriodName").identity());

    let section = entity(&mut env, TopLevelEntity::new(EntityKind::DomainEntity, "Section"));
    env.add_property(
        section,
        EntityProperty::new(PropertyKind::DomainEntity, "Session")
            .identity()
            .with_merge_directive(MergeDirective::new("Session.School", session_merge_target)),
    );
    env.add_property(section, EntityProperty::new(PropertyKind::DomainEntity, "School").identity());
    env.add_property(section, EntityProperty::new(PropertyKind::String, "SectionIdentifier").identity());
    env.add_property(
        section,
        EntityProperty::new(PropertyKind::DomainEntity, "ClassPeriod")
            .optional_collection()
            .with_merge_directive(MergeDirective::new("ClassPeriod.School", "School")),
    );
    env
}

/// Students with one address common inlined twice under role names. The
/// address carries both a descriptor and an entity reference.
fn address_model() -> ModelEnvironment {
    let mut env = ModelEnvironment::new();
    let ns = env.add_namespace("EdFi", false, &[]);
    let mut entity = |env: &mut ModelEnvironment, e: TopLevelEntity| env.add_entity(ns, e).unwrap();

    entity(&mut env, TopLevelEntity::new(EntityKind::Descriptor, "State"));
    let school = entity(&mut env, TopLevelEntity::new(EntityKind::DomainEntity, "School"));
    env.add_property(school, EntityProperty::new(PropertyKind::Integer, "SchoolId").identity());

    let address = entity(&mut env, TopLevelEntity::new(EntityKind::Common, "Address"));
    env.add_property(address, EntityProperty::new(PropertyKind::Descriptor, "State"));
    env.add_property(address, EntityProperty::new(PropertyKind::DomainEntity, "School"));

    let student = entity(&mut env, TopLevelEntity::new(EntityKind::DomainEntity, "Student"));
    env.add_property(student, EntityProperty::new(PropertyKind::Integer, "StudentUSI").identity());
    env.add_property(
        student,
        EntityProperty::new(PropertyKind::InlineCommon, "Address").with_role_name("Home"),
    );
    env.add_property(
        student,
        EntityProperty::new(PropertyKind::InlineCommon, "Address")
            .with_role_name("Mailing")
            .optional(),
    );
    env
}

#[test]
fn test_unresolved_merge_target_keeps_columns_and_reports() {
    let mut env = section_model("Skool");
    run(&mut env);

    let section = table(&env, "EdFi", "Section");
    assert_eq!(
        column_ids(section),
        vec!["SchoolId", "SectionIdentifier", "SessionName", "TermDescriptorId"]
    );
    assert_eq!(
        pairs(section, "FK_Section_Session"),
        vec![
            pair("SchoolId", "SchoolId"),
            pair("SessionName", "SessionName"),
            pair("TermDescriptorId", "TermDescriptorId"),
        ]
    );

    let failures: Vec<&str> = env
        .validation_failures
        .iter()
        .filter(|f| f.validator_name == "MergeDirectivePathMustExist")
        .map(|f| f.message.as_str())
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("'Skool'"));
    assert!(env.has_errors());
}

#[test]
fn test_merged_reference_in_join_table_keys_on_parent_column() {
    let mut env = section_model("School");
    run(&mut env);
    assert!(!env.has_errors());

    let periods = table(&env, "EdFi", "SectionClassPeriod");
    let mut ids = column_ids(periods);
    ids.sort();
    assert_eq!(
        ids,
        vec!["ClassPeriodName", "SchoolId", "SectionIdentifier", "SessionName", "TermDescriptorId"]
    );
    assert!(periods.columns.iter().all(|c| c.is_part_of_primary_key));
    assert_eq!(
        pairs(periods, "FK_SectionClassPeriod_ClassPeriod"),
        vec![pair("ClassPeriodName", "ClassPeriodName"), pair("SchoolId", "SchoolId")]
    );
    assert!(foreign_key_names(periods).contains(&"FK_SectionClassPeriod_Section"));
}

#[test]
fn test_common_reused_under_two_roles_keys_each_occurrence() {
    let mut env = address_model();
    run(&mut env);

    let student = table(&env, "EdFi", "Student");
    assert_eq!(
        column_ids(student),
        vec![
            "StudentUSI",
            "HomeSchoolId",
            "HomeStateDescriptorId",
            "MailingSchoolId",
            "MailingStateDescriptorId",
        ]
    );
    assert_eq!(
        foreign_key_names(student),
        vec![
            "FK_Student_School",
            "FK_Student_StateDescriptor",
            "FK_Student_School1",
            "FK_Student_StateDescriptor1",
        ]
    );
    assert_eq!(
        pairs(student, "FK_Student_StateDescriptor"),
        vec![pair("HomeStateDescriptorId", "StateDescriptorId")]
    );
    assert_eq!(
        pairs(student, "FK_Student_StateDescriptor1"),
        vec![pair("MailingStateDescriptorId", "StateDescriptorId")]
    );
    assert_eq!(pairs(student, "FK_Student_School"), vec![pair("HomeSchoolId", "SchoolId")]);
    assert_eq!(pairs(student, "FK_Student_School1"), vec![pair("MailingSchoolId", "SchoolId")]);
}
