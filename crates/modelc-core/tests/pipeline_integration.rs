//! Integration tests running the unified pipeline over small models.

use modelc_core::{
    unified_plugin, EntityKind, EntityProperty, EntityRef, FailureCategory, MergeDirective,
    MergeLink, ModelDocument, ModelEnvironment, Pipeline, PropertyKind, TopLevelEntity,
};
use pretty_assertions::assert_eq;

fn run(env: &mut ModelEnvironment) {
    Pipeline::new()
        .with_plugin(unified_plugin())
        .run(env)
        .expect("pipeline should not fault");
}

/// Core namespace `EdFi` with `Foo`, extension `Extension` depending on it.
fn core_and_extension() -> ModelEnvironment {
    let mut env = ModelEnvironment::new();
    let core = env.add_namespace("EdFi", false, &[]);
    env.add_namespace("Extension", true, &[core]);
    let foo = env
        .add_entity(core, TopLevelEntity::new(EntityKind::DomainEntity, "Foo"))
        .unwrap();
    env.add_property(foo, EntityProperty::new(PropertyKind::Integer, "FooId").identity());
    env
}

#[test]
fn test_qualified_extension_binds_to_core() {
    let mut env = core_and_extension();
    let extension = env.namespace_by_name("Extension").unwrap();
    let child = env
        .add_entity(
            extension,
            TopLevelEntity::new(EntityKind::DomainEntityExtension, "Foo").with_qualified_base("EdFi", "Foo"),
        )
        .unwrap();

    run(&mut env);

    let foo = env.find_entity("EdFi", EntityKind::DomainEntity, "Foo").unwrap();
    assert_eq!(env.entity(child).base_entity, EntityRef::Entity(foo));
    assert_eq!(env.entity(foo).extended_by, vec![child]);
    assert!(env.validation_failures.is_empty());
}

#[test]
fn test_unqualified_name_prefers_local_definition() {
    let mut env = core_and_extension();
    let extension = env.namespace_by_name("Extension").unwrap();
    let local_foo = env
        .add_entity(extension, TopLevelEntity::new(EntityKind::DomainEntity, "Foo"))
        .unwrap();
    let holder = env
        .add_entity(extension, TopLevelEntity::new(EntityKind::DomainEntity, "Holder"))
        .unwrap();
    let reference = env.add_property(holder, EntityProperty::new(PropertyKind::DomainEntity, "Foo"));

    run(&mut env);

    assert_eq!(env.property(reference).referenced_entity, EntityRef::Entity(local_foo));
}

#[test]
fn test_sibling_extensions_do_not_collide() {
    let mut env = ModelEnvironment::new();
    let core = env.add_namespace("EdFi", false, &[]);
    let first = env.add_namespace("ExtensionA", true, &[core]);
    let second = env.add_namespace("ExtensionB", true, &[core]);
    let a = env
        .add_entity(first, TopLevelEntity::new(EntityKind::DomainEntity, "Bar"))
        .unwrap();
    let b = env
        .add_entity(second, TopLevelEntity::new(EntityKind::DomainEntity, "Bar"))
        .unwrap();

    // A reference from ExtensionB cannot see ExtensionA.
    let holder = env
        .add_entity(second, TopLevelEntity::new(EntityKind::Association, "Holder"))
        .unwrap();
    let reference = env.add_property(
        holder,
        EntityProperty::new(PropertyKind::DomainEntity, "Bar").with_referenced_namespace("ExtensionA"),
    );

    run(&mut env);

    assert_ne!(a, b);
    assert_eq!(env.property(reference).referenced_entity, EntityRef::NoEntity);
    assert_eq!(env.validation_failures.len(), 1);
    assert_eq!(env.validation_failures[0].validator_name, "ReferencedEntityMustExist");
    assert_eq!(env.validation_failures[0].category, FailureCategory::Error);
}

#[test]
fn test_rerunning_pipeline_is_idempotent() {
    let mut env = ModelEnvironment::new();
    let core = env.add_namespace("EdFi", false, &[]);
    let school = env
        .add_entity(core, TopLevelEntity::new(EntityKind::DomainEntity, "School"))
        .unwrap();
    env.add_property(school, EntityProperty::new(PropertyKind::Integer, "SchoolId").identity());
    let session = env
        .add_entity(core, TopLevelEntity::new(EntityKind::DomainEntity, "Session"))
        .unwrap();
    let session_school = env.add_property(
        session,
        EntityProperty::new(PropertyKind::DomainEntity, "School").identity(),
    );
    let section = env
        .add_entity(core, TopLevelEntity::new(EntityKind::DomainEntity, "Section"))
        .unwrap();
    let section_session = env.add_property(
        section,
        EntityProperty::new(PropertyKind::DomainEntity, "Session")
            .identity()
            .with_merge_directive(MergeDirective::new("Session.School", "School")),
    );
    let section_school = env.add_property(
        section,
        EntityProperty::new(PropertyKind::DomainEntity, "School").identity(),
    );
    let subclass = env
        .add_entity(
            core,
            TopLevelEntity::new(EntityKind::DomainEntitySubclass, "CharterSchool").with_base("School"),
        )
        .unwrap();

    let pipeline = Pipeline::new().with_plugin(unified_plugin()).without_validation();
    pipeline.run(&mut env).unwrap();
    pipeline.run(&mut env).unwrap();

    assert_eq!(env.entity(school).subclassed_by, vec![subclass]);
    assert_eq!(env.entity(school).in_references, vec![session_school, section_school]);

    let link = MergeLink {
        owner: section_session,
        directive: 0,
    };
    assert_eq!(env.property(session_school).merge_sourced_by, vec![link]);
    assert_eq!(env.property(section_school).merge_targeted_by, vec![link]);

    // Section reaches School directly and through Session.
    assert_eq!(
        env.entity(section).out_reference_paths,
        vec![vec![section_session, session_school], vec![section_school]]
    );
}

#[test]
fn test_model_document_through_pipeline() {
    let text = r#"{
        "namespaces": [
            {
                "name": "EdFi",
                "entities": [
                    { "kind": "descriptor", "name": "GradeLevel", "documentation": "Grade level." },
                    { "kind": "domainEntity", "name": "Student",
                      "properties": [
                        { "kind": "integer", "name": "StudentId", "identity": true },
                        { "kind": "descriptor", "name": "GradeLevel", "inheritDocumentation": true },
                        { "kind": "descriptor", "name": "Missing" }
                      ] },
                    { "kind": "domain", "name": "Enrollment",
                      "items": [ { "kind": "domainEntity", "name": "Student" } ] }
                ]
            }
        ]
    }"#;

    let mut env = ModelDocument::from_json(text).unwrap().load().unwrap();
    run(&mut env);

    let student = env.find_entity("EdFi", EntityKind::DomainEntity, "Student").unwrap();
    let grade = env.property_by_full_name(student, "GradeLevel").unwrap();
    assert_eq!(env.property(grade).documentation, "Grade level.");

    let domain = env.find_entity("EdFi", EntityKind::Domain, "Enrollment").unwrap();
    assert_eq!(env.entity(domain).items[0].referenced_entity, EntityRef::Entity(student));

    assert!(env.has_errors());
    let messages: Vec<_> = env.validation_failures.iter().map(|f| f.validator_name.as_str()).collect();
    assert_eq!(messages, vec!["ReferencedEntityMustExist"]);
}
