use wrapgen_core::ast::{
    AstContext, EnumDecl, FieldDecl, MethodDecl, OperatorKind, QualType, RecordDecl,
};

use crate::annotations::{AnnotationSet, strings};
use crate::model::FoundMethod;
use crate::test_utils::{analyzer, analyzer_with_config, insert_and_parse};

#[test]
fn members_include_the_whole_inheritance_chain() {
    let mut ctx = AstContext::new();
    let base = ctx.add_record(
        RecordDecl::class("Base").with_field(FieldDecl::new("x", QualType::builtin("int"))),
    );
    let derived = ctx.add_record(
        RecordDecl::class("Derived")
            .with_base(base)
            .with_field(FieldDecl::new("y", QualType::builtin("double"))),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, derived);

    let class = analyzer.class(id);
    let names: Vec<&str> = class.members.iter().map(|m| m.js_name.as_str()).collect();
    assert_eq!(names, ["y", "x"]);

    let base_id = analyzer.get_by_record(base).unwrap();
    assert_eq!(class.members[0].declared_in, id);
    assert_eq!(class.members[1].declared_in, base_id);
}

#[test]
fn access_and_annotations_filter_fields() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_field(FieldDecl::new("visible", QualType::builtin("int")))
            .with_field(FieldDecl::new("hidden", QualType::builtin("int")).private_())
            .with_field(
                FieldDecl::new("skipped", QualType::builtin("int"))
                    .with_attribute(strings::BINDINGS_NONE),
            )
            .with_field(
                FieldDecl::new("annotated_private", QualType::builtin("int"))
                    .private_()
                    .with_attribute(strings::READONLY),
            ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let class = analyzer.class(id);
    let names: Vec<&str> = class.members.iter().map(|m| m.js_name.as_str()).collect();
    assert_eq!(names, ["visible"]);
    // the annotated private field is an error, the plain one is not
    assert_eq!(class.errors.borrow().error_count(), 1);
}

#[test]
fn readonly_wrapping_through_type_annotation_and_typedef() {
    let mut ctx = AstContext::new();
    let locked = ctx.add_record(RecordDecl::class("Locked"));
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_field(FieldDecl::new("plain", QualType::builtin("int")))
            .with_field(FieldDecl::new(
                "const_typed",
                QualType::builtin("int").as_const(),
            ))
            .with_field(
                FieldDecl::new("annotated", QualType::builtin("int"))
                    .with_attribute(strings::READONLY),
            )
            .with_field(FieldDecl::new("via_typedef", QualType::record(locked))),
    );

    let mut analyzer = analyzer(&ctx);
    analyzer.annotations.merge_into_record(
        locked,
        &AnnotationSet::from_iter([strings::READONLY.to_string()]),
    );
    let id = insert_and_parse(&mut analyzer, record);

    let class = analyzer.class(id);
    let consts: Vec<bool> = class.members.iter().map(|m| m.is_const).collect();
    assert_eq!(consts, [false, true, true, true]);
}

#[test]
fn member_js_name_overrides() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_field(
                FieldDecl::new("renamed_by_config", QualType::builtin("int")),
            )
            .with_field(
                FieldDecl::new("renamed_by_annotation", QualType::builtin("int"))
                    .with_attribute(format!("{}nice", strings::USE_NAME_PREFIX)),
            ),
    );

    let mut analyzer = analyzer_with_config(
        &ctx,
        r#"{"classes": {"Foo": {"members": {"Foo::renamed_by_config": {"name": "fromConfig"}}}}}"#,
    );
    let id = insert_and_parse(&mut analyzer, record);

    let names: Vec<&str> = analyzer
        .class(id)
        .members
        .iter()
        .map(|m| m.js_name.as_str())
        .collect();
    assert_eq!(names, ["fromConfig", "nice"]);
}

#[test]
fn enums_parse_with_their_elements() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo").with_enum(
            EnumDecl::new("Color")
                .with_enumerator("Red", 0)
                .with_enumerator("Green", 1)
                .with_enumerator("Blue", 4),
        ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let enums = &analyzer.class(id).enums;
    assert_eq!(enums.len(), 1);
    assert_eq!(enums[0].name, "Color");
    let elements: Vec<(&str, i64)> = enums[0]
        .elements
        .iter()
        .map(|e| (e.name.as_str(), e.value))
        .collect();
    assert_eq!(elements, [("Red", 0), ("Green", 1), ("Blue", 4)]);
}

fn pimpl_fixture() -> (AstContext, wrapgen_core::ast::RecordId, wrapgen_core::ast::RecordId) {
    let mut ctx = AstContext::new();
    let impl_record = ctx.add_record(
        RecordDecl::struct_("P::Impl")
            .with_include("\"p_impl.h\"")
            .with_field(FieldDecl::new("x", QualType::builtin("int"))),
    );
    let outer = ctx.add_record(
        RecordDecl::class("P")
            .with_include("\"p.h\"")
            .with_attribute(format!("{}impl", strings::USE_PIMPL_PREFIX))
            .with_field(FieldDecl::new("impl", QualType::record(impl_record).pointer()).private_()),
    );
    (ctx, outer, impl_record)
}

#[test]
fn pimpl_members_are_hoisted_with_accessed_through() {
    let (ctx, outer, impl_record) = pimpl_fixture();

    let mut analyzer = analyzer(&ctx);
    let impl_id = analyzer
        .get_or_insert(impl_record, FoundMethod::Unspecified)
        .unwrap();
    let id = insert_and_parse(&mut analyzer, outer);

    let class = analyzer.class(id);
    assert_eq!(class.pimpl_members.len(), 1);
    assert_eq!(class.pimpl_members[0].long_name, "P::impl");

    // x is exposed as if declared directly on P
    let hoisted: Vec<&str> = class.members.iter().map(|m| m.js_name.as_str()).collect();
    assert_eq!(hoisted, ["x"]);
    assert_eq!(class.members[0].accessed_through, Some(0));
    assert_eq!(class.members[0].class, id);

    // the target is demoted to a pimpl-only class and claimed by the field
    assert_eq!(analyzer.class(impl_id).found_method, FoundMethod::Pimpl);
    assert!(!analyzer.should_be_wrapped(impl_id));
    assert_eq!(
        analyzer.class(impl_id).pimpl_target_of.as_deref(),
        Some("P::impl")
    );

    // and Impl's header travels with P
    assert!(class.include_files.contains("\"p_impl.h\""));
    assert!(!class.has_errors());
}

#[test]
fn pimpl_through_smart_pointer_dereferences_operator_star() {
    let mut ctx = AstContext::new();
    let impl_record = ctx.add_record(
        RecordDecl::struct_("Q::Impl").with_field(FieldDecl::new("y", QualType::builtin("int"))),
    );
    let smart = ctx.add_record(
        RecordDecl::class("std::unique_ptr<Q::Impl>").with_method(
            MethodDecl::new("operator*", QualType::record(impl_record).lvalue_ref())
                .operator(OperatorKind::Star),
        ),
    );
    let outer = ctx.add_record(
        RecordDecl::class("Q")
            .with_attribute(format!("{}impl", strings::USE_PIMPL_PREFIX))
            .with_field(FieldDecl::new("impl", QualType::record(smart)).private_()),
    );

    let mut analyzer = analyzer(&ctx);
    analyzer
        .get_or_insert(impl_record, FoundMethod::Unspecified)
        .unwrap();
    let id = insert_and_parse(&mut analyzer, outer);

    let class = analyzer.class(id);
    assert_eq!(class.pimpl_members.len(), 1);
    let hoisted: Vec<&str> = class.members.iter().map(|m| m.js_name.as_str()).collect();
    assert_eq!(hoisted, ["y"]);
}

#[test]
fn unresolved_pimpl_target_is_an_error() {
    let (ctx, outer, _impl_record) = pimpl_fixture();

    // Impl was never seen by the model
    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, outer);

    assert!(analyzer.class(id).has_errors());
    assert!(
        analyzer
            .class(id)
            .errors
            .borrow()
            .errors()
            .any(|e| e.message.contains("not found"))
    );
}

#[test]
fn declared_pimpl_without_matching_field_is_an_error() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("P").with_attribute(format!("{}missing", strings::USE_PIMPL_PREFIX)),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    assert!(
        analyzer
            .class(id)
            .errors
            .borrow()
            .errors()
            .any(|e| e.message.contains("Mismatched number of pimpl members"))
    );
}

#[test]
fn two_pimpls_of_the_same_type_are_an_error() {
    let mut ctx = AstContext::new();
    let impl_record = ctx.add_record(
        RecordDecl::struct_("P::Impl").with_field(FieldDecl::new("x", QualType::builtin("int"))),
    );
    let outer = ctx.add_record(
        RecordDecl::class("P")
            .with_attribute(format!("{}first", strings::USE_PIMPL_PREFIX))
            .with_attribute(format!("{}second", strings::USE_PIMPL_PREFIX))
            .with_field(
                FieldDecl::new("first", QualType::record(impl_record).pointer()).private_(),
            )
            .with_field(
                FieldDecl::new("second", QualType::record(impl_record).pointer()).private_(),
            ),
    );

    let mut analyzer = analyzer(&ctx);
    analyzer
        .get_or_insert(impl_record, FoundMethod::Unspecified)
        .unwrap();
    let id = insert_and_parse(&mut analyzer, outer);

    assert!(
        analyzer
            .class(id)
            .errors
            .borrow()
            .errors()
            .any(|e| e.message.contains("same underlying type"))
    );
}
