use std::rc::Rc;

use wrapgen_core::ast::{AstContext, MatchEvent, MethodDecl, ParamDecl, QualType, RecordDecl};

use crate::annotations::strings;
use crate::config::Config;
use crate::model::FoundMethod;
use crate::output::MemoryTarget;
use crate::{Driver, Error};

/// `class Foo : public v8toolkit::WrappedClassBase { Foo(); int bar(int = 5); };`
fn annotated_foo_context() -> AstContext {
    let mut ctx = AstContext::new();
    let marker = ctx.add_record(RecordDecl::class("v8toolkit::WrappedClassBase"));
    let foo = ctx.add_record(
        RecordDecl::class("Foo")
            .with_include("\"foo.h\"")
            .with_base(marker)
            .with_attribute(strings::BINDINGS_ALL)
            .with_method(MethodDecl::constructor("Foo"))
            .with_method(
                MethodDecl::new("bar", QualType::builtin("int"))
                    .with_param(ParamDecl::new("a", QualType::builtin("int")).with_default("5")),
            ),
    );
    ctx.push_event(MatchEvent::RecordDefinition {
        record: foo,
        inherits_marker_base: true,
    });
    ctx
}

#[test]
fn annotated_class_produces_one_binding_file() {
    let ctx = annotated_foo_context();
    let target = MemoryTarget::new();
    let driver = Driver::new(&ctx, Config::empty())
        .with_default_output_modules(Rc::clone(&target) as Rc<dyn crate::output::OutputTarget>);

    driver.run().unwrap();

    let bindings = target
        .file("v8toolkit_generated_class_wrapper_1.cpp")
        .expect("binding file written");
    assert!(bindings.contains(
        "class_wrapper.add_method(\"bar\", static_cast<int(Foo::*)(int)>(&Foo::bar), std::tuple<int>(5));"
    ));
    assert!(bindings.contains("class_wrapper.add_constructor<>(\"Foo\", isolate, std::tuple<>());"));
    assert!(target.file("v8toolkit_generated_class_wrapper_2.cpp").is_none());
    assert!(target.file("js-api.js").is_some());
}

#[test]
fn base_classes_are_pulled_in_and_emitted_first() {
    let mut ctx = AstContext::new();
    let a = ctx.add_record(RecordDecl::class("A").with_method(MethodDecl::constructor("A")));
    let b = ctx.add_record(
        RecordDecl::class("B")
            .with_base(a)
            .with_attribute(strings::BINDINGS_ALL),
    );
    ctx.push_event(MatchEvent::RecordDefinition {
        record: a,
        inherits_marker_base: false,
    });
    ctx.push_event(MatchEvent::RecordDefinition {
        record: b,
        inherits_marker_base: false,
    });

    let mut driver = Driver::new(&ctx, Config::empty());
    let events: Vec<_> = ctx.events().to_vec();
    for event in &events {
        driver.handle_match(event).unwrap();
    }
    let analyzer = driver.finish_analysis().unwrap();

    let a_id = analyzer.get_by_record(a).unwrap();
    let b_id = analyzer.get_by_record(b).unwrap();
    assert_eq!(analyzer.class(a_id).found_method, FoundMethod::BaseClass);
    assert!(analyzer.class(a_id).force_no_constructors);
    assert!(analyzer.should_be_wrapped(a_id));
    // A lost its constructors to the promotion
    assert!(analyzer.class(a_id).constructors.is_empty());

    let files = crate::partition::partition(&analyzer, 0);
    assert_eq!(files[0].classes, vec![a_id, b_id]);
}

#[test]
fn std_and_internal_records_are_ignored() {
    let mut ctx = AstContext::new();
    let std_record = ctx.add_record(RecordDecl::class("std::vector<int>"));
    let internal = ctx.add_record(RecordDecl::class("__cxxabi_thing"));
    ctx.push_event(MatchEvent::RecordDefinition {
        record: std_record,
        inherits_marker_base: false,
    });
    ctx.push_event(MatchEvent::RecordDefinition {
        record: internal,
        inherits_marker_base: false,
    });

    let mut driver = Driver::new(&ctx, Config::empty());
    let events: Vec<_> = ctx.events().to_vec();
    for event in &events {
        driver.handle_match(event).unwrap();
    }
    let analyzer = driver.finish_analysis().unwrap();

    assert!(analyzer.is_empty());
}

#[test]
fn typedef_annotations_and_aliases_reach_the_record() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("CppFactory<Thing>").with_attribute(strings::BINDINGS_ALL),
    );
    ctx.push_event(MatchEvent::Typedef {
        name: "ThingFactory".to_string(),
        underlying_record: Some(record),
        annotations: vec![strings::NAME_ALIAS.to_string(), "EXTRA".to_string()],
    });
    ctx.push_event(MatchEvent::RecordDefinition {
        record,
        inherits_marker_base: false,
    });

    let mut driver = Driver::new(&ctx, Config::empty());
    let events: Vec<_> = ctx.events().to_vec();
    for event in &events {
        driver.handle_match(event).unwrap();
    }
    let analyzer = driver.finish_analysis().unwrap();

    let id = analyzer.get_by_record(record).unwrap();
    // the typedef gave the specialization a legal name and its annotations
    assert_eq!(analyzer.js_name(id), "ThingFactory");
    assert!(analyzer.class(id).annotations.has("EXTRA"));
}

#[test]
fn template_forward_declaration_annotations_cover_specializations() {
    let mut ctx = AstContext::new();
    let template = ctx.add_template(wrapgen_core::ast::ClassTemplateDecl::new("Holder"));
    let forward = ctx.add_record(
        RecordDecl::class("Holder")
            .dependent()
            .forward_declaration()
            .with_attribute(strings::BINDINGS_ALL),
    );
    let spec = ctx.add_record(RecordDecl::class("Holder<int>").specialization_of(template));
    ctx.push_event(MatchEvent::AnnotatedForwardDeclaration {
        record: forward,
        described_template: Some(template),
    });

    let mut driver = Driver::new(&ctx, Config::empty());
    let events: Vec<_> = ctx.events().to_vec();
    for event in &events {
        driver.handle_match(event).unwrap();
    }

    let merged = driver.analyzer.annotations.annotations_of(&ctx, spec);
    assert!(merged.has(strings::BINDINGS_ALL));
}

#[test]
fn reserved_static_names_fail_the_run() {
    let mut ctx = AstContext::new();
    let marker = ctx.add_record(RecordDecl::class("v8toolkit::WrappedClassBase"));
    let record = ctx.add_record(
        RecordDecl::class("X")
            .with_base(marker)
            .with_method(MethodDecl::new("length", QualType::builtin("int")).static_())
            .with_method(MethodDecl::new("arity", QualType::builtin("void")).static_()),
    );
    ctx.push_event(MatchEvent::RecordDefinition {
        record,
        inherits_marker_base: true,
    });

    let target = MemoryTarget::new();
    let driver = Driver::new(&ctx, Config::empty())
        .with_default_output_modules(Rc::clone(&target) as Rc<dyn crate::output::OutputTarget>);

    match driver.run() {
        Err(Error::AnalysisFailed(diagnostics)) => {
            assert_eq!(diagnostics.error_count(), 2);
        }
        other => panic!("expected analysis failure, got {other:?}"),
    }
    // nothing was written
    assert!(target.file_names().is_empty());
}

#[test]
fn multiple_inheritance_fails_the_run() {
    let mut ctx = AstContext::new();
    let a = ctx.add_record(RecordDecl::class("A"));
    let b = ctx.add_record(RecordDecl::class("B"));
    let d = ctx.add_record(
        RecordDecl::class("D")
            .with_base(a)
            .with_base(b)
            .with_attribute(strings::BINDINGS_ALL),
    );
    ctx.push_event(MatchEvent::RecordDefinition {
        record: d,
        inherits_marker_base: false,
    });

    let target = MemoryTarget::new();
    let driver = Driver::new(&ctx, Config::empty())
        .with_default_output_modules(Rc::clone(&target) as Rc<dyn crate::output::OutputTarget>);

    assert!(matches!(driver.run(), Err(Error::AnalysisFailed(_))));
}

#[test]
fn config_renames_flow_through_every_artifact() {
    let ctx = annotated_foo_context();
    let config = Config::from_str(r#"{"classes": {"Foo": {"name": "Bar"}}}"#).unwrap();
    let target = MemoryTarget::new();
    let driver = Driver::new(&ctx, config)
        .with_default_output_modules(Rc::clone(&target) as Rc<dyn crate::output::OutputTarget>);

    driver.run().unwrap();

    let bindings = target
        .file("v8toolkit_generated_class_wrapper_1.cpp")
        .unwrap();
    assert!(bindings.contains("class_wrapper.set_class_name(\"Bar\");"));
    assert!(bindings.contains("class_wrapper.add_constructor<>(\"Bar\", isolate, std::tuple<>());"));

    let stub = target.file("js-api.js").unwrap();
    assert!(stub.contains("class Bar"));
    assert!(!stub.contains("class Foo"));
}
