use wrapgen_core::ast::{
    AstContext, Comment, FunctionTemplateDecl, MethodDecl, OperatorKind, ParamDecl, QualType,
    RecordDecl,
};

use crate::annotations::strings;
use crate::model::FunctionKind;
use crate::test_utils::{analyzer, analyzer_with_config, insert_and_parse};

#[test]
fn parses_public_methods_with_defaults() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo").with_method(
            MethodDecl::new("bar", QualType::builtin("int"))
                .with_param(ParamDecl::new("a", QualType::builtin("int")).with_default("5")),
        ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let class = analyzer.class(id);
    assert_eq!(class.member_functions.len(), 1);
    let bar = &class.member_functions[0];
    assert_eq!(bar.kind, FunctionKind::Member);
    assert_eq!(bar.js_name, "bar");
    assert_eq!(bar.name, "Foo::bar");
    assert_eq!(bar.parameters[0].default_value, "5");
    assert_eq!(bar.signature_string(&ctx), "int Foo::bar(int)");
    assert_eq!(
        bar.default_argument_tuple_string(&ctx),
        "std::tuple<int>(5)"
    );
}

#[test]
fn default_argument_normalization() {
    let mut ctx = AstContext::new();
    let baz = ctx.add_record(RecordDecl::class("Baz"));
    let record = ctx.add_record(
        RecordDecl::class("Foo").with_method(
            MethodDecl::new("f", QualType::builtin("void"))
                .with_param(ParamDecl::new("a", QualType::builtin("int")).with_default("= 5"))
                .with_param(
                    ParamDecl::new("b", QualType::record(baz).as_const().lvalue_ref())
                        .with_default("{}"),
                ),
        ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let f = &analyzer.class(id).member_functions[0];
    // the stray `=` some frontends include is stripped
    assert_eq!(f.parameters[0].default_value, "5");
    // `{}` expands to the plain non-const type
    assert_eq!(f.parameters[1].default_value, "Baz{}");
}

#[test]
fn member_signature_carries_qualifiers() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_method(MethodDecl::new("c", QualType::builtin("void")).const_())
            .with_method(
                MethodDecl::new("r", QualType::builtin("void"))
                    .const_()
                    .rvalue_qualified(),
            ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let class = analyzer.class(id);
    assert_eq!(class.member_functions[0].signature_string(&ctx), "void Foo::c() const");
    assert_eq!(
        class.member_functions[1].signature_string(&ctx),
        "void Foo::r() const &&"
    );
}

#[test]
fn non_public_and_special_members_are_filtered() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_method(MethodDecl::new("hidden", QualType::builtin("void")).private_())
            .with_method(MethodDecl::new("shielded", QualType::builtin("void")).protected_())
            .with_method(MethodDecl::destructor("~Foo"))
            .with_method(MethodDecl::new("operator int", QualType::builtin("int")).conversion())
            .with_method(
                MethodDecl::new("operator*", QualType::builtin("int")).operator(OperatorKind::Star),
            )
            .with_method(
                MethodDecl::new("operator()", QualType::builtin("int"))
                    .operator(OperatorKind::Call),
            )
            .with_method(MethodDecl::new("visible", QualType::builtin("void"))),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let class = analyzer.class(id);
    let names: Vec<&str> = class
        .member_functions
        .iter()
        .map(|f| f.js_name.as_str())
        .collect();
    assert_eq!(names, ["visible"]);
    // operator() is kept, as the callable overload
    let call = class.call_operator.as_ref().expect("call operator parsed");
    assert!(call.is_callable_overload());
    assert!(!class.has_errors());
}

#[test]
fn annotations_on_non_public_methods_are_errors() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo").with_method(
            MethodDecl::new("hidden", QualType::builtin("void"))
                .private_()
                .with_attribute(format!("{}renamed", strings::USE_NAME_PREFIX)),
        ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    assert!(analyzer.class(id).member_functions.is_empty());
    assert!(analyzer.class(id).has_errors());
}

#[test]
fn config_skip_overrides_annotations() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_method(
                MethodDecl::new("skipped", QualType::builtin("void"))
                    .with_attribute("irrelevant"),
            )
            .with_method(
                MethodDecl::new("kept", QualType::builtin("void"))
                    .with_attribute(strings::BINDINGS_NONE),
            )
            .with_method(
                MethodDecl::new("dropped", QualType::builtin("void"))
                    .with_attribute(strings::BINDINGS_NONE),
            ),
    );

    let mut analyzer = analyzer_with_config(
        &ctx,
        r#"{
            "classes": {
                "Foo": {
                    "members": {
                        "void Foo::skipped()": { "skip": true },
                        "void Foo::kept()": { "skip": false }
                    }
                }
            }
        }"#,
    );
    let id = insert_and_parse(&mut analyzer, record);

    let names: Vec<&str> = analyzer
        .class(id)
        .member_functions
        .iter()
        .map(|f| f.js_name.as_str())
        .collect();
    assert_eq!(names, ["kept"]);
}

#[test]
fn function_templates_instantiate_at_their_defaults() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_function_template(
                FunctionTemplateDecl::new(
                    MethodDecl::new("f", QualType::template_param("X"))
                        .with_param(ParamDecl::new("y", QualType::template_param("Y"))),
                )
                .with_type_param("X", Some(QualType::builtin("int")))
                .with_type_param("Y", Some(QualType::builtin("char"))),
            )
            .with_function_template(
                FunctionTemplateDecl::new(
                    MethodDecl::new("g", QualType::template_param("Z"))
                        .with_param(ParamDecl::new("z", QualType::template_param("Z"))),
                )
                .with_type_param("Z", None),
            ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let class = analyzer.class(id);
    assert_eq!(class.member_functions.len(), 1);
    let f = &class.member_functions[0];
    assert_eq!(f.return_type.name(&ctx), "int");
    assert_eq!(f.parameters[0].type_info.name(&ctx), "char");
    assert_eq!(f.signature_string(&ctx), "int Foo::f(char)");
}

#[test]
fn static_method_name_resolution() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_method(MethodDecl::new("id", QualType::builtin("int")).static_())
            .with_method(MethodDecl::new("name", QualType::builtin("int")).static_()),
    );

    let mut analyzer = analyzer_with_config(
        &ctx,
        r#"{
            "bulk_renames": {
                "static_functions": [
                    { "regex": "^int Foo::id\\(\\)$", "replace": "identifier" }
                ]
            }
        }"#,
    );
    let id = insert_and_parse(&mut analyzer, record);

    let class = analyzer.class(id);
    let names: Vec<&str> = class
        .static_functions
        .iter()
        .map(|f| f.js_name.as_str())
        .collect();
    // bulk rename applies first; the built-in `name` rename catches the rest
    assert_eq!(names, ["identifier", "get_name"]);
    assert!(!class.has_errors());
}

#[test]
fn reserved_static_names_are_errors() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("X")
            .with_method(MethodDecl::new("length", QualType::builtin("int")).static_())
            .with_method(MethodDecl::new("arity", QualType::builtin("void")).static_()),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let errors = analyzer.class(id).errors.borrow().error_count();
    assert_eq!(errors, 2);
    assert!(
        analyzer
            .class(id)
            .errors
            .borrow()
            .errors()
            .all(|e| e.message.contains("invalid name"))
    );
}

#[test]
fn extension_methods_are_recorded_not_wrapped() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_method(
                MethodDecl::new("extend", QualType::builtin("void"))
                    .static_()
                    .with_attribute(strings::EXTEND_WRAPPER),
            )
            .with_method(
                MethodDecl::new("customize", QualType::builtin("void"))
                    .static_()
                    .with_attribute(strings::CUSTOM_EXTENSION),
            )
            .with_method(
                MethodDecl::new("broken", QualType::builtin("void"))
                    .with_attribute(strings::EXTEND_WRAPPER),
            ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let class = analyzer.class(id);
    assert!(class.static_functions.is_empty());
    assert!(class.wrapper_extension_methods.contains("Foo::extend"));
    assert!(class.wrapper_custom_extensions.contains(
        "class_wrapper.add_new_constructor_function_template_callback(&Foo::customize);"
    ));
    // EXTEND_WRAPPER on a non-static method is an error
    assert!(class.has_errors());
}

#[test]
fn constructor_filtering_and_naming() {
    let mut ctx = AstContext::new();
    let foo = QualType::builtin("int");
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_method(MethodDecl::constructor("Foo"))
            .with_method(MethodDecl::copy_constructor("Foo"))
            .with_method(MethodDecl::move_constructor("Foo"))
            .with_method(MethodDecl::constructor("Foo").deleted())
            .with_method(
                MethodDecl::constructor("Foo")
                    .with_param(ParamDecl::new("a", foo))
                    .with_attribute(format!("{}MakeFoo", strings::CONSTRUCTOR_PREFIX)),
            ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let class = analyzer.class(id);
    assert_eq!(class.constructors.len(), 2);
    assert_eq!(class.constructors[0].js_name, "Foo");
    assert_eq!(class.constructors[1].js_name, "MakeFoo");
    assert_eq!(analyzer.constructor_name_count(), 2);
}

#[test]
fn abstract_classes_get_no_constructors() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Shape")
            .abstract_()
            .with_method(MethodDecl::constructor("Shape"))
            .with_method(MethodDecl::new("area", QualType::builtin("double")).pure_virtual()),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    assert!(analyzer.class(id).constructors.is_empty());
    assert_eq!(analyzer.class(id).member_functions.len(), 1);
}

#[test]
fn do_not_wrap_constructors_annotation() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo")
            .with_attribute(strings::DO_NOT_WRAP_CONSTRUCTORS)
            .with_method(MethodDecl::constructor("Foo")),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    assert!(analyzer.class(id).constructors.is_empty());
}

#[test]
fn duplicate_constructor_names_across_classes_are_errors() {
    let mut ctx = AstContext::new();
    let first = ctx.add_record(
        RecordDecl::class("First").with_method(
            MethodDecl::constructor("First")
                .with_attribute(format!("{}Shared", strings::CONSTRUCTOR_PREFIX)),
        ),
    );
    let second = ctx.add_record(
        RecordDecl::class("Second").with_method(
            MethodDecl::constructor("Second")
                .with_attribute(format!("{}Shared", strings::CONSTRUCTOR_PREFIX)),
        ),
    );

    let mut analyzer = analyzer(&ctx);
    insert_and_parse(&mut analyzer, first);
    assert!(!analyzer.log.has_errors());
    insert_and_parse(&mut analyzer, second);

    assert!(analyzer.log.has_errors());
    assert!(
        analyzer
            .log
            .diagnostics()
            .errors()
            .any(|e| e.message.contains("duplicate JS constructor"))
    );
    assert_eq!(analyzer.constructor_name_count(), 1);
}

#[test]
fn doxygen_comments_attach_to_parameters_and_return() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo").with_method(
            MethodDecl::new("bar", QualType::builtin("int"))
                .with_param(ParamDecl::new("a", QualType::builtin("int")))
                .with_comment(
                    Comment::default()
                        .with_paragraph("Does interesting things.")
                        .with_param("a", "  the input value\n * continued  ")
                        .with_param("zzz", "matches nothing")
                        .with_return("the computed result"),
                ),
        ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let bar = &analyzer.class(id).member_functions[0];
    assert_eq!(bar.comment, "Does interesting things.");
    assert_eq!(bar.parameters[0].description, "the input value continued");
    assert_eq!(bar.return_type_comment, "the computed result");
    // the unmatched @param name is a warning, not an error
    assert!(!analyzer.class(id).has_errors());
    assert!(
        analyzer
            .log
            .diagnostics()
            .warnings()
            .any(|w| w.message.contains("zzz"))
    );
}

#[test]
fn unnamed_parameters_get_placeholder_names() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Foo").with_method(
            MethodDecl::new("f", QualType::builtin("void"))
                .with_param(ParamDecl::unnamed(QualType::builtin("int"))),
        ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    let f = &analyzer.class(id).member_functions[0];
    assert_eq!(f.parameters[0].name, "unspecified_position_0");
    assert!(
        analyzer
            .log
            .diagnostics()
            .warnings()
            .any(|w| w.message.contains("no variable name"))
    );
}

#[test]
fn using_declarations_resolve_to_their_target() {
    let mut ctx = AstContext::new();
    let record = ctx.add_record(
        RecordDecl::class("Derived").with_using(
            MethodDecl::new("inherited", QualType::builtin("void")),
        ),
    );

    let mut analyzer = analyzer(&ctx);
    let id = insert_and_parse(&mut analyzer, record);

    assert_eq!(analyzer.class(id).member_functions.len(), 1);
    assert_eq!(analyzer.class(id).member_functions[0].js_name, "inherited");
}
