//! Shared fixtures for model, partition and output tests.

use wrapgen_core::ast::{AstContext, MethodDecl, ParamDecl, QualType, RecordDecl, RecordId};

use crate::config::Config;
use crate::model::{Analyzer, ClassId, FoundMethod};

pub fn analyzer(ctx: &AstContext) -> Analyzer<'_> {
    Analyzer::new(ctx, Config::empty())
}

pub fn analyzer_with_config<'a>(ctx: &'a AstContext, config_json: &str) -> Analyzer<'a> {
    Analyzer::new(ctx, Config::from_str(config_json).expect("test config parses"))
}

/// Insert a record and parse everything on it.
pub fn insert_and_parse(analyzer: &mut Analyzer<'_>, record: RecordId) -> ClassId {
    let id = analyzer
        .get_or_insert(record, FoundMethod::Annotation)
        .expect("insert succeeds");
    analyzer.parse_all_methods(id);
    analyzer.parse_members(id);
    analyzer.parse_enums(id);
    id
}

/// `class Foo { Foo(); int bar(int a = 5); };` with its own header.
pub fn simple_class() -> RecordDecl {
    RecordDecl::class("Foo")
        .with_include("\"foo.h\"")
        .with_method(MethodDecl::constructor("Foo"))
        .with_method(
            MethodDecl::new("bar", QualType::builtin("int"))
                .with_param(ParamDecl::new("a", QualType::builtin("int")).with_default("5")),
        )
}

/// The host marker base record.
pub fn marker_base(ctx: &mut AstContext) -> RecordId {
    ctx.add_record(RecordDecl::class("v8toolkit::WrappedClassBase"))
}
