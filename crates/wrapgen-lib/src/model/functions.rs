//! Parsed class functions: members, statics, constructors and the call
//! operator, all sharing one [`ClassFunction`] payload tagged by
//! [`FunctionKind`].

use std::rc::Rc;
use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

use crate::annotations::{AnnotationSet, strings};
use crate::ast::{AstContext, RecordId};
use crate::host;
use crate::inspect::{TemplateMap, TypeInfo, substitute_type};
use crate::model::{Analyzer, ClassId, ExportType, FoundMethod, get_export_type};
use wrapgen_core::ast::{
    Access, Comment, CommentChild, MemberDecl, MethodDecl, MethodKind, MethodRef, OperatorKind,
    RefQualifier,
};

/// Which flavor of class function this is; dispatch is a match on this tag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FunctionKind {
    Constructor,
    Member,
    Static,
    CallOperator,
}

/// One parameter of a parsed function.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub position: usize,
    /// Source name, or `unspecified_position_N` when unnamed.
    pub name: String,
    pub type_info: TypeInfo,
    /// Textual default-value expression; empty when there is none.
    pub default_value: String,
    /// Doxygen `@param` description paragraph.
    pub description: String,
}

/// A parsed method: the common payload of all four function kinds.
#[derive(Debug, Clone)]
pub struct ClassFunction {
    pub class: ClassId,
    pub kind: FunctionKind,
    pub decl: MethodRef,
    pub template_map: Rc<TemplateMap>,
    pub return_type: TypeInfo,
    pub parameters: Vec<Parameter>,
    /// Fully qualified C++ name.
    pub name: String,
    pub js_name: String,
    pub comment: String,
    pub return_type_comment: String,
    pub annotations: AnnotationSet,
    pub is_virtual: bool,
    pub is_virtual_final: bool,
    pub is_virtual_override: bool,
    pub is_static: bool,
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_lvalue_qualified: bool,
    pub is_rvalue_qualified: bool,
}

static TRAILING_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*&{1,2}\s*$").expect("static regex"));

static LEADING_CONST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*const\s*").expect("static regex"));

static LEADING_EQUALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*=\s*").expect("static regex"));

static STD_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:class|struct)?\s*std::function").expect("static regex"));

pub(crate) fn remove_reference_from_type_string(type_string: &str) -> String {
    TRAILING_REFERENCE.replace(type_string, "").into_owned()
}

pub(crate) fn remove_local_const_from_type_string(type_string: &str) -> String {
    LEADING_CONST.replace(type_string, "").into_owned()
}

/// Trim a doxygen comment slice: per-line leading/trailing whitespace and
/// decoration stars removed, lines joined with single spaces.
pub(crate) fn trim_doxygen_comment_whitespace(comment: &str) -> String {
    let mut parts = Vec::new();
    for line in comment.lines() {
        let trimmed = line.trim().trim_matches('*').trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    parts.join(" ")
}

/// Signature string used as the config lookup key for a method.
pub fn signature_of(ctx: &AstContext, method: &MethodDecl, map: &TemplateMap) -> String {
    let mut result = format!(
        "{} {}(",
        substitute_type(ctx, &method.return_type, map),
        method.qualified_name
    );
    let mut first = true;
    for param in &method.params {
        if !first {
            result.push(',');
        }
        first = false;
        result.push_str(&substitute_type(ctx, &param.ty, map));
    }
    result.push(')');

    if !method.is_static && !method.is_constructor() {
        if method.is_const {
            result.push_str(" const");
        }
        if method.is_volatile {
            result.push_str(" volatile");
        }
        match method.ref_qualifier {
            RefQualifier::LValue => result.push_str(" &"),
            RefQualifier::RValue => result.push_str(" &&"),
            RefQualifier::None => {}
        }
    }
    result
}

impl ClassFunction {
    pub fn is_callable_overload(&self) -> bool {
        self.kind == FunctionKind::CallOperator
    }

    pub fn signature_string(&self, ctx: &AstContext) -> String {
        signature_of(ctx, ctx.method(self.decl), &self.template_map)
    }

    /// Comma-separated canonical parameter type names.
    pub fn parameter_types_string(&self, ctx: &AstContext) -> String {
        self.parameters
            .iter()
            .map(|p| p.type_info.name(ctx))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn return_and_parameter_types_string(&self, ctx: &AstContext) -> String {
        let mut result = self.return_type.name(ctx);
        if !self.parameters.is_empty() {
            result.push_str(", ");
            result.push_str(&self.parameter_types_string(ctx));
        }
        result
    }

    pub fn return_and_class_and_parameter_types_string(
        &self,
        ctx: &AstContext,
        class_name: &str,
    ) -> String {
        let mut result = format!("{}, {}", self.return_type.name(ctx), class_name);
        if !self.parameters.is_empty() {
            result.push_str(", ");
            result.push_str(&self.parameter_types_string(ctx));
        }
        result
    }

    pub fn js_input_parameter_string(&self) -> String {
        self.parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `std::tuple<types...>(values...)` of the trailing defaulted
    /// parameters. A defaulted `std::function` parameter clears the whole
    /// tuple; the host runtime cannot build those defaults.
    pub fn default_argument_tuple_string(&self, ctx: &AstContext) -> String {
        let mut types: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        for param in &self.parameters {
            if STD_FUNCTION.is_match(&param.type_info.plain_type().name(ctx)) {
                types.clear();
                values.clear();
                continue;
            }
            if param.default_value.is_empty() {
                continue;
            }
            types.push(remove_local_const_from_type_string(
                &remove_reference_from_type_string(&param.type_info.name(ctx)),
            ));
            values.push(param.default_value.clone());
        }
        format!("std::tuple<{}>({})", types.join(", "), values.join(", "))
    }

    /// Root includes of every type in the signature.
    pub fn includes(&self, ctx: &AstContext) -> IndexSet<String> {
        let mut results = self.return_type.root_includes(ctx);
        for param in &self.parameters {
            results.extend(param.type_info.root_includes(ctx));
        }
        results
    }

    /// Record ids referenced by the signature's plain types.
    pub(crate) fn referenced_records(&self) -> Vec<RecordId> {
        let mut records = Vec::new();
        if let Some(record) = self.return_type.plain_type_decl() {
            records.push(record);
        }
        for param in &self.parameters {
            if let Some(record) = param.type_info.plain_type_decl() {
                records.push(record);
            }
        }
        records
    }
}

impl Analyzer<'_> {
    /// Build the shared function payload for one method declaration.
    fn build_class_function(
        &self,
        class: ClassId,
        kind: FunctionKind,
        decl: MethodRef,
        template_map: Rc<TemplateMap>,
    ) -> ClassFunction {
        let ctx = self.ctx;
        let method = ctx.method(decl);
        let annotations = AnnotationSet::from_attributes(&method.attributes);
        let class_name = self.class(class).class_name.clone();

        let mut parameters = Vec::with_capacity(method.params.len());
        for (position, param) in method.params.iter().enumerate() {
            let type_info = TypeInfo::with_map(param.ty.clone(), Rc::clone(&template_map));
            let name = if param.name.is_empty() {
                self.log.warn(format!(
                    "class {} method {} parameter index {} has no variable name",
                    class_name, method.qualified_name, position
                ));
                format!("unspecified_position_{position}")
            } else {
                param.name.clone()
            };

            // Some frontends hand back the default argument with a stray
            // leading `=`; a bare `{}` needs the type name to compile
            // outside its declaration context.
            let default_value = match &param.default_argument {
                Some(source) => {
                    let stripped = LEADING_EQUALS.replace(source, "").into_owned();
                    if stripped == "{}" {
                        format!("{}{{}}", type_info.plain_type().without_const().name(ctx))
                    } else {
                        stripped
                    }
                }
                None => String::new(),
            };

            parameters.push(Parameter {
                position,
                name,
                type_info,
                default_value,
                description: String::new(),
            });
        }

        let mut comment = String::new();
        let mut return_type_comment = String::new();
        if let Some(full_comment) = &method.comment {
            self.associate_doxygen(
                full_comment,
                &method.qualified_name,
                &mut parameters,
                &mut comment,
                &mut return_type_comment,
            );
        }

        let js_name =
            self.resolve_function_js_name(class, kind, method, &annotations, &template_map, ctx);

        ClassFunction {
            class,
            kind,
            decl,
            return_type: TypeInfo::with_map(method.return_type.clone(), Rc::clone(&template_map)),
            template_map,
            parameters,
            name: method.qualified_name.clone(),
            js_name,
            comment,
            return_type_comment,
            annotations,
            is_virtual: method.is_virtual,
            is_virtual_final: method.is_virtual_final,
            is_virtual_override: method.is_virtual_override,
            is_static: method.is_static,
            is_const: method.is_const,
            is_volatile: method.is_volatile,
            is_lvalue_qualified: method.ref_qualifier == RefQualifier::LValue,
            is_rvalue_qualified: method.ref_qualifier == RefQualifier::RValue,
        }
    }

    /// Attach doxygen block children to the function: `@param`s to matching
    /// parameters, the first `@return` to the return comment, the first
    /// free paragraph to the description.
    fn associate_doxygen(
        &self,
        full_comment: &Comment,
        method_name: &str,
        parameters: &mut [Parameter],
        comment: &mut String,
        return_type_comment: &mut String,
    ) {
        for child in &full_comment.children {
            match child {
                CommentChild::Param { name, text } => {
                    match parameters.iter_mut().find(|p| p.name == *name) {
                        Some(param) => {
                            param.description = trim_doxygen_comment_whitespace(text);
                        }
                        None => self.log.warn(format!(
                            "in {method_name}, method parameter comment name '{name}' doesn't match any parameter in the function"
                        )),
                    }
                }
                CommentChild::BlockCommand { command, text } => {
                    if command == "return" && return_type_comment.is_empty() {
                        *return_type_comment = trim_doxygen_comment_whitespace(text);
                    }
                }
                CommentChild::Paragraph(text) => {
                    if comment.is_empty() {
                        *comment = trim_doxygen_comment_whitespace(text);
                    }
                }
            }
        }
    }

    /// JavaScript-name resolution priority chains per function kind.
    fn resolve_function_js_name(
        &self,
        class: ClassId,
        kind: FunctionKind,
        method: &MethodDecl,
        annotations: &AnnotationSet,
        template_map: &TemplateMap,
        ctx: &AstContext,
    ) -> String {
        let class_name = &self.class(class).class_name;
        match kind {
            FunctionKind::Constructor => {
                if let Some(named) = annotations
                    .with_tail(strings::CONSTRUCTOR_PREFIX)
                    .into_iter()
                    .next()
                {
                    named
                } else {
                    self.js_name(class)
                }
            }
            FunctionKind::Member | FunctionKind::CallOperator => {
                let signature = signature_of(ctx, method, template_map);
                if let Some(from_config) = self.config.member_name(class_name, &signature) {
                    from_config.to_string()
                } else if let Some(annotated) = annotations
                    .with_tail(strings::USE_NAME_PREFIX)
                    .into_iter()
                    .next()
                {
                    annotated
                } else {
                    method.name.clone()
                }
            }
            FunctionKind::Static => {
                let signature = signature_of(ctx, method, template_map);
                let mut js_name = if let Some(from_config) =
                    self.config.member_name(class_name, &signature)
                {
                    from_config.to_string()
                } else if let Some(renamed) = self.config.bulk_rename("static_functions", &signature)
                {
                    renamed
                } else if let Some(annotated) = annotations
                    .with_tail(strings::USE_NAME_PREFIX)
                    .into_iter()
                    .next()
                {
                    annotated
                } else {
                    method.name.clone()
                };

                if let Some((_, renamed)) = host::STATIC_METHOD_RENAMES
                    .iter()
                    .find(|(from, _)| *from == js_name)
                {
                    js_name = (*renamed).to_string();
                }

                if host::RESERVED_STATIC_NAMES.contains(&js_name.as_str()) {
                    self.log.error(format!(
                        "Static function has invalid name: '{}' - static functions cannot be named any of: {}",
                        js_name,
                        host::RESERVED_STATIC_NAMES.join(", ")
                    ));
                }
                js_name
            }
        }
    }

    /// Parse every wrappable function of the class. Idempotent; walks the
    /// record's declarations in order so function templates with defaulted
    /// type parameters are picked up alongside plain methods.
    pub fn parse_all_methods(&mut self, id: ClassId) {
        if self.class(id).methods_parsed {
            return;
        }
        self.class_mut(id).methods_parsed = true;

        let Some(record) = self.class(id).record else {
            return;
        };
        let ctx = self.ctx;
        let log = self.log.clone();
        let _guard = log.capture(self.class(id).errors.clone());

        let class_name = self.class(id).class_name.clone();
        let class_annotations = self.class(id).annotations.clone();
        let decl = ctx.record(record);
        log::info!("parsing class methods for {class_name}");

        let mut member_functions = Vec::new();
        let mut static_functions = Vec::new();
        let mut constructors = Vec::new();
        let mut call_operator = None;
        let mut extension_methods = IndexSet::new();
        let mut custom_extensions = IndexSet::new();
        let mut added_declarations = 0u32;
        let mut referenced_records = Vec::new();

        for (index, member) in decl.decls.iter().enumerate() {
            let (method, template_map): (&MethodDecl, TemplateMap) = match member {
                MemberDecl::Method(m) => (m, TemplateMap::new()),
                // The shadow resolves to its target method and processing
                // continues as if it were declared here.
                MemberDecl::Using(using) => (&using.target, TemplateMap::new()),
                MemberDecl::FunctionTemplate(ft) => {
                    if AnnotationSet::from_attributes(&ft.method.attributes)
                        .has(strings::BINDINGS_NONE)
                    {
                        continue;
                    }
                    let mut map = TemplateMap::new();
                    let mut all_defaulted = true;
                    for type_param in &ft.type_params {
                        match &type_param.default_type {
                            Some(default) => {
                                map.insert(type_param.name.clone(), default.clone());
                            }
                            None => all_defaulted = false,
                        }
                    }
                    // Without defaults there is no type to instantiate at.
                    if !all_defaulted {
                        continue;
                    }
                    (&ft.method, map)
                }
                MemberDecl::Field(_) | MemberDecl::Enum(_) | MemberDecl::Nested(_) => continue,
            };

            let decl_ref = MethodRef { record, index };
            let template_map = Rc::new(template_map);
            let annotations = AnnotationSet::from_attributes(&method.attributes);
            let signature = signature_of(ctx, method, &template_map);

            match self.config.member_skip(&class_name, &signature) {
                Some(true) => continue,
                // skip: false overrides whatever the annotations say
                Some(false) => {}
                None => {
                    if annotations.has(strings::BINDINGS_NONE) {
                        continue;
                    }
                }
            }

            let export_type =
                get_export_type(&log, &annotations, &method.qualified_name, ExportType::All);
            if export_type != ExportType::All {
                log::info!(
                    "skipping method {} because not supposed to be exported",
                    method.qualified_name
                );
                continue;
            }

            if method.access != Access::Public {
                if !annotations.is_empty() {
                    log.error(format!(
                        "Annotation on non-public method: {}",
                        method.qualified_name
                    ));
                }
                continue;
            }

            match method.kind {
                MethodKind::Operator(OperatorKind::Call) => {}
                MethodKind::Operator(_) => continue,
                MethodKind::Destructor => continue,
                MethodKind::Conversion => continue,
                MethodKind::Normal | MethodKind::Constructor { .. } => {}
            }

            if let MethodKind::Constructor {
                is_copy,
                is_move,
                is_deleted,
            } = method.kind
            {
                if decl.is_abstract
                    || class_annotations.has(strings::DO_NOT_WRAP_CONSTRUCTORS)
                    || self.class(id).force_no_constructors
                    || is_copy
                    || is_move
                    || is_deleted
                {
                    continue;
                }
                let function = self.build_class_function(
                    id,
                    FunctionKind::Constructor,
                    decl_ref,
                    template_map,
                );
                self.record_constructor_name(&function.js_name, id);
                referenced_records.extend(function.referenced_records());
                added_declarations += 1;
                constructors.push(function);
                continue;
            }

            if annotations.has(strings::EXTEND_WRAPPER) {
                if !method.is_static {
                    log.error(format!(
                        "method {} annotated with EXTEND_WRAPPER must be static",
                        method.qualified_name
                    ));
                }
                extension_methods.insert(method.qualified_name.clone());
                continue;
            }

            if annotations.has(strings::CUSTOM_EXTENSION) {
                if !method.is_static {
                    log.error(format!(
                        "method {} annotated with CUSTOM_EXTENSION must be static",
                        method.qualified_name
                    ));
                    continue;
                }
                custom_extensions.insert(format!(
                    "class_wrapper.add_new_constructor_function_template_callback(&{});",
                    method.qualified_name
                ));
                continue;
            }

            let kind = if method.is_static {
                FunctionKind::Static
            } else if method.kind == MethodKind::Operator(OperatorKind::Call) {
                FunctionKind::CallOperator
            } else {
                FunctionKind::Member
            };
            let function = self.build_class_function(id, kind, decl_ref, template_map);
            referenced_records.extend(function.referenced_records());
            added_declarations += 1;
            match kind {
                FunctionKind::Static => static_functions.push(function),
                FunctionKind::CallOperator => call_operator = Some(function),
                _ => member_functions.push(function),
            }
        }

        self.note_used_classes(id, &referenced_records);
        let class = self.class_mut(id);
        class.member_functions = member_functions;
        class.static_functions = static_functions;
        class.constructors = constructors;
        class.call_operator = call_operator;
        class.wrapper_extension_methods = extension_methods;
        class.wrapper_custom_extensions = custom_extensions;
        class.declaration_count += added_declarations;
        log::info!("done parsing methods on {class_name}");
    }

    /// Whether the class ends up reachable only as a PIMPL target.
    pub fn is_pimpl_only(&self, id: ClassId) -> bool {
        self.class(id).found_method == FoundMethod::Pimpl
    }
}
