//! Type inspection: canonical stringification, template-parameter
//! substitution, plain-type computation, JSDoc conversion, and root-include
//! lookup.
//!
//! A [`TypeInfo`] is an immutable value computed per use site: the frontend
//! type handle plus the template-parameter map in effect where the type was
//! written. The substituted type may not exist as a frontend type object,
//! so the substituted spelling is only available as a string; the *plain*
//! type (references and pointers stripped) is always available structurally.

mod jsdoc;


use std::rc::Rc;
use std::sync::LazyLock;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::ast::{AstContext, QualType, RecordId, TemplateArg};
use wrapgen_core::ast::{MethodKind, OperatorKind, Type};

pub use jsdoc::JsdocRules;

/// Template parameter name -> the type substituted for it.
pub type TemplateMap = IndexMap<String, QualType>;

/// Implementation-specific inline namespace spellings are rewritten to
/// plain `std::` so type names are stable across standard libraries.
static INLINE_NAMESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"std::__(?:cxx\d\d|\d)::").expect("static regex"));

fn normalize_inline_namespaces(name: &str) -> String {
    INLINE_NAMESPACE.replace_all(name, "std::").into_owned()
}

/// Chase typedef chains to the underlying type, folding local qualifiers
/// down onto it.
pub fn strip_typedefs(qt: &QualType) -> QualType {
    let mut current = qt.clone();
    while let Type::Typedef { underlying, .. } = &*current.ty {
        let mut next = underlying.clone();
        next.is_const |= current.is_const;
        next.is_volatile |= current.is_volatile;
        current = next;
    }
    current
}

fn qualifier_prefix(qt: &QualType) -> &'static str {
    match (qt.is_const, qt.is_volatile) {
        (true, true) => "const volatile ",
        (true, false) => "const ",
        (false, true) => "volatile ",
        (false, false) => "",
    }
}

fn render(ctx: &AstContext, qt: &QualType) -> String {
    match &*qt.ty {
        Type::Pointer(inner) => {
            let mut result = format!("{} *", render(ctx, inner));
            if qt.is_const {
                result.push_str("const");
            }
            result
        }
        Type::LValueReference(inner) => format!("{} &", render(ctx, inner)),
        Type::RValueReference(inner) => format!("{} &&", render(ctx, inner)),
        Type::Typedef { .. } => render(ctx, &strip_typedefs(qt)),
        Type::Builtin(name) => format!("{}{}", qualifier_prefix(qt), name),
        Type::Record(id) => format!(
            "{}{}",
            qualifier_prefix(qt),
            ctx.record(*id).qualified_name
        ),
        Type::TemplateParam(name) => format!("{}{}", qualifier_prefix(qt), name),
        Type::TemplateSpecialization { name, args, .. } => {
            let rendered: Vec<String> = args
                .iter()
                .map(|arg| match arg {
                    TemplateArg::Type(t) => render(ctx, &strip_typedefs(t)),
                    TemplateArg::Integral(value) => value.to_string(),
                })
                .collect();
            format!(
                "{}{}<{}>",
                qualifier_prefix(qt),
                name,
                rendered.join(", ")
            )
        }
        Type::FunctionProto {
            return_type,
            param_types,
        } => {
            let params: Vec<String> = param_types.iter().map(|p| render(ctx, p)).collect();
            format!("{} ({})", render(ctx, return_type), params.join(", "))
        }
    }
}

/// Canonical C++ spelling of a type: typedefs chased with local qualifiers
/// preserved, inline namespace prefixes normalized.
pub fn type_string(ctx: &AstContext, qt: &QualType) -> String {
    normalize_inline_namespaces(&render(ctx, &strip_typedefs(qt)))
}

/// Spelling of a (possibly dependent) type under a template-parameter map.
///
/// Non-dependent types short-circuit to [`type_string`]. Dependent types
/// peel references, pointers and qualifiers into a suffix, substitute the
/// plain type through the map, recurse into function prototypes and
/// template specializations, and re-apply the suffix.
pub fn substitute_type(ctx: &AstContext, qt: &QualType, map: &TemplateMap) -> String {
    if !qt.is_dependent() {
        return type_string(ctx, qt);
    }

    let mut suffix = String::new();
    if qt.is_rvalue_reference() {
        suffix.push_str(" &&");
    } else if qt.is_reference() {
        suffix.push_str(" &");
    }
    let mut current = qt.non_reference().clone();

    loop {
        if current.is_const {
            suffix = format!(" const{suffix}");
            current.is_const = false;
            continue;
        }
        if current.is_volatile {
            suffix = format!(" volatile{suffix}");
            current.is_volatile = false;
            continue;
        }
        if let Some(pointee) = current.pointee() {
            suffix = format!(" *{suffix}");
            current = pointee.clone();
            continue;
        }
        if let Type::Typedef { underlying, .. } = &*current.ty {
            current = underlying.clone();
            continue;
        }
        break;
    }

    match &*current.ty {
        Type::FunctionProto {
            return_type,
            param_types,
        } => {
            let params: Vec<String> = param_types
                .iter()
                .map(|p| substitute_type(ctx, p, map))
                .collect();
            format!(
                "{}({}){}",
                substitute_type(ctx, return_type, map),
                params.join(", "),
                suffix
            )
        }
        Type::TemplateSpecialization { name, args, .. } => {
            // Non-type template arguments are skipped on this path.
            let rendered: Vec<String> = args
                .iter()
                .filter_map(|arg| match arg {
                    TemplateArg::Type(t) => Some(substitute_type(ctx, t, map)),
                    TemplateArg::Integral(_) => None,
                })
                .collect();
            format!("{}<{}>{}", name, rendered.join(", "), suffix)
        }
        Type::TemplateParam(name) => match map.get(name) {
            Some(mapped) => format!("{}{}", type_string(ctx, mapped), suffix),
            None => format!("{name}{suffix}"),
        },
        _ => format!("{}{}", type_string(ctx, &current), suffix),
    }
}

/// The substitution target for a dependent type: strip it down to its plain
/// name and look that up in the map; an unmapped type comes back stripped.
fn substitution_target(qt: &QualType, map: &TemplateMap) -> QualType {
    if !qt.is_dependent() {
        return qt.clone();
    }
    let mut current = qt.non_reference().clone();
    loop {
        if current.is_const || current.is_volatile {
            current.is_const = false;
            current.is_volatile = false;
            continue;
        }
        if let Some(pointee) = current.pointee() {
            current = pointee.clone();
            continue;
        }
        if let Type::Typedef { underlying, .. } = &*current.ty {
            current = underlying.clone();
            continue;
        }
        break;
    }
    if let Type::TemplateParam(name) = &*current.ty
        && let Some(mapped) = map.get(name)
    {
        return mapped.clone();
    }
    current
}

/// Plain type: reference stripped, pointers stripped until none remains,
/// template substitution applied, constness re-applied if present before
/// substitution.
pub fn plain_qual_type(qt: &QualType, map: &TemplateMap) -> QualType {
    let mut plain = strip_typedefs(qt.non_reference());
    while let Some(pointee) = plain.pointee() {
        plain = strip_typedefs(pointee);
    }
    if !qt.is_dependent() {
        return plain;
    }

    let was_const = plain.is_const;
    plain.is_const = false;
    let mut plain = substitution_target(&plain, map);
    if plain.is_reference() {
        plain = plain.non_reference().clone();
    }
    if was_const {
        plain.is_const = true;
    }
    while let Some(pointee) = plain.pointee() {
        plain = strip_typedefs(pointee);
    }
    plain
}

fn record_of(qt: &QualType) -> Option<RecordId> {
    match &*qt.ty {
        Type::Record(id) => Some(*id),
        Type::TemplateSpecialization { record, .. } => *record,
        Type::Typedef { underlying, .. } => record_of(underlying),
        _ => None,
    }
}

/// `char *` -> `char`; `std::unique_ptr<T>` -> `T` (through `operator*`).
pub fn dereferenced_type(ctx: &AstContext, qt: &QualType) -> QualType {
    let stripped = strip_typedefs(qt.non_reference());
    if let Some(pointee) = stripped.pointee() {
        return strip_typedefs(pointee);
    }
    if let Some(record) = record_of(&stripped) {
        for method in ctx.record(record).methods() {
            if method.kind == MethodKind::Operator(OperatorKind::Star) {
                return strip_typedefs(method.return_type.non_reference());
            }
        }
    }
    stripped
}

fn root_include_for(ctx: &AstContext, record: Option<RecordId>) -> Option<String> {
    let record = record?;
    let definition = ctx.definition_of(record)?;
    ctx.record(definition).include_spelling.clone()
}

/// A type handle plus the template-parameter map in effect at its use site.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    ty: QualType,
    template_map: Rc<TemplateMap>,
}

impl TypeInfo {
    pub fn new(ty: QualType) -> Self {
        Self {
            ty,
            template_map: Rc::new(TemplateMap::new()),
        }
    }

    pub fn with_map(ty: QualType, template_map: Rc<TemplateMap>) -> Self {
        Self { ty, template_map }
    }

    pub fn qual_type(&self) -> &QualType {
        &self.ty
    }

    /// Canonical C++ spelling with template substitution applied.
    pub fn name(&self, ctx: &AstContext) -> String {
        substitute_type(ctx, &self.ty, &self.template_map)
    }

    pub fn is_void(&self, ctx: &AstContext) -> bool {
        self.name(ctx) == "void"
    }

    pub fn plain_type(&self) -> TypeInfo {
        TypeInfo::new(plain_qual_type(&self.ty, &self.template_map))
    }

    pub fn plain_name(&self, ctx: &AstContext) -> String {
        type_string(ctx, &plain_qual_type(&self.ty, &self.template_map))
    }

    /// Whether the type (or the type pointed/referred to) is const; the
    /// pointer itself being const does not count.
    pub fn is_const(&self) -> bool {
        plain_qual_type(&self.ty, &self.template_map).is_const
    }

    pub fn without_const(&self) -> TypeInfo {
        let mut ty = self.ty.clone();
        ty.is_const = false;
        TypeInfo::with_map(ty, Rc::clone(&self.template_map))
    }

    pub fn plain_type_decl(&self) -> Option<RecordId> {
        record_of(&plain_qual_type(&self.ty, &self.template_map))
    }

    /// Whether the plain type is a template specialization.
    pub fn is_templated(&self) -> bool {
        matches!(
            &*plain_qual_type(&self.ty, &self.template_map).ty,
            Type::TemplateSpecialization { .. }
        )
    }

    /// Qualified name of the template being specialized, when templated.
    pub fn templated_name(&self) -> Option<String> {
        match &*plain_qual_type(&self.ty, &self.template_map).ty {
            Type::TemplateSpecialization { name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    /// Visit each type argument of the plain type's specialization;
    /// non-type arguments are skipped.
    pub fn for_each_templated_type(&self, mut callback: impl FnMut(&QualType)) {
        if let Type::TemplateSpecialization { args, .. } =
            &*plain_qual_type(&self.ty, &self.template_map).ty
        {
            for arg in args {
                if let TemplateArg::Type(t) = arg {
                    callback(t);
                }
            }
        }
    }

    /// Best-effort JSDoc type string.
    pub fn jsdoc_type_name(&self, ctx: &AstContext, rules: &JsdocRules) -> String {
        if self.is_templated() {
            let mut converted = Vec::new();
            self.for_each_templated_type(|arg| {
                converted.push(TypeInfo::new(arg.clone()).jsdoc_type_name(ctx, rules));
            });
            let mut outer = rules.convert_simple(&self.templated_name().unwrap_or_default());
            for (i, arg) in converted.iter().enumerate() {
                outer = outer.replace(&format!("${}", i + 1), arg);
            }
            outer
        } else {
            rules.convert_simple(&self.name(ctx))
        }
    }

    /// The verbatim `#include` spellings needed to name this type: the plain
    /// type's defining header, recursing through template arguments; for
    /// function prototypes, the union over return and parameter types.
    pub fn root_includes(&self, ctx: &AstContext) -> IndexSet<String> {
        let mut includes = IndexSet::new();
        let stripped = strip_typedefs(&self.ty);
        if let Type::FunctionProto {
            return_type,
            param_types,
        } = &*stripped.ty
        {
            if let Some(include) =
                root_include_for(ctx, TypeInfo::new(return_type.clone()).plain_type_decl())
            {
                includes.insert(include);
            }
            for param in param_types {
                if let Some(include) =
                    root_include_for(ctx, TypeInfo::new(param.clone()).plain_type_decl())
                {
                    includes.insert(include);
                }
            }
            return includes;
        }

        if let Some(include) = root_include_for(ctx, self.plain_type_decl()) {
            includes.insert(include);
        }
        self.for_each_templated_type(|arg| {
            includes.extend(TypeInfo::new(arg.clone()).root_includes(ctx));
        });
        includes
    }
}
