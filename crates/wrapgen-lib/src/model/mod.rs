//! The class model.
//!
//! One [`Analyzer`] owns every [`WrappedClass`] discovered in a translation
//! unit. All cross-class edges (base/derived/used) are [`ClassId`] handles
//! into the owning container, which never shrinks during a run, so handles
//! stay valid for the analyzer's lifetime. Classes are uniquely keyed by
//! canonical class name; repeated queries about the same declaration return
//! the same entry.

mod functions;
mod members;

#[cfg(test)]
mod functions_tests;
#[cfg(test)]
mod members_tests;

use std::cell::OnceCell;

use indexmap::{IndexMap, IndexSet};

use crate::annotations::{AnnotationRegistry, AnnotationSet, strings};
use crate::ast::{AstContext, QualType, RecordId};
use crate::config::Config;
use crate::diagnostics::{Log, SharedDiagnostics, shared_diagnostics};
use crate::host;
use crate::inspect::JsdocRules;
use crate::{Error, Result};
use wrapgen_core::ast::{Access, MemberDecl, MethodRef};
use wrapgen_core::utils::{split_namespace, strip_tag_keyword};

pub use functions::{ClassFunction, FunctionKind, Parameter, signature_of};
pub use members::{DataMember, Enum, EnumElement};

/// Handle to a [`WrappedClass`] inside its owning [`Analyzer`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ClassId(u32);

impl ClassId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a class entered the model; governs wrapping eligibility.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FoundMethod {
    Unspecified,
    /// Found through its own export annotation.
    Annotation,
    /// Found by inheriting from the host marker base.
    Inheritance,
    /// Synthesized, e.g. the bidirectional wrapper class.
    Generated,
    /// Included because something else inherits from it.
    BaseClass,
    /// Referenced only as a PIMPL target.
    Pimpl,
    /// Blacklisted.
    NeverWrap,
}

/// Export decision computed from `BINDINGS_ALL` / `BINDINGS_NONE`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExportType {
    Unspecified,
    None,
    All,
}

/// Evaluate the export annotations on a declaration; having both specifiers
/// at once is a data error and only one may be present.
pub(crate) fn get_export_type(
    log: &Log,
    annotations: &AnnotationSet,
    name: &str,
    default: ExportType,
) -> ExportType {
    let mut export_type = default;
    let mut found_specifier = false;
    for annotation in annotations.iter() {
        let new_type = match annotation {
            strings::BINDINGS_ALL => ExportType::All,
            strings::BINDINGS_NONE => ExportType::None,
            _ => continue,
        };
        if found_specifier {
            log.error(format!("Found more than one export specifier on {name}"));
        }
        export_type = new_type;
        found_specifier = true;
    }
    export_type
}

/// One record declaration as the generator sees it.
#[derive(Debug)]
pub struct WrappedClass {
    pub id: ClassId,
    /// The underlying record; `None` for synthesized classes.
    pub record: Option<RecordId>,
    /// Canonical fully qualified name with the tag keyword stripped.
    pub class_name: String,
    pub short_name: String,
    /// Namespace prefix, trailing `::` retained; empty when absent.
    pub namespace_name: String,
    pub kind_keyword: String,
    pub found_method: FoundMethod,
    pub annotations: AnnotationSet,
    /// Doxygen description paragraph attached to the record.
    pub comment: String,
    /// At most one may actually be used for wrapping; more is a data error.
    pub base_types: IndexSet<ClassId>,
    pub derived_types: IndexSet<ClassId>,
    /// Wrapped classes referenced by this class's signatures and members.
    pub used_classes: IndexSet<ClassId>,
    /// Verbatim `#include` strings needed to compile this class's bindings.
    pub include_files: IndexSet<String>,
    /// The include that brings in this class's own definition.
    pub my_include: Option<String>,
    pub bidirectional: bool,
    pub bidirectional_constructor: Option<MethodRef>,
    pub force_no_constructors: bool,
    /// Compilation-cost estimate used by the partitioner.
    pub declaration_count: u32,
    pub wrapper_extension_methods: IndexSet<String>,
    pub wrapper_custom_extensions: IndexSet<String>,
    pub errors: SharedDiagnostics,

    js_name: OnceCell<String>,

    pub(crate) methods_parsed: bool,
    pub member_functions: Vec<ClassFunction>,
    pub static_functions: Vec<ClassFunction>,
    pub constructors: Vec<ClassFunction>,
    pub call_operator: Option<ClassFunction>,

    pub(crate) members_parsed: bool,
    pub members: Vec<DataMember>,
    pub pimpl_members: Vec<DataMember>,
    /// Field names declared PIMPL through annotations (short or qualified).
    pub(crate) pimpl_member_names: Vec<String>,
    /// Long name of the PIMPL field this class is reached through, once
    /// claimed; a second claim is a data error.
    pub(crate) pimpl_target_of: Option<String>,

    pub(crate) enums_parsed: bool,
    pub enums: Vec<Enum>,

    pub(crate) base_types_to_ignore: Vec<String>,
    pub(crate) base_type_to_use: Option<String>,
}

impl WrappedClass {
    fn new(id: ClassId, record: Option<RecordId>, class_name: String, found: FoundMethod) -> Self {
        let (namespace_name, short_name) = split_namespace(&class_name);
        Self {
            id,
            record,
            short_name: short_name.to_string(),
            namespace_name: namespace_name.to_string(),
            kind_keyword: String::new(),
            class_name,
            found_method: found,
            annotations: AnnotationSet::new(),
            comment: String::new(),
            base_types: IndexSet::new(),
            derived_types: IndexSet::new(),
            used_classes: IndexSet::new(),
            include_files: IndexSet::new(),
            my_include: None,
            bidirectional: false,
            bidirectional_constructor: None,
            force_no_constructors: false,
            declaration_count: 0,
            wrapper_extension_methods: IndexSet::new(),
            wrapper_custom_extensions: IndexSet::new(),
            errors: shared_diagnostics(),
            js_name: OnceCell::new(),
            methods_parsed: false,
            member_functions: Vec::new(),
            static_functions: Vec::new(),
            constructors: Vec::new(),
            call_operator: None,
            members_parsed: false,
            members: Vec::new(),
            pimpl_members: Vec::new(),
            pimpl_member_names: Vec::new(),
            pimpl_target_of: None,
            enums_parsed: false,
            enums: Vec::new(),
            base_types_to_ignore: Vec::new(),
            base_type_to_use: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.borrow().has_errors()
    }

    pub fn has_static_method(&self) -> bool {
        !self.static_functions.is_empty()
    }

    pub fn has_pimpl_members(&self) -> bool {
        !self.pimpl_members.is_empty()
    }

    pub fn is_template_specialization(&self, ctx: &AstContext) -> bool {
        self.record
            .is_some_and(|r| ctx.record(r).specialized_template.is_some())
    }

    /// The class's own type, for include computation.
    pub fn canonical_type(&self) -> Option<QualType> {
        self.record.map(QualType::record)
    }

    pub(crate) fn is_declared_pimpl_name(&self, short: &str, qualified: &str) -> bool {
        self.pimpl_member_names
            .iter()
            .any(|n| n == short || n == qualified)
    }
}

/// Owner of the class model and everything the passes need to build it.
pub struct Analyzer<'a> {
    pub ctx: &'a AstContext,
    pub config: Config,
    pub annotations: AnnotationRegistry,
    pub log: Log,
    pub jsdoc: JsdocRules,
    classes: Vec<WrappedClass>,
    by_name: IndexMap<String, ClassId>,
    by_record: IndexMap<RecordId, ClassId>,
    /// JS constructor names live in one shared namespace across all classes.
    used_constructor_names: IndexSet<String>,
    declaration_base_cost: u32,
}

impl<'a> Analyzer<'a> {
    pub fn new(ctx: &'a AstContext, config: Config) -> Self {
        let declaration_base_cost = config.declaration_base_cost().unwrap_or(3);
        Self {
            ctx,
            config,
            annotations: AnnotationRegistry::new(),
            log: Log::new(),
            jsdoc: JsdocRules::default(),
            classes: Vec::new(),
            by_name: IndexMap::new(),
            by_record: IndexMap::new(),
            used_constructor_names: IndexSet::new(),
            declaration_base_cost,
        }
    }

    pub fn class(&self, id: ClassId) -> &WrappedClass {
        &self.classes[id.index()]
    }

    pub(crate) fn class_mut(&mut self, id: ClassId) -> &mut WrappedClass {
        &mut self.classes[id.index()]
    }

    pub fn classes(&self) -> impl Iterator<Item = &WrappedClass> {
        self.classes.iter()
    }

    pub fn class_ids(&self) -> Vec<ClassId> {
        (0..self.classes.len() as u32).map(ClassId).collect()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub(crate) fn declaration_base_cost(&self) -> u32 {
        self.declaration_base_cost
    }

    /// The wrapped class for a record declaration, if one exists.
    pub fn get_by_record(&self, record: RecordId) -> Option<ClassId> {
        if let Some(&id) = self.by_record.get(&record) {
            return Some(id);
        }
        let definition = self.ctx.definition_of(record)?;
        self.by_record.get(&definition).copied()
    }

    pub fn get_by_name(&self, class_name: &str) -> Option<ClassId> {
        self.by_name.get(class_name).copied()
    }

    /// Returns the existing entry for a record's canonical name or creates
    /// one. A later sighting with `FoundMethod::BaseClass` promotes the
    /// entry (and its own bases) but never downgrades it.
    pub fn get_or_insert(&mut self, record: RecordId, found: FoundMethod) -> Result<ClassId> {
        let decl = self.ctx.record(record);
        let definition = self.ctx.definition_of(record).ok_or_else(|| {
            Error::InconsistentAst(format!("{} doesn't have a definition", decl.qualified_name))
        })?;
        let decl = self.ctx.record(definition);
        if decl.is_dependent {
            return Err(Error::InconsistentAst(format!(
                "unexpected dependent type: {}",
                decl.qualified_name
            )));
        }

        let class_name = strip_tag_keyword(&decl.canonical_name()).to_string();
        if let Some(&id) = self.by_name.get(&class_name) {
            if found == FoundMethod::BaseClass {
                self.promote_to_base_class(id);
            }
            return Ok(id);
        }

        self.insert_record(definition, found)
    }

    /// The promotion never downgrades; a class that would not otherwise be
    /// wrapped loses its constructors, and the promotion propagates to its
    /// own base types.
    fn promote_to_base_class(&mut self, id: ClassId) {
        if matches!(
            self.class(id).found_method,
            FoundMethod::NeverWrap | FoundMethod::BaseClass
        ) {
            return;
        }
        if !self.should_be_wrapped(id) {
            self.class_mut(id).force_no_constructors = true;
        }
        self.class_mut(id).found_method = FoundMethod::BaseClass;
        let bases: Vec<ClassId> = self.class(id).base_types.iter().copied().collect();
        for base in bases {
            self.promote_to_base_class(base);
        }
    }

    fn insert_record(&mut self, record: RecordId, found: FoundMethod) -> Result<ClassId> {
        let ctx = self.ctx;
        let decl = ctx.record(record);
        let class_name = strip_tag_keyword(&decl.canonical_name()).to_string();
        if class_name.is_empty() {
            return Err(Error::InconsistentAst(
                "empty name string for record declaration".to_string(),
            ));
        }

        let id = ClassId(self.classes.len() as u32);
        let mut class = WrappedClass::new(id, Some(record), class_name.clone(), found);
        class.kind_keyword = decl.kind.keyword().to_string();
        class.declaration_count = self.declaration_base_cost;

        if host::NEVER_WRAP_CLASS_NAMES.contains(&class.class_name.as_str()) {
            class.found_method = FoundMethod::NeverWrap;
            self.classes.push(class);
            self.by_name.insert(class_name, id);
            self.by_record.insert(record, id);
            return Ok(id);
        }

        class.annotations = self.annotations.annotations_of(ctx, record);
        log::info!("created new WrappedClass: {}", class.class_name);

        // A class reached only through inheritance contributes its members
        // but not its constructors, unless it opts in on its own.
        if found == FoundMethod::BaseClass
            && !(class.annotations.has(strings::BINDINGS_ALL)
                && !class.annotations.has(strings::BINDINGS_NONE))
        {
            class.force_no_constructors = true;
        }

        let log = self.log.clone();
        let _guard = log.capture(class.errors.clone());

        if class.annotations.has(strings::BINDINGS_ALL)
            && class.annotations.has(strings::BINDINGS_NONE)
        {
            log.error(format!(
                "type has both BINDINGS_NONE and BINDINGS_ALL - this makes no sense: {}",
                class.class_name
            ));
        }

        class.base_types_to_ignore = class
            .annotations
            .with_tail(strings::IGNORE_BASE_TYPE_PREFIX);
        let base_types_to_use = class.annotations.with_tail(strings::USE_BASE_TYPE_PREFIX);
        if base_types_to_use.len() > 1 {
            log.error(format!(
                "More than one base type specified to use for type {}",
                class.class_name
            ));
        }
        class.base_type_to_use = base_types_to_use.into_iter().next();
        let must_have_base_type = class.base_type_to_use.is_some();

        class.pimpl_member_names = class.annotations.with_tail(strings::USE_PIMPL_PREFIX);

        if let Some(comment) = &decl.comment {
            class.comment = members::first_paragraph(comment);
        }
        class.my_include = decl.include_spelling.clone();

        self.classes.push(class);
        self.by_name.insert(class_name.clone(), id);
        self.by_record.insert(record, id);

        let mut found_base_type = false;
        for base in &decl.bases {
            let base_decl = ctx.record(base.record);
            let base_canonical = base_decl.canonical_name();
            if base_canonical == host::MARKER_BASE && base.access != Access::Public {
                log.error(format!(
                    "class inherits from v8toolkit::WrappedClassBase but not publicly: {class_name}"
                ));
            }

            let base_stripped = strip_tag_keyword(&base_canonical);
            if self
                .class(id)
                .base_types_to_ignore
                .iter()
                .any(|ignored| ignored == base_stripped)
            {
                log::info!(
                    "skipping base type excluded by annotation on class: {base_stripped}"
                );
                continue;
            }
            if host::BASE_TYPES_TO_IGNORE
                .iter()
                .any(|ignored| strip_tag_keyword(ignored) == base_stripped)
            {
                log::info!("skipping globally ignored base type: {base_stripped}");
                continue;
            }
            if let Some(use_base) = self.class(id).base_type_to_use.clone()
                && use_base != wrapgen_core::utils::split_namespace(base_stripped).1
            {
                continue;
            }

            found_base_type = true;
            let base_found = if self.found_method_means_wrapped(id) {
                FoundMethod::BaseClass
            } else {
                FoundMethod::Unspecified
            };
            let base_id = self.get_or_insert(base.record, base_found)?;
            self.class_mut(id).base_types.insert(base_id);
            self.class_mut(base_id).derived_types.insert(id);
        }

        if must_have_base_type && !found_base_type {
            log.error(format!(
                "base_type_to_use specified but no base type found: {class_name}"
            ));
        }

        self.make_bidirectional_if_needed(id)?;

        Ok(id)
    }

    /// A class annotated bidirectional gets a synthesized `JS<Name>`
    /// subclass whose virtuals are exposed to JavaScript.
    fn make_bidirectional_if_needed(&mut self, id: ClassId) -> Result<()> {
        if !self.class(id).annotations.has(strings::BIDIRECTIONAL_CLASS) {
            return Ok(());
        }
        let ctx = self.ctx;
        let log = self.log.clone();
        let _guard = log.capture(self.class(id).errors.clone());
        let class_name = self.class(id).class_name.clone();

        let Some(record) = self.class(id).record else {
            return Ok(());
        };
        let mut bidirectional_constructor = None;
        for (index, member) in ctx.record(record).decls.iter().enumerate() {
            let MemberDecl::Method(method) = member else {
                continue;
            };
            if !method.is_constructor() || method.access != Access::Public {
                continue;
            }
            let annotations = AnnotationSet::from_attributes(&method.attributes);
            if !annotations.has(strings::BIDIRECTIONAL_CONSTRUCTOR)
                || annotations.has(strings::BINDINGS_NONE)
            {
                continue;
            }
            if bidirectional_constructor.is_some() {
                log.error(format!(
                    "Got more than one bidirectional constructor for {class_name}"
                ));
                continue;
            }
            bidirectional_constructor = Some(MethodRef { record, index });
        }
        if bidirectional_constructor.is_none() {
            log.error(format!(
                "Bidirectional class {class_name} doesn't have a bidirectional constructor explicitly set"
            ));
        }
        self.class_mut(id).bidirectional_constructor = bidirectional_constructor;

        let js_name = self.js_name(id);
        let wrapper_id = ClassId(self.classes.len() as u32);
        let mut wrapper = WrappedClass::new(
            wrapper_id,
            None,
            format!("JS{js_name}"),
            FoundMethod::Generated,
        );
        wrapper.bidirectional = true;
        wrapper.declaration_count = self.declaration_base_cost;
        wrapper.my_include = Some(format!(
            "\"v8toolkit_generated_bidirectional_{js_name}.h\""
        ));
        wrapper
            .include_files
            .insert("<v8toolkit/bidirectional.h>".to_string());
        wrapper.base_types.insert(id);
        self.by_name.insert(wrapper.class_name.clone(), wrapper_id);
        self.classes.push(wrapper);
        self.class_mut(id).derived_types.insert(wrapper_id);
        Ok(())
    }

    /// The name under which JavaScript sees the class, resolved lazily:
    /// config override, then typedef alias, then `USE_NAME_` annotation,
    /// then the short name.
    pub fn js_name(&self, id: ClassId) -> String {
        let class = self.class(id);
        class
            .js_name
            .get_or_init(|| {
                if let Some(from_config) = self.config.class_name_override(&class.class_name) {
                    return from_config.to_string();
                }
                if let Some(record) = class.record
                    && let Some(alias) = self.annotations.alias_for(record)
                {
                    return alias.to_string();
                }
                if let Some(annotated) = class
                    .annotations
                    .with_tail(strings::USE_NAME_PREFIX)
                    .into_iter()
                    .next()
                {
                    return annotated;
                }
                class.short_name.clone()
            })
            .clone()
    }

    pub fn found_method_means_wrapped(&self, id: ClassId) -> bool {
        matches!(
            self.class(id).found_method,
            FoundMethod::Annotation
                | FoundMethod::Inheritance
                | FoundMethod::Generated
                | FoundMethod::BaseClass
        )
    }

    /// The wrapping decision table; see also [`Self::should_be_parsed`].
    pub fn should_be_wrapped(&self, id: ClassId) -> bool {
        let class = self.class(id);
        match class.found_method {
            FoundMethod::NeverWrap | FoundMethod::Pimpl => false,
            FoundMethod::BaseClass | FoundMethod::Generated => true,
            FoundMethod::Inheritance | FoundMethod::Annotation => {
                !class.annotations.has(strings::BINDINGS_NONE)
            }
            FoundMethod::Unspecified => {
                !class.annotations.has(strings::BINDINGS_NONE)
                    && class.annotations.has(strings::BINDINGS_ALL)
            }
        }
    }

    /// PIMPL targets are parsed (their members get hoisted) even though they
    /// are not wrapped themselves.
    pub fn should_be_parsed(&self, id: ClassId) -> bool {
        self.should_be_wrapped(id) || self.class(id).found_method == FoundMethod::Pimpl
    }

    /// Ids of all classes that will participate in output, in discovery
    /// order.
    pub fn wrapped_class_ids(&self) -> Vec<ClassId> {
        self.class_ids()
            .into_iter()
            .filter(|&id| self.should_be_wrapped(id))
            .collect()
    }

    /// Run every lazy parse on every parseable class. New entries created
    /// along the way (e.g. bidirectional wrappers) are picked up too.
    pub fn parse_all(&mut self) {
        let mut index = 0;
        while index < self.classes.len() {
            let id = ClassId(index as u32);
            if self.should_be_parsed(id) {
                self.parse_all_methods(id);
                self.parse_members(id);
                self.parse_enums(id);
            }
            index += 1;
        }
    }

    pub(crate) fn record_constructor_name(&mut self, js_name: &str, class: ClassId) {
        if self.used_constructor_names.contains(js_name) {
            let class_js_name = self.js_name(class);
            self.log.error(format!(
                "duplicate JS constructor function name: {js_name} in class {class_js_name}"
            ));
        } else {
            self.used_constructor_names.insert(js_name.to_string());
        }
    }

    pub fn constructor_name_count(&self) -> usize {
        self.used_constructor_names.len()
    }

    /// Note every wrapped class referenced by a set of type uses.
    pub(crate) fn note_used_classes(&mut self, id: ClassId, records: &[RecordId]) {
        let mut used = Vec::new();
        for &record in records {
            if let Some(class_id) = self.get_by_record(record)
                && class_id != id
            {
                used.push(class_id);
            }
        }
        self.class_mut(id).used_classes.extend(used);
    }

    /// The inheritance chain starting at `id`: the class itself, then its
    /// ancestors.
    pub(crate) fn inheritance_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut queue = vec![id];
        while let Some(current) = queue.pop() {
            if chain.contains(&current) {
                continue;
            }
            chain.push(current);
            for &base in self.class(current).base_types.iter().rev() {
                queue.push(base);
            }
        }
        chain
    }
}
