//! End-of-translation-unit validation.
//!
//! Runs once per wrapped class. Every failed check lands in the class's
//! error bucket through the log's scoped sink; any recorded error prevents
//! output.

use std::sync::LazyLock;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::host;
use crate::inspect::TypeInfo;
use crate::model::{Analyzer, ClassId};

static ILLEGAL_JS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[<>:]|^$").expect("static regex"));

impl Analyzer<'_> {
    /// Validate every class that participates in output.
    pub fn validate_all(&mut self) {
        for id in self.wrapped_class_ids() {
            self.validate_class(id);
        }
    }

    pub fn validate_class(&mut self, id: ClassId) {
        let log = self.log.clone();
        let _guard = log.capture(self.class(id).errors.clone());
        let class = self.class(id);
        let class_name = class.class_name.clone();
        let js_name = self.js_name(id);
        log::info!("validating {class_name}");

        // Reserved global names.
        if host::RESERVED_GLOBAL_NAMES.contains(&js_name.as_str()) {
            log.error(format!(
                "Class has same name as JavaScript reserved word: {class_name}"
            ));
        }

        // No two static methods may share a JS name.
        let class = self.class(id);
        let mut static_names: IndexMap<&str, Vec<&crate::model::ClassFunction>> = IndexMap::new();
        for function in &class.static_functions {
            static_names
                .entry(function.js_name.as_str())
                .or_default()
                .push(function);
        }
        for (name, functions) in &static_names {
            if functions.len() > 1 {
                let signatures: Vec<String> = functions
                    .iter()
                    .map(|f| f.signature_string(self.ctx))
                    .collect();
                log.error(format!(
                    "Multiple static functions in {} with the same JavaScript name {}: {}",
                    class_name,
                    name,
                    signatures.join(", ")
                ));
            }
        }

        // Nor may member functions and data members collide.
        let mut member_names: IndexMap<&str, Vec<String>> = IndexMap::new();
        for function in &class.member_functions {
            member_names
                .entry(function.js_name.as_str())
                .or_default()
                .push(function.signature_string(self.ctx));
        }
        for member in &class.members {
            member_names
                .entry(member.js_name.as_str())
                .or_default()
                .push(member.long_name.clone());
        }
        for (name, sources) in &member_names {
            if sources.len() > 1 {
                log.error(format!(
                    "Multiple member functions/data members with the same JavaScript name {}: {}",
                    name,
                    sources.join(", ")
                ));
            }
        }

        // Template syntax and scope operators must be aliased away.
        if ILLEGAL_JS_NAME.is_match(&js_name) {
            log.error(format!(
                "JavaScript type name '{js_name}' for '{class_name}' is either empty or has one of < > : in it, must be aliased to a standard name"
            ));
        }

        if class.base_types.len() > 1 {
            log.error(format!(
                "Type {class_name} has more than one base class - this isn't supported because javascript doesn't support MI"
            ));
        }

        // Bidirectional wrappers need a registered constructor on the base.
        if class.bidirectional
            && let Some(&base) = class.base_types.first()
            && self.class(base).bidirectional_constructor.is_none()
        {
            log.error(format!(
                "Bidirectional class {class_name} has no bidirectional constructor"
            ));
        }

        self.compute_include_closure(id);
    }

    /// Union in everything the generated bindings for this class need to
    /// compile: the class's own header, every type named in an exposed
    /// signature or member, and the headers of every base and derived type.
    fn compute_include_closure(&mut self, id: ClassId) {
        let ctx = self.ctx;
        let class = self.class(id);
        let mut includes: IndexSet<String> = IndexSet::new();

        if let Some(own) = &class.my_include {
            includes.insert(own.clone());
        }
        // When the class itself is templated, this picks up the types
        // composing it.
        if let Some(own_type) = class.canonical_type() {
            includes.extend(TypeInfo::new(own_type).root_includes(ctx));
        }

        for &base in &class.base_types {
            if let Some(base_include) = &self.class(base).my_include {
                includes.insert(base_include.clone());
            }
        }

        for member in &class.members {
            includes.extend(member.type_info.root_includes(ctx));
        }

        for &derived in &class.derived_types {
            let derived_class = self.class(derived);
            if let Some(derived_type) = derived_class.canonical_type() {
                includes.extend(TypeInfo::new(derived_type).root_includes(ctx));
            }
            // Bidirectional wrappers have no record to compute from, only a
            // recorded include of their own.
            if let Some(derived_include) = &derived_class.my_include {
                includes.insert(derived_include.clone());
            }
        }

        for function in class
            .member_functions
            .iter()
            .chain(&class.static_functions)
            .chain(&class.constructors)
            .chain(class.call_operator.as_ref())
        {
            includes.extend(function.includes(ctx));
        }

        includes.retain(|include| {
            !include.is_empty() && !host::NEVER_INCLUDE_FOR_ANY_FILE.contains(&include.as_str())
        });

        self.class_mut(id).include_files.extend(includes);
    }
}
