//! Annotation sets and the per-translation-unit registries.
//!
//! Annotations are free-form strings attached to declarations by the
//! frontend. The generator recognizes a fixed vocabulary (see [`strings`]);
//! anything else is carried along and ignored. Two registries let
//! annotations travel between declarations: annotations on a class-template
//! forward declaration apply to every specialization, and annotations on a
//! typedef apply to the underlying record (a typedef can also give the
//! record its JavaScript name alias).

use indexmap::{IndexMap, IndexSet};

use crate::ast::{AstContext, RecordId, TemplateId};

/// The annotation vocabulary the generator recognizes. Parameterized
/// annotations are prefix-encoded: `USE_NAME_foo` means "use `foo`".
pub mod strings {
    pub const BINDINGS_ALL: &str = "BINDINGS_ALL";
    pub const BINDINGS_NONE: &str = "BINDINGS_NONE";
    pub const READONLY: &str = "READONLY";
    pub const EXTEND_WRAPPER: &str = "EXTEND_WRAPPER";
    pub const CUSTOM_EXTENSION: &str = "CUSTOM_EXTENSION";
    pub const NAME_ALIAS: &str = "NAME_ALIAS";
    pub const DO_NOT_WRAP_CONSTRUCTORS: &str = "DO_NOT_WRAP_CONSTRUCTORS";
    pub const BIDIRECTIONAL_CLASS: &str = "BIDIRECTIONAL_CLASS";
    pub const BIDIRECTIONAL_CONSTRUCTOR: &str = "BIDIRECTIONAL_CONSTRUCTOR";
    pub const PIMPL: &str = "PIMPL";

    pub const CONSTRUCTOR_PREFIX: &str = "CONSTRUCTOR_";
    pub const USE_NAME_PREFIX: &str = "USE_NAME_";
    pub const IGNORE_BASE_TYPE_PREFIX: &str = "IGNORE_BASE_TYPE_";
    pub const USE_BASE_TYPE_PREFIX: &str = "USE_BASE_TYPE_";
    pub const USE_PIMPL_PREFIX: &str = "USE_PIMPL_";
    pub const EXPOSE_STATIC_METHODS_AS_PREFIX: &str = "EXPOSE_STATIC_METHODS_AS_";
}

/// A merged set of annotation strings attached to one declaration.
///
/// Order of insertion is irrelevant; equality is string equality.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    annotations: IndexSet<String>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_attributes(attributes: &[String]) -> Self {
        Self {
            annotations: attributes.iter().cloned().collect(),
        }
    }

    pub fn has(&self, target: &str) -> bool {
        self.annotations.contains(target)
    }

    pub fn merge(&mut self, other: &AnnotationSet) {
        for annotation in &other.annotations {
            self.annotations.insert(annotation.clone());
        }
    }

    /// Extract the captured tails of every annotation starting with
    /// `prefix`: `with_tail("USE_NAME_")` on `{"USE_NAME_foo"}` yields
    /// `["foo"]`.
    pub fn with_tail(&self, prefix: &str) -> Vec<String> {
        self.annotations
            .iter()
            .filter_map(|a| a.strip_prefix(prefix))
            .map(str::to_string)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

impl FromIterator<String> for AnnotationSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            annotations: iter.into_iter().collect(),
        }
    }
}

/// Registry associating annotations and name aliases with declarations.
///
/// Lifetime is the translation unit: populated while the frontend delivers
/// match events, queried during parsing and validation.
#[derive(Debug, Default)]
pub struct AnnotationRegistry {
    templates: IndexMap<TemplateId, AnnotationSet>,
    records: IndexMap<RecordId, AnnotationSet>,
    aliases: IndexMap<RecordId, String>,
}

impl AnnotationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge annotations onto a class template so every specialization
    /// inherits them.
    pub fn merge_into_template(&mut self, template: TemplateId, other: &AnnotationSet) {
        self.templates.entry(template).or_default().merge(other);
    }

    /// Merge annotations onto a record (e.g. from a typedef naming it).
    pub fn merge_into_record(&mut self, record: RecordId, other: &AnnotationSet) {
        self.records.entry(record).or_default().merge(other);
    }

    /// Record the typedef alias for a record; a later alias replaces an
    /// earlier one.
    pub fn set_alias(&mut self, record: RecordId, alias: impl Into<String>) {
        self.aliases.insert(record, alias.into());
    }

    pub fn alias_for(&self, record: RecordId) -> Option<&str> {
        self.aliases.get(&record).map(String::as_str)
    }

    pub fn record_annotations(&self, record: RecordId) -> Option<&AnnotationSet> {
        self.records.get(&record)
    }

    /// The full annotation set for a record: its own attributes, anything
    /// merged onto it through typedefs, and - for template specializations -
    /// everything registered against the specialized template.
    pub fn annotations_of(&self, ctx: &AstContext, record: RecordId) -> AnnotationSet {
        let decl = ctx.record(record);
        let mut set = AnnotationSet::from_attributes(&decl.attributes);
        if let Some(merged) = self.records.get(&record) {
            set.merge(merged);
        }
        if let Some(template) = decl.specialized_template
            && let Some(template_set) = self.templates.get(&template)
        {
            set.merge(template_set);
        }
        set
    }
}
