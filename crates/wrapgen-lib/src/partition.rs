//! Partitioning wrapped classes into binding files.
//!
//! Classes are emitted base-before-derived and packed into files under a
//! declaration-weight budget. A budget of zero means unlimited - one file.
//! A single class larger than the budget still gets a file of its own.

use indexmap::IndexSet;

use crate::model::{Analyzer, ClassId};

/// One generated binding file and the metadata its emitter needs.
#[derive(Debug)]
pub struct BindingFile {
    /// 1-based position in the chain.
    pub number: usize,
    /// Classes in emission order.
    pub classes: Vec<ClassId>,
    pub declaration_count: u32,
    /// Union of the classes' include files.
    pub includes: IndexSet<String>,
    /// Classes instantiated explicitly in this file.
    pub explicit_instantiations: Vec<ClassId>,
    /// Classes that additionally need a const instantiation (those with
    /// wrapper extension methods).
    pub explicit_instantiations_for_const_types: Vec<ClassId>,
    /// Classes whose instantiation lives elsewhere but are referenced here.
    pub extern_templates: Vec<ClassId>,
    /// Classes with PIMPL members needing a WrapperBuilder specialization.
    pub wrapper_builder_classes: Vec<ClassId>,
    max_declarations: u32,
}

impl BindingFile {
    fn new(number: usize, max_declarations: u32) -> Self {
        Self {
            number,
            classes: Vec::new(),
            declaration_count: 0,
            includes: IndexSet::new(),
            explicit_instantiations: Vec::new(),
            explicit_instantiations_for_const_types: Vec::new(),
            extern_templates: Vec::new(),
            wrapper_builder_classes: Vec::new(),
            max_declarations,
        }
    }

    /// Whether the class fits without exceeding the declaration limit. An
    /// empty file accepts anything; zero means unlimited.
    fn can_hold(&self, declaration_count: u32) -> bool {
        self.declaration_count == 0
            || self.max_declarations == 0
            || self.declaration_count + declaration_count <= self.max_declarations
    }

    fn add_class(&mut self, analyzer: &Analyzer<'_>, id: ClassId) {
        let class = analyzer.class(id);
        self.classes.push(id);
        self.declaration_count += class.declaration_count;
        self.includes.extend(class.include_files.iter().cloned());
        self.explicit_instantiations.push(id);
        if !class.wrapper_extension_methods.is_empty() {
            self.explicit_instantiations_for_const_types.push(id);
        }
        if class.has_pimpl_members() {
            self.wrapper_builder_classes.push(id);
        }
    }
}

/// Topologically order the wrapped classes (base before derived) and pack
/// them into binding files.
pub fn partition(analyzer: &Analyzer<'_>, max_declarations_per_file: u32) -> Vec<BindingFile> {
    let candidates = analyzer.wrapped_class_ids();
    let mut files = vec![BindingFile::new(1, max_declarations_per_file)];
    let mut emitted: IndexSet<ClassId> = IndexSet::new();

    // Repeatedly scan; a class is emittable once all its bases are out.
    // Loop until a full pass emits nothing.
    let mut found_match = true;
    while found_match {
        found_match = false;
        for &id in &candidates {
            if emitted.contains(&id) {
                continue;
            }
            let ready = analyzer
                .class(id)
                .base_types
                .iter()
                .all(|base| emitted.contains(base));
            if !ready {
                continue;
            }

            emitted.insert(id);
            found_match = true;

            let declaration_count = analyzer.class(id).declaration_count;
            if !files[files.len() - 1].can_hold(declaration_count) {
                log::info!("bindings file full, rotating");
                let number = files.len() + 1;
                files.push(BindingFile::new(number, max_declarations_per_file));
            }
            let current = files.len() - 1;
            files[current].add_class(analyzer, id);
        }
    }

    // A class left unemitted that uses another unemitted class is a data
    // error worth naming.
    for &id in &candidates {
        if emitted.contains(&id) {
            continue;
        }
        for &used in &analyzer.class(id).used_classes {
            if !emitted.contains(&used) {
                analyzer.log.error(format!(
                    "Could not dump '{}' because it uses type '{}' that wasn't dumped",
                    analyzer.class(id).class_name,
                    analyzer.class(used).class_name
                ));
            }
        }
    }

    // Everything instantiated in an earlier file is an extern template for
    // later files that reference it through base/derived edges.
    let mut instantiated_before: IndexSet<ClassId> = IndexSet::new();
    for file in &mut files {
        let mut externs: IndexSet<ClassId> = IndexSet::new();
        for &id in &file.classes {
            let class = analyzer.class(id);
            for &related in class.base_types.iter().chain(&class.derived_types) {
                if instantiated_before.contains(&related) {
                    externs.insert(related);
                }
            }
        }
        let mut externs: Vec<ClassId> = externs.into_iter().collect();
        externs.sort_by(|a, b| {
            analyzer
                .class(*a)
                .class_name
                .cmp(&analyzer.class(*b).class_name)
        });
        file.extern_templates = externs;
        instantiated_before.extend(file.classes.iter().copied());
    }

    files
}
