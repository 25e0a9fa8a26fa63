//! The binding-file output module.
//!
//! Emits `v8toolkit_generated_class_wrapper_{N}.cpp`, one per binding file:
//! a fixed preamble, the include set, explicit instantiations, extern
//! template declarations, WrapperBuilder specializations for PIMPL
//! classes, one registration block per class, and the chaining call that
//! strings the files together behind a single public entry point.

use std::fmt::Write;
use std::rc::Rc;

use crate::annotations::strings;
use crate::host;
use crate::inspect::type_string;
use crate::model::{Analyzer, ClassFunction, ClassId, DataMember};
use crate::output::{OutputModule, OutputTarget};
use crate::partition::BindingFile;

pub struct BindingsOutputModule {
    target: Rc<dyn OutputTarget>,
}

impl BindingsOutputModule {
    pub fn new(target: Rc<dyn OutputTarget>) -> Self {
        Self { target }
    }
}

impl OutputModule for BindingsOutputModule {
    fn name(&self) -> &'static str {
        "BindingsOutputModule"
    }

    fn process(&mut self, analyzer: &Analyzer<'_>, files: &[BindingFile]) -> crate::Result<()> {
        for (index, file) in files.iter().enumerate() {
            let last_file = index == files.len() - 1;
            let contents = emit_file(analyzer, file, last_file);
            let filename = format!("v8toolkit_generated_class_wrapper_{}.cpp", file.number);
            log::info!("writing binding file {filename}");
            self.target.write_file(&filename, &contents)?;
        }
        Ok(())
    }
}

struct Emitter<'a> {
    analyzer: &'a Analyzer<'a>,
    out: String,
}

fn emit_file(analyzer: &Analyzer<'_>, file: &BindingFile, last_file: bool) -> String {
    let mut emitter = Emitter {
        analyzer,
        out: String::new(),
    };
    emitter.file(file, last_file);
    emitter.out
}

impl Emitter<'_> {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn file(&mut self, file: &BindingFile, last_file: bool) {
        let analyzer = self.analyzer;

        self.out.push_str(host::HEADER_FOR_EVERY_CLASS_WRAPPER_FILE);
        for include in host::INCLUDES_FOR_EVERY_CLASS_WRAPPER_FILE {
            self.line(&format!("#include {include}"));
        }
        self.line("");

        let mut includes: Vec<&String> = file
            .includes
            .iter()
            .filter(|include| {
                !include.is_empty()
                    && !host::NEVER_INCLUDE_FOR_ANY_FILE.contains(&include.as_str())
            })
            .collect();
        includes.sort();
        for include in includes {
            self.line(&format!("#include {include}"));
        }
        self.line("");

        let mut instantiations: Vec<ClassId> = file.explicit_instantiations.clone();
        instantiations.sort_by(|a, b| {
            analyzer
                .class(*a)
                .class_name
                .cmp(&analyzer.class(*b).class_name)
        });
        for id in &instantiations {
            self.line(&format!(
                "template class v8toolkit::V8ClassWrapper<{}>;",
                analyzer.class(*id).class_name
            ));
        }
        let mut const_instantiations = file.explicit_instantiations_for_const_types.clone();
        const_instantiations.sort_by(|a, b| {
            analyzer
                .class(*a)
                .class_name
                .cmp(&analyzer.class(*b).class_name)
        });
        for id in &const_instantiations {
            self.line(&format!(
                "template class v8toolkit::V8ClassWrapper<{} const>;",
                analyzer.class(*id).class_name
            ));
        }
        for id in &file.extern_templates {
            self.line(&format!(
                "extern template class v8toolkit::V8ClassWrapper<{}>;",
                analyzer.class(*id).class_name
            ));
        }
        self.line("");

        if !file.wrapper_builder_classes.is_empty() {
            self.line("namespace v8toolkit {");
            self.line("");
            for &id in &file.wrapper_builder_classes {
                self.wrapper_builder(id);
            }
            self.line("} // end namespace v8toolkit");
            self.line("");
        }

        self.line(&format!(
            "void v8toolkit_initialize_class_wrappers_{}(v8toolkit::Isolate &); // may not exist - that's ok",
            file.number + 1
        ));
        self.line(&format!(
            "void v8toolkit_initialize_class_wrappers_{}(v8toolkit::Isolate & isolate) {{",
            file.number
        ));
        self.line("");
        for &id in &file.classes {
            self.class_block(id);
            self.line("");
        }
        if !last_file {
            self.line(&format!(
                "    v8toolkit_initialize_class_wrappers_{}(isolate);",
                file.number + 1
            ));
        }
        self.line("}");
    }

    /// Classes with private PIMPL fields need their member pointers made
    /// reachable through a WrapperBuilder specialization.
    fn wrapper_builder(&mut self, id: ClassId) {
        let analyzer = self.analyzer;
        let ctx = analyzer.ctx;
        let class = analyzer.class(id);
        self.line("template<>");
        self.line(&format!("struct WrapperBuilder<{}> {{", class.class_name));
        for pimpl_member in &class.pimpl_members {
            let dereferenced =
                crate::inspect::dereferenced_type(ctx, pimpl_member.type_info.qual_type());
            let target_name = crate::inspect::TypeInfo::new(dereferenced.clone())
                .plain_type_decl()
                .and_then(|record| analyzer.get_by_record(record))
                .map(|target| analyzer.class(target).class_name.clone())
                .unwrap_or_else(|| type_string(ctx, &dereferenced));
            self.line(&format!(
                "    static constexpr auto {short} = static_cast<{target}({class}::*)>(&LetMeIn<{class}>::{short});",
                short = pimpl_member.short_name,
                target = target_name,
                class = class.class_name,
            ));
        }
        self.line("};");
        self.line("");
    }

    fn class_block(&mut self, id: ClassId) {
        let analyzer = self.analyzer;
        let ctx = analyzer.ctx;
        let class = analyzer.class(id);
        let class_name = &class.class_name;
        let js_name = analyzer.js_name(id);

        self.line("    {");
        self.line(&format!(
            "        v8toolkit::V8ClassWrapper<{class_name}> & class_wrapper = isolate.wrap_class<{class_name}>();"
        ));
        self.line(&format!(
            "        class_wrapper.set_class_name(\"{js_name}\");"
        ));

        for function in &class.member_functions {
            let method_pointer = member_function_pointer(analyzer, function, class_name);
            self.line(&format!(
                "        class_wrapper.add_method(\"{}\", {}, {});",
                function.js_name,
                method_pointer,
                function.default_argument_tuple_string(ctx)
            ));
        }

        if let Some(call_operator) = &class.call_operator {
            self.line(&format!(
                "        class_wrapper.make_callable<{}>(&{});",
                call_operator.return_and_class_and_parameter_types_string(ctx, class_name),
                call_operator.name
            ));
        }

        for function in &class.static_functions {
            self.line(&format!(
                "        class_wrapper.add_static_method<{}>(\"{}\", &{}, {});",
                function.return_and_parameter_types_string(ctx),
                function.js_name,
                function.name,
                function.default_argument_tuple_string(ctx)
            ));
        }

        for member in &class.members {
            let read_only = if member.is_const { "_readonly" } else { "" };
            self.line(&format!(
                "        class_wrapper.add_member{}<{}>(\"{}\");",
                read_only,
                member_pointer(analyzer, member, class_name),
                member.js_name
            ));
        }

        for enumeration in &class.enums {
            let mut elements = String::new();
            for (i, element) in enumeration.elements.iter().enumerate() {
                if i > 0 {
                    elements.push_str(", ");
                }
                let _ = write!(elements, "{{\"{}\", {}}}", element.name, element.value);
            }
            self.line(&format!(
                "        class_wrapper.add_enum(\"{}\", {{{}}});",
                enumeration.name, elements
            ));
        }

        for extension_method in &class.wrapper_extension_methods {
            self.line(&format!("        {extension_method}(class_wrapper);"));
        }
        for custom_extension in &class.wrapper_custom_extensions {
            self.line(&format!("        {custom_extension}"));
        }

        if let Some(&base) = class.base_types.first() {
            self.line(&format!(
                "        class_wrapper.set_parent_type<{}>();",
                analyzer.class(base).class_name
            ));
        }
        if !class.derived_types.is_empty() {
            let derived: Vec<&str> = class
                .derived_types
                .iter()
                .map(|&d| analyzer.class(d).class_name.as_str())
                .collect();
            self.line(&format!(
                "        class_wrapper.set_compatible_types<{}>();",
                derived.join(", ")
            ));
        }
        self.line("        class_wrapper.finalize(true);");

        if class.constructors.is_empty() || class.force_no_constructors {
            let expose_name = class
                .annotations
                .with_tail(strings::EXPOSE_STATIC_METHODS_AS_PREFIX)
                .into_iter()
                .next()
                .unwrap_or(js_name);
            self.line(&format!(
                "        class_wrapper.expose_static_methods(\"{expose_name}\", isolate);"
            ));
        } else {
            for constructor in &class.constructors {
                self.line(&format!(
                    "        class_wrapper.add_constructor<{}>(\"{}\", isolate, {});",
                    constructor.parameter_types_string(ctx),
                    constructor.js_name,
                    constructor.default_argument_tuple_string(ctx)
                ));
            }
        }
        self.line("    }");
    }
}

/// `static_cast<ret(Class::*)(params) quals>(&Class::name)`, pinning down
/// the overload being registered.
fn member_function_pointer(
    analyzer: &Analyzer<'_>,
    function: &ClassFunction,
    class_name: &str,
) -> String {
    let ctx = analyzer.ctx;
    let mut qualifiers = String::new();
    if function.is_const {
        qualifiers.push_str(" const");
    }
    if function.is_volatile {
        qualifiers.push_str(" volatile");
    }
    if function.is_lvalue_qualified {
        qualifiers.push_str(" &");
    } else if function.is_rvalue_qualified {
        qualifiers.push_str(" &&");
    }
    format!(
        "static_cast<{}({}::*)({}){}>(&{})",
        function.return_type.name(ctx),
        class_name,
        function.parameter_types_string(ctx),
        qualifiers,
        function.name
    )
}

/// Template argument(s) for `add_member`: the plain member pointer, or the
/// two-step PIMPL traversal. Only one level of indirection is supported.
fn member_pointer(analyzer: &Analyzer<'_>, member: &DataMember, class_name: &str) -> String {
    match member.accessed_through {
        None => format!("&{}", member.long_name),
        Some(pimpl_index) => {
            let ctx = analyzer.ctx;
            let class = analyzer.class(member.class);
            let through = &class.pimpl_members[pimpl_index];
            format!(
                "static_cast<{}({}::*)>(&{}), &{}",
                type_string(ctx, member.type_info.qual_type()),
                class_name,
                through.long_name,
                member.long_name
            )
        }
    }
}
