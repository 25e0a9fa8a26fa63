//! The bidirectional-header output module.
//!
//! For every synthesized bidirectional class, emits
//! `v8toolkit_generated_bidirectional_{JSName}.h`: a `JS<Name>` subclass
//! deriving from the C++ base and `v8toolkit::JSWrapper`, a constructor
//! forwarding the base's registered bidirectional constructor, and one
//! `JS_ACCESS` line per overridable virtual in the base chain.

use std::rc::Rc;

use crate::model::{Analyzer, ClassId};
use crate::output::{OutputModule, OutputTarget};
use crate::partition::BindingFile;

pub struct BidirectionalOutputModule {
    target: Rc<dyn OutputTarget>,
}

impl BidirectionalOutputModule {
    pub fn new(target: Rc<dyn OutputTarget>) -> Self {
        Self { target }
    }
}

impl OutputModule for BidirectionalOutputModule {
    fn name(&self) -> &'static str {
        "BidirectionalOutputModule"
    }

    fn process(&mut self, analyzer: &Analyzer<'_>, _files: &[BindingFile]) -> crate::Result<()> {
        log::info!("starting bidirectional output module");
        for id in analyzer.wrapped_class_ids() {
            let class = analyzer.class(id);
            if !class.bidirectional {
                continue;
            }
            if class.base_types.len() != 1 {
                analyzer.log.error(format!(
                    "bidirectional class {} must have 1 base type but actually has {}",
                    class.class_name,
                    class.base_types.len()
                ));
                continue;
            }
            let Some(&base) = class.base_types.first() else {
                continue;
            };
            let base_js_name = analyzer.js_name(base);
            let contents = emit_header(analyzer, id, base);
            let filename = format!("v8toolkit_generated_bidirectional_{base_js_name}.h");
            self.target.write_file(&filename, &contents)?;
        }
        log::info!("finished bidirectional output module");
        Ok(())
    }
}

fn emit_header(analyzer: &Analyzer<'_>, id: ClassId, base: ClassId) -> String {
    let ctx = analyzer.ctx;
    let class = analyzer.class(id);
    let base_class = analyzer.class(base);
    let base_name = &base_class.class_name;
    let wrapper_name = &class.class_name;

    let mut out = String::new();
    out.push_str("#pragma once\n\n");

    // The implementation lives in this header (via macros), so it needs the
    // base chain's includes, not just the primary type's.
    let mut includes = indexmap::IndexSet::new();
    for include in class
        .include_files
        .iter()
        .chain(base_class.include_files.iter())
    {
        if include.is_empty() || Some(include) == class.my_include.as_ref() {
            continue;
        }
        includes.insert(include.clone());
    }
    for include in &includes {
        out.push_str(&format!("#include {include}\n"));
    }
    out.push('\n');

    out.push_str(&format!(
        "class {wrapper_name} : public {base_name}, public v8toolkit::JSWrapper<{base_name}> {{\npublic:\n"
    ));

    // Forward the registered bidirectional constructor's parameters after
    // the wrapper plumbing.
    let mut parameter_list = String::new();
    let mut forwarded = Vec::new();
    if let Some(constructor_ref) = base_class.bidirectional_constructor {
        let constructor = ctx.method(constructor_ref);
        for (i, param) in constructor.params.iter().enumerate() {
            let position = i + 1;
            parameter_list.push_str(&format!(
                ", {} var{}",
                crate::inspect::type_string(ctx, &param.ty),
                position
            ));
            if param.ty.is_rvalue_reference() {
                forwarded.push(format!("std::move(var{position})"));
            } else {
                forwarded.push(format!("var{position}"));
            }
        }
    }
    out.push_str(&format!(
        "    {wrapper_name}(v8::Local<v8::Context> context, v8::Local<v8::Object> object,\n"
    ));
    out.push_str(&format!(
        "        v8::Local<v8::FunctionTemplate> created_by{parameter_list}) :\n"
    ));
    out.push_str(&format!("      {base_name}({}),\n", forwarded.join(", ")));
    out.push_str(&format!(
        "      v8toolkit::JSWrapper<{base_name}>(context, object, created_by) {{}}\n\n"
    ));

    // One JS_ACCESS line per overridable virtual anywhere in the chain.
    for level in analyzer.inheritance_chain(base) {
        for function in &analyzer.class(level).member_functions {
            if !function.is_virtual || function.is_virtual_override || function.is_virtual_final {
                continue;
            }
            let constness = if function.is_const { "_CONST" } else { "" };
            let mut arguments = vec![
                function.return_type.name(ctx),
                function.js_name.clone(),
            ];
            for param in &function.parameters {
                arguments.push(param.type_info.name(ctx));
            }
            out.push_str(&format!(
                "    JS_ACCESS_{}{}({});\n",
                function.parameters.len(),
                constness,
                arguments.join(", ")
            ));
        }
    }

    out.push_str("};\n");
    out
}
