//! The JavaScript stub output module.
//!
//! Emits `js-api.js`: a configured header followed by one JSDoc-annotated
//! ES-class shell per wrapped class, for IDE consumption. Bidirectional
//! wrappers and template specializations are omitted, as are call
//! operators and virtual overrides.

use std::rc::Rc;

use crate::model::{Analyzer, ClassFunction, ClassId};
use crate::output::{OutputModule, OutputTarget};
use crate::partition::BindingFile;

pub const STUB_FILE_NAME: &str = "js-api.js";

pub struct JavascriptStubOutputModule {
    target: Rc<dyn OutputTarget>,
}

impl JavascriptStubOutputModule {
    pub fn new(target: Rc<dyn OutputTarget>) -> Self {
        Self { target }
    }
}

impl OutputModule for JavascriptStubOutputModule {
    fn name(&self) -> &'static str {
        "JavascriptStubOutputModule"
    }

    fn process(&mut self, analyzer: &Analyzer<'_>, files: &[BindingFile]) -> crate::Result<()> {
        log::info!("starting JavaScript stub output module");
        let mut out = String::new();
        if let Some(header) = analyzer.config.js_stub_header() {
            out.push_str(header);
            out.push('\n');
        }

        for file in files {
            for &id in &file.classes {
                let class = analyzer.class(id);
                if class.bidirectional || class.is_template_specialization(analyzer.ctx) {
                    continue;
                }
                emit_class(analyzer, id, &mut out);
            }
        }

        self.target.write_file(STUB_FILE_NAME, &out)
    }
}

fn emit_class(analyzer: &Analyzer<'_>, id: ClassId, out: &mut String) {
    let ctx = analyzer.ctx;
    let class = analyzer.class(id);
    let name = analyzer.js_name(id);

    out.push_str("/**\n");
    if !class.comment.is_empty() {
        out.push_str(&format!(" * {}\n", class.comment));
    }
    out.push_str(&format!(" * @class {name}\n"));
    for member in &class.members {
        let jsdoc_type = member.type_info.jsdoc_type_name(ctx, &analyzer.jsdoc);
        out.push_str(&format!(
            " * @property {{{}}} {}{}\n",
            jsdoc_type,
            member.js_name,
            comment_suffix(&member.comment)
        ));
    }
    out.push_str(" */\n");

    let inheritance = match class.base_types.first() {
        Some(&base) => format!(" extends {}", analyzer.js_name(base)),
        None => String::new(),
    };
    out.push_str(&format!("class {name}{inheritance}\n{{\n"));

    for constructor in &class.constructors {
        emit_function_comment(analyzer, constructor, false, out);
        out.push_str(&format!(
            "    constructor({}) {{}}\n",
            constructor.js_input_parameter_string()
        ));
    }

    for function in &class.member_functions {
        if function.is_virtual_override {
            continue;
        }
        emit_function_comment(analyzer, function, true, out);
        out.push_str(&format!(
            "    {}({}) {{}}\n",
            function.js_name,
            function.js_input_parameter_string()
        ));
    }

    for function in &class.static_functions {
        emit_function_comment(analyzer, function, true, out);
        out.push_str(&format!(
            "    static {}({}) {{}}\n",
            function.js_name,
            function.js_input_parameter_string()
        ));
    }

    out.push_str(&format!("}} // end class {name}\n\n"));
}

fn emit_function_comment(
    analyzer: &Analyzer<'_>,
    function: &ClassFunction,
    with_return: bool,
    out: &mut String,
) {
    let ctx = analyzer.ctx;
    out.push_str("    /**\n");
    if !function.comment.is_empty() {
        out.push_str(&format!("     * {}\n", function.comment));
    }
    for param in &function.parameters {
        let jsdoc_type = param.type_info.jsdoc_type_name(ctx, &analyzer.jsdoc);
        if param.default_value.is_empty() {
            out.push_str(&format!(
                "     * @param {{{}}} {}{}\n",
                jsdoc_type,
                param.name,
                comment_suffix(&param.description)
            ));
        } else {
            out.push_str(&format!(
                "     * @param {{{}}} [{} = {}]{}\n",
                jsdoc_type,
                param.name,
                param.default_value,
                comment_suffix(&param.description)
            ));
        }
    }
    if with_return {
        out.push_str(&format!(
            "     * @return {{{}}}{}\n",
            function.return_type.jsdoc_type_name(ctx, &analyzer.jsdoc),
            comment_suffix(&function.return_type_comment)
        ));
    }
    out.push_str("     */\n");
}

fn comment_suffix(comment: &str) -> String {
    if comment.is_empty() {
        String::new()
    } else {
        format!(" {comment}")
    }
}
