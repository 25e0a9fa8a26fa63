//! The discovery driver.
//!
//! Consumes match events from the external frontend, dispatches them into
//! the class model, and at end of translation unit runs parsing,
//! validation, partitioning and the output modules.

use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

use crate::annotations::{AnnotationSet, strings};
use crate::ast::{AstContext, RecordId};
use crate::config::Config;
use crate::host;
use crate::model::{Analyzer, FoundMethod};
use crate::output::{OutputModule, OutputTarget, default_output_modules};
use crate::partition::partition;
use crate::{Error, Result};
use wrapgen_core::ast::MatchEvent;

static STD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:class\s+|struct\s+)?std::").expect("static regex"));

static INTERNAL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:class\s+|struct\s+)?__").expect("static regex"));

pub struct Driver<'a> {
    pub analyzer: Analyzer<'a>,
    output_modules: Vec<Box<dyn OutputModule>>,
    types_to_ignore: Vec<Regex>,
    matched_events: usize,
}

impl<'a> Driver<'a> {
    pub fn new(ctx: &'a AstContext, config: Config) -> Self {
        let types_to_ignore = host::TYPES_TO_IGNORE_REGEX
            .iter()
            .map(|pattern| Regex::new(pattern).expect("host ignore regexes compile"))
            .collect();
        Self {
            analyzer: Analyzer::new(ctx, config),
            output_modules: Vec::new(),
            types_to_ignore,
            matched_events: 0,
        }
    }

    pub fn add_output_module(&mut self, module: Box<dyn OutputModule>) {
        log::info!("adding output module {}", module.name());
        self.output_modules.push(module);
    }

    pub fn with_default_output_modules(mut self, target: Rc<dyn OutputTarget>) -> Self {
        for module in default_output_modules(target) {
            self.add_output_module(module);
        }
        self
    }

    /// Feed every frontend event, then finish the translation unit.
    pub fn run(mut self) -> Result<()> {
        let ctx = self.analyzer.ctx;
        for event in ctx.events() {
            self.handle_match(event)?;
        }
        self.end_of_translation_unit()
    }

    /// Dispatch one match event into the model.
    pub fn handle_match(&mut self, event: &MatchEvent) -> Result<()> {
        self.matched_events += 1;
        if self.matched_events % 10_000 == 0 {
            log::info!("matcher results processed: {}", self.matched_events);
        }
        match event {
            MatchEvent::RecordDefinition {
                record,
                inherits_marker_base,
            } => self.handle_record_definition(*record, *inherits_marker_base),
            MatchEvent::AnnotatedForwardDeclaration {
                record,
                described_template,
            } => {
                self.handle_annotated_forward_declaration(*record, *described_template);
                Ok(())
            }
            MatchEvent::Typedef {
                name,
                underlying_record,
                annotations,
            } => {
                self.handle_typedef(name, *underlying_record, annotations);
                Ok(())
            }
        }
    }

    fn is_uninteresting_name(&self, canonical_name: &str) -> bool {
        STD_NAME.is_match(canonical_name)
            || INTERNAL_NAME.is_match(canonical_name)
            || self
                .types_to_ignore
                .iter()
                .any(|regex| regex.is_match(canonical_name))
    }

    fn handle_record_definition(
        &mut self,
        record: RecordId,
        inherits_marker_base: bool,
    ) -> Result<()> {
        let ctx = self.analyzer.ctx;
        let decl = ctx.record(record);
        let canonical_name = decl.canonical_name();
        if decl.is_dependent {
            log::info!("skipping dependent type: {canonical_name}");
            return Ok(());
        }
        if self.is_uninteresting_name(&canonical_name) {
            return Ok(());
        }

        let annotations = self.analyzer.annotations.annotations_of(ctx, record);
        let found = if inherits_marker_base {
            if annotations.has(strings::BINDINGS_NONE) {
                log::info!("skipping {canonical_name} because it's explicitly marked SKIP");
                return Ok(());
            }
            FoundMethod::Inheritance
        } else if annotations.has(strings::BINDINGS_ALL) {
            FoundMethod::Annotation
        } else {
            FoundMethod::Unspecified
        };
        log::info!("storing {canonical_name} for later processing (unless dupe)");
        self.analyzer.get_or_insert(record, found)?;
        Ok(())
    }

    /// Annotations on a class-template forward declaration apply to all of
    /// its specializations; on a plain record, to the record itself.
    fn handle_annotated_forward_declaration(
        &mut self,
        record: RecordId,
        described_template: Option<wrapgen_core::ast::TemplateId>,
    ) {
        let ctx = self.analyzer.ctx;
        let decl = ctx.record(record);
        let annotations = AnnotationSet::from_attributes(&decl.attributes);
        if decl.is_dependent && let Some(template) = described_template {
            self.analyzer
                .annotations
                .merge_into_template(template, &annotations);
        } else {
            let target = ctx.definition_of(record).unwrap_or(record);
            self.analyzer
                .annotations
                .merge_into_record(target, &annotations);
        }
    }

    fn handle_typedef(
        &mut self,
        name: &str,
        underlying_record: Option<RecordId>,
        annotations: &[String],
    ) {
        // Typedefs of primitive types are not interesting.
        let Some(record) = underlying_record else {
            return;
        };
        let ctx = self.analyzer.ctx;
        let target = ctx.definition_of(record).unwrap_or(record);
        if self.is_uninteresting_name(&ctx.record(target).canonical_name()) {
            return;
        }

        let set = AnnotationSet::from_attributes(annotations);
        self.analyzer.annotations.merge_into_record(target, &set);

        if set.has(strings::NAME_ALIAS) {
            log::info!(
                "annotated type name: {} => {}",
                ctx.record(target).qualified_name,
                name
            );
            self.analyzer.annotations.set_alias(target, name);
        }
    }

    /// End of translation unit: parse everything, validate, fail the run on
    /// any recorded error, then partition and hand the files to the output
    /// modules.
    pub fn end_of_translation_unit(mut self) -> Result<()> {
        self.analyzer.parse_all();
        self.analyzer.validate_all();

        for warning in self.analyzer.log.diagnostics().warnings() {
            log::warn!("{warning}");
        }
        if self.analyzer.log.has_errors() {
            return Err(Error::AnalysisFailed(self.analyzer.log.take()));
        }

        log::info!("about to generate output files");
        let max_declarations = self
            .analyzer
            .config
            .max_declarations_per_file()
            .unwrap_or(0);
        let files = partition(&self.analyzer, max_declarations);
        for module in &mut self.output_modules {
            module.process(&self.analyzer, &files)?;
        }

        // Output-time data errors (e.g. undumped dependencies) still fail
        // the run.
        if self.analyzer.log.has_errors() {
            return Err(Error::AnalysisFailed(self.analyzer.log.take()));
        }
        Ok(())
    }

    /// Finish analysis without running output modules; used by tests and
    /// by callers that drive output themselves.
    pub fn finish_analysis(mut self) -> Result<Analyzer<'a>> {
        self.analyzer.parse_all();
        self.analyzer.validate_all();
        if self.analyzer.log.has_errors() {
            return Err(Error::AnalysisFailed(self.analyzer.log.take()));
        }
        Ok(self.analyzer)
    }
}
