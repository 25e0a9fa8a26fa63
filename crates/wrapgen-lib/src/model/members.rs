//! Parsed data members and enums, including PIMPL hoisting.

use indexmap::IndexSet;

use crate::annotations::{AnnotationSet, strings};
use crate::inspect::{TypeInfo, dereferenced_type, type_string};
use crate::model::functions::trim_doxygen_comment_whitespace;
use crate::model::{Analyzer, ClassId, ExportType, FoundMethod, get_export_type};
use wrapgen_core::ast::{Access, Comment, CommentChild, FieldDecl, MemberDecl};

/// A field exposed to JavaScript.
#[derive(Debug, Clone)]
pub struct DataMember {
    /// The class whose wrapper exposes the member.
    pub class: ClassId,
    /// Where the field is actually declared; may be an ancestor of `class`.
    pub declared_in: ClassId,
    pub short_name: String,
    pub long_name: String,
    pub type_info: TypeInfo,
    /// Whether the *wrapping* is const, not necessarily the C++ type: a
    /// const type, a readonly annotation, or a readonly typedef all count.
    pub is_const: bool,
    pub comment: String,
    pub js_name: String,
    pub annotations: AnnotationSet,
    /// Index into the owning class's `pimpl_members` when the field is
    /// reached through a PIMPL indirection. One level only.
    pub accessed_through: Option<usize>,
}

/// A nested enum and its elements.
#[derive(Debug, Clone)]
pub struct Enum {
    pub name: String,
    pub elements: Vec<EnumElement>,
}

#[derive(Debug, Clone)]
pub struct EnumElement {
    pub name: String,
    pub value: i64,
}

/// First description paragraph of a doxygen comment, trimmed.
pub(crate) fn first_paragraph(comment: &Comment) -> String {
    for child in &comment.children {
        if let CommentChild::Paragraph(text) = child {
            return trim_doxygen_comment_whitespace(text);
        }
    }
    String::new()
}

impl Analyzer<'_> {
    fn build_data_member(
        &self,
        class: ClassId,
        declared_in: ClassId,
        field: &FieldDecl,
    ) -> DataMember {
        let annotations = AnnotationSet::from_attributes(&field.attributes);
        let type_info = TypeInfo::new(field.ty.clone());
        let class_name = &self.class(class).class_name;

        let mut is_const = type_info.is_const() || annotations.has(strings::READONLY);
        // A readonly annotation can also arrive through a typedef naming the
        // member's record type.
        if let Some(record) = type_info.plain_type_decl()
            && let Some(merged) = self.annotations.record_annotations(record)
            && merged.has(strings::READONLY)
        {
            is_const = true;
        }

        let comment = field.comment.as_ref().map(first_paragraph).unwrap_or_default();

        let js_name = if let Some(from_config) =
            self.config.member_name(class_name, &field.qualified_name)
        {
            from_config.to_string()
        } else if let Some(annotated) = annotations
            .with_tail(strings::USE_NAME_PREFIX)
            .into_iter()
            .next()
        {
            annotated
        } else {
            field.name.clone()
        };

        DataMember {
            class,
            declared_in,
            short_name: field.name.clone(),
            long_name: field.qualified_name.clone(),
            type_info,
            is_const,
            comment,
            js_name,
            annotations,
            accessed_through: None,
        }
    }

    /// Parse data members across the inheritance chain, treating declared
    /// PIMPL fields specially: the field's dereferenced type must resolve
    /// to a known class, whose own members are then hoisted into this
    /// class's member namespace. Idempotent.
    pub fn parse_members(&mut self, id: ClassId) {
        if self.class(id).members_parsed {
            return;
        }
        self.class_mut(id).members_parsed = true;

        if self.class(id).record.is_none() {
            return;
        }
        let ctx = self.ctx;
        let log = self.log.clone();
        let _guard = log.capture(self.class(id).errors.clone());
        let class_name = self.class(id).class_name.clone();

        let mut members: Vec<DataMember> = Vec::new();
        let mut pimpl_members: Vec<DataMember> = Vec::new();
        let mut pimpl_includes: IndexSet<String> = IndexSet::new();
        let mut pimpl_targets: Vec<Option<ClassId>> = Vec::new();

        for level_id in self.inheritance_chain(id) {
            let Some(level_record) = self.class(level_id).record else {
                continue;
            };
            for member in &ctx.record(level_record).decls {
                let MemberDecl::Field(field) = member else {
                    continue;
                };
                let field_annotations = AnnotationSet::from_attributes(&field.attributes);

                if field_annotations.has(strings::PIMPL)
                    && !self
                        .class(id)
                        .is_declared_pimpl_name(&field.name, &field.qualified_name)
                {
                    self.class_mut(id)
                        .pimpl_member_names
                        .push(field.qualified_name.clone());
                }

                if level_id == id
                    && self
                        .class(id)
                        .is_declared_pimpl_name(&field.name, &field.qualified_name)
                {
                    let data_member = self.build_data_member(id, level_id, field);
                    let underlying = dereferenced_type(ctx, &field.ty);
                    let target = TypeInfo::new(underlying.clone())
                        .plain_type_decl()
                        .and_then(|record| self.get_by_record(record));
                    let Some(target) = target else {
                        log.error(format!(
                            "pimpl type {} for class {} not found in wrapped classes",
                            type_string(ctx, &underlying),
                            class_name
                        ));
                        continue;
                    };
                    pimpl_includes.extend(data_member.type_info.root_includes(ctx));
                    pimpl_members.push(data_member);
                    pimpl_targets.push(Some(target));
                    self.class_mut(target).found_method = FoundMethod::Pimpl;
                    continue;
                }

                match self
                    .config
                    .member_skip(&class_name, &field.qualified_name)
                {
                    Some(true) => continue,
                    Some(false) => {}
                    None => {
                        if field_annotations.has(strings::BINDINGS_NONE) {
                            continue;
                        }
                    }
                }

                let export_type = get_export_type(
                    &log,
                    &field_annotations,
                    &field.qualified_name,
                    ExportType::All,
                );
                if export_type == ExportType::None {
                    continue;
                }

                if field.access != Access::Public {
                    let only_pimpl =
                        field_annotations.len() == 1 && field_annotations.has(strings::PIMPL);
                    if !field_annotations.is_empty() && !only_pimpl {
                        log.error(format!(
                            "Annotation on non-public member: {}",
                            field.qualified_name
                        ));
                    }
                    continue;
                }

                members.push(self.build_data_member(id, level_id, field));
            }
        }

        let member_records: Vec<_> = members
            .iter()
            .filter_map(|m| m.type_info.plain_type_decl())
            .collect();
        self.note_used_classes(id, &member_records);

        let added = (members.len() + pimpl_members.len()) as u32;
        {
            let class = self.class_mut(id);
            class.members = members;
            class.pimpl_members = pimpl_members;
            class.include_files.extend(pimpl_includes);
            class.declaration_count += added;
        }

        // Every declared PIMPL name must have resolved to an actual field.
        let expected = self.class(id).pimpl_member_names.len();
        let found = self.class(id).pimpl_members.len();
        if expected != found {
            log.error(format!(
                "Mismatched number of pimpl members specified vs found in {}: {} specified vs {} found",
                self.class(id).short_name,
                expected,
                found
            ));
        }

        // No two PIMPL fields may share an underlying type; there is no way
        // to pick different JS names based on the traversal.
        let mut seen_types = IndexSet::new();
        for pimpl_member in &self.class(id).pimpl_members {
            let spelled = type_string(ctx, pimpl_member.type_info.qual_type());
            if !seen_types.insert(spelled.clone()) {
                log.error(format!(
                    "multiple pimpl types in {class_name} have the same underlying type: {spelled}"
                ));
            }
        }

        // Hoist the target classes' members into this class.
        for (index, target) in pimpl_targets.iter().enumerate() {
            let Some(target) = *target else { continue };
            let pimpl_long_name = self.class(id).pimpl_members[index].long_name.clone();

            // The target is typically not wrapped itself, so its members
            // need an explicit parse.
            self.parse_members(target);

            if self.class(target).members.is_empty() {
                log.warn(format!(
                    "Pimpl member type has no members: {}",
                    self.class(target).class_name
                ));
            }

            match &self.class(target).pimpl_target_of {
                Some(existing) if *existing != pimpl_long_name => {
                    log.error(format!(
                        "Pimpl member / class already used as pimpl for something else - not allowed: {pimpl_long_name}"
                    ));
                    continue;
                }
                _ => {}
            }
            self.class_mut(target).pimpl_target_of = Some(pimpl_long_name);

            let mut hoisted: Vec<DataMember> = self
                .class(target)
                .members
                .iter()
                .filter(|m| m.accessed_through.is_none())
                .cloned()
                .collect();
            for member in &mut hoisted {
                member.class = id;
                member.accessed_through = Some(index);
            }
            self.class_mut(id).members.extend(hoisted);
        }
    }

    /// Parse nested enum declarations. Idempotent.
    pub fn parse_enums(&mut self, id: ClassId) {
        if self.class(id).enums_parsed {
            return;
        }
        self.class_mut(id).enums_parsed = true;

        let Some(record) = self.class(id).record else {
            return;
        };
        let mut enums = Vec::new();
        for member in &self.ctx.record(record).decls {
            let MemberDecl::Enum(decl) = member else {
                continue;
            };
            enums.push(Enum {
                name: decl.name.clone(),
                elements: decl
                    .enumerators
                    .iter()
                    .map(|e| EnumElement {
                        name: e.name.clone(),
                        value: e.value,
                    })
                    .collect(),
            });
        }
        self.class_mut(id).enums = enums;
    }
}
