//! AST facade: the data model delivered by the external C++ frontend.
//!
//! The generator never parses C++ itself. A frontend (a clang plugin, or a
//! test) constructs an [`AstContext`] holding every record declaration of a
//! translation unit together with the stream of [`MatchEvent`]s the matcher
//! produced. Everything is plain data: types are structural trees, record
//! references are arena ids, and doxygen comments are pre-split into their
//! block children.
//!
//! The whole context is serde-(de)serializable so the CLI can load a dump
//! written by an out-of-process frontend.

use serde::{Deserialize, Serialize};

/// Handle to a record declaration inside an [`AstContext`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct RecordId(u32);

impl RecordId {
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a class-template declaration inside an [`AstContext`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TemplateId(u32);

impl TemplateId {
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena of declarations for one translation unit.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AstContext {
    records: Vec<RecordDecl>,
    templates: Vec<ClassTemplateDecl>,
    events: Vec<MatchEvent>,
}

impl AstContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize a frontend dump.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add a record declaration; empty qualified names on its methods and
    /// fields are filled in from the record's own qualified name.
    pub fn add_record(&mut self, mut record: RecordDecl) -> RecordId {
        let prefix = record.qualified_name.clone();
        for decl in &mut record.decls {
            decl.qualify(&prefix);
        }
        let id = RecordId(self.records.len() as u32);
        self.records.push(record);
        id
    }

    pub fn add_template(&mut self, template: ClassTemplateDecl) -> TemplateId {
        let id = TemplateId(self.templates.len() as u32);
        self.templates.push(template);
        id
    }

    pub fn push_event(&mut self, event: MatchEvent) {
        self.events.push(event);
    }

    pub fn record(&self, id: RecordId) -> &RecordDecl {
        &self.records[id.index()]
    }

    pub fn template(&self, id: TemplateId) -> &ClassTemplateDecl {
        &self.templates[id.index()]
    }

    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    pub fn records(&self) -> impl Iterator<Item = (RecordId, &RecordDecl)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (RecordId(i as u32), r))
    }

    /// Resolve a (possibly forward) declaration to the record's definition.
    pub fn definition_of(&self, id: RecordId) -> Option<RecordId> {
        let decl = self.record(id);
        if decl.is_definition {
            return Some(id);
        }
        self.records()
            .find(|(_, r)| r.is_definition && r.qualified_name == decl.qualified_name)
            .map(|(found, _)| found)
    }

    /// Look up a method declaration through its stable path.
    pub fn method(&self, r: MethodRef) -> &MethodDecl {
        match &self.record(r.record).decls[r.index] {
            MemberDecl::Method(m) => m,
            MemberDecl::FunctionTemplate(ft) => &ft.method,
            MemberDecl::Using(u) => &u.target,
            other => panic!("MethodRef does not name a method: {other:?}"),
        }
    }
}

/// Stable path to a method declaration: record + position in its decl list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MethodRef {
    pub record: RecordId,
    pub index: usize,
}

/// A class-template declaration (annotations on it apply to every
/// specialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassTemplateDecl {
    pub qualified_name: String,
}

impl ClassTemplateDecl {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Class,
    Struct,
}

impl RecordKind {
    pub fn keyword(self) -> &'static str {
        match self {
            RecordKind::Class => "class",
            RecordKind::Struct => "struct",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Public,
    Protected,
    Private,
}

/// A record (class/struct) declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDecl {
    pub qualified_name: String,
    pub kind: RecordKind,
    pub is_definition: bool,
    pub is_dependent: bool,
    pub is_abstract: bool,
    /// Set when this record is a specialization of a class template.
    pub specialized_template: Option<TemplateId>,
    pub bases: Vec<BaseSpecifier>,
    pub decls: Vec<MemberDecl>,
    /// Raw annotation strings attached by the frontend.
    pub attributes: Vec<String>,
    pub comment: Option<Comment>,
    /// Verbatim `#include` spelling of the file declaring this record,
    /// quotes or angle brackets included.
    pub include_spelling: Option<String>,
}

impl RecordDecl {
    pub fn new(kind: RecordKind, qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
            is_definition: true,
            is_dependent: false,
            is_abstract: false,
            specialized_template: None,
            bases: Vec::new(),
            decls: Vec::new(),
            attributes: Vec::new(),
            comment: None,
            include_spelling: None,
        }
    }

    pub fn class(qualified_name: impl Into<String>) -> Self {
        Self::new(RecordKind::Class, qualified_name)
    }

    pub fn struct_(qualified_name: impl Into<String>) -> Self {
        Self::new(RecordKind::Struct, qualified_name)
    }

    /// Canonical name as clang would spell it, tag keyword included.
    pub fn canonical_name(&self) -> String {
        format!("{} {}", self.kind.keyword(), self.qualified_name)
    }

    pub fn forward_declaration(mut self) -> Self {
        self.is_definition = false;
        self
    }

    pub fn dependent(mut self) -> Self {
        self.is_dependent = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn specialization_of(mut self, template: TemplateId) -> Self {
        self.specialized_template = Some(template);
        self
    }

    pub fn with_base(mut self, record: RecordId) -> Self {
        self.bases.push(BaseSpecifier {
            record,
            access: Access::Public,
        });
        self
    }

    pub fn with_base_access(mut self, record: RecordId, access: Access) -> Self {
        self.bases.push(BaseSpecifier { record, access });
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.decls.push(MemberDecl::Method(method));
        self
    }

    pub fn with_function_template(mut self, template: FunctionTemplateDecl) -> Self {
        self.decls.push(MemberDecl::FunctionTemplate(template));
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.decls.push(MemberDecl::Field(field));
        self
    }

    pub fn with_enum(mut self, decl: EnumDecl) -> Self {
        self.decls.push(MemberDecl::Enum(decl));
        self
    }

    pub fn with_using(mut self, target: MethodDecl) -> Self {
        self.decls.push(MemberDecl::Using(UsingShadowDecl {
            target: Box::new(target),
        }));
        self
    }

    pub fn with_nested(mut self, record: RecordId) -> Self {
        self.decls.push(MemberDecl::Nested(record));
        self
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }

    pub fn with_include(mut self, spelling: impl Into<String>) -> Self {
        self.include_spelling = Some(spelling.into());
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.decls.iter().filter_map(|d| match d {
            MemberDecl::Method(m) => Some(m),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.decls.iter().filter_map(|d| match d {
            MemberDecl::Field(f) => Some(f),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseSpecifier {
    pub record: RecordId,
    pub access: Access,
}

/// One entry in a record's ordered declaration list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MemberDecl {
    Method(MethodDecl),
    /// A member function template; only wrappable when every template type
    /// parameter has a default.
    FunctionTemplate(FunctionTemplateDecl),
    Field(FieldDecl),
    Enum(EnumDecl),
    /// A using-declaration bringing a base-class method into scope.
    Using(UsingShadowDecl),
    Nested(RecordId),
}

impl MemberDecl {
    fn qualify(&mut self, prefix: &str) {
        match self {
            MemberDecl::Method(m) => m.qualify(prefix),
            MemberDecl::FunctionTemplate(ft) => ft.method.qualify(prefix),
            MemberDecl::Field(f) => {
                if f.qualified_name.is_empty() {
                    f.qualified_name = format!("{prefix}::{}", f.name);
                }
            }
            MemberDecl::Using(u) => u.target.qualify(prefix),
            MemberDecl::Enum(_) | MemberDecl::Nested(_) => {}
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsingShadowDecl {
    pub target: Box<MethodDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefQualifier {
    None,
    LValue,
    RValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorKind {
    /// `operator()`
    Call,
    /// `operator*`
    Star,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    Normal,
    Constructor {
        is_copy: bool,
        is_move: bool,
        is_deleted: bool,
    },
    Destructor,
    Conversion,
    Operator(OperatorKind),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub qualified_name: String,
    pub access: Access,
    pub kind: MethodKind,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_virtual_final: bool,
    pub is_virtual_override: bool,
    pub is_const: bool,
    pub is_volatile: bool,
    pub ref_qualifier: RefQualifier,
    pub return_type: QualType,
    pub params: Vec<ParamDecl>,
    pub attributes: Vec<String>,
    pub comment: Option<Comment>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: QualType) -> Self {
        Self {
            name: name.into(),
            qualified_name: String::new(),
            access: Access::Public,
            kind: MethodKind::Normal,
            is_static: false,
            is_virtual: false,
            is_pure_virtual: false,
            is_virtual_final: false,
            is_virtual_override: false,
            is_const: false,
            is_volatile: false,
            ref_qualifier: RefQualifier::None,
            return_type,
            params: Vec::new(),
            attributes: Vec::new(),
            comment: None,
        }
    }

    fn qualify(&mut self, prefix: &str) {
        if self.qualified_name.is_empty() {
            self.qualified_name = format!("{prefix}::{}", self.name);
        }
    }

    pub fn constructor(name: impl Into<String>) -> Self {
        let mut method = Self::new(name, QualType::builtin("void"));
        method.kind = MethodKind::Constructor {
            is_copy: false,
            is_move: false,
            is_deleted: false,
        };
        method
    }

    pub fn copy_constructor(name: impl Into<String>) -> Self {
        let mut method = Self::constructor(name);
        method.kind = MethodKind::Constructor {
            is_copy: true,
            is_move: false,
            is_deleted: false,
        };
        method
    }

    pub fn move_constructor(name: impl Into<String>) -> Self {
        let mut method = Self::constructor(name);
        method.kind = MethodKind::Constructor {
            is_copy: false,
            is_move: true,
            is_deleted: false,
        };
        method
    }

    pub fn deleted(mut self) -> Self {
        if let MethodKind::Constructor { is_deleted, .. } = &mut self.kind {
            *is_deleted = true;
        }
        self
    }

    pub fn destructor(name: impl Into<String>) -> Self {
        let mut method = Self::new(name, QualType::builtin("void"));
        method.kind = MethodKind::Destructor;
        method
    }

    pub fn conversion(mut self) -> Self {
        self.kind = MethodKind::Conversion;
        self
    }

    pub fn operator(mut self, op: OperatorKind) -> Self {
        self.kind = MethodKind::Operator(op);
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn virtual_(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    pub fn pure_virtual(mut self) -> Self {
        self.is_virtual = true;
        self.is_pure_virtual = true;
        self
    }

    pub fn final_(mut self) -> Self {
        self.is_virtual_final = true;
        self
    }

    pub fn override_(mut self) -> Self {
        self.is_virtual = true;
        self.is_virtual_override = true;
        self
    }

    pub fn const_(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn volatile_(mut self) -> Self {
        self.is_volatile = true;
        self
    }

    pub fn lvalue_qualified(mut self) -> Self {
        self.ref_qualifier = RefQualifier::LValue;
        self
    }

    pub fn rvalue_qualified(mut self) -> Self {
        self.ref_qualifier = RefQualifier::RValue;
        self
    }

    pub fn private_(mut self) -> Self {
        self.access = Access::Private;
        self
    }

    pub fn protected_(mut self) -> Self {
        self.access = Access::Protected;
        self
    }

    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, MethodKind::Constructor { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Empty when the parameter is unnamed in source.
    pub name: String,
    pub ty: QualType,
    /// Verbatim default-argument source slice, when present.
    pub default_argument: Option<String>,
    pub attributes: Vec<String>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: QualType) -> Self {
        Self {
            name: name.into(),
            ty,
            default_argument: None,
            attributes: Vec::new(),
        }
    }

    pub fn unnamed(ty: QualType) -> Self {
        Self::new("", ty)
    }

    pub fn with_default(mut self, source: impl Into<String>) -> Self {
        self.default_argument = Some(source.into());
        self
    }
}

/// A member function template with its template type parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionTemplateDecl {
    pub method: MethodDecl,
    pub type_params: Vec<TemplateTypeParam>,
}

impl FunctionTemplateDecl {
    pub fn new(method: MethodDecl) -> Self {
        Self {
            method,
            type_params: Vec::new(),
        }
    }

    pub fn with_type_param(mut self, name: impl Into<String>, default: Option<QualType>) -> Self {
        self.type_params.push(TemplateTypeParam {
            name: name.into(),
            default_type: default,
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateTypeParam {
    pub name: String,
    pub default_type: Option<QualType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub qualified_name: String,
    pub access: Access,
    pub ty: QualType,
    pub attributes: Vec<String>,
    pub comment: Option<Comment>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: QualType) -> Self {
        Self {
            name: name.into(),
            qualified_name: String::new(),
            access: Access::Public,
            ty,
            attributes: Vec::new(),
            comment: None,
        }
    }

    pub fn private_(mut self) -> Self {
        self.access = Access::Private;
        self
    }

    pub fn protected_(mut self) -> Self {
        self.access = Access::Protected;
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub enumerators: Vec<Enumerator>,
}

impl EnumDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enumerators: Vec::new(),
        }
    }

    pub fn with_enumerator(mut self, name: impl Into<String>, value: i64) -> Self {
        self.enumerators.push(Enumerator {
            name: name.into(),
            value,
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    pub value: i64,
}

/// A doxygen comment, pre-split into block children by the frontend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    pub children: Vec<CommentChild>,
}

impl Comment {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            children: vec![CommentChild::Paragraph(text.into())],
        }
    }

    pub fn with_paragraph(mut self, text: impl Into<String>) -> Self {
        self.children.push(CommentChild::Paragraph(text.into()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.children.push(CommentChild::Param {
            name: name.into(),
            text: text.into(),
        });
        self
    }

    pub fn with_return(mut self, text: impl Into<String>) -> Self {
        self.children.push(CommentChild::BlockCommand {
            command: "return".to_string(),
            text: text.into(),
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommentChild {
    Paragraph(String),
    /// `@param <name> <description>`
    Param { name: String, text: String },
    /// `@<command> <text>`, e.g. `@return`.
    BlockCommand { command: String, text: String },
}

/// One AST match delivered by the frontend matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// A record definition; flagged when it publicly inherits from the host
    /// marker base.
    RecordDefinition {
        record: RecordId,
        inherits_marker_base: bool,
    },
    /// A forward declaration carrying annotations, possibly describing a
    /// class template.
    AnnotatedForwardDeclaration {
        record: RecordId,
        described_template: Option<TemplateId>,
    },
    /// A typedef-like declaration (typedef or `using` alias).
    Typedef {
        name: String,
        underlying_record: Option<RecordId>,
        annotations: Vec<String>,
    },
}

/// A type as the frontend hands it over: a structural tree with local
/// const/volatile bits at every level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualType {
    pub is_const: bool,
    pub is_volatile: bool,
    pub ty: Box<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    /// A builtin type spelled canonically ("int", "double", "void", ...).
    Builtin(String),
    Record(RecordId),
    /// A typedef; stringification chases it to the underlying type while
    /// preserving local qualifiers.
    Typedef { name: String, underlying: QualType },
    Pointer(QualType),
    LValueReference(QualType),
    RValueReference(QualType),
    /// A dependent type naming a template parameter.
    TemplateParam(String),
    /// `name<args...>`; `record` links the specialization's record when the
    /// frontend instantiated one.
    TemplateSpecialization {
        name: String,
        record: Option<RecordId>,
        args: Vec<TemplateArg>,
    },
    /// `ret(params...)`, the pointee of things like `std::function<...>`.
    FunctionProto {
        return_type: QualType,
        param_types: Vec<QualType>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateArg {
    Type(QualType),
    Integral(i64),
}

impl QualType {
    fn unqualified(ty: Type) -> Self {
        Self {
            is_const: false,
            is_volatile: false,
            ty: Box::new(ty),
        }
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self::unqualified(Type::Builtin(name.into()))
    }

    pub fn void() -> Self {
        Self::builtin("void")
    }

    pub fn record(id: RecordId) -> Self {
        Self::unqualified(Type::Record(id))
    }

    pub fn template_param(name: impl Into<String>) -> Self {
        Self::unqualified(Type::TemplateParam(name.into()))
    }

    pub fn specialization(
        name: impl Into<String>,
        record: Option<RecordId>,
        args: Vec<TemplateArg>,
    ) -> Self {
        Self::unqualified(Type::TemplateSpecialization {
            name: name.into(),
            record,
            args,
        })
    }

    pub fn function_proto(return_type: QualType, param_types: Vec<QualType>) -> Self {
        Self::unqualified(Type::FunctionProto {
            return_type,
            param_types,
        })
    }

    pub fn typedef_named(self, name: impl Into<String>) -> Self {
        Self::unqualified(Type::Typedef {
            name: name.into(),
            underlying: self,
        })
    }

    pub fn pointer(self) -> Self {
        Self::unqualified(Type::Pointer(self))
    }

    pub fn lvalue_ref(self) -> Self {
        Self::unqualified(Type::LValueReference(self))
    }

    pub fn rvalue_ref(self) -> Self {
        Self::unqualified(Type::RValueReference(self))
    }

    pub fn as_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn as_volatile(mut self) -> Self {
        self.is_volatile = true;
        self
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            &*self.ty,
            Type::LValueReference(_) | Type::RValueReference(_)
        )
    }

    pub fn is_rvalue_reference(&self) -> bool {
        matches!(&*self.ty, Type::RValueReference(_))
    }

    /// The referred-to type for references, the type itself otherwise.
    pub fn non_reference(&self) -> &QualType {
        match &*self.ty {
            Type::LValueReference(inner) | Type::RValueReference(inner) => inner,
            _ => self,
        }
    }

    pub fn pointee(&self) -> Option<&QualType> {
        match &*self.ty {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether the type depends on a template parameter anywhere in its tree.
    pub fn is_dependent(&self) -> bool {
        match &*self.ty {
            Type::Builtin(_) | Type::Record(_) => false,
            Type::TemplateParam(_) => true,
            Type::Typedef { underlying, .. } => underlying.is_dependent(),
            Type::Pointer(inner) | Type::LValueReference(inner) | Type::RValueReference(inner) => {
                inner.is_dependent()
            }
            Type::TemplateSpecialization { args, .. } => args.iter().any(|arg| match arg {
                TemplateArg::Type(t) => t.is_dependent(),
                TemplateArg::Integral(_) => false,
            }),
            Type::FunctionProto {
                return_type,
                param_types,
            } => return_type.is_dependent() || param_types.iter().any(QualType::is_dependent),
        }
    }
}
