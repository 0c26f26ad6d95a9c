//! Node kinds of the syntax tree.
//!
//! [`AstKind`] carries the per-kind payload; [`AstTag`] is the fieldless
//! classification the resolution engine dispatches on.

use crate::base::{Name, NodeId};

/// Declared visibility of a statement or declaration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// No visibility keyword was written.
    #[default]
    Default,
    /// `public`
    Public,
    /// `private`
    Private,
}

/// How a `use`/`import` clause limits what it brings into scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LimitationKind {
    /// `use M` / `import M.f`
    #[default]
    None,
    /// `use M except a, b`
    Except,
    /// `use M only a, b as c`
    Only,
    /// `import M.{a, b as c}`
    Braces,
}

/// Statements that own a body but are not named declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompoundKind {
    Block,
    Local,
    On,
    For,
    While,
    DoWhile,
    Forall,
    Coforall,
    Cobegin,
    Conditional,
    Select,
    Try,
}

/// Payload of one syntax-tree node.
///
/// Sub-expression handles (`symbol`, `receiver`, `type_expr`, ...) always
/// point at children of the same node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AstKind {
    Module {
        name: Name,
        /// Part of the internally provided standard library.
        internal: bool,
    },
    Function {
        name: Name,
    },
    Record {
        name: Name,
    },
    Class {
        name: Name,
    },
    Enum {
        name: Name,
    },
    EnumElement {
        name: Name,
    },
    Variable {
        name: Name,
        type_expr: Option<NodeId>,
    },
    Formal {
        name: Name,
        type_expr: Option<NodeId>,
    },
    /// A type-query pattern variable such as `?t` in `x: ?t`.
    TypeQuery {
        name: Name,
    },
    TupleDecl,
    MultiDecl,
    /// `include module M;` The parsed submodule is registered separately.
    Include {
        name: Name,
    },
    Use {
        visibility: Visibility,
    },
    Import {
        visibility: Visibility,
    },
    VisibilityClause {
        symbol: NodeId,
        limitation: LimitationKind,
        limitations: Vec<NodeId>,
    },
    Identifier {
        name: Name,
    },
    Dot {
        receiver: NodeId,
        field: Name,
    },
    As {
        symbol: NodeId,
        rename: NodeId,
    },
    Compound(CompoundKind),
    /// Any other expression; its operands are its children.
    Call,
}

/// Fieldless classification of [`AstKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AstTag {
    Module,
    Function,
    Record,
    Class,
    Enum,
    EnumElement,
    Variable,
    Formal,
    TypeQuery,
    TupleDecl,
    MultiDecl,
    Include,
    Use,
    Import,
    VisibilityClause,
    Identifier,
    Dot,
    As,
    Block,
    Local,
    On,
    For,
    While,
    DoWhile,
    Forall,
    Coforall,
    Cobegin,
    Conditional,
    Select,
    Try,
    Call,
}

impl AstKind {
    /// The tag of this kind.
    pub fn tag(&self) -> AstTag {
        match self {
            AstKind::Module { .. } => AstTag::Module,
            AstKind::Function { .. } => AstTag::Function,
            AstKind::Record { .. } => AstTag::Record,
            AstKind::Class { .. } => AstTag::Class,
            AstKind::Enum { .. } => AstTag::Enum,
            AstKind::EnumElement { .. } => AstTag::EnumElement,
            AstKind::Variable { .. } => AstTag::Variable,
            AstKind::Formal { .. } => AstTag::Formal,
            AstKind::TypeQuery { .. } => AstTag::TypeQuery,
            AstKind::TupleDecl => AstTag::TupleDecl,
            AstKind::MultiDecl => AstTag::MultiDecl,
            AstKind::Include { .. } => AstTag::Include,
            AstKind::Use { .. } => AstTag::Use,
            AstKind::Import { .. } => AstTag::Import,
            AstKind::VisibilityClause { .. } => AstTag::VisibilityClause,
            AstKind::Identifier { .. } => AstTag::Identifier,
            AstKind::Dot { .. } => AstTag::Dot,
            AstKind::As { .. } => AstTag::As,
            AstKind::Compound(compound) => match compound {
                CompoundKind::Block => AstTag::Block,
                CompoundKind::Local => AstTag::Local,
                CompoundKind::On => AstTag::On,
                CompoundKind::For => AstTag::For,
                CompoundKind::While => AstTag::While,
                CompoundKind::DoWhile => AstTag::DoWhile,
                CompoundKind::Forall => AstTag::Forall,
                CompoundKind::Coforall => AstTag::Coforall,
                CompoundKind::Cobegin => AstTag::Cobegin,
                CompoundKind::Conditional => AstTag::Conditional,
                CompoundKind::Select => AstTag::Select,
                CompoundKind::Try => AstTag::Try,
            },
            AstKind::Call => AstTag::Call,
        }
    }

    /// The declared name, for named declarations only.
    ///
    /// `Include` is not a named declaration even though it carries a name.
    pub fn decl_name(&self) -> Option<Name> {
        match self {
            AstKind::Module { name, .. }
            | AstKind::Function { name }
            | AstKind::Record { name }
            | AstKind::Class { name }
            | AstKind::Enum { name }
            | AstKind::EnumElement { name }
            | AstKind::Variable { name, .. }
            | AstKind::Formal { name, .. }
            | AstKind::TypeQuery { name } => Some(*name),
            _ => None,
        }
    }
}

impl AstTag {
    pub fn is_module(self) -> bool {
        self == AstTag::Module
    }

    pub fn is_enum(self) -> bool {
        self == AstTag::Enum
    }

    pub fn is_include(self) -> bool {
        self == AstTag::Include
    }

    /// Kinds whose contents live in a fresh identifier scope.
    pub fn indicates_new_id_scope(self) -> bool {
        matches!(
            self,
            AstTag::Module | AstTag::Function | AstTag::Record | AstTag::Class | AstTag::Enum
        )
    }

    pub fn is_simple_block_like(self) -> bool {
        matches!(self, AstTag::Block | AstTag::Local | AstTag::On)
    }

    pub fn is_loop(self) -> bool {
        matches!(
            self,
            AstTag::For | AstTag::While | AstTag::DoWhile | AstTag::Forall | AstTag::Coforall
        )
    }

    pub fn is_cobegin(self) -> bool {
        self == AstTag::Cobegin
    }

    pub fn is_conditional(self) -> bool {
        self == AstTag::Conditional
    }

    pub fn is_select(self) -> bool {
        self == AstTag::Select
    }

    pub fn is_try(self) -> bool {
        self == AstTag::Try
    }
}
