//! Bottom-up construction of [`AstTree`]s.
//!
//! Leaves are created first; every composite node adopts the nodes it is
//! given as children. Whatever is still parentless when [`AstBuilder::finish`]
//! runs must be a module and becomes a top-level module.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::kind::{AstKind, AstTag, CompoundKind, LimitationKind, Visibility};
use super::tree::{AstNode, AstTree};
use crate::base::{Interner, Name, NodeId};

/// Errors raised while assembling a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AstError {
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(SmolStr),

    #[error("{0} does not exist in this builder")]
    UnknownNode(NodeId),

    #[error("{child} already has a parent")]
    AlreadyAdopted { child: NodeId },

    #[error("{0} was never attached to a parent and is not a module")]
    Detached(NodeId),

    #[error("top-level module '{name}' is defined by both {first} and {second}")]
    DuplicateToplevelModule {
        name: SmolStr,
        first: NodeId,
        second: NodeId,
    },

    #[error("{include} cannot include {module}")]
    InvalidInclude { include: NodeId, module: NodeId },
}

/// Assembles an [`AstTree`].
///
/// ```
/// use vizscope::syntax::{AstBuilder, LimitationKind, Visibility};
///
/// let mut b = AstBuilder::new();
/// let x = b.variable("x", None)?;
/// let lib = b.module("Lib", vec![x])?;
/// let target = b.ident("Lib")?;
/// let clause = b.clause(target, LimitationKind::None, vec![])?;
/// let use_lib = b.use_stmt(Visibility::Default, vec![clause])?;
/// let app = b.module("App", vec![use_lib])?;
/// let tree = b.finish()?;
/// assert_eq!(tree.parent(use_lib), Some(app));
/// # let _ = lib;
/// # Ok::<(), vizscope::syntax::AstError>(())
/// ```
#[derive(Debug)]
pub struct AstBuilder {
    interner: Arc<Interner>,
    nodes: Vec<AstNode>,
    includes: FxHashMap<NodeId, NodeId>,
    linked: FxHashSet<NodeId>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::with_interner(Arc::new(Interner::new()))
    }

    /// Build with an interner shared with other trees or tools.
    pub fn with_interner(interner: Arc<Interner>) -> Self {
        Self {
            interner,
            nodes: Vec::new(),
            includes: FxHashMap::default(),
            linked: FxHashSet::default(),
        }
    }

    pub fn interner(&self) -> &Arc<Interner> {
        &self.interner
    }

    /// Intern an identifier after checking it is one.
    pub fn name(&self, text: &str) -> Result<Name, AstError> {
        let mut chars = text.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first == '_' || unicode_ident::is_xid_start(first))
                    && chars.all(unicode_ident::is_xid_continue)
            }
            None => false,
        };
        if !valid {
            return Err(AstError::InvalidIdentifier(SmolStr::new(text)));
        }
        Ok(self.interner.intern(text))
    }

    fn push(&mut self, kind: AstKind, children: Vec<NodeId>) -> Result<NodeId, AstError> {
        for (i, &child) in children.iter().enumerate() {
            let node = self
                .nodes
                .get(child.slot())
                .ok_or(AstError::UnknownNode(child))?;
            if node.parent.is_some() || children[..i].contains(&child) || self.linked.contains(&child)
            {
                return Err(AstError::AlreadyAdopted { child });
            }
        }

        let id = NodeId::new(self.nodes.len() as u32);
        for &child in &children {
            self.nodes[child.slot()].parent = Some(id);
        }
        self.nodes.push(AstNode {
            id,
            parent: None,
            kind,
            children,
        });
        Ok(id)
    }

    fn tag(&self, id: NodeId) -> Result<AstTag, AstError> {
        self.nodes
            .get(id.slot())
            .map(AstNode::tag)
            .ok_or(AstError::UnknownNode(id))
    }

    pub fn ident(&mut self, name: &str) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        self.push(AstKind::Identifier { name }, Vec::new())
    }

    pub fn dot(&mut self, receiver: NodeId, field: &str) -> Result<NodeId, AstError> {
        let field = self.name(field)?;
        self.push(AstKind::Dot { receiver, field }, vec![receiver])
    }

    /// `A.B.C` as nested dot expressions over an identifier.
    pub fn dotted(&mut self, path: &str) -> Result<NodeId, AstError> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut expr = self.ident(first)?;
        for segment in segments {
            expr = self.dot(expr, segment)?;
        }
        Ok(expr)
    }

    /// `symbol as rename` for an arbitrary rename expression.
    pub fn as_expr(&mut self, symbol: NodeId, rename: NodeId) -> Result<NodeId, AstError> {
        self.push(AstKind::As { symbol, rename }, vec![symbol, rename])
    }

    /// `symbol as new_name`
    pub fn rename(&mut self, symbol: NodeId, new_name: &str) -> Result<NodeId, AstError> {
        let rename = self.ident(new_name)?;
        self.as_expr(symbol, rename)
    }

    pub fn clause(
        &mut self,
        symbol: NodeId,
        limitation: LimitationKind,
        limitations: Vec<NodeId>,
    ) -> Result<NodeId, AstError> {
        let mut children = Vec::with_capacity(limitations.len() + 1);
        children.push(symbol);
        children.extend(limitations.iter().copied());
        self.push(
            AstKind::VisibilityClause {
                symbol,
                limitation,
                limitations,
            },
            children,
        )
    }

    pub fn use_stmt(
        &mut self,
        visibility: Visibility,
        clauses: Vec<NodeId>,
    ) -> Result<NodeId, AstError> {
        self.push(AstKind::Use { visibility }, clauses)
    }

    pub fn import_stmt(
        &mut self,
        visibility: Visibility,
        clauses: Vec<NodeId>,
    ) -> Result<NodeId, AstError> {
        self.push(AstKind::Import { visibility }, clauses)
    }

    pub fn variable(&mut self, name: &str, type_expr: Option<NodeId>) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        self.push(
            AstKind::Variable { name, type_expr },
            type_expr.into_iter().collect(),
        )
    }

    pub fn formal(&mut self, name: &str, type_expr: Option<NodeId>) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        self.push(
            AstKind::Formal { name, type_expr },
            type_expr.into_iter().collect(),
        )
    }

    pub fn type_query(&mut self, name: &str) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        self.push(AstKind::TypeQuery { name }, Vec::new())
    }

    /// Any expression that is not otherwise modeled.
    pub fn call(&mut self, operands: Vec<NodeId>) -> Result<NodeId, AstError> {
        self.push(AstKind::Call, operands)
    }

    /// A function; its formals and body statements become its children.
    pub fn function(
        &mut self,
        name: &str,
        formals: Vec<NodeId>,
        body: Vec<NodeId>,
    ) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        let mut children = formals;
        children.extend(body);
        self.push(AstKind::Function { name }, children)
    }

    pub fn record(&mut self, name: &str, members: Vec<NodeId>) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        self.push(AstKind::Record { name }, members)
    }

    pub fn class(&mut self, name: &str, members: Vec<NodeId>) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        self.push(AstKind::Class { name }, members)
    }

    pub fn enum_decl(&mut self, name: &str, elements: &[&str]) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        let mut children = Vec::with_capacity(elements.len());
        for element in elements {
            let element = self.name(element)?;
            children.push(self.push(AstKind::EnumElement { name: element }, Vec::new())?);
        }
        self.push(AstKind::Enum { name }, children)
    }

    pub fn tuple_decl(&mut self, components: Vec<NodeId>) -> Result<NodeId, AstError> {
        self.push(AstKind::TupleDecl, components)
    }

    pub fn multi_decl(&mut self, decls: Vec<NodeId>) -> Result<NodeId, AstError> {
        self.push(AstKind::MultiDecl, decls)
    }

    pub fn compound(
        &mut self,
        kind: CompoundKind,
        children: Vec<NodeId>,
    ) -> Result<NodeId, AstError> {
        self.push(AstKind::Compound(kind), children)
    }

    pub fn module(&mut self, name: &str, stmts: Vec<NodeId>) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        self.push(
            AstKind::Module {
                name,
                internal: false,
            },
            stmts,
        )
    }

    /// A module of the internally provided standard library.
    pub fn internal_module(&mut self, name: &str, stmts: Vec<NodeId>) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        self.push(
            AstKind::Module {
                name,
                internal: true,
            },
            stmts,
        )
    }

    /// `include module name;`
    pub fn include(&mut self, name: &str) -> Result<NodeId, AstError> {
        let name = self.name(name)?;
        self.push(AstKind::Include { name }, Vec::new())
    }

    /// Register `module` as the parsed body of `include`.
    ///
    /// The module ends up parented to whatever contains the include.
    pub fn link_include(&mut self, include: NodeId, module: NodeId) -> Result<(), AstError> {
        if !self.tag(include)?.is_include() || !self.tag(module)?.is_module() {
            return Err(AstError::InvalidInclude { include, module });
        }
        if self.nodes[module.slot()].parent.is_some() || !self.linked.insert(module) {
            return Err(AstError::AlreadyAdopted { child: module });
        }
        self.includes.insert(include, module);
        Ok(())
    }

    pub fn finish(mut self) -> Result<AstTree, AstError> {
        for (&include, &module) in &self.includes {
            let parent = self.nodes[include.slot()]
                .parent
                .ok_or(AstError::Detached(include))?;
            self.nodes[module.slot()].parent = Some(parent);
        }

        let mut roots = IndexMap::new();
        for node in &self.nodes {
            if node.parent.is_some() {
                continue;
            }
            let AstKind::Module { name, .. } = node.kind else {
                return Err(AstError::Detached(node.id));
            };
            if let Some(first) = roots.insert(name, node.id) {
                return Err(AstError::DuplicateToplevelModule {
                    name: self.interner.display(name),
                    first,
                    second: node.id,
                });
            }
        }

        Ok(AstTree {
            interner: self.interner,
            nodes: self.nodes,
            roots,
            included: self.includes,
        })
    }
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}
