//! Immutable syntax tree storage.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::kind::{AstKind, AstTag};
use crate::base::{Interner, Name, NodeId};

/// One node of the syntax tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstNode {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: AstKind,
    pub(crate) children: Vec<NodeId>,
}

impl AstNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The parent node; `None` for top-level modules.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &AstKind {
        &self.kind
    }

    pub fn tag(&self) -> AstTag {
        self.kind.tag()
    }

    /// Direct children in source order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A complete, immutable syntax tree.
///
/// Built by [`AstBuilder`](super::AstBuilder). The resolution engine only
/// reads from it: node lookup by id, parent lookup, child iteration, the
/// top-level module table and the `include` → submodule mapping.
#[derive(Debug)]
pub struct AstTree {
    pub(crate) interner: Arc<Interner>,
    pub(crate) nodes: Vec<AstNode>,
    /// Top-level modules by name, in registration order.
    pub(crate) roots: IndexMap<Name, NodeId>,
    pub(crate) included: FxHashMap<NodeId, NodeId>,
}

impl AstTree {
    /// The interner every [`Name`] in this tree comes from.
    pub fn interner(&self) -> &Arc<Interner> {
        &self.interner
    }

    pub fn node(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id.slot())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.slot() < self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<&AstKind> {
        self.node(id).map(AstNode::kind)
    }

    pub fn tag(&self, id: NodeId) -> Option<AstTag> {
        self.node(id).map(AstNode::tag)
    }

    /// Parent of a node. `None` for top-level modules and unknown ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(AstNode::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(AstNode::children).unwrap_or_default()
    }

    /// Name of an identifier node.
    pub fn identifier_name(&self, id: NodeId) -> Option<Name> {
        match self.kind(id)? {
            AstKind::Identifier { name } => Some(*name),
            _ => None,
        }
    }

    /// Find a top-level module by name.
    pub fn toplevel_module(&self, name: Name) -> Option<NodeId> {
        self.roots.get(&name).copied()
    }

    pub fn num_toplevel_modules(&self) -> usize {
        self.roots.len()
    }

    /// The parsed body of the submodule an `include` refers to.
    pub fn included_submodule(&self, include: NodeId) -> Option<NodeId> {
        self.included.get(&include).copied()
    }

    /// Whether the node sits inside (or is) a module of the internally
    /// provided standard library.
    pub fn is_in_internal_module(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if let Some(AstKind::Module { internal: true, .. }) = self.kind(cur) {
                return true;
            }
            current = self.parent(cur);
        }
        false
    }

    /// Iterate over every node in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &AstNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
