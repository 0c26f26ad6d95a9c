//! Handles into the resolution arenas, and declaration identities.

use std::fmt;

use la_arena::Idx;

use super::poi::PoiScope;
use super::scope::Scope;
use crate::base::{Name, NodeId};

/// Handle of a [`Scope`] in its context's arena.
///
/// Two handles are equal iff they denote the same scope object, so handle
/// equality is scope identity.
pub type ScopeId = Idx<Scope>;

/// Handle of a [`PoiScope`] in its context's arena.
pub type PoiScopeId = Idx<PoiScope>;

/// Identity of one declaration a name can resolve to.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum DeclId {
    /// A declaration that exists in the syntax tree.
    Node(NodeId),
    /// A builtin type of the root scope; it has no syntax.
    Builtin(Name),
}

impl DeclId {
    /// The backing node, for declarations that have one.
    pub fn node(self) -> Option<NodeId> {
        match self {
            DeclId::Node(id) => Some(id),
            DeclId::Builtin(_) => None,
        }
    }

    pub fn is_builtin(self) -> bool {
        matches!(self, DeclId::Builtin(_))
    }
}

impl From<NodeId> for DeclId {
    fn from(id: NodeId) -> Self {
        DeclId::Node(id)
    }
}

impl fmt::Debug for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclId::Node(id) => write!(f, "Decl({})", id.index()),
            DeclId::Builtin(name) => write!(f, "Builtin({})", name.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decl_id_node() {
        let decl = DeclId::from(NodeId::new(9));
        assert_eq!(decl.node(), Some(NodeId::new(9)));
        assert!(!decl.is_builtin());

        let builtin = DeclId::Builtin(Name::from_raw(2));
        assert_eq!(builtin.node(), None);
        assert!(builtin.is_builtin());
    }

    #[test]
    fn test_handles_are_arena_indices() {
        let mut scopes = la_arena::Arena::new();
        let root = scopes.alloc(Scope::root(Vec::<Name>::new()));
        let again = scopes.alloc(Scope::root(Vec::<Name>::new()));

        assert_ne!(root, again);
        assert!(root < again);
        assert_eq!(u32::from(again.into_raw()), 1);
        assert_eq!(std::mem::size_of::<ScopeId>(), 4);
    }
}
