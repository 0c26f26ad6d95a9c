//! Stable identities for AST nodes.

use std::fmt;

/// An identifier for one node of the syntax tree.
///
/// `NodeId` is a lightweight handle (just a u32) that stays stable for the
/// lifetime of an [`AstTree`](crate::syntax::AstTree). It is the key every
/// memoized resolution query is indexed by, and the anchor for diagnostics.
///
/// The universal root scope has no node; it is denoted by `None` wherever an
/// `Option<NodeId>` names a scope owner.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw index.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// The slot this id occupies in the node storage.
    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_ordering_follows_creation() {
        let first = NodeId::new(3);
        let second = NodeId::new(7);

        assert!(first < second);
        assert_eq!(first.slot(), 3);
        assert_eq!(u32::from(second), 7);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::new(12).to_string(), "node#12");
        assert_eq!(format!("{:?}", NodeId::new(12)), "NodeId(12)");
    }

    #[test]
    fn test_node_id_size() {
        assert_eq!(std::mem::size_of::<NodeId>(), 4);
        assert_eq!(std::mem::size_of::<Option<NodeId>>(), 8);
    }
}
