//! The syntax layer consumed by the resolution engine.
//!
//! Parsing is out of scope; trees are assembled with [`AstBuilder`] by a
//! parser front end or directly by tests. Once finished, an [`AstTree`] is
//! immutable and every node keeps a stable [`NodeId`](crate::base::NodeId).

mod builder;
mod kind;
mod tree;

pub use builder::{AstBuilder, AstError};
pub use kind::{AstKind, AstTag, CompoundKind, LimitationKind, Visibility};
pub use tree::{AstNode, AstTree};
