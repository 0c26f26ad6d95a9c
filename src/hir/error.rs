//! Errors returned by the resolution entry points.

use crate::base::NodeId;

/// Misuse of the public API.
///
/// Problems in the program being resolved are never reported this way; they
/// become [`Diagnostic`](super::Diagnostic)s.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The id does not belong to the tree this context resolves.
    #[error("{0} is not a node of this syntax tree")]
    UnknownNode(NodeId),
}
