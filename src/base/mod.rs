//! Foundation types for the resolution engine.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`NodeId`] - Stable syntax-tree node identities
//! - [`Name`], [`Interner`] - String interning
//!
//! This module has NO dependencies on other vizscope modules.

mod intern;
mod node_id;

pub use intern::{Interner, Name};
pub use node_id::NodeId;
