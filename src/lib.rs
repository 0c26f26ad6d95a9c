//! # vizscope-base
//!
//! Scope construction, `use`/`import` visibility and point-of-instantiation
//! lookup for a compiler front end.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! hir     → Scopes, visibility clauses, lookup, POI scopes
//!   ↓
//! syntax  → Immutable syntax tree + builder
//!   ↓
//! base    → Primitives (NodeId, Name interning)
//! ```

/// Foundation types: NodeId, Name interning
pub mod base;

/// Scope and visibility resolution engine
pub mod hir;

/// The syntax tree the engine resolves over
pub mod syntax;

// Re-export foundation types
pub use base::{Interner, Name, NodeId};
