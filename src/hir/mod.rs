//! Scope and visibility resolution over an [`AstTree`](crate::syntax::AstTree).
//!
//! ## Design Principles
//!
//! 1. **Lazy**: scopes, `use`/`import` clauses and POI scopes are built the
//!    first time a query needs them
//! 2. **Memoized**: every query is cached by its arguments in the
//!    [`ResolveContext`], so the same question yields the same handle
//! 3. **Arena-owned**: scopes refer to their parents by [`ScopeId`], never by
//!    owning reference
//!
//! ## Usage
//!
//! ```
//! use vizscope::hir::{LookupConfig, ResolveContext};
//! use vizscope::syntax::{AstBuilder, LimitationKind, Visibility};
//!
//! let mut b = AstBuilder::new();
//! let x = b.variable("x", None)?;
//! b.module("Lib", vec![x])?;
//! let target = b.ident("Lib")?;
//! let clause = b.clause(target, LimitationKind::None, vec![])?;
//! let use_lib = b.use_stmt(Visibility::Default, vec![clause])?;
//! let app = b.module("App", vec![use_lib])?;
//! let tree = b.finish()?;
//!
//! let mut ctx = ResolveContext::new(&tree);
//! let scope = ctx.scope_for_id(app)?;
//! let name = tree.interner().intern("x");
//! let found = ctx.lookup_name_in_scope(scope, None, name, LookupConfig::ALL_VISIBLE);
//! assert_eq!(found.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builtins;
mod context;
mod diagnostics;
mod error;
mod ids;
mod poi;
mod query;
mod resolve;
mod scope;
mod visibility;

pub use builtins::BUILTIN_TYPE_NAMES;
pub use context::{ContextConfig, ResolveContext};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, VisibilityStmtKind, codes};
pub use error::ResolveError;
pub use ids::{DeclId, PoiScopeId, ScopeId};
pub use poi::PoiScope;
pub use query::{QueryCache, QueryState};
pub use resolve::{InnermostMatch, LookupConfig, MatchesFound};
pub use scope::{DeclMap, GatheredDecls, IdsWithName, Scope, creates_scope, gather_decls_within};
pub use visibility::{ResolvedVisibilityScope, VisibilityClause, VisibilityKind};
