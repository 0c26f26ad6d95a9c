//! The compilation context: arenas, memo tables and the scope builder.
//!
//! A [`ResolveContext`] borrows one [`AstTree`] and owns everything derived
//! from it. Scopes, POI scopes and visibility results are append-only for
//! the lifetime of the context (or until [`ResolveContext::invalidate`]).

use std::sync::Arc;

use la_arena::Arena;
use smol_str::SmolStr;

use super::builtins::BUILTIN_TYPE_NAMES;
use super::diagnostics::{Diagnostic, DiagnosticCollector};
use super::error::ResolveError;
use super::ids::{PoiScopeId, ScopeId};
use super::poi::PoiScope;
use super::query::QueryCache;
use super::resolve::InnermostMatch;
use super::scope::{GatheredDecls, Scope, creates_scope, gather_decls_within};
use super::visibility::ResolvedVisibilityScope;
use crate::base::{Interner, Name, NodeId};
use crate::syntax::{AstKind, AstTag, AstTree};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Knobs fixed for the lifetime of one context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextConfig {
    /// Top-level module every non-internal module sees automatically.
    pub auto_module: SmolStr,
    /// Names the root scope is populated with.
    pub builtin_types: Vec<SmolStr>,
    /// Record the type system handles itself; never gathered.
    pub tuple_record_name: SmolStr,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            auto_module: SmolStr::new_static("Standard"),
            builtin_types: BUILTIN_TYPE_NAMES
                .iter()
                .map(|&name| SmolStr::new_static(name))
                .collect(),
            tuple_record_name: SmolStr::new_static("_tuple"),
        }
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Resolution state for one syntax tree.
///
/// Every query is memoized by its arguments, so asking the same question
/// twice returns the same handle.
#[derive(Debug)]
pub struct ResolveContext<'a> {
    pub(crate) tree: &'a AstTree,
    config: ContextConfig,
    auto_module_name: Name,
    tuple_record_name: Name,
    builtin_names: Vec<Name>,

    pub(crate) scopes: Arena<Scope>,
    pub(crate) poi_scopes: Arena<PoiScope>,

    scope_for_id_cache: QueryCache<NodeId, ScopeId>,
    constructed_scopes: QueryCache<Option<NodeId>, ScopeId>,
    auto_module_scope: Option<Option<ScopeId>>,
    pub(crate) visibility_cache: QueryCache<ScopeId, Arc<ResolvedVisibilityScope>>,
    pub(crate) constructed_pois: QueryCache<(Option<ScopeId>, Option<PoiScopeId>), PoiScopeId>,
    pub(crate) poi_cache: QueryCache<(ScopeId, Option<PoiScopeId>), PoiScopeId>,
    pub(crate) innermost_cache: QueryCache<(ScopeId, Name), InnermostMatch>,

    pub(crate) diagnostics: DiagnosticCollector,
}

impl<'a> ResolveContext<'a> {
    pub fn new(tree: &'a AstTree) -> Self {
        Self::with_config(tree, ContextConfig::default())
    }

    pub fn with_config(tree: &'a AstTree, config: ContextConfig) -> Self {
        let interner = tree.interner();
        let builtin_names = config
            .builtin_types
            .iter()
            .map(|name| interner.intern(name))
            .collect();
        Self {
            tree,
            auto_module_name: interner.intern(&config.auto_module),
            tuple_record_name: interner.intern(&config.tuple_record_name),
            builtin_names,
            config,
            scopes: Arena::new(),
            poi_scopes: Arena::new(),
            scope_for_id_cache: QueryCache::new(),
            constructed_scopes: QueryCache::new(),
            auto_module_scope: None,
            visibility_cache: QueryCache::new(),
            constructed_pois: QueryCache::new(),
            poi_cache: QueryCache::new(),
            innermost_cache: QueryCache::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    pub fn tree(&self) -> &'a AstTree {
        self.tree
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn interner(&self) -> &Arc<Interner> {
        self.tree.interner()
    }

    /// The scope behind a handle.
    ///
    /// # Panics
    ///
    /// If the handle was issued before the last [`invalidate`](Self::invalidate)
    /// or by another context. Use [`get_scope`](Self::get_scope) for handles
    /// of unknown origin.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// The scope behind a handle, or `None` if this context never issued it.
    pub fn get_scope(&self, id: ScopeId) -> Option<&Scope> {
        let index = u32::from(id.into_raw()) as usize;
        (index < self.scopes.len()).then(|| &self.scopes[id])
    }

    /// Number of scope objects built so far.
    pub fn num_scopes(&self) -> usize {
        self.scopes.len()
    }

    /// Drop every derived result.
    ///
    /// The next query recomputes from the syntax tree. Handles obtained
    /// earlier must not be used afterwards.
    pub fn invalidate(&mut self) {
        tracing::debug!(
            "[SCOPE] invalidating {} scopes, {} poi scopes",
            self.scopes.len(),
            self.poi_scopes.len()
        );
        self.scopes = Arena::new();
        self.poi_scopes = Arena::new();
        self.scope_for_id_cache.clear();
        self.constructed_scopes.clear();
        self.auto_module_scope = None;
        self.visibility_cache.clear();
        self.constructed_pois.clear();
        self.poi_cache.clear();
        self.innermost_cache.clear();
        self.diagnostics.clear();
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    /// Every diagnostic reported so far, in report order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.diagnostics()
    }

    pub fn diagnostics_for_node(&self, node: NodeId) -> Vec<&Diagnostic> {
        self.diagnostics.for_node(node).collect()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    // ------------------------------------------------------------------------
    // Scope builder
    // ------------------------------------------------------------------------

    /// The scope a node's contents are resolved in.
    ///
    /// Nodes that do not create a scope, or whose scope would be empty,
    /// share the scope of their nearest ancestor that has one.
    pub fn scope_for_id(&mut self, id: NodeId) -> Result<ScopeId, ResolveError> {
        if !self.tree.contains(id) {
            return Err(ResolveError::UnknownNode(id));
        }
        Ok(self.scope_for_node(id))
    }

    /// The scope of a module, enum or `include` that was found as the
    /// target of a `use`/`import`.
    pub fn scope_for_module(&mut self, id: NodeId) -> Result<ScopeId, ResolveError> {
        self.scope_for_id(id)
    }

    /// The universal root scope holding the builtin types.
    pub fn root_scope(&mut self) -> ScopeId {
        if let Some(&root) = self.constructed_scopes.get(&None) {
            return root;
        }
        let root = self.scopes.alloc(Scope::root(self.builtin_names.iter().copied()));
        tracing::debug!(
            "[SCOPE] built root scope with {} builtins",
            self.builtin_names.len()
        );
        self.constructed_scopes.finish(None, root);
        root
    }

    /// The nearest module-kind scope at or above `scope`.
    pub fn module_scope_of(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(cur) = current {
            let s = self.scope(cur);
            if s.is_module() {
                return Some(cur);
            }
            current = s.parent();
        }
        None
    }

    /// The scope of the automatically used standard module, if the tree
    /// has one.
    pub(crate) fn scope_for_auto_module(&mut self) -> Option<ScopeId> {
        if let Some(scope) = self.auto_module_scope {
            return scope;
        }
        let scope = self
            .tree
            .toplevel_module(self.auto_module_name)
            .map(|module| self.scope_for_node(module));
        self.auto_module_scope = Some(scope);
        scope
    }

    pub(crate) fn scope_for_node(&mut self, id: NodeId) -> ScopeId {
        if let Some(&scope) = self.scope_for_id_cache.get(&id) {
            return scope;
        }
        let scope = self.compute_scope_for_node(id);
        self.scope_for_id_cache.finish(id, scope);
        scope
    }

    fn compute_scope_for_node(&mut self, id_in: NodeId) -> ScopeId {
        let tree = self.tree;
        let Some(mut tag) = tree.tag(id_in) else {
            tracing::error!("[SCOPE] no syntax node for {}", id_in);
            return self.root_scope();
        };

        let mut id = id_in;
        if tag.is_include() {
            match tree.included_submodule(id_in).and_then(|sub| Some((sub, tree.tag(sub)?))) {
                Some((sub, sub_tag)) => {
                    id = sub;
                    tag = sub_tag;
                }
                None => {
                    tracing::warn!("[SCOPE] include {} has no parsed submodule", id_in);
                    self.diagnostics.add(Diagnostic::warning(
                        id_in,
                        "could not find the submodule named by 'include'",
                    ));
                }
            }
        }

        if creates_scope(tag) {
            let gathered = gather_decls_within(tree, id, Some(self.tuple_record_name));
            if tag.indicates_new_id_scope() || !gathered.is_trivial() {
                return self.construct_scope(id, tag, gathered);
            }
        }

        match tree.parent(id) {
            Some(parent) => self.scope_for_node(parent),
            None => self.root_scope(),
        }
    }

    fn construct_scope(&mut self, id: NodeId, tag: AstTag, gathered: GatheredDecls) -> ScopeId {
        if let Some(&scope) = self.constructed_scopes.get(&Some(id)) {
            return scope;
        }

        let tree = self.tree;
        let parent = match tree.parent(id) {
            Some(parent) => self.scope_for_node(parent),
            None => self.root_scope(),
        };
        let auto_uses_modules =
            matches!(tree.kind(id), Some(AstKind::Module { .. })) && !tree.is_in_internal_module(id);

        let num_decls = gathered.declared.len();
        let scope = self.scopes.alloc(Scope::new(id, tag, parent, auto_uses_modules, gathered));
        tracing::debug!(
            "[SCOPE] built {:?} for {} ({:?}, {} names, parent {:?})",
            scope,
            id,
            tag,
            num_decls,
            parent
        );
        self.constructed_scopes.finish(Some(id), scope);
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{AstBuilder, CompoundKind, LimitationKind, Visibility};

    #[test]
    fn test_empty_block_reuses_parent_scope() {
        let mut b = AstBuilder::new();
        let inner = b.compound(CompoundKind::Block, vec![]).unwrap();
        let outer = b.compound(CompoundKind::While, vec![inner]).unwrap();
        let f = b.function("f", vec![], vec![outer]).unwrap();
        b.module("M", vec![f]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);

        let fn_scope = ctx.scope_for_id(f).unwrap();
        assert_eq!(ctx.scope_for_id(inner).unwrap(), fn_scope);
        assert_eq!(ctx.scope_for_id(outer).unwrap(), fn_scope);
    }

    #[test]
    fn test_block_with_decls_gets_scope() {
        let mut b = AstBuilder::new();
        let x = b.variable("x", None).unwrap();
        let block = b.compound(CompoundKind::Block, vec![x]).unwrap();
        let m = b.module("M", vec![block]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);

        let block_scope = ctx.scope_for_id(block).unwrap();
        let module_scope = ctx.scope_for_id(m).unwrap();
        assert_ne!(block_scope, module_scope);
        assert_eq!(ctx.scope(block_scope).parent(), Some(module_scope));
        assert_eq!(ctx.scope_for_id(x).unwrap(), block_scope);
    }

    #[test]
    fn test_block_with_only_use_gets_scope() {
        let mut b = AstBuilder::new();
        let target = b.ident("M").unwrap();
        let clause = b.clause(target, LimitationKind::None, vec![]).unwrap();
        let use_stmt = b.use_stmt(Visibility::Default, vec![clause]).unwrap();
        let block = b.compound(CompoundKind::Block, vec![use_stmt]).unwrap();
        let m = b.module("M", vec![block]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);

        let block_scope = ctx.scope_for_id(block).unwrap();
        assert_ne!(block_scope, ctx.scope_for_id(m).unwrap());
        assert!(ctx.scope(block_scope).contains_use_import());
    }

    #[test]
    fn test_function_always_gets_scope() {
        let mut b = AstBuilder::new();
        let f = b.function("f", vec![], vec![]).unwrap();
        let m = b.module("M", vec![f]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);

        let fn_scope = ctx.scope_for_id(f).unwrap();
        assert_ne!(fn_scope, ctx.scope_for_id(m).unwrap());
        assert!(ctx.scope(fn_scope).declared().is_empty());
    }

    #[test]
    fn test_toplevel_module_parent_is_root() {
        let mut b = AstBuilder::new();
        let m = b.module("M", vec![]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);

        let module_scope = ctx.scope_for_id(m).unwrap();
        let root = ctx.root_scope();
        assert_eq!(ctx.scope(module_scope).parent(), Some(root));
        assert!(ctx.scope(module_scope).auto_uses_modules());
        assert!(ctx.scope(root).is_root());
        assert_eq!(ctx.module_scope_of(module_scope), Some(module_scope));
        assert_eq!(ctx.module_scope_of(root), None);
    }

    #[test]
    fn test_internal_module_does_not_auto_use() {
        let mut b = AstBuilder::new();
        let m = b.internal_module("Internal", vec![]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);

        let scope = ctx.scope_for_id(m).unwrap();
        assert!(!ctx.scope(scope).auto_uses_modules());
    }

    #[test]
    fn test_include_redirects_to_submodule() {
        let mut b = AstBuilder::new();
        let inc = b.include("Sub").unwrap();
        let y = b.variable("y", None).unwrap();
        let sub = b.module("Sub", vec![y]).unwrap();
        b.link_include(inc, sub).unwrap();
        let outer = b.module("Outer", vec![inc]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);

        let via_include = ctx.scope_for_id(inc).unwrap();
        assert_eq!(via_include, ctx.scope_for_id(sub).unwrap());
        assert_eq!(ctx.scope(via_include).id(), Some(sub));
        assert_eq!(
            ctx.scope(via_include).parent(),
            Some(ctx.scope_for_id(outer).unwrap())
        );
    }

    #[test]
    fn test_unknown_node_is_an_error() {
        let mut b = AstBuilder::new();
        b.module("M", vec![]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);

        let bogus = NodeId::new(99);
        assert_eq!(ctx.scope_for_id(bogus), Err(ResolveError::UnknownNode(bogus)));
    }

    #[test]
    fn test_invalidate_rebuilds() {
        let mut b = AstBuilder::new();
        let m = b.module("M", vec![]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);

        let before = ctx.scope_for_id(m).unwrap();
        assert_eq!(ctx.num_scopes(), 2);
        assert!(ctx.get_scope(before).is_some());

        ctx.invalidate();
        assert_eq!(ctx.num_scopes(), 0);
        assert!(ctx.get_scope(before).is_none());

        let after = ctx.scope_for_id(m).unwrap();
        assert_eq!(ctx.num_scopes(), 2);
        assert_eq!(ctx.get_scope(after).and_then(Scope::id), Some(m));
    }

    #[test]
    fn test_custom_builtins() {
        let mut b = AstBuilder::new();
        b.module("M", vec![]).unwrap();
        let tree = b.finish().unwrap();
        let config = ContextConfig {
            builtin_types: vec![SmolStr::new("widget")],
            ..ContextConfig::default()
        };
        let mut ctx = ResolveContext::with_config(&tree, config);

        let root = ctx.root_scope();
        let widget = tree.interner().intern("widget");
        let int = tree.interner().intern("int");
        assert!(ctx.scope(root).contains_name(widget));
        assert!(!ctx.scope(root).contains_name(int));
    }
}
