//! Visibility clauses and the `use`/`import` resolver.
//!
//! Every `use`/`import` statement directly inside a scope is normalized into
//! [`VisibilityClause`]s: a target scope, what of it becomes visible, a
//! privacy flag, and the (original, visible-as) name pairs. The clauses of
//! one scope are computed together, lazily, the first time a lookup needs
//! them.
//!
//! Resolving a target requires a lookup, and that lookup may come back
//! through the very scope being resolved. While a scope's statements are
//! being resolved, lookups through it see the clauses found so far and
//! nothing else.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::context::ResolveContext;
use super::diagnostics::VisibilityStmtKind;
use super::ids::ScopeId;
use super::resolve::LookupConfig;
use crate::base::{Name, NodeId};
use crate::syntax::{AstKind, LimitationKind, Visibility};

// ============================================================================
// CLAUSES
// ============================================================================

/// What part of a target scope a clause makes visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisibilityKind {
    /// Only the module/enum name itself (or its rename).
    SymbolOnly,
    /// Everything declared in the target.
    AllContents,
    /// Only the listed names.
    OnlyContents,
    /// Everything except the listed names.
    ContentsExcept,
}

/// One normalized effect of a `use`/`import`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilityClause {
    scope: ScopeId,
    kind: VisibilityKind,
    is_private: bool,
    names: Vec<(Name, Name)>,
}

impl VisibilityClause {
    pub fn new(
        scope: ScopeId,
        kind: VisibilityKind,
        is_private: bool,
        names: Vec<(Name, Name)>,
    ) -> Self {
        Self {
            scope,
            kind,
            is_private,
            names,
        }
    }

    /// The scope this clause exposes.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn kind(&self) -> VisibilityKind {
        self.kind
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    /// `(original name, visible-as name)` pairs.
    pub fn names(&self) -> &[(Name, Name)] {
        &self.names
    }

    /// If `name` is one of the visible-as names, the original name it stands
    /// for.
    pub fn lookup_name(&self, name: Name) -> Option<Name> {
        self.names
            .iter()
            .find(|(_, visible_as)| *visible_as == name)
            .map(|(original, _)| *original)
    }
}

/// The clauses contributed by every `use`/`import` directly inside one scope,
/// in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedVisibilityScope {
    scope: ScopeId,
    clauses: Vec<VisibilityClause>,
}

impl ResolvedVisibilityScope {
    pub(crate) fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            clauses: Vec::new(),
        }
    }

    /// The scope whose statements produced these clauses.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn clauses(&self) -> &[VisibilityClause] {
        &self.clauses
    }

    fn add_clause(&mut self, clause: VisibilityClause) {
        self.clauses.push(clause);
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

impl ResolveContext<'_> {
    /// The resolved `use`/`import` clauses of `scope`.
    ///
    /// `None` when the scope has no such statements, or while they are being
    /// resolved further up the call stack.
    pub fn resolved_visibility(&mut self, scope: ScopeId) -> Option<Arc<ResolvedVisibilityScope>> {
        self.resolve_visibility_stmts(scope)
    }

    pub(crate) fn resolve_visibility_stmts(
        &mut self,
        scope: ScopeId,
    ) -> Option<Arc<ResolvedVisibilityScope>> {
        if !self.scope(scope).contains_use_import() {
            return None;
        }
        if self.visibility_cache.is_running(&scope) {
            tracing::debug!("[VIZ] {:?} is already being resolved, skipping", scope);
            return None;
        }
        if let Some(resolved) = self.visibility_cache.get(&scope) {
            return Some(Arc::clone(resolved));
        }

        self.visibility_cache.begin(scope);
        let resolved = Arc::new(self.resolve_visibility_query(scope));
        self.visibility_cache.finish(scope, Arc::clone(&resolved));
        Some(resolved)
    }

    fn resolve_visibility_query(&mut self, scope: ScopeId) -> ResolvedVisibilityScope {
        let mut resolved = ResolvedVisibilityScope::new(scope);
        let tree = self.tree;
        let Some(node) = self.scope(scope).id() else {
            tracing::error!("[VIZ] {:?} has use/import but no syntax node", scope);
            return resolved;
        };

        for &child in tree.children(node) {
            match tree.kind(child) {
                Some(AstKind::Use { visibility }) => {
                    self.resolve_use_stmt(child, *visibility, scope, &mut resolved);
                }
                Some(AstKind::Import { visibility }) => {
                    self.resolve_import_stmt(child, *visibility, scope, &mut resolved);
                }
                _ => {}
            }
        }

        tracing::debug!(
            "[VIZ] resolved {} clauses for {:?} ({})",
            resolved.clauses.len(),
            scope,
            node
        );
        resolved
    }

    fn resolve_use_stmt(
        &mut self,
        stmt: NodeId,
        visibility: Visibility,
        scope: ScopeId,
        r: &mut ResolvedVisibilityScope,
    ) {
        let tree = self.tree;
        let is_private = visibility != Visibility::Public;

        for &clause in tree.children(stmt) {
            let Some(AstKind::VisibilityClause {
                symbol,
                limitation,
                limitations,
            }) = tree.kind(clause)
            else {
                continue;
            };
            if *limitation == LimitationKind::Braces {
                self.diagnostics
                    .unsupported(clause, "a brace list cannot be used with 'use'");
                continue;
            }

            let Some((expr, new_name)) = self.split_rename(*symbol) else {
                continue;
            };
            let Some((found, old_name)) =
                self.find_use_import_target(scope, r, expr, VisibilityStmtKind::Use)
            else {
                continue;
            };

            // the module/enum name itself stays referenceable
            r.add_clause(VisibilityClause::new(
                found,
                VisibilityKind::SymbolOnly,
                is_private,
                vec![(old_name, new_name.unwrap_or(old_name))],
            ));

            match limitation {
                LimitationKind::Except => {
                    for &entry in limitations {
                        if let Some(AstKind::As { .. }) = tree.kind(entry) {
                            self.diagnostics
                                .unsupported(entry, "'as' cannot be used with 'except'");
                        }
                    }
                    let names = self.convert_limitations(limitations);
                    r.add_clause(VisibilityClause::new(
                        found,
                        VisibilityKind::ContentsExcept,
                        is_private,
                        names,
                    ));
                }
                LimitationKind::Only => {
                    self.error_if_any_limitation_not_in_scope(
                        limitations,
                        found,
                        r,
                        VisibilityStmtKind::Use,
                    );
                    let names = self.convert_limitations(limitations);
                    r.add_clause(VisibilityClause::new(
                        found,
                        VisibilityKind::OnlyContents,
                        is_private,
                        names,
                    ));
                }
                LimitationKind::None => {
                    r.add_clause(VisibilityClause::new(
                        found,
                        VisibilityKind::AllContents,
                        is_private,
                        Vec::new(),
                    ));
                }
                LimitationKind::Braces => {}
            }
        }
    }

    fn resolve_import_stmt(
        &mut self,
        stmt: NodeId,
        visibility: Visibility,
        scope: ScopeId,
        r: &mut ResolvedVisibilityScope,
    ) {
        let tree = self.tree;
        let is_private = visibility != Visibility::Public;

        for &clause in tree.children(stmt) {
            let Some(AstKind::VisibilityClause {
                symbol,
                limitation,
                limitations,
            }) = tree.kind(clause)
            else {
                continue;
            };
            if matches!(limitation, LimitationKind::Except | LimitationKind::Only) {
                self.diagnostics.unsupported(
                    clause,
                    "'except' and 'only' cannot be used with 'import'",
                );
                continue;
            }

            let Some((mut expr, new_name)) = self.split_rename(*symbol) else {
                continue;
            };

            // `import M.f` keeps every overload of `f`, so the outermost dot is
            // handled here rather than resolved to a single declaration.
            let mut dot_name = None;
            if *limitation != LimitationKind::Braces {
                if let Some(AstKind::Dot { receiver, field }) = tree.kind(expr) {
                    expr = *receiver;
                    dot_name = Some(*field);
                }
            }

            let Some((found, old_name)) =
                self.find_use_import_target(scope, r, expr, VisibilityStmtKind::Import)
            else {
                continue;
            };

            let (kind, names) = match (*limitation, dot_name) {
                (LimitationKind::Braces, _) => {
                    self.error_if_any_limitation_not_in_scope(
                        limitations,
                        found,
                        r,
                        VisibilityStmtKind::Import,
                    );
                    (
                        VisibilityKind::OnlyContents,
                        self.convert_limitations(limitations),
                    )
                }
                (_, Some(dot_name)) => {
                    self.error_if_name_not_in_scope(
                        found,
                        r,
                        dot_name,
                        clause,
                        VisibilityStmtKind::Import,
                    );
                    (
                        VisibilityKind::OnlyContents,
                        vec![(dot_name, new_name.unwrap_or(dot_name))],
                    )
                }
                (_, None) => (
                    VisibilityKind::SymbolOnly,
                    vec![(old_name, new_name.unwrap_or(old_name))],
                ),
            };
            r.add_clause(VisibilityClause::new(found, kind, is_private, names));
        }
    }

    /// Peel a top-level `as` off a clause symbol.
    ///
    /// Returns the expression to resolve and the new name, or `None` if the
    /// rename is not a plain identifier.
    fn split_rename(&mut self, symbol: NodeId) -> Option<(NodeId, Option<Name>)> {
        let tree = self.tree;
        match tree.kind(symbol) {
            Some(AstKind::As {
                symbol: original,
                rename,
            }) => match tree.identifier_name(*rename) {
                Some(new_name) => Some((*original, Some(new_name))),
                None => {
                    self.diagnostics
                        .unsupported(symbol, "this form of as is not yet supported");
                    None
                }
            },
            _ => Some((symbol, None)),
        }
    }

    /// Resolve `this`, `super`, `M` or `M.N.S` to a scope.
    ///
    /// Also returns the last name in the expression (`S` for `M.N.S`).
    fn find_use_import_target(
        &mut self,
        scope: ScopeId,
        resolving: &ResolvedVisibilityScope,
        expr: NodeId,
        kind: VisibilityStmtKind,
    ) -> Option<(ScopeId, Name)> {
        let tree = self.tree;
        match tree.kind(expr) {
            Some(AstKind::Identifier { name }) => {
                let name = *name;
                let found = if name == Name::SUPER {
                    self.scope(scope)
                        .parent()
                        .and_then(|parent| self.module_scope_of(parent))
                } else if name == Name::THIS {
                    self.module_scope_of(scope)
                } else {
                    return self
                        .find_scope_viz(scope, name, resolving, expr, kind, true)
                        .map(|found| (found, name));
                };
                if found.is_none() {
                    self.diagnostics.unresolved_target(expr, kind);
                }
                found.map(|found| (found, name))
            }
            Some(AstKind::Dot { receiver, field }) => {
                let (inner, _) = self.find_use_import_target(scope, resolving, *receiver, kind)?;
                self.find_scope_viz(inner, *field, resolving, expr, kind, false)
                    .map(|found| (found, *field))
            }
            _ => {
                self.diagnostics.unsupported(
                    expr,
                    &format!("expression type not supported as target of '{}'", kind.keyword()),
                );
                None
            }
        }
    }

    /// Look up one path segment and insist it names exactly one module
    /// (or enum, for `use`).
    fn find_scope_viz(
        &mut self,
        scope: ScopeId,
        name: Name,
        resolving: &ResolvedVisibilityScope,
        id_for_errs: NodeId,
        kind: VisibilityStmtKind,
        is_first_part: bool,
    ) -> Option<ScopeId> {
        let mut found = Vec::new();
        let got = self.lookup_in_scope_viz(
            scope,
            Some(resolving),
            name,
            kind,
            is_first_part,
            &mut found,
        );

        if !got || found.is_empty() {
            self.diagnostics.unresolved_target(id_for_errs, kind);
            return None;
        }
        if found.len() > 1 || found[0].len() > 1 {
            self.diagnostics.ambiguous_target(id_for_errs, kind);
            return None;
        }

        let tree = self.tree;
        let target = found[0]
            .first()
            .node()
            .and_then(|id| Some((id, tree.tag(id)?)));
        match target {
            Some((id, tag))
                if tag.is_module()
                    || tag.is_include()
                    || (kind == VisibilityStmtKind::Use && tag.is_enum()) =>
            {
                Some(self.scope_for_node(id))
            }
            _ => {
                self.diagnostics.not_a_module(id_for_errs);
                None
            }
        }
    }

    fn error_if_name_not_in_scope(
        &mut self,
        scope: ScopeId,
        resolving: &ResolvedVisibilityScope,
        name: Name,
        id_for_err: NodeId,
        kind: VisibilityStmtKind,
    ) {
        let mut checked = FxHashSet::default();
        let mut result = Vec::new();
        let config = LookupConfig::INNERMOST | LookupConfig::DECLS | LookupConfig::IMPORT_AND_USE;
        let got = self.do_lookup_in_scope(
            scope,
            Some(resolving),
            name,
            config,
            &mut checked,
            &mut result,
        );

        if !got || result.is_empty() {
            let text = self.interner().display(name);
            self.diagnostics.limitation_not_found(id_for_err, &text, kind);
        }
    }

    fn error_if_any_limitation_not_in_scope(
        &mut self,
        limitations: &[NodeId],
        scope: ScopeId,
        resolving: &ResolvedVisibilityScope,
        kind: VisibilityStmtKind,
    ) {
        let tree = self.tree;
        for &entry in limitations {
            let checked = match tree.kind(entry) {
                Some(AstKind::Identifier { name }) => Some((entry, *name)),
                Some(AstKind::As { symbol, .. }) => {
                    tree.identifier_name(*symbol).map(|name| (*symbol, name))
                }
                _ => None,
            };
            if let Some((ident, name)) = checked {
                self.error_if_name_not_in_scope(scope, resolving, name, ident, kind);
            }
        }
    }

    /// Turn a limitation list into name pairs, reporting and skipping the
    /// entries that are not `a` or `a as b`.
    fn convert_limitations(&mut self, limitations: &[NodeId]) -> Vec<(Name, Name)> {
        let tree = self.tree;
        let mut names = Vec::with_capacity(limitations.len());
        for &entry in limitations {
            match tree.kind(entry) {
                Some(AstKind::Identifier { name }) => names.push((*name, *name)),
                Some(AstKind::Dot { .. }) => {
                    self.diagnostics
                        .unsupported(entry, "dot expression not supported here");
                }
                Some(AstKind::As { symbol, rename }) => {
                    let Some(name) = tree.identifier_name(*symbol) else {
                        self.diagnostics
                            .unsupported(*symbol, "expression type not supported for 'as'");
                        continue;
                    };
                    let Some(rename) = tree.identifier_name(*rename) else {
                        self.diagnostics
                            .unsupported(*rename, "this form of as is not yet supported");
                        continue;
                    };
                    names.push((name, rename));
                }
                _ => {
                    self.diagnostics
                        .unsupported(entry, "expression type not supported here");
                }
            }
        }
        names
    }
}
