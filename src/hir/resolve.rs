//! Name lookup: finding the declarations a name refers to.
//!
//! One lookup searches up to four axes, in this order, each gated by a
//! [`LookupConfig`] flag:
//!
//! 1. **Declarations** made directly in the scope
//! 2. **Use/import** clauses of the scope, recursing into each target (and
//!    into the automatically used standard module for non-internal modules)
//! 3. **Parents**, walked outward up to and including the first module scope,
//!    followed by the root scope
//! 4. **Top-level modules** by name
//!
//! Results are appended in axis order. Overloads stay grouped by the scope
//! that declares them. With [`LookupConfig::INNERMOST`] the search stops at
//! the first scope level that produces anything.
//!
//! Every scope is inspected at most once per top-level lookup. The visited
//! set is owned by the caller, never by the context, so independent lookups
//! never share history.

use rustc_hash::FxHashSet;

use super::context::ResolveContext;
use super::diagnostics::VisibilityStmtKind;
use super::ids::{DeclId, ScopeId};
use super::scope::IdsWithName;
use super::visibility::{ResolvedVisibilityScope, VisibilityClause, VisibilityKind};
use crate::base::Name;

// ============================================================================
// CONFIGURATION
// ============================================================================

bitflags::bitflags! {
    /// Which axes one lookup searches.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LookupConfig: u8 {
        /// Declarations made directly in the scope.
        const DECLS = 1 << 0;
        /// Names brought in by `use`/`import`.
        const IMPORT_AND_USE = 1 << 1;
        /// Enclosing scopes, up to the nearest module, then the root.
        const PARENTS = 1 << 2;
        /// Top-level modules by name.
        const TOPLEVEL = 1 << 3;
        /// Stop at the first scope level that yields a match.
        const INNERMOST = 1 << 4;
        /// Everything visible by ordinary lexical rules.
        const ALL_VISIBLE = Self::DECLS.bits() | Self::IMPORT_AND_USE.bits() | Self::PARENTS.bits();
    }
}

// ============================================================================
// INNERMOST MATCH
// ============================================================================

/// How many declarations the innermost matching scope level held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchesFound {
    Zero,
    One,
    Many,
}

/// Result of [`ResolveContext::find_innermost_decl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InnermostMatch {
    /// The first declaration found; `None` iff nothing matched.
    pub id: Option<DeclId>,
    pub found: MatchesFound,
}

impl InnermostMatch {
    pub fn is_unique(&self) -> bool {
        self.found == MatchesFound::One
    }

    pub fn is_ambiguous(&self) -> bool {
        self.found == MatchesFound::Many
    }
}

// ============================================================================
// LOOKUP
// ============================================================================

impl ResolveContext<'_> {
    /// Find `name` from `scope`.
    ///
    /// When `receiver` is given it is searched first, as for method-call
    /// style references. An empty result is a normal outcome.
    pub fn lookup_name_in_scope(
        &mut self,
        scope: ScopeId,
        receiver: Option<ScopeId>,
        name: Name,
        config: LookupConfig,
    ) -> Vec<IdsWithName> {
        let mut visited = FxHashSet::default();
        self.lookup_name_in_scope_with_set(scope, receiver, name, config, &mut visited)
    }

    /// [`lookup_name_in_scope`](Self::lookup_name_in_scope) with a visited
    /// set owned by the caller.
    ///
    /// Scopes already in `visited` are skipped, and every scope inspected
    /// here is added to it, so several lookups can be composed without
    /// reporting a declaration twice.
    pub fn lookup_name_in_scope_with_set(
        &mut self,
        scope: ScopeId,
        receiver: Option<ScopeId>,
        name: Name,
        config: LookupConfig,
        visited: &mut FxHashSet<ScopeId>,
    ) -> Vec<IdsWithName> {
        let mut result = Vec::new();
        if let Some(receiver) = receiver {
            self.do_lookup_in_scope(receiver, None, name, config, visited, &mut result);
        }
        self.do_lookup_in_scope(scope, None, name, config, visited, &mut result);
        result
    }

    /// Lookup used while resolving one segment of a `use`/`import` path.
    ///
    /// The first segment (`A` in `A.B.C`) of a `use` may be a top-level
    /// module, a submodule, a name brought in by another `use`/`import`, or
    /// a sibling or parent module; the first segment of an `import` may
    /// only be a top-level module or a name brought in by `use`/`import`.
    /// Later segments are looked up among the declarations and clauses of
    /// the scope the previous segment resolved to.
    pub(crate) fn lookup_in_scope_viz(
        &mut self,
        scope: ScopeId,
        resolving: Option<&ResolvedVisibilityScope>,
        name: Name,
        kind: VisibilityStmtKind,
        is_first_part: bool,
        result: &mut Vec<IdsWithName>,
    ) -> bool {
        let config = match (is_first_part, kind) {
            (true, VisibilityStmtKind::Use) => {
                LookupConfig::INNERMOST
                    | LookupConfig::TOPLEVEL
                    | LookupConfig::DECLS
                    | LookupConfig::IMPORT_AND_USE
                    | LookupConfig::PARENTS
            }
            (true, VisibilityStmtKind::Import) => {
                LookupConfig::INNERMOST | LookupConfig::TOPLEVEL | LookupConfig::IMPORT_AND_USE
            }
            (false, _) => {
                LookupConfig::INNERMOST | LookupConfig::IMPORT_AND_USE | LookupConfig::DECLS
            }
        };

        let mut checked = FxHashSet::default();
        self.do_lookup_in_scope(scope, resolving, name, config, &mut checked, result)
    }

    /// Append every match for `name` reachable from `scope` under `config`.
    ///
    /// Returns whether anything was appended.
    pub(crate) fn do_lookup_in_scope(
        &mut self,
        scope: ScopeId,
        resolving: Option<&ResolvedVisibilityScope>,
        name: Name,
        config: LookupConfig,
        checked: &mut FxHashSet<ScopeId>,
        result: &mut Vec<IdsWithName>,
    ) -> bool {
        let start = result.len();
        if !checked.insert(scope) {
            return false;
        }

        let only_innermost = config.contains(LookupConfig::INNERMOST);
        let check_use_import = config.contains(LookupConfig::IMPORT_AND_USE);
        tracing::trace!("[LOOKUP] {:?} in {:?} ({:?})", name, scope, config);

        if config.contains(LookupConfig::DECLS) {
            let got = self.scope(scope).lookup_in_scope(name, result);
            if got {
                tracing::trace!("[LOOKUP] {:?} declared in {:?}", name, scope);
            }
            if only_innermost && got {
                return true;
            }
        }

        if check_use_import {
            let got =
                self.do_lookup_in_imports(scope, resolving, name, only_innermost, checked, result);
            if only_innermost && got {
                return true;
            }
        }

        if config.contains(LookupConfig::PARENTS) {
            let mut parent_config = LookupConfig::DECLS;
            if check_use_import {
                parent_config |= LookupConfig::IMPORT_AND_USE;
            }
            if only_innermost {
                parent_config |= LookupConfig::INNERMOST;
            }

            let mut current = self.scope(scope).parent();
            while let Some(cur) = current {
                let got =
                    self.do_lookup_in_scope(cur, resolving, name, parent_config, checked, result);
                if only_innermost && got {
                    return true;
                }
                if self.scope(cur).is_module() {
                    break;
                }
                current = self.scope(cur).parent();
            }

            // the root scope, even past a module boundary
            if let Some(root) = self.outermost_ancestor(scope) {
                let got =
                    self.do_lookup_in_scope(root, resolving, name, parent_config, checked, result);
                if only_innermost && got {
                    return true;
                }
            }
        }

        if config.contains(LookupConfig::TOPLEVEL) {
            if let Some(module) = self.tree.toplevel_module(name) {
                tracing::trace!("[LOOKUP] {:?} is top-level module {}", name, module);
                result.push(IdsWithName::new(DeclId::Node(module)));
                if only_innermost {
                    return true;
                }
            }
        }

        result.len() > start
    }

    fn do_lookup_in_imports(
        &mut self,
        scope: ScopeId,
        resolving: Option<&ResolvedVisibilityScope>,
        name: Name,
        only_innermost: bool,
        checked: &mut FxHashSet<ScopeId>,
        result: &mut Vec<IdsWithName>,
    ) -> bool {
        let mut contents_config = LookupConfig::DECLS | LookupConfig::IMPORT_AND_USE;
        if only_innermost {
            contents_config |= LookupConfig::INNERMOST;
        }

        let cached;
        let clauses: &[VisibilityClause] = match resolving {
            Some(r) if r.scope() == scope => r.clauses(),
            _ => {
                cached = self.resolve_visibility_stmts(scope);
                cached
                    .as_deref()
                    .map(ResolvedVisibilityScope::clauses)
                    .unwrap_or_default()
            }
        };

        for clause in clauses {
            let named = clause.lookup_name(name);
            match (named, clause.kind()) {
                (Some(_), VisibilityKind::SymbolOnly) => {
                    if let Some(target) = self.scope(clause.scope()).id() {
                        tracing::trace!("[LOOKUP] {:?} names {} via {:?}", name, target, scope);
                        result.push(IdsWithName::new(DeclId::Node(target)));
                        return true;
                    }
                }
                // listed in an `except`
                (Some(_), VisibilityKind::ContentsExcept) => {}
                (Some(_), _)
                | (None, VisibilityKind::AllContents | VisibilityKind::ContentsExcept) => {
                    let original = named.unwrap_or(name);
                    let found = self.do_lookup_in_scope(
                        clause.scope(),
                        resolving,
                        original,
                        contents_config,
                        checked,
                        result,
                    );
                    if found && only_innermost {
                        return true;
                    }
                }
                (None, _) => {}
            }
        }

        if self.scope(scope).auto_uses_modules() {
            if let Some(auto) = self.scope_for_auto_module() {
                let found =
                    self.do_lookup_in_scope(auto, resolving, name, contents_config, checked, result);
                if found && only_innermost {
                    return true;
                }
            }
        }

        false
    }

    /// The topmost scope above `scope`, if `scope` has a parent at all.
    fn outermost_ancestor(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut outermost = None;
        let mut current = self.scope(scope).parent();
        while let Some(cur) = current {
            outermost = Some(cur);
            current = self.scope(cur).parent();
        }
        outermost
    }

    // ------------------------------------------------------------------------
    // Whole-scope visibility
    // ------------------------------------------------------------------------

    /// Whether every declaration of `check` is visible from `from` through
    /// parent links and unrestricted `use` clauses alone.
    ///
    /// Renamed, `only` and `except` clauses never count, since they do not
    /// expose the whole scope.
    pub fn is_whole_scope_visible_from_scope(&mut self, check: ScopeId, from: ScopeId) -> bool {
        let mut checked = FxHashSet::default();
        self.do_is_whole_scope_visible(check, from, &mut checked)
    }

    fn do_is_whole_scope_visible(
        &mut self,
        check: ScopeId,
        from: ScopeId,
        checked: &mut FxHashSet<ScopeId>,
    ) -> bool {
        if !checked.insert(from) {
            return false;
        }

        let mut current = Some(from);
        while let Some(cur) = current {
            if cur == check {
                return true;
            }

            if self.scope(cur).contains_use_import() {
                let used: Vec<ScopeId> = self
                    .resolve_visibility_stmts(cur)
                    .map(|r| {
                        r.clauses()
                            .iter()
                            .filter(|clause| clause.kind() == VisibilityKind::AllContents)
                            .map(VisibilityClause::scope)
                            .collect()
                    })
                    .unwrap_or_default();
                for used_scope in used {
                    if self.do_is_whole_scope_visible(check, used_scope, checked) {
                        return true;
                    }
                }
            }

            current = self.scope(cur).parent();
        }

        false
    }

    // ------------------------------------------------------------------------
    // Innermost declaration
    // ------------------------------------------------------------------------

    /// The nearest declaration of `name` visible from `scope`.
    ///
    /// Reports [`MatchesFound::Many`] when the nearest scope level holding
    /// `name` holds more than one declaration of it.
    pub fn find_innermost_decl(&mut self, scope: ScopeId, name: Name) -> InnermostMatch {
        if let Some(&found) = self.innermost_cache.get(&(scope, name)) {
            return found;
        }

        let config = LookupConfig::ALL_VISIBLE | LookupConfig::INNERMOST;
        let matches = self.lookup_name_in_scope(scope, None, name, config);
        let found = match matches.first() {
            Some(ids) => InnermostMatch {
                id: Some(ids.first()),
                found: if ids.len() > 1 {
                    MatchesFound::Many
                } else {
                    MatchesFound::One
                },
            },
            None => InnermostMatch {
                id: None,
                found: MatchesFound::Zero,
            },
        };

        self.innermost_cache.finish((scope, name), found);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{AstBuilder, AstTree, CompoundKind, LimitationKind, Visibility};
    use rstest::rstest;

    fn name(tree: &AstTree, text: &str) -> Name {
        tree.interner().intern(text)
    }

    fn decls(result: &[IdsWithName]) -> Vec<DeclId> {
        result.iter().flat_map(IdsWithName::iter).collect()
    }

    #[rstest]
    #[case(LookupConfig::DECLS, false)]
    #[case(LookupConfig::ALL_VISIBLE, true)]
    #[case(LookupConfig::PARENTS, true)]
    #[case(LookupConfig::TOPLEVEL, false)]
    fn test_parent_axis_gating(#[case] config: LookupConfig, #[case] expect_found: bool) {
        let mut b = AstBuilder::new();
        let x = b.variable("x", None).unwrap();
        let y = b.variable("y", None).unwrap();
        let f = b.function("f", vec![], vec![y]).unwrap();
        b.module("M", vec![x, f]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let fn_scope = ctx.scope_for_id(f).unwrap();

        let result = ctx.lookup_name_in_scope(fn_scope, None, name(&tree, "x"), config);
        assert_eq!(!result.is_empty(), expect_found);
        if expect_found {
            assert_eq!(decls(&result), vec![DeclId::Node(x)]);
        }
    }

    #[test]
    fn test_parent_walk_stops_at_module() {
        let mut b = AstBuilder::new();
        let x = b.variable("x", None).unwrap();
        let f = b.function("f", vec![], vec![]).unwrap();
        let inner = b.module("Inner", vec![f]).unwrap();
        b.module("Outer", vec![x, inner]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let fn_scope = ctx.scope_for_id(f).unwrap();

        let result =
            ctx.lookup_name_in_scope(fn_scope, None, name(&tree, "x"), LookupConfig::ALL_VISIBLE);
        assert!(result.is_empty());
    }

    #[test]
    fn test_builtins_visible_past_module_boundary() {
        let mut b = AstBuilder::new();
        let f = b.function("f", vec![], vec![]).unwrap();
        let inner = b.module("Inner", vec![f]).unwrap();
        b.module("Outer", vec![inner]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let fn_scope = ctx.scope_for_id(f).unwrap();

        let int = name(&tree, "int");
        let result = ctx.lookup_name_in_scope(fn_scope, None, int, LookupConfig::ALL_VISIBLE);
        assert_eq!(decls(&result), vec![DeclId::Builtin(int)]);
    }

    #[test]
    fn test_innermost_stops_at_first_level() {
        let mut b = AstBuilder::new();
        let outer_x = b.variable("x", None).unwrap();
        let inner_x = b.variable("x", None).unwrap();
        let block = b.compound(CompoundKind::Block, vec![inner_x]).unwrap();
        b.module("M", vec![outer_x, block]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let block_scope = ctx.scope_for_id(block).unwrap();
        let x = name(&tree, "x");

        let all = ctx.lookup_name_in_scope(block_scope, None, x, LookupConfig::ALL_VISIBLE);
        assert_eq!(decls(&all), vec![DeclId::Node(inner_x), DeclId::Node(outer_x)]);

        let innermost = ctx.lookup_name_in_scope(
            block_scope,
            None,
            x,
            LookupConfig::ALL_VISIBLE | LookupConfig::INNERMOST,
        );
        assert_eq!(decls(&innermost), vec![DeclId::Node(inner_x)]);
    }

    #[test]
    fn test_toplevel_axis() {
        let mut b = AstBuilder::new();
        let other = b.module("Other", vec![]).unwrap();
        let m = b.module("M", vec![]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let scope = ctx.scope_for_id(m).unwrap();
        let other_name = name(&tree, "Other");

        assert!(ctx
            .lookup_name_in_scope(scope, None, other_name, LookupConfig::ALL_VISIBLE)
            .is_empty());
        let result = ctx.lookup_name_in_scope(scope, None, other_name, LookupConfig::TOPLEVEL);
        assert_eq!(decls(&result), vec![DeclId::Node(other)]);
    }

    #[test]
    fn test_receiver_scope_searched_first() {
        let mut b = AstBuilder::new();
        let field = b.variable("v", None).unwrap();
        let rec = b.record("R", vec![field]).unwrap();
        let local = b.variable("v", None).unwrap();
        let f = b.function("f", vec![], vec![local]).unwrap();
        b.module("M", vec![rec, f]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let fn_scope = ctx.scope_for_id(f).unwrap();
        let rec_scope = ctx.scope_for_id(rec).unwrap();

        let result = ctx.lookup_name_in_scope(
            fn_scope,
            Some(rec_scope),
            name(&tree, "v"),
            LookupConfig::DECLS,
        );
        assert_eq!(decls(&result), vec![DeclId::Node(field), DeclId::Node(local)]);
    }

    #[test]
    fn test_shared_visited_set_skips_seen_scopes() {
        let mut b = AstBuilder::new();
        let x = b.variable("x", None).unwrap();
        let m = b.module("M", vec![x]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let scope = ctx.scope_for_id(m).unwrap();
        let x_name = name(&tree, "x");

        let mut visited = FxHashSet::default();
        let first = ctx.lookup_name_in_scope_with_set(
            scope,
            None,
            x_name,
            LookupConfig::DECLS,
            &mut visited,
        );
        let second = ctx.lookup_name_in_scope_with_set(
            scope,
            None,
            x_name,
            LookupConfig::DECLS,
            &mut visited,
        );
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert!(visited.contains(&scope));
    }

    #[test]
    fn test_auto_module_is_searched() {
        let mut b = AstBuilder::new();
        let helper = b.function("helper", vec![], vec![]).unwrap();
        b.internal_module("Standard", vec![helper]).unwrap();
        let user = b.module("User", vec![]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let scope = ctx.scope_for_id(user).unwrap();

        let result =
            ctx.lookup_name_in_scope(scope, None, name(&tree, "helper"), LookupConfig::ALL_VISIBLE);
        assert_eq!(decls(&result), vec![DeclId::Node(helper)]);
    }

    #[test]
    fn test_find_innermost_decl_counts() {
        let mut b = AstBuilder::new();
        let f1 = b.function("f", vec![], vec![]).unwrap();
        let f2 = b.function("f", vec![], vec![]).unwrap();
        let g = b.function("g", vec![], vec![]).unwrap();
        let m = b.module("M", vec![f1, f2, g]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let scope = ctx.scope_for_id(m).unwrap();

        let many = ctx.find_innermost_decl(scope, name(&tree, "f"));
        assert_eq!(many.id, Some(DeclId::Node(f1)));
        assert!(many.is_ambiguous());

        let one = ctx.find_innermost_decl(scope, name(&tree, "g"));
        assert_eq!(one.id, Some(DeclId::Node(g)));
        assert!(one.is_unique());

        let zero = ctx.find_innermost_decl(scope, name(&tree, "h"));
        assert_eq!(
            zero,
            InnermostMatch {
                id: None,
                found: MatchesFound::Zero
            }
        );
    }

    #[test]
    fn test_whole_scope_visibility_through_use() {
        let mut b = AstBuilder::new();
        let lib = b.module("Lib", vec![]).unwrap();
        let target = b.ident("Lib").unwrap();
        let clause = b.clause(target, LimitationKind::None, vec![]).unwrap();
        let use_stmt = b.use_stmt(Visibility::Default, vec![clause]).unwrap();
        let f = b.function("f", vec![], vec![]).unwrap();
        let user = b.module("User", vec![use_stmt, f]).unwrap();
        let only_target = b.ident("Lib").unwrap();
        let x = b.ident("x").unwrap();
        let only_clause = b.clause(only_target, LimitationKind::Only, vec![x]).unwrap();
        let only_use = b.use_stmt(Visibility::Default, vec![only_clause]).unwrap();
        let partial = b.module("Partial", vec![only_use]).unwrap();
        let tree = b.finish().unwrap();
        let mut ctx = ResolveContext::new(&tree);
        let lib_scope = ctx.scope_for_id(lib).unwrap();
        let fn_scope = ctx.scope_for_id(f).unwrap();
        let user_scope = ctx.scope_for_id(user).unwrap();
        let partial_scope = ctx.scope_for_id(partial).unwrap();

        assert!(ctx.is_whole_scope_visible_from_scope(lib_scope, fn_scope));
        assert!(ctx.is_whole_scope_visible_from_scope(user_scope, fn_scope));
        assert!(!ctx.is_whole_scope_visible_from_scope(fn_scope, user_scope));
        assert!(!ctx.is_whole_scope_visible_from_scope(lib_scope, partial_scope));
    }
}
