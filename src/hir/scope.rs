//! Scopes and the declaration gatherer.
//!
//! A [`Scope`] is built for a syntax node only when that node creates a
//! scope and the scope would not be empty; see
//! [`ResolveContext::scope_for_id`](super::ResolveContext::scope_for_id).

use indexmap::IndexMap;

use super::ids::{DeclId, ScopeId};
use crate::base::{Name, NodeId};
use crate::syntax::{AstKind, AstTag, AstTree};

// ============================================================================
// DECLARATION SETS
// ============================================================================

/// The declarations sharing one name within one scope, in source order.
///
/// Overloads stay together here; they are never merged or disambiguated
/// during name resolution. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdsWithName {
    ids: Vec<DeclId>,
}

impl IdsWithName {
    pub fn new(first: DeclId) -> Self {
        Self { ids: vec![first] }
    }

    pub(crate) fn append(&mut self, id: DeclId) {
        self.ids.push(id);
    }

    /// The first declaration in source order.
    pub fn first(&self) -> DeclId {
        self.ids[0]
    }

    pub fn ids(&self) -> &[DeclId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: DeclId) -> bool {
        self.ids.contains(&id)
    }
}

/// Name → declarations declared directly in one scope.
pub type DeclMap = IndexMap<Name, IdsWithName>;

fn gather(declared: &mut DeclMap, name: Name, id: DeclId) {
    match declared.get_mut(&name) {
        Some(existing) => existing.append(id),
        None => {
            declared.insert(name, IdsWithName::new(id));
        }
    }
}

// ============================================================================
// GATHERER
// ============================================================================

/// What one node declares directly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GatheredDecls {
    pub declared: DeclMap,
    pub contains_use_import: bool,
    pub contains_function_decls: bool,
}

impl GatheredDecls {
    /// Nothing declared and nothing used or imported.
    pub fn is_trivial(&self) -> bool {
        self.declared.is_empty() && !self.contains_use_import
    }
}

struct DeclGatherer<'t> {
    tree: &'t AstTree,
    excluded_record: Option<Name>,
    out: GatheredDecls,
}

impl DeclGatherer<'_> {
    fn visit(&mut self, id: NodeId) {
        let Some(kind) = self.tree.kind(id) else {
            return;
        };

        match kind {
            AstKind::Record { name } if Some(*name) == self.excluded_record => {}
            AstKind::TupleDecl | AstKind::MultiDecl => {
                for &child in self.tree.children(id) {
                    self.visit(child);
                }
            }
            AstKind::Use { .. } | AstKind::Import { .. } => {
                self.out.contains_use_import = true;
            }
            AstKind::Include { name } => {
                gather(&mut self.out.declared, *name, DeclId::Node(id));
            }
            _ => {
                let Some(name) = kind.decl_name() else {
                    return;
                };
                gather(&mut self.out.declared, name, DeclId::Node(id));

                if let AstKind::Function { .. } = kind {
                    self.out.contains_function_decls = true;
                }
                if let AstKind::Formal {
                    type_expr: Some(type_expr),
                    ..
                } = kind
                {
                    self.gather_type_queries(*type_expr);
                }
            }
        }
    }

    /// Every type query anywhere inside a formal's type expression.
    fn gather_type_queries(&mut self, type_expr: NodeId) {
        let mut stack = vec![type_expr];
        while let Some(id) = stack.pop() {
            if let Some(AstKind::TypeQuery { name }) = self.tree.kind(id) {
                gather(&mut self.out.declared, *name, DeclId::Node(id));
            }
            stack.extend(self.tree.children(id).iter().rev());
        }
    }
}

/// Gather the names declared by the direct children of `node`.
///
/// Declarations are not searched transitively: blocks, loops and other
/// compound statements are scopes of their own. Tuple and multi
/// declarations are looked through. A record named `excluded_record` is
/// left out.
pub fn gather_decls_within(
    tree: &AstTree,
    node: NodeId,
    excluded_record: Option<Name>,
) -> GatheredDecls {
    let mut gatherer = DeclGatherer {
        tree,
        excluded_record,
        out: GatheredDecls::default(),
    };
    for &child in tree.children(node) {
        gatherer.visit(child);
    }
    gatherer.out
}

/// Whether nodes of this kind may introduce a scope.
pub fn creates_scope(tag: AstTag) -> bool {
    tag.indicates_new_id_scope()
        || tag.is_simple_block_like()
        || tag.is_loop()
        || tag.is_cobegin()
        || tag.is_conditional()
        || tag.is_select()
        || tag.is_try()
}

// ============================================================================
// SCOPE
// ============================================================================

/// A lexical region holding declarations and/or visibility statements.
///
/// Immutable once built. The parent is a handle, never an owning link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    id: Option<NodeId>,
    tag: Option<AstTag>,
    parent: Option<ScopeId>,
    auto_uses_modules: bool,
    contains_use_import: bool,
    contains_function_decls: bool,
    declared: DeclMap,
}

impl Scope {
    /// The universal root scope, holding only builtins.
    pub(crate) fn root(builtins: impl IntoIterator<Item = Name>) -> Self {
        let mut declared = DeclMap::default();
        for name in builtins {
            declared
                .entry(name)
                .or_insert_with(|| IdsWithName::new(DeclId::Builtin(name)));
        }
        Self {
            id: None,
            tag: None,
            parent: None,
            auto_uses_modules: false,
            contains_use_import: false,
            contains_function_decls: false,
            declared,
        }
    }

    pub(crate) fn new(
        id: NodeId,
        tag: AstTag,
        parent: ScopeId,
        auto_uses_modules: bool,
        gathered: GatheredDecls,
    ) -> Self {
        Self {
            id: Some(id),
            tag: Some(tag),
            parent: Some(parent),
            auto_uses_modules,
            contains_use_import: gathered.contains_use_import,
            contains_function_decls: gathered.contains_function_decls,
            declared: gathered.declared,
        }
    }

    /// Owning node; `None` for the root scope.
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    pub fn tag(&self) -> Option<AstTag> {
        self.tag
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_module(&self) -> bool {
        self.tag.is_some_and(AstTag::is_module)
    }

    /// Whether the automatically used standard module is visible here.
    pub fn auto_uses_modules(&self) -> bool {
        self.auto_uses_modules
    }

    pub fn contains_use_import(&self) -> bool {
        self.contains_use_import
    }

    pub fn contains_function_decls(&self) -> bool {
        self.contains_function_decls
    }

    pub fn declared(&self) -> &DeclMap {
        &self.declared
    }

    pub fn contains_name(&self, name: Name) -> bool {
        self.declared.contains_key(&name)
    }

    /// Append the declarations of `name` in this scope alone.
    pub fn lookup_in_scope(&self, name: Name, result: &mut Vec<IdsWithName>) -> bool {
        match self.declared.get(&name) {
            Some(ids) => {
                result.push(ids.clone());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{AstBuilder, CompoundKind, LimitationKind, Visibility};

    fn names(tree: &AstTree, gathered: &GatheredDecls) -> Vec<String> {
        gathered
            .declared
            .keys()
            .map(|&name| tree.interner().display(name).to_string())
            .collect()
    }

    #[test]
    fn test_gather_direct_children_only() {
        let mut b = AstBuilder::new();
        let inner = b.variable("inner", None).unwrap();
        let block = b.compound(CompoundKind::Block, vec![inner]).unwrap();
        let outer = b.variable("outer", None).unwrap();
        let m = b.module("M", vec![outer, block]).unwrap();
        let tree = b.finish().unwrap();

        let gathered = gather_decls_within(&tree, m, None);
        assert_eq!(names(&tree, &gathered), vec!["outer"]);
        assert!(!gathered.contains_function_decls);
    }

    #[test]
    fn test_gather_overloads_accumulate_in_order() {
        let mut b = AstBuilder::new();
        let f1 = b.function("f", vec![], vec![]).unwrap();
        let f2 = b.function("f", vec![], vec![]).unwrap();
        let m = b.module("M", vec![f1, f2]).unwrap();
        let tree = b.finish().unwrap();

        let gathered = gather_decls_within(&tree, m, None);
        let name = tree.interner().intern("f");
        let ids = &gathered.declared[&name];
        assert_eq!(ids.ids(), &[DeclId::Node(f1), DeclId::Node(f2)]);
        assert!(gathered.contains_function_decls);
    }

    #[test]
    fn test_gather_formal_type_queries() {
        let mut b = AstBuilder::new();
        let query = b.type_query("t").unwrap();
        let nested = b.type_query("u").unwrap();
        let inner_call = b.call(vec![nested]).unwrap();
        let ty = b.call(vec![query, inner_call]).unwrap();
        let x = b.formal("x", Some(ty)).unwrap();
        let f = b.function("f", vec![x], vec![]).unwrap();
        b.module("M", vec![f]).unwrap();
        let tree = b.finish().unwrap();

        let gathered = gather_decls_within(&tree, f, None);
        assert_eq!(names(&tree, &gathered), vec!["x", "t", "u"]);
    }

    #[test]
    fn test_gather_looks_through_tuple_and_multi_decls() {
        let mut b = AstBuilder::new();
        let a = b.variable("a", None).unwrap();
        let c = b.variable("c", None).unwrap();
        let tuple = b.tuple_decl(vec![a, c]).unwrap();
        let d = b.variable("d", None).unwrap();
        let multi = b.multi_decl(vec![d, tuple]).unwrap();
        let m = b.module("M", vec![multi]).unwrap();
        let tree = b.finish().unwrap();

        let gathered = gather_decls_within(&tree, m, None);
        assert_eq!(names(&tree, &gathered), vec!["d", "a", "c"]);
    }

    #[test]
    fn test_gather_flags_use_and_include() {
        let mut b = AstBuilder::new();
        let target = b.ident("Other").unwrap();
        let clause = b.clause(target, LimitationKind::None, vec![]).unwrap();
        let use_stmt = b.use_stmt(Visibility::Default, vec![clause]).unwrap();
        let inc = b.include("Sub").unwrap();
        let sub = b.module("Sub", vec![]).unwrap();
        b.link_include(inc, sub).unwrap();
        let m = b.module("M", vec![use_stmt, inc]).unwrap();
        b.module("Other", vec![]).unwrap();
        let tree = b.finish().unwrap();

        let gathered = gather_decls_within(&tree, m, None);
        assert!(gathered.contains_use_import);
        assert_eq!(names(&tree, &gathered), vec!["Sub"]);
        assert!(!gathered.is_trivial());
    }

    #[test]
    fn test_gather_skips_excluded_record() {
        let mut b = AstBuilder::new();
        let tuple = b.record("_tuple", vec![]).unwrap();
        let other = b.record("R", vec![]).unwrap();
        let m = b.module("M", vec![tuple, other]).unwrap();
        let excluded = b.name("_tuple").unwrap();
        let tree = b.finish().unwrap();

        let gathered = gather_decls_within(&tree, m, Some(excluded));
        assert_eq!(names(&tree, &gathered), vec!["R"]);
    }

    #[test]
    fn test_creates_scope() {
        assert!(creates_scope(AstTag::Function));
        assert!(creates_scope(AstTag::Block));
        assert!(creates_scope(AstTag::Forall));
        assert!(creates_scope(AstTag::Cobegin));
        assert!(creates_scope(AstTag::Conditional));
        assert!(creates_scope(AstTag::Select));
        assert!(creates_scope(AstTag::Try));
        assert!(!creates_scope(AstTag::Use));
        assert!(!creates_scope(AstTag::Call));
        assert!(!creates_scope(AstTag::Variable));
    }

    #[test]
    fn test_root_scope_lookup() {
        let interner = crate::base::Interner::new();
        let int = interner.intern("int");
        let root = Scope::root([int, int]);

        let mut result = Vec::new();
        assert!(root.lookup_in_scope(int, &mut result));
        assert_eq!(result, vec![IdsWithName::new(DeclId::Builtin(int))]);
        assert!(root.is_root());
        assert!(!root.lookup_in_scope(interner.intern("missing"), &mut result));
    }
}
