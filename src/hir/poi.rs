//! Point-of-instantiation scopes.
//!
//! Calls inside an instantiated generic function are resolved in the
//! function's own scope and also at its point of instantiation: the call
//! site, and recursively that call site's own POI. A [`PoiScope`] is one link
//! of that chain.

use super::context::ResolveContext;
use super::ids::{PoiScopeId, ScopeId};

/// One link of a point-of-instantiation chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoiScope {
    in_scope: Option<ScopeId>,
    in_fn_poi: Option<PoiScopeId>,
}

impl PoiScope {
    /// The call-site scope, after collapsing. `None` when no enclosing scope
    /// could contribute a candidate.
    pub fn in_scope(&self) -> Option<ScopeId> {
        self.in_scope
    }

    /// The POI of the function containing the call site.
    pub fn in_fn_poi(&self) -> Option<PoiScopeId> {
        self.in_fn_poi
    }
}

impl ResolveContext<'_> {
    /// # Panics
    ///
    /// If the handle was not issued by this context since the last
    /// [`invalidate`](ResolveContext::invalidate).
    pub fn poi_scope(&self, id: PoiScopeId) -> &PoiScope {
        &self.poi_scopes[id]
    }

    pub fn get_poi_scope(&self, id: PoiScopeId) -> Option<&PoiScope> {
        let index = u32::from(id.into_raw()) as usize;
        (index < self.poi_scopes.len()).then(|| &self.poi_scopes[id])
    }

    /// The POI scope for a call made from `scope`, which is itself being
    /// resolved under `parent_poi`.
    ///
    /// Scopes with neither `use`/`import` nor function declarations add no
    /// candidates and are skipped in favour of their nearest ancestor that
    /// has some. Links of `parent_poi` whose scope is already wholly visible
    /// from `scope` are dropped. The same arguments always produce the same
    /// handle.
    pub fn point_of_instantiation_scope(
        &mut self,
        scope: ScopeId,
        parent_poi: Option<PoiScopeId>,
    ) -> PoiScopeId {
        if let Some(&poi) = self.poi_cache.get(&(scope, parent_poi)) {
            return poi;
        }

        let mut use_scope = Some(scope);
        while let Some(cur) = use_scope {
            let s = self.scope(cur);
            if s.contains_use_import() || s.contains_function_decls() {
                break;
            }
            use_scope = s.parent();
        }

        let mut use_poi = parent_poi;
        while let Some(poi) = use_poi {
            let link = *self.poi_scope(poi);
            let collapse = match link.in_scope {
                Some(in_scope) => self.is_whole_scope_visible_from_scope(in_scope, scope),
                None => false,
            };
            if !collapse {
                break;
            }
            use_poi = link.in_fn_poi;
        }

        let poi = self.construct_poi_scope(use_scope, use_poi);
        tracing::trace!(
            "[POI] {:?} under {:?} -> {:?} ({:?}, {:?})",
            scope,
            parent_poi,
            poi,
            use_scope,
            use_poi
        );
        self.poi_cache.finish((scope, parent_poi), poi);
        poi
    }

    fn construct_poi_scope(
        &mut self,
        in_scope: Option<ScopeId>,
        in_fn_poi: Option<PoiScopeId>,
    ) -> PoiScopeId {
        if let Some(&poi) = self.constructed_pois.get(&(in_scope, in_fn_poi)) {
            return poi;
        }

        let poi = self.poi_scopes.alloc(PoiScope {
            in_scope,
            in_fn_poi,
        });
        tracing::debug!("[POI] built {:?} for {:?}", poi, in_scope);
        self.constructed_pois.finish((in_scope, in_fn_poi), poi);
        poi
    }
}
