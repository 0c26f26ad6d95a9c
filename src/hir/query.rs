//! Memoization for resolution queries.
//!
//! Every derived result is computed at most once per context and keyed by
//! the query's argument tuple. A query marks its key [`QueryState::InProgress`]
//! before running so that reentrant callers can see it is on the stack.

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// State of one memoized query invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryState<V> {
    /// The query is currently executing somewhere up the call stack.
    InProgress,
    /// The query finished with this result.
    Done(V),
}

/// A memo table for one query function.
#[derive(Clone, Debug)]
pub struct QueryCache<K, V> {
    entries: FxHashMap<K, QueryState<V>>,
}

impl<K: Eq + Hash, V> QueryCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// The finished result for `key`, if any.
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.entries.get(key) {
            Some(QueryState::Done(value)) => Some(value),
            _ => None,
        }
    }

    /// Whether the query for `key` is currently executing.
    pub fn is_running(&self, key: &K) -> bool {
        matches!(self.entries.get(key), Some(QueryState::InProgress))
    }

    /// Mark `key` as executing.
    ///
    /// Returns `false` if the key was already running or done, in which case
    /// nothing changes.
    pub fn begin(&mut self, key: K) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, QueryState::InProgress);
        true
    }

    /// Record the result for `key`.
    pub fn finish(&mut self, key: K, value: V) {
        self.entries.insert(key, QueryState::Done(value));
    }

    /// Number of finished entries.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|state| matches!(state, QueryState::Done(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every entry, finished or not.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
