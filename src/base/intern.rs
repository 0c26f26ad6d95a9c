//! String interning for identifiers.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;

/// An interned identifier name.
///
/// `Name` is a lightweight handle (just a u32) that represents an identifier
/// string. The actual string is stored in an [`Interner`].
///
/// Names from the same interner compare equal iff their strings are equal,
/// which is what lets declaration maps and lookup caches key on `Name`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Name(u32);

impl Name {
    /// `this`, pre-interned by every [`Interner`].
    pub const THIS: Name = Name(0);
    /// `super`, pre-interned by every [`Interner`].
    pub const SUPER: Name = Name(1);

    /// Create a Name from a raw index (used internally).
    #[inline]
    pub(crate) const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

const PRE_INTERNED: [&str; 2] = ["this", "super"];

/// String interner for deduplicating identifier strings.
///
/// Thread-safe via internal locking, so one interner can be shared by the
/// tree builder and any number of resolution contexts.
pub struct Interner {
    inner: RwLock<InternerInner>,
}

#[derive(Default)]
struct InternerInner {
    /// Map from string to index
    map: FxHashMap<SmolStr, u32>,
    /// Storage of all interned strings
    strings: Vec<SmolStr>,
}

impl InternerInner {
    fn insert(&mut self, s: &str) -> u32 {
        if let Some(&index) = self.map.get(s) {
            return index;
        }
        let smol = SmolStr::new(s);
        let index = self.strings.len() as u32;
        self.strings.push(smol.clone());
        self.map.insert(smol, index);
        index
    }
}

impl Interner {
    /// Create an interner holding only the pre-interned keywords.
    pub fn new() -> Self {
        let mut inner = InternerInner::default();
        for keyword in PRE_INTERNED {
            inner.insert(keyword);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Intern a string, returning a `Name` handle.
    ///
    /// If the string has been interned before, returns the existing `Name`.
    pub fn intern(&self, s: &str) -> Name {
        {
            let inner = self.inner.read();
            if let Some(&index) = inner.map.get(s) {
                return Name::from_raw(index);
            }
        }

        // Another writer may have inserted between the two locks; `insert`
        // re-checks under the write lock.
        let index = self.inner.write().insert(s);
        Name::from_raw(index)
    }

    /// Look up the string for a `Name`.
    ///
    /// Returns `None` if the `Name` was created by a different interner.
    pub fn lookup(&self, name: Name) -> Option<SmolStr> {
        self.inner.read().strings.get(name.0 as usize).cloned()
    }

    /// The string for a `Name`, or `<?>` when the name is foreign to this
    /// interner. Intended for messages and logs.
    pub fn display(&self, name: Name) -> SmolStr {
        self.lookup(name).unwrap_or_else(|| SmolStr::new_static("<?>"))
    }

    /// Get the number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Check if the interner is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Interner")
            .field("count", &inner.strings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_same_string() {
        let interner = Interner::new();

        let a = interner.intern("hello");
        let b = interner.intern("hello");

        assert_eq!(a, b);
        assert_eq!(interner.len(), PRE_INTERNED.len() + 1);
    }

    #[test]
    fn test_keywords_are_pre_interned() {
        let interner = Interner::new();

        assert_eq!(interner.intern("this"), Name::THIS);
        assert_eq!(interner.intern("super"), Name::SUPER);
        assert_eq!(interner.display(Name::SUPER).as_str(), "super");
    }

    #[test]
    fn test_display_foreign_name() {
        let interner = Interner::new();
        assert_eq!(interner.display(Name::from_raw(999)).as_str(), "<?>");
    }

    #[test]
    fn test_name_size() {
        assert_eq!(std::mem::size_of::<Name>(), 4);
    }
}
