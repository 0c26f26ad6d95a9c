//! The builtin type catalog.
//!
//! The type system owns the real catalog; the root scope only needs the
//! names, so they are listed here and can be overridden through
//! [`ContextConfig`](super::ContextConfig).

/// Names of the builtin types visible from every scope.
pub const BUILTIN_TYPE_NAMES: &[&str] = &[
    "bool",
    "int",
    "uint",
    "real",
    "imag",
    "complex",
    "string",
    "bytes",
    "nothing",
    "void",
    "locale",
    "range",
    "domain",
    "owned",
    "shared",
    "borrowed",
    "unmanaged",
    "RootClass",
    "c_ptr",
    "c_string",
];
