//! Problems found while resolving `use`/`import` statements.
//!
//! Every diagnostic is anchored to the syntax node it is about. Resolution
//! never aborts on a diagnostic; the offending clause is dropped and the
//! rest of the program is resolved as usual.

use std::sync::Arc;

use crate::base::NodeId;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message anchored to a syntax node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The node the problem is reported on.
    pub node: NodeId,
    /// Severity level.
    pub severity: Severity,
    /// Error/warning code (e.g., "V0001").
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(node: NodeId, message: impl Into<Arc<str>>) -> Self {
        Self {
            node,
            severity: Severity::Error,
            code: None,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(node: NodeId, message: impl Into<Arc<str>>) -> Self {
        Self {
            node,
            severity: Severity::Warning,
            code: None,
            message: message.into(),
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes for visibility resolution.
pub mod codes {
    /// A `use`/`import` path segment names nothing reachable.
    pub const UNRESOLVED_TARGET: &str = "V0001";
    /// A `use`/`import` path does not denote exactly one declaration.
    pub const AMBIGUOUS_TARGET: &str = "V0002";
    /// A `use`/`import` target is not a module (or enum, for `use`).
    pub const NOT_A_MODULE: &str = "V0003";
    /// A name listed in a limitation does not exist in the target.
    pub const LIMITATION_NOT_FOUND: &str = "V0004";
    /// A syntax form the resolver does not accept.
    pub const UNSUPPORTED_SYNTAX: &str = "V0005";
}

/// Which statement a visibility clause belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisibilityStmtKind {
    /// `use A.B`
    Use,
    /// `import C.D`
    Import,
}

impl VisibilityStmtKind {
    pub fn keyword(self) -> &'static str {
        match self {
            VisibilityStmtKind::Use => "use",
            VisibilityStmtKind::Import => "import",
        }
    }
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during visibility resolution.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            "[DIAG] {} on {}: {}",
            diagnostic.code.as_deref().unwrap_or("-"),
            diagnostic.node,
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    /// Add an unresolved `use`/`import` target error.
    pub fn unresolved_target(&mut self, node: NodeId, kind: VisibilityStmtKind) {
        self.add(
            Diagnostic::error(
                node,
                format!("could not find target of '{}'", kind.keyword()),
            )
            .with_code(codes::UNRESOLVED_TARGET),
        );
    }

    /// Add an ambiguous `use`/`import` target error.
    pub fn ambiguous_target(&mut self, node: NodeId, kind: VisibilityStmtKind) {
        self.add(
            Diagnostic::error(
                node,
                format!("ambiguity in finding target of '{}'", kind.keyword()),
            )
            .with_code(codes::AMBIGUOUS_TARGET),
        );
    }

    /// Add a target-is-not-a-module error.
    pub fn not_a_module(&mut self, node: NodeId) {
        self.add(
            Diagnostic::error(node, "does not refer to a module").with_code(codes::NOT_A_MODULE),
        );
    }

    /// Add a missing-limitation error.
    pub fn limitation_not_found(&mut self, node: NodeId, name: &str, kind: VisibilityStmtKind) {
        self.add(
            Diagnostic::error(
                node,
                format!("could not find '{}' for '{}'", name, kind.keyword()),
            )
            .with_code(codes::LIMITATION_NOT_FOUND),
        );
    }

    /// Add an unsupported-syntax error.
    pub fn unsupported(&mut self, node: NodeId, message: &str) {
        self.add(Diagnostic::error(node, message).with_code(codes::UNSUPPORTED_SYNTAX));
    }

    /// Get all collected diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics anchored to one node.
    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.node == node)
    }

    /// Get the count of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::error(NodeId::new(3), "test error").with_code("V0001");

        assert_eq!(diag.node, NodeId::new(3));
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code.as_deref(), Some("V0001"));
        assert_eq!(&*diag.message, "test error");
    }

    #[test]
    fn test_collector_messages() {
        let mut collector = DiagnosticCollector::new();
        let node = NodeId::new(1);

        collector.unresolved_target(node, VisibilityStmtKind::Use);
        collector.ambiguous_target(node, VisibilityStmtKind::Import);
        collector.limitation_not_found(NodeId::new(2), "x", VisibilityStmtKind::Use);

        let messages: Vec<_> = collector.diagnostics().iter().map(|d| &*d.message).collect();
        assert_eq!(
            messages,
            vec![
                "could not find target of 'use'",
                "ambiguity in finding target of 'import'",
                "could not find 'x' for 'use'",
            ]
        );
        assert_eq!(collector.for_node(node).count(), 2);
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        collector.not_a_module(NodeId::new(1));
        collector.add(Diagnostic::warning(NodeId::new(2), "test warning"));

        assert_eq!(collector.len(), 2);
        assert_eq!(collector.error_count(), 1);
        assert!(collector.has_errors());

        collector.clear();
        assert!(collector.is_empty());
        assert!(!collector.has_errors());
    }
}
