//! Diagnostics sink
//!
//! The collector and exporter never fail on messy data; they report what
//! they worked around through a [`DiagnosticSink`]. The default sink forwards
//! to `tracing`, tests use [`MemorySink`] to inspect what was reported.

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Field path the diagnostic is about, if any
    pub path: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            path: None,
            message: message.into(),
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let path = diagnostic.path.as_deref().unwrap_or_default();
        match diagnostic.severity {
            Severity::Debug => tracing::debug!(path, "{}", diagnostic.message),
            Severity::Info => tracing::info!(path, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(path, "{}", diagnostic.message),
        }
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(MemorySink::default())
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.diagnostics()
            .into_iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect()
    }

    /// Whether any warning mentions `needle`
    pub fn warned(&self, needle: &str) -> bool {
        self.warnings().iter().any(|d| d.message.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(diagnostic);
        }
    }
}

pub(crate) fn default_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(TracingSink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.emit(Diagnostic::new(Severity::Info, "announced"));
        sink.emit(Diagnostic::new(Severity::Warning, "type changed").at("c->value"));

        assert_eq!(sink.diagnostics().len(), 2);
        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path.as_deref(), Some("c->value"));
        assert!(sink.warned("type changed"));
        assert!(!sink.warned("announced"));
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        TracingSink.emit(Diagnostic::new(Severity::Warning, "no subscriber").at("c"));
    }
}
