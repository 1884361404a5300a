use std::fmt;

use indexmap::IndexSet;
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::util::InstId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    DoubleAcquire,
    DoubleRelease,
    ReleaseWithoutAcquire,
    UnreleasedLock,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiagnosticKind::DoubleAcquire => "double acquire",
            DiagnosticKind::DoubleRelease => "double release",
            DiagnosticKind::ReleaseWithoutAcquire => "release without acquire",
            DiagnosticKind::UnreleasedLock => "lock not released at exit",
        };
        write!(f, "{}", text)
    }
}

/// A lock usage anomaly in the analyzed program.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub function: String,
    pub lock: String,
    /// Offending call, absent for exit-time diagnostics.
    pub site: Option<InstId>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} of {}", self.function, self.kind, self.lock)?;
        if let Some(site) = self.site {
            write!(f, " at {}", site)?;
        }
        Ok(())
    }
}

/// Collects diagnostics and analysis warnings, forwarding both to the logger.
/// A diagnostic is recorded once however often the fixpoint revisits its site.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    diagnostics: IndexSet<Diagnostic>,
    warnings: Vec<String>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!("{}", text);
        self.warnings.push(text);
    }

    /// Records `diagnostic`; returns false when it was already known.
    pub fn error(&mut self, diagnostic: Diagnostic) -> bool {
        if self.diagnostics.contains(&diagnostic) {
            return false;
        }
        error!("{}", diagnostic);
        self.diagnostics.insert(diagnostic)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<String>) {
        (self.diagnostics.into_iter().collect(), self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_are_deduplicated() {
        let mut log = DiagnosticLog::new();
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::ReleaseWithoutAcquire,
            function: "f".to_string(),
            lock: "@m".to_string(),
            site: Some(InstId::new(3)),
        };
        assert!(log.error(diagnostic.clone()));
        assert!(!log.error(diagnostic));
        assert_eq!(log.count(DiagnosticKind::ReleaseWithoutAcquire), 1);
        log.warn("odd branch");
        assert_eq!(log.warnings().len(), 1);
    }
}
