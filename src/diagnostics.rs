use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ChapterNumbering,
    HadithNumbering,
    CountMismatch,
    AppendedUnit,
    UnitTypeMismatch,
    MissingPosition,
    SkippedSource,
    UnplacedContent,
    MissingNarrators,
    MissingCrossReference,
    MarkerCleanup,
}

/// Renders the serde name, so logs and stored records agree on one spelling.
impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(Value::String(name)) => f.write_str(&name),
            _ => Err(fmt::Error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Append-only record of expected corpus anomalies, threaded through each stage.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        warn!(kind = %kind, "{message}");
        self.entries.push(Diagnostic { kind, message });
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    #[cfg(test)]
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    /// Logs a per-kind summary once a stage completes.
    pub fn log_summary(&self, stage: &str) {
        let mut kinds: Vec<DiagnosticKind> = Vec::new();
        for entry in &self.entries {
            if !kinds.contains(&entry.kind) {
                kinds.push(entry.kind);
            }
        }

        for kind in kinds {
            info!(stage, kind = %kind, count = self.count(kind), "diagnostic summary");
        }
        info!(stage, total = self.len(), "diagnostics collected");
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
