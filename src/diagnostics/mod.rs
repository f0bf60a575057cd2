//! Structured diagnostics accumulated during semantic analysis.
//!
//! The core reports every failure through a [`DiagnosticSink`]; rendering
//! source snippets and choosing exit codes is the consuming driver's job.
//! A JSON payload is provided for tooling consumers.

use blake3::Hasher;
use serde::Serialize;
use std::fmt;

pub const JSON_SCHEMA_VERSION: &str = "1.0.0";

/// Identifier for a source file, assigned by the driver's file loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FileId(pub u32);

impl FileId {
    pub const UNKNOWN: FileId = FileId(u32::MAX);
}

/// Span into a source file (byte offsets).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Span {
    pub file_id: FileId,
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            file_id: FileId::UNKNOWN,
            start,
            end,
        }
    }

    #[must_use]
    pub fn in_file(file_id: FileId, start: usize, end: usize) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    #[must_use]
    pub fn with_file(self, file_id: FileId) -> Self {
        Self { file_id, ..self }
    }
}

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

/// Structured identifier for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticCode {
    pub code: String,
    pub category: Option<String>,
}

impl DiagnosticCode {
    #[must_use]
    pub fn new(code: impl Into<String>, category: Option<String>) -> Self {
        Self {
            code: code.into(),
            category,
        }
    }
}

/// Highlight for a particular span within the diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub is_primary: bool,
}

impl Label {
    #[must_use]
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    #[must_use]
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }
}

/// Fix-it suggestion for the developer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub message: String,
    pub span: Option<Span>,
    pub replacement: Option<String>,
}

impl Suggestion {
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        span: Option<Span>,
        replacement: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            span,
            replacement,
        }
    }
}

/// Rich diagnostic entry with optional labels, notes, and suggestions.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<DiagnosticCode>,
    pub message: String,
    pub primary_label: Option<Label>,
    pub secondary_labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestions: Vec<Suggestion>,
}

impl Diagnostic {
    #[must_use]
    pub fn error(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(Severity::Error, message, span)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(Severity::Warning, message, span)
    }

    #[must_use]
    pub fn note(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::new(Severity::Note, message, span)
    }

    #[must_use]
    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub fn with_primary_label(mut self, message: impl Into<String>) -> Self {
        if let Some(label) = self.primary_label.take() {
            self.primary_label = Some(Label::primary(label.span, message));
        }
        self
    }

    #[must_use]
    pub fn with_secondary(mut self, label: Label) -> Self {
        self.secondary_labels.push(label);
        self
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn add_suggestion(&mut self, suggestion: Suggestion) {
        self.suggestions.push(suggestion);
    }

    #[must_use]
    fn new(severity: Severity, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            primary_label: span.map(|span| Label::primary(span, String::new())),
            secondary_labels: Vec::new(),
            notes: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

/// Collection helper used to accumulate diagnostics during checking.
#[derive(Debug)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    namespace: String,
}

impl DiagnosticSink {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            diagnostics: Vec::new(),
            namespace: namespace.into(),
        }
    }

    pub fn push(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.code.is_none() {
            diagnostic.code = Some(self.auto_code(&diagnostic));
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn push_error(&mut self, message: impl Into<String>, span: Option<Span>) {
        self.push(Diagnostic::error(message, span));
    }

    pub fn push_warning(&mut self, message: impl Into<String>, span: Option<Span>) {
        self.push(Diagnostic::warning(message, span));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Move every accumulated diagnostic into `other`, preserving order.
    pub fn drain_into(&mut self, other: &mut DiagnosticSink) {
        for diagnostic in self.diagnostics.drain(..) {
            other.diagnostics.push(diagnostic);
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Serialize the sink's contents for tooling consumers.
    #[must_use]
    pub fn to_json(&self) -> String {
        let payload: Vec<JsonDiagnostic> =
            self.diagnostics.iter().map(JsonDiagnostic::from).collect();
        serde_json::to_string(&payload).unwrap_or_else(|_| "[]".into())
    }

    fn auto_code(&self, diagnostic: &Diagnostic) -> DiagnosticCode {
        let mut hasher = Hasher::new();
        hasher.update(self.namespace.as_bytes());
        hasher.update(diagnostic.message.as_bytes());
        if let Some(label) = diagnostic.primary_label.as_ref() {
            hasher.update(&label.span.start.to_le_bytes());
            hasher.update(&label.span.end.to_le_bytes());
        }
        let hash = hasher.finalize();
        let bytes = hash.as_bytes();
        let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let suffix = raw % 100_000;
        let code = format!("{}{:05}", self.namespace.to_ascii_uppercase(), suffix);
        DiagnosticCode::new(code, Some(self.namespace.clone()))
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new("sema")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self
            .code
            .as_ref()
            .map_or("UNKNOWN", |c| c.code.as_str());
        write!(f, "{}[{code}]: {}", self.severity.as_str(), self.message)
    }
}

#[derive(Serialize)]
struct JsonDiagnostic {
    version: String,
    severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<DiagnosticCode>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_span: Option<Span>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<JsonSuggestion>,
}

#[derive(Serialize)]
struct JsonLabel {
    span: Span,
    message: String,
    primary: bool,
}

#[derive(Serialize)]
struct JsonSuggestion {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replacement: Option<String>,
}

impl From<&Diagnostic> for JsonDiagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        let mut labels = Vec::new();
        if let Some(label) = diagnostic.primary_label.as_ref() {
            labels.push(JsonLabel {
                span: label.span,
                message: label.message.clone(),
                primary: true,
            });
        }
        for label in &diagnostic.secondary_labels {
            labels.push(JsonLabel {
                span: label.span,
                message: label.message.clone(),
                primary: false,
            });
        }
        Self {
            version: JSON_SCHEMA_VERSION.to_string(),
            severity: diagnostic.severity.as_str().to_string(),
            code: diagnostic.code.clone(),
            message: diagnostic.message.clone(),
            primary_span: diagnostic.primary_label.as_ref().map(|label| label.span),
            labels,
            notes: diagnostic.notes.clone(),
            suggestions: diagnostic
                .suggestions
                .iter()
                .map(|s| JsonSuggestion {
                    message: s.message.clone(),
                    span: s.span,
                    replacement: s.replacement.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_assigns_auto_codes() {
        let mut sink = DiagnosticSink::new("sema");
        sink.push_error("unbound identifier `frob`", Some(Span::new(4, 8)));
        let diagnostics = sink.into_vec();
        assert_eq!(diagnostics.len(), 1);
        let code = diagnostics[0].code.as_ref().unwrap();
        assert!(code.code.starts_with("SEMA"));
        assert_eq!(code.category.as_deref(), Some("sema"));
    }

    #[test]
    fn auto_codes_are_stable_for_identical_input() {
        let mut first = DiagnosticSink::new("sema");
        first.push_error("mismatch", Some(Span::new(0, 1)));
        let mut second = DiagnosticSink::new("sema");
        second.push_error("mismatch", Some(Span::new(0, 1)));
        assert_eq!(
            first.into_vec()[0].code.as_ref().unwrap().code,
            second.into_vec()[0].code.as_ref().unwrap().code
        );
    }

    #[test]
    fn explicit_codes_are_preserved() {
        let mut sink = DiagnosticSink::new("sema");
        sink.push(
            Diagnostic::error("boom", None)
                .with_code(DiagnosticCode::new("SEM001", Some("sema".into()))),
        );
        assert_eq!(sink.into_vec()[0].code.as_ref().unwrap().code, "SEM001");
    }

    #[test]
    fn drain_preserves_order() {
        let mut buffer = DiagnosticSink::new("sema");
        buffer.push_error("first", None);
        buffer.push_warning("second", None);
        let mut sink = DiagnosticSink::new("sema");
        buffer.drain_into(&mut sink);
        assert!(buffer.is_empty());
        let drained = sink.into_vec();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "first");
        assert_eq!(drained[1].message, "second");
    }

    #[test]
    fn json_payload_matches_schema() {
        let mut sink = DiagnosticSink::new("sema");
        let mut diagnostic = Diagnostic::error("type mismatch", Some(Span::new(10, 14)))
            .with_code(DiagnosticCode::new("SEM001", Some("sema".into())))
            .with_secondary(Label::secondary(Span::new(2, 5), "declared here"));
        diagnostic.add_note("found `String`, expected `Int`");
        sink.push(diagnostic);

        let value: serde_json::Value = serde_json::from_str(&sink.to_json()).unwrap();
        let entry = &value[0];
        assert_eq!(entry["version"], JSON_SCHEMA_VERSION);
        assert_eq!(entry["severity"], "error");
        assert_eq!(entry["code"]["code"], "SEM001");
        assert_eq!(entry["primary_span"]["start"], 10);
        assert_eq!(entry["labels"].as_array().unwrap().len(), 2);
        assert_eq!(entry["labels"][1]["primary"], false);
        assert_eq!(entry["notes"][0], "found `String`, expected `Int`");
    }

    #[test]
    fn display_includes_code_and_message() {
        let diagnostic = Diagnostic::error("no implicit found", None)
            .with_code(DiagnosticCode::new("SEM004", None));
        assert_eq!(diagnostic.to_string(), "error[SEM004]: no implicit found");
    }
}
