//! Structured diagnostics for cmdtree.
//!
//! Both the line matcher and the command installer report problems as
//! [`Diagnostic`] values: a stable code from [`codes`], a severity, a message,
//! and optionally a byte [`Span`] into the line or template being examined.
//! [`explain`] returns long-form help for every known code.

#![warn(missing_docs)]

/// Diagnostic ID constants.
pub mod codes;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// The line cannot be dispatched, or the command set cannot be built.
    Error,
    /// The command set builds but something in it is unreachable or odd.
    Warn,
    /// Informational.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
        })
    }
}

/// Half-open byte range `[start, end)` into a command line or template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl Span {
    /// Span from `start` to `end`. Panics if they are reversed.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "reversed span {start}..{end}");
        Span { start, end }
    }

    /// Zero-width span, used for "something is missing here".
    pub fn empty(at: usize) -> Self {
        Span { start: at, end: at }
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is zero-width.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The same span, shrunk to fit inside a text of `len` bytes.
    pub fn clamp(self, len: usize) -> Self {
        let start = self.start.min(len);
        Span {
            start,
            end: self.end.min(len).max(start),
        }
    }

    /// The covered text, or `""` when the span is out of bounds.
    pub fn slice(self, text: &str) -> &str {
        text.get(self.start..self.end).unwrap_or_default()
    }
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code, e.g. `CLI1001`.
    pub id: Cow<'static, str>,
    /// Severity.
    pub severity: Severity,
    /// One-line message.
    pub message: String,
    /// Location in the examined text, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Key/value details for tools (`token`, `candidates`, `template`, ...).
    /// Sorted so JSON output is stable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Diagnostic {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// An error.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::with_severity(Severity::Error, id, message, span)
    }

    /// A warning.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::with_severity(Severity::Warn, id, message, span)
    }

    /// Replace the context map.
    pub fn with_context(mut self, context: BTreeMap<String, String>) -> Self {
        self.context = Some(context);
        self
    }

    /// Add one context entry, keeping any already present.
    pub fn note(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether this diagnostic should fail the operation.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Long-form help for this diagnostic's code.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

const EXPLANATIONS: &[(&str, &str)] = &[
    (
        codes::PARSE_NO_MATCH,
        "No command reachable from the current position accepts this token. \
         Check the spelling, the current mode, and the session privilege.",
    ),
    (
        codes::PARSE_AMBIGUOUS,
        "Several commands accept this token with the same priority, usually because an \
         abbreviation is a prefix of more than one keyword. Type more characters.",
    ),
    (
        codes::PARSE_INCOMPLETE,
        "The line is a valid beginning of one or more commands but stops before any of \
         them is complete.",
    ),
    (
        codes::PARSE_INCOMPLETE_PIPE,
        "Text after `|` must be a complete output modifier such as `include REGEX` or \
         `begin REGEX`.",
    ),
    (codes::PARSE_NO_MODE, "The session's mode has no installed commands."),
    (
        codes::PARSE_ARGV_TOO_LONG,
        "A line may contain at most 128 tokens per segment and each token at most 256 bytes.",
    ),
    (
        codes::INSTALL_DUPLICATE_COMMAND,
        "Another command already terminates at the same grammar position in this mode.",
    ),
    (
        codes::INSTALL_MALFORMED_GRAMMAR,
        "The grammar string has unbalanced groups, an empty alternative, a bad range, or \
         an unknown placeholder.",
    ),
    (
        codes::INSTALL_HELP_MISMATCH,
        "A command must provide either no help strings or exactly one per keyword and \
         placeholder.",
    ),
    (
        codes::INSTALL_UNKNOWN_COMMAND,
        "The referenced command path is not installed.",
    ),
    (
        codes::INSTALL_SHADOWED_COMMAND,
        "The command's canonical line is matched by a different command, so it can never \
         be reached with that input.",
    ),
    (
        codes::INSTALL_UNKNOWN_MODE,
        "The command set references a mode name that it does not declare.",
    ),
];

/// Long-form help for a diagnostic code, if the code is known.
pub fn explain(id: &str) -> Option<&'static str> {
    EXPLANATIONS
        .iter()
        .find(|(code, _)| *code == id)
        .map(|(_, text)| *text)
}
