//! Terminal and JSON rendering for the `cmdtree` binary.
//!
//! Diagnostics carry byte spans into the line (or grammar template) they
//! describe. Pretty output feeds that text to ariadne so the offending token
//! is underlined; JSON output serializes the diagnostics unchanged.

use std::io::{self, IsTerminal};

use anyhow::Result;
use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use cmdtree_diagnostics::{Diagnostic, Severity};
use serde::Serialize;

// ── Output format ───────────────────────────────────────────────────────

/// How results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human-readable text; diagnostics go to stderr through ariadne.
    Pretty,
    /// One JSON document on stdout.
    Json,
}

impl Format {
    /// Explicit choice, or pretty on a terminal and JSON on a pipe.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ if io::stdout().is_terminal() => Format::Pretty,
            _ => Format::Json,
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: &Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Info => ReportKind::Advice,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: &Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Info => Color::Blue,
        _ => Color::Yellow,
    }
}

fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref().filter(|c| !c.is_empty())?;
    Some(
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Render diagnostics against `source` (a command line or a template) to stderr.
///
/// `name` labels the source in the report header, e.g. `<line>`.
pub(crate) fn render_diagnostics_pretty(source: &str, name: &str, diagnostics: &[Diagnostic]) {
    let mut cache = (name, Source::from(source));

    for diag in diagnostics {
        let Some(span) = diag.span else {
            eprintln!("{}[{}]: {}", diag.severity, diag.id, diag.message);
            if let Some(note) = context_note(diag) {
                eprintln!("  = note: {note}");
            }
            if let Some(help) = diag.explain() {
                eprintln!("  = help: {help}");
            }
            continue;
        };

        // Incomplete lines point one past the last character.
        let span = span.clamp(source.len());
        let (start, end) = (span.start, span.end);

        let label = context_note(diag).unwrap_or_else(|| diag.message.clone());
        let mut report = Report::build(report_kind(&diag.severity), (name, start..end))
            .with_code(diag.id.as_ref())
            .with_message(&diag.message)
            .with_config(Config::default().with_compact(false))
            .with_label(
                Label::new((name, start..end))
                    .with_message(label)
                    .with_color(severity_color(&diag.severity)),
            );
        if let Some(help) = diag.explain() {
            report = report.with_help(help);
        }
        report.finish().eprint(&mut cache).ok();
    }
}

/// Print `2 errors, 1 warning` style counts to stderr.
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;
    let mut parts = Vec::new();
    if errors > 0 {
        let s = if errors == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{errors} error{s}").fg(Color::Red)));
    }
    if warnings > 0 {
        let s = if warnings == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{warnings} warning{s}").fg(Color::Yellow)));
    }
    if !parts.is_empty() {
        eprintln!("{}", parts.join(", "));
    }
}

// ── JSON rendering ──────────────────────────────────────────────────────

/// Pretty-printed JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Whether any diagnostic is an error; warnings do not fail a command.
pub(crate) fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}
