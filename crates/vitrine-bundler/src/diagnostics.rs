//! Diagnostic extraction from Rolldown errors.
//!
//! Rolldown reports build failures as a batch of [`BuildDiagnostic`]s. Each
//! one is rendered through Rolldown's own report printer and reduced to a
//! small, stable shape that the error surface can print: a one-line
//! message, a location and the code frame.

use rolldown_error::{BatchedBuildDiagnostic, BuildDiagnostic, DiagnosticOptions, EventKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Extracted diagnostic information from Rolldown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub help: Option<String>,
    /// Rendered report with the code frame, without colors.
    pub frame: Option<String>,
}

impl ExtractedDiagnostic {
    /// A diagnostic that carries only a message.
    pub fn other(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Other(kind.into()),
            message: message.into(),
            file: None,
            line: None,
            column: None,
            help: None,
            frame: None,
        }
    }

    /// `file:line:column`, as far as it is known.
    pub fn location(&self) -> Option<String> {
        let file = self.file.as_deref()?;
        Some(match (self.line, self.column) {
            (Some(line), Some(column)) => format!("    at {file}:{line}:{column}"),
            (Some(line), None) => format!("    at {file}:{line}"),
            _ => format!("    at {file}"),
        })
    }
}

/// Diagnostic kind (mirrors Rolldown's event kinds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    UnresolvedEntry,
    UnresolvedImport,
    MissingExport,
    Plugin,
    Other(String),
}

impl DiagnosticKind {
    fn from_event(kind: EventKind) -> Self {
        match kind {
            EventKind::ParseError | EventKind::JsonParseError => DiagnosticKind::ParseError,
            EventKind::UnresolvedEntry => DiagnosticKind::UnresolvedEntry,
            EventKind::UnresolvedImport | EventKind::ResolveError => {
                DiagnosticKind::UnresolvedImport
            }
            EventKind::MissingExportError => DiagnosticKind::MissingExport,
            EventKind::PluginError => DiagnosticKind::Plugin,
            other => DiagnosticKind::Other(other.to_string()),
        }
    }

    /// Hint for the kinds a preview user can act on.
    fn hint(&self) -> Option<&'static str> {
        match self {
            DiagnosticKind::UnresolvedImport => Some(
                "Install the missing package in the component directory, or pass it with ?external=<name>",
            ),
            DiagnosticKind::ParseError => Some("JSX and newer syntax need the ?babelify query flag"),
            _ => None,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::ParseError => f.write_str("ParseError"),
            DiagnosticKind::UnresolvedEntry => f.write_str("UnresolvedEntry"),
            DiagnosticKind::UnresolvedImport => f.write_str("UnresolvedImport"),
            DiagnosticKind::MissingExport => f.write_str("MissingExport"),
            DiagnosticKind::Plugin => f.write_str("PluginError"),
            DiagnosticKind::Other(kind) => f.write_str(kind),
        }
    }
}

/// Extract every diagnostic of a failed build. Paths are shown relative to
/// `cwd`.
pub fn extract_from_batch(batch: &BatchedBuildDiagnostic, cwd: &Path) -> Vec<ExtractedDiagnostic> {
    let options = DiagnosticOptions {
        cwd: cwd.to_path_buf(),
    };
    batch
        .iter()
        .map(|diagnostic| extract_single(diagnostic, &options))
        .collect()
}

fn extract_single(diagnostic: &BuildDiagnostic, options: &DiagnosticOptions) -> ExtractedDiagnostic {
    let kind = DiagnosticKind::from_event(diagnostic.kind());
    let rendered = diagnostic.to_diagnostic_with(options);
    let report = rendered.convert_to_string(false);

    let (file, line, column) = match rendered.get_primary_location() {
        Some((file, line, column, _)) => (
            Some(file),
            u32::try_from(line).ok(),
            u32::try_from(column + 1).ok(),
        ),
        None => (None, None, None),
    };

    let help = extract_help_text(&report).or_else(|| kind.hint().map(str::to_string));

    ExtractedDiagnostic {
        message: report_headline(&report),
        kind,
        file,
        line,
        column,
        help,
        frame: Some(report.trim_end().to_string()),
    }
}

/// First line of a rendered report without the `[CODE] Error:` prefix.
fn report_headline(report: &str) -> String {
    let first = report.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let without_code = match first.strip_prefix('[').and_then(|rest| rest.split_once("] ")) {
        Some((_, rest)) => rest,
        None => first,
    };
    without_code
        .strip_prefix("Error: ")
        .or_else(|| without_code.strip_prefix("Warning: "))
        .unwrap_or(without_code)
        .trim()
        .to_string()
}

/// Extract help text from a rendered report.
fn extract_help_text(text: &str) -> Option<String> {
    for indicator in &["Help: ", "help: "] {
        if let Some(pos) = text.find(indicator) {
            let help = text[pos + indicator.len()..].lines().next().unwrap_or("").trim();
            if !help.is_empty() {
                return Some(help.to_string());
            }
        }
    }
    None
}
