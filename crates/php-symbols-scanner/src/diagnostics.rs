//! Diagnostics derived from the scanner's end state.
//!
//! The scanner never fails on malformed input, but a file that ends inside a
//! string or with a dangling `class Foo` is worth pointing out.

use crate::scanner::ScanReport;
use crate::state::ScanState;

/// A problem found at end-of-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanDiagnostic {
    /// Line/column range: (start_line, start_col, end_line, end_col), 0-based lines.
    pub range: (u32, u32, u32, u32),
    pub message: String,
    pub kind: ScanDiagnosticKind,
}

/// Kind of scan diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDiagnosticKind {
    /// A quoted string was still open.
    UnterminatedString,
    /// A `/* */` comment was still open.
    UnterminatedComment,
    /// A `(` was never closed.
    UnclosedParenthesis,
    /// A declaration keyword never reached its `{` or `(`.
    UnresolvedDeclaration,
}

/// Collect diagnostics from a finished scan.
pub fn extract_scan_diagnostics(report: &ScanReport) -> Vec<ScanDiagnostic> {
    let mut diagnostics = Vec::new();

    if let Some(frame) = &report.open_region {
        let (kind, message) = match frame.state {
            ScanState::DoubleQuoted | ScanState::SingleQuoted => (
                ScanDiagnosticKind::UnterminatedString,
                "Unterminated string literal",
            ),
            ScanState::BlockComment => (
                ScanDiagnosticKind::UnterminatedComment,
                "Unterminated comment",
            ),
            _ => (
                ScanDiagnosticKind::UnclosedParenthesis,
                "Unclosed parenthesis",
            ),
        };
        let line = frame.line.saturating_sub(1);
        diagnostics.push(ScanDiagnostic {
            range: (line, frame.column, line, frame.column + 1),
            message: message.to_string(),
            kind,
        });
    }

    for decl in &report.unresolved {
        let line = decl.line.saturating_sub(1);
        let end = decl.column + decl.keyword.chars().count() as u32;
        diagnostics.push(ScanDiagnostic {
            range: (line, decl.column, line, end),
            message: format!("Incomplete {} declaration", decl.kind),
            kind: ScanDiagnosticKind::UnresolvedDeclaration,
        });
    }

    diagnostics
}
