//! Shared types for php-symbols.
//!
//! Contains the symbol records produced by the scanner and the per-file
//! collections used by the index and the language server.

use serde::{Deserialize, Serialize};
use tower_lsp::ls_types::SymbolKind as LspSymbolKind;

/// Kind of a declared PHP symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Interface,
    Function,
}

impl SymbolKind {
    /// Convert to the ls_types SymbolKind used by tower-lsp.
    pub fn to_lsp_symbol_kind(self) -> LspSymbolKind {
        match self {
            SymbolKind::Class => LspSymbolKind::CLASS,
            SymbolKind::Interface => LspSymbolKind::INTERFACE,
            SymbolKind::Function => LspSymbolKind::FUNCTION,
        }
    }

    /// Whether this kind is closed by `{` (as opposed to `(`).
    pub fn is_class_like(self) -> bool {
        matches!(self, SymbolKind::Class | SymbolKind::Interface)
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Class => write!(f, "class"),
            SymbolKind::Interface => write!(f, "interface"),
            SymbolKind::Function => write!(f, "function"),
        }
    }
}

/// A declaration found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRecord {
    /// Declared name (e.g. "Foo", "bar")
    pub name: String,
    /// Kind of symbol
    pub kind: SymbolKind,
    /// 1-based line of the name
    pub line: u32,
    /// 0-based column of the first character of the name
    pub start_column: u32,
    /// 0-based column just past the last character of the name
    pub end_column: u32,
    /// Number of unmatched `{` before the declaration
    pub brace_depth: u32,
}

impl SymbolRecord {
    /// Name span as (start line, start col, end line, end col) with a 0-based line.
    ///
    /// Columns are counted in characters, as produced by the scanner.
    pub fn selection_range(&self) -> (u32, u32, u32, u32) {
        let line = self.line.saturating_sub(1);
        (line, self.start_column, line, self.end_column)
    }
}

/// Symbols extracted from a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSymbols {
    pub symbols: Vec<SymbolRecord>,
}

impl FileSymbols {
    pub fn new(symbols: Vec<SymbolRecord>) -> Self {
        FileSymbols { symbols }
    }
}
