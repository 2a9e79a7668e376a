//! Global workspace symbol index.

use dashmap::DashMap;
use php_symbols_types::{FileSymbols, SymbolRecord};

/// A symbol together with the file it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedSymbol {
    pub uri: String,
    pub symbol: SymbolRecord,
}

/// Global index of all symbols in the workspace.
pub struct WorkspaceIndex {
    /// File URI → extracted symbols for that file
    pub file_symbols: DashMap<String, FileSymbols>,
}

impl WorkspaceIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        WorkspaceIndex {
            file_symbols: DashMap::new(),
        }
    }

    /// Update symbols from a single file, replacing whatever was there.
    pub fn update_file(&self, uri: &str, file_symbols: FileSymbols) {
        self.file_symbols.insert(uri.to_string(), file_symbols);
    }

    /// Remove all symbols from a file.
    pub fn remove_file(&self, uri: &str) {
        self.file_symbols.remove(uri);
    }

    /// Symbols of a single file.
    pub fn get(&self, uri: &str) -> Option<FileSymbols> {
        self.file_symbols.get(uri).map(|r| r.value().clone())
    }

    /// Search symbols by name (case-insensitive substring match).
    ///
    /// Results are ordered by URI, then by position in the file.
    pub fn search(&self, query: &str) -> Vec<IndexedSymbol> {
        let query_lower = query.to_lowercase();
        let mut results = Vec::new();

        for entry in self.file_symbols.iter() {
            for sym in &entry.value().symbols {
                if sym.name.to_lowercase().contains(&query_lower) {
                    results.push(IndexedSymbol {
                        uri: entry.key().clone(),
                        symbol: sym.clone(),
                    });
                }
            }
        }

        results.sort_by(|a, b| {
            a.uri
                .cmp(&b.uri)
                .then(a.symbol.line.cmp(&b.symbol.line))
                .then(a.symbol.start_column.cmp(&b.symbol.start_column))
        });
        results
    }

    pub fn file_count(&self) -> usize {
        self.file_symbols.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.file_symbols
            .iter()
            .map(|entry| entry.value().symbols.len())
            .sum()
    }
}

impl Default for WorkspaceIndex {
    fn default() -> Self {
        Self::new()
    }
}
