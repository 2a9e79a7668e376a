//! SourceDocument: ropey::Rope holding an open file, rescanned chunk by chunk.

use crate::options::ScanOptions;
use crate::scanner::{ScanReport, Scanner};
use php_symbols_types::SymbolRecord;
use ropey::Rope;

/// Text of a single open PHP file.
pub struct SourceDocument {
    rope: Rope,
}

impl SourceDocument {
    pub fn new(text: &str) -> Self {
        SourceDocument {
            rope: Rope::from_str(text),
        }
    }

    /// Replace the whole content (used for full-sync changes).
    pub fn replace(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Apply an incremental edit from LSP didChange.
    ///
    /// Positions are 0-based lines and UTF-16 code units, as sent by the client.
    /// Out-of-range positions are clamped to the end of the line or document.
    pub fn apply_edit(
        &mut self,
        start_line: u32,
        start_char: u32,
        end_line: u32,
        end_char: u32,
        new_text: &str,
    ) {
        let start = self.position_to_char(start_line, start_char);
        let end = self.position_to_char(end_line, end_char).max(start);

        self.rope.remove(start..end);
        self.rope.insert(start, new_text);
    }

    /// Scan the document by walking the rope's chunks.
    pub fn scan(&self, options: &ScanOptions) -> ScanReport {
        let mut scanner = Scanner::with_options(options);
        for chunk in self.rope.chunks() {
            scanner.feed(chunk);
        }
        scanner.finish_report()
    }

    /// LSP range (0-based line, UTF-16 columns) of a symbol's name.
    pub fn symbol_range(&self, symbol: &SymbolRecord) -> (u32, u32, u32, u32) {
        let line = symbol.line.saturating_sub(1);
        (
            line,
            self.utf16_column(line, symbol.start_column),
            line,
            self.utf16_column(line, symbol.end_column),
        )
    }

    /// Convert a character column on a 0-based line to UTF-16 code units.
    pub fn utf16_column(&self, line: u32, char_column: u32) -> u32 {
        let line = line as usize;
        if line >= self.rope.len_lines() {
            return char_column;
        }
        let slice = self.rope.line(line);
        let column = (char_column as usize).min(slice.len_chars());
        slice.char_to_utf16_cu(column) as u32
    }

    /// Convert (line, UTF-16 offset) to a char index in the rope.
    fn position_to_char(&self, line: u32, character: u32) -> usize {
        let line = line as usize;
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let line_start = self.rope.line_to_char(line);
        let slice = self.rope.line(line);
        let utf16 = (character as usize).min(slice.len_utf16_cu());
        line_start + slice.utf16_cu_to_char(utf16)
    }
}

impl Default for SourceDocument {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use php_symbols_types::SymbolKind;

    #[test]
    fn test_scan_document() {
        let doc = SourceDocument::new("<?php\nclass Foo {\n    public function bar(): void {}\n}\n");
        let report = doc.scan(&ScanOptions::default());
        assert_eq!(report.symbols.len(), 2);
        assert_eq!(report.symbols[0].kind, SymbolKind::Class);
        assert_eq!(report.symbols[1].name, "bar");
    }

    #[test]
    fn test_incremental_edit() {
        let mut doc = SourceDocument::new("<?php\nclass Foo {}\n");

        // Change "Foo" to "Bar" (line 1, chars 6-9)
        doc.apply_edit(1, 6, 1, 9, "Bar");
        assert!(doc.rope.to_string().contains("class Bar {}"));

        let report = doc.scan(&ScanOptions::default());
        assert_eq!(report.symbols[0].name, "Bar");
    }

    #[test]
    fn test_edit_after_multibyte_text() {
        // "é" is one UTF-16 unit, "𝄞" is two
        let mut doc = SourceDocument::new("<?php /* é𝄞 */ class Foo {}\n");
        doc.apply_edit(0, 22, 0, 25, "Baz");
        assert_eq!(doc.rope.to_string(), "<?php /* é𝄞 */ class Baz {}\n");
    }

    #[test]
    fn test_edit_out_of_range_appends() {
        let mut doc = SourceDocument::new("<?php\n");
        doc.apply_edit(10, 0, 12, 4, "function late() {}\n");
        assert!(doc.rope.to_string().ends_with("function late() {}\n"));
        assert_eq!(doc.scan(&ScanOptions::default()).symbols[0].name, "late");
    }

    #[test]
    fn test_replace() {
        let mut doc = SourceDocument::new("<?php class A {}");
        doc.replace("<?php class B {}");
        assert_eq!(doc.scan(&ScanOptions::default()).symbols[0].name, "B");
    }

    #[test]
    fn test_symbol_range_in_utf16() {
        let doc = SourceDocument::new("<?php\n/*𝄞*/ class Foo {}\n");
        let report = doc.scan(&ScanOptions::default());
        let foo = &report.symbols[0];
        // Scanner counts "𝄞" as one column, UTF-16 as two
        assert_eq!(foo.start_column, 12);
        assert_eq!(doc.symbol_range(foo), (1, 13, 1, 16));
    }

    #[test]
    fn test_large_document_spans_chunks() {
        let mut source = String::from("<?php\n");
        for i in 0..2000 {
            source.push_str(&format!("function f{}($a = \"){{\") {{ return [$a]; }}\n", i));
        }
        let doc = SourceDocument::new(&source);
        assert!(doc.rope.chunks().count() > 1);
        let report = doc.scan(&ScanOptions::default());
        assert_eq!(report.symbols.len(), 2000);
        assert_eq!(report.symbols, crate::scan_str(&source));
    }
}
