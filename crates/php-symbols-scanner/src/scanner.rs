//! The declaration scanner.
//!
//! `Scanner` consumes text one character at a time. Every piece of partial
//! state (open-tag prefix, pending `?`/`/`/`*`/`#` lead character, the
//! identifier being read, queued intents, the lookback buffer) lives in the
//! scanner itself, so feeding `"<?php cla"` then `"ss Foo {"` gives the same
//! result as feeding the whole string at once.

use crate::intent::{classify_keyword, is_declared_name, IntentQueue, Terminator};
use crate::lookback::LookbackBuffer;
use crate::options::ScanOptions;
use crate::state::{Frame, ScanState, StateStack};
use php_symbols_types::{SymbolKind, SymbolRecord};

/// Sequences that switch from plain text to PHP code (compared lowercased).
const OPEN_TAGS: [&str; 2] = ["<?php", "<?="];

/// Whether `ch` can be part of a PHP label.
///
/// PHP treats bytes `0x7f..=0xff` as label bytes, so every non-ASCII
/// character counts.
pub fn is_label_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '\u{7f}' || !ch.is_ascii()
}

/// Identifier currently being read.
#[derive(Debug, Clone, Default)]
struct PendingIdentifier {
    text: String,
    line: u32,
    column: u32,
    /// Last two non-whitespace characters before the identifier, nearest first.
    prefix: (Option<char>, Option<char>),
}

impl PendingIdentifier {
    fn push(&mut self, ch: char, line: u32, column: u32, prefix: (Option<char>, Option<char>)) {
        if self.text.is_empty() {
            self.line = line;
            self.column = column;
            self.prefix = prefix;
        }
        self.text.push(ch);
    }

    fn take(&mut self) -> Option<PendingIdentifier> {
        if self.text.is_empty() {
            None
        } else {
            Some(std::mem::take(self))
        }
    }

    fn clear(&mut self) {
        self.text.clear();
    }

    /// `$class`, `Foo::class` and `$obj->function` are not keywords. A single
    /// `:` (alternative syntax, `case 1:`) does not disqualify.
    fn is_keyword_eligible(&self) -> bool {
        !matches!(
            self.prefix,
            (Some('$'), _) | (Some(':'), Some(':')) | (Some('>'), Some('-'))
        )
    }
}

/// A declaration keyword that never reached its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDeclaration {
    /// The keyword as written (e.g. "class", "Function").
    pub keyword: String,
    pub kind: SymbolKind,
    /// 1-based line of the keyword.
    pub line: u32,
    /// 0-based column of the keyword.
    pub column: u32,
}

/// Everything known at end-of-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Declarations in source order.
    pub symbols: Vec<SymbolRecord>,
    /// Innermost string, block comment or parenthesis still open at the end.
    pub open_region: Option<Frame>,
    /// Keywords whose declarations were cut off by the end of the stream.
    pub unresolved: Vec<UnresolvedDeclaration>,
    /// Number of lines seen.
    pub lines: u32,
}

/// Streaming declaration scanner. One instance scans one file.
#[derive(Debug, Clone)]
pub struct Scanner {
    options: ScanOptions,
    states: StateStack,
    /// Candidate open tag read so far in `Initial`.
    tag: String,
    /// First half of a two-character sequence (`?>`, `//`, `/*`, `*/`, `#[`).
    lead: Option<char>,
    /// Last non-whitespace character consumed in code.
    prev: Option<char>,
    /// The non-whitespace character before `prev`.
    prev2: Option<char>,
    pending: PendingIdentifier,
    intents: IntentQueue,
    lookback: LookbackBuffer,
    symbols: Vec<SymbolRecord>,
    line: u32,
    column: u32,
    brace_depth: u32,
}

impl Scanner {
    /// Create a scanner with default options.
    pub fn new() -> Self {
        Self::with_options(&ScanOptions::default())
    }

    pub fn with_options(options: &ScanOptions) -> Self {
        Scanner {
            options: options.clone(),
            states: StateStack::new(),
            tag: String::new(),
            lead: None,
            prev: None,
            prev2: None,
            pending: PendingIdentifier::default(),
            intents: IntentQueue::new(),
            lookback: LookbackBuffer::new(options.lookback_capacity),
            symbols: Vec::new(),
            line: 1,
            column: 0,
            brace_depth: 0,
        }
    }

    /// Consume the next chunk of source text.
    pub fn feed(&mut self, chunk: &str) {
        for ch in chunk.chars() {
            self.step(ch);
        }
    }

    /// Current lexical state.
    pub fn state(&self) -> ScanState {
        self.states.current()
    }

    /// Current 1-based line.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn brace_depth(&self) -> u32 {
        self.brace_depth
    }

    /// End the scan and return the declarations found.
    pub fn finish(self) -> Vec<SymbolRecord> {
        self.finish_report().symbols
    }

    /// End the scan and return the declarations together with the end state.
    pub fn finish_report(mut self) -> ScanReport {
        if self.states.current() == ScanState::InScripting {
            self.finalize_pending();
        }

        let unresolved: Vec<UnresolvedDeclaration> = self
            .intents
            .iter()
            .filter_map(|intent| {
                let keyword = self.lookback.get(intent.keyword())?;
                Some(UnresolvedDeclaration {
                    keyword: keyword.text.clone(),
                    kind: intent.kind(),
                    line: keyword.line,
                    column: keyword.column,
                })
            })
            .collect();
        let open_region = self.states.innermost_open_region().copied();

        tracing::debug!(
            "Scan finished: {} symbols, {} lines, {} unresolved declarations",
            self.symbols.len(),
            self.line,
            unresolved.len()
        );

        ScanReport {
            symbols: self.symbols,
            open_region,
            unresolved,
            lines: self.line,
        }
    }

    fn step(&mut self, ch: char) {
        match ch {
            // Carriage returns are invisible: they take no column.
            '\r' => return,
            '\n' => {
                self.end_line();
                return;
            }
            _ => {}
        }

        match self.states.current() {
            ScanState::Initial => self.step_initial(ch),
            ScanState::InScripting => self.step_scripting(ch),
            ScanState::ParenDepth(depth) => self.step_paren(ch, depth),
            ScanState::DoubleQuoted => self.step_quoted(ch, '"'),
            ScanState::SingleQuoted => self.step_quoted(ch, '\''),
            ScanState::LineComment => self.step_line_comment(ch),
            ScanState::BlockComment => self.step_block_comment(ch),
        }
        self.column = self.column.saturating_add(1);
    }

    fn end_line(&mut self) {
        match self.states.current() {
            ScanState::Initial => self.tag.clear(),
            // A line break ends an identifier just like a space does.
            ScanState::InScripting => self.finalize_pending(),
            ScanState::LineComment => self.states.pop(),
            _ => self.pending.clear(),
        }
        self.lead = None;
        self.line = self.line.saturating_add(1);
        self.column = 0;
    }

    fn step_initial(&mut self, ch: char) {
        if ch == '<' {
            self.tag.clear();
            self.tag.push('<');
            return;
        }
        if self.tag.is_empty() {
            return;
        }

        self.tag.push(ch.to_ascii_lowercase());
        if OPEN_TAGS.contains(&self.tag.as_str()) {
            self.tag.clear();
            self.lead = None;
            self.set_prev(None);
            self.push_state(ScanState::InScripting);
        } else if !OPEN_TAGS.iter().any(|t| t.starts_with(self.tag.as_str())) {
            self.tag.clear();
        }
    }

    fn step_scripting(&mut self, ch: char) {
        match (self.lead.take(), ch) {
            (Some('?'), '>') => {
                self.leave_scripting();
                return;
            }
            (Some('/'), '/') => {
                self.push_state_at_lead(ScanState::LineComment);
                return;
            }
            (Some('/'), '*') => {
                self.push_state_at_lead(ScanState::BlockComment);
                return;
            }
            _ => {}
        }

        if is_label_char(ch) {
            self.pending
                .push(ch, self.line, self.column, (self.prev, self.prev2));
            self.set_prev(Some(ch));
            return;
        }

        self.finalize_pending();

        match ch {
            c if c.is_ascii_whitespace() => return,
            '"' => self.push_state(ScanState::DoubleQuoted),
            '\'' => self.push_state(ScanState::SingleQuoted),
            '#' => {
                self.push_state(ScanState::LineComment);
                self.lead = Some('#');
            }
            '/' | '?' => self.lead = Some(ch),
            '(' => {
                self.resolve(Terminator::Paren);
                self.push_state(ScanState::ParenDepth(0));
            }
            '{' => {
                self.resolve(Terminator::Brace);
                self.brace_depth = self.brace_depth.saturating_add(1);
            }
            '}' => self.brace_depth = self.brace_depth.saturating_sub(1),
            ';' => self.cancel_intents(),
            _ => {}
        }
        self.set_prev(Some(ch));
    }

    fn step_paren(&mut self, ch: char, depth: u32) {
        match (self.lead.take(), ch) {
            (Some('?'), '>') => {
                self.leave_scripting();
                return;
            }
            (Some('/'), '/') => {
                self.push_state_at_lead(ScanState::LineComment);
                return;
            }
            (Some('/'), '*') => {
                self.push_state_at_lead(ScanState::BlockComment);
                return;
            }
            _ => {}
        }

        match ch {
            '(' => self.states.replace_current(ScanState::ParenDepth(depth + 1)),
            ')' if depth == 0 => self.states.pop(),
            ')' => self.states.replace_current(ScanState::ParenDepth(depth - 1)),
            '"' => self.push_state(ScanState::DoubleQuoted),
            '\'' => self.push_state(ScanState::SingleQuoted),
            '#' => {
                self.push_state(ScanState::LineComment);
                self.lead = Some('#');
            }
            '/' | '?' => self.lead = Some(ch),
            '{' => self.brace_depth = self.brace_depth.saturating_add(1),
            '}' => self.brace_depth = self.brace_depth.saturating_sub(1),
            _ => {}
        }
        if !ch.is_ascii_whitespace() {
            self.set_prev(Some(ch));
        }
    }

    fn step_quoted(&mut self, ch: char, quote: char) {
        if ch == quote {
            self.states.pop();
            self.set_prev(Some(ch));
        }
    }

    fn step_line_comment(&mut self, ch: char) {
        match (self.lead.take(), ch) {
            // `#[` opens an attribute, not a comment
            (Some('#'), '[') => self.states.pop(),
            (Some('?'), '>') => self.leave_scripting(),
            (_, '?') => self.lead = Some('?'),
            _ => {}
        }
    }

    fn step_block_comment(&mut self, ch: char) {
        match (self.lead.take(), ch) {
            (Some('*'), '/') => self.states.pop(),
            (_, '*') => self.lead = Some('*'),
            _ => {}
        }
    }

    fn push_state(&mut self, state: ScanState) {
        self.states.push(state, self.line, self.column);
    }

    /// Push a state that began at the previous character.
    fn push_state_at_lead(&mut self, state: ScanState) {
        self.states
            .push(state, self.line, self.column.saturating_sub(1));
    }

    fn leave_scripting(&mut self) {
        self.finalize_pending();
        self.states.reset();
        self.lead = None;
        self.set_prev(None);
        self.tag.clear();
    }

    /// Shift `ch` into the last-two-characters window. `None` clears it.
    fn set_prev(&mut self, ch: Option<char>) {
        self.prev2 = ch.and(self.prev);
        self.prev = ch;
    }

    /// Turn the identifier being read into a label record, queueing an
    /// intent if it is a declaration keyword.
    fn finalize_pending(&mut self) {
        let Some(ident) = self.pending.take() else {
            return;
        };
        let keyword = if ident.is_keyword_eligible() {
            classify_keyword(&ident.text, self.options.distinct_interfaces)
        } else {
            None
        };
        let seq = self
            .lookback
            .push(ident.text, ident.line, ident.column, self.brace_depth);
        if let Some(kind) = keyword {
            self.intents.push(kind, seq);
        }
    }

    /// Emit a symbol for every intent closed by `terminator`.
    fn resolve(&mut self, terminator: Terminator) {
        for intent in self.intents.take_matching(terminator) {
            let Some(label) = self.lookback.name_after(intent.keyword()) else {
                tracing::trace!("Anonymous {} at line {}", intent.kind(), self.line);
                continue;
            };
            if !is_declared_name(&label.text) {
                tracing::trace!("Skipping {} named {:?}", intent.kind(), label.text);
                continue;
            }

            let symbol = SymbolRecord {
                name: label.text.clone(),
                kind: intent.kind(),
                line: label.line,
                start_column: label.column,
                end_column: label.end_column(),
                brace_depth: self.brace_depth,
            };
            tracing::trace!(
                "Found {} {} at {}:{}",
                symbol.kind,
                symbol.name,
                symbol.line,
                symbol.start_column
            );
            self.symbols.push(symbol);
        }
    }

    fn cancel_intents(&mut self) {
        let dropped = self.intents.cancel_all();
        if dropped > 0 {
            tracing::trace!("Dropped {} intents at `;` on line {}", dropped, self.line);
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan a complete source string with default options.
pub fn scan_str(source: &str) -> Vec<SymbolRecord> {
    let mut scanner = Scanner::new();
    scanner.feed(source);
    scanner.finish()
}
