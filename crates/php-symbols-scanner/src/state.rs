//! Lexical states and the state stack.

/// Lexical context of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    /// Plain text outside `<?php ... ?>`.
    Initial,
    /// PHP code.
    InScripting,
    /// Inside `"..."`.
    DoubleQuoted,
    /// Inside `'...'`.
    SingleQuoted,
    /// Inside `// ...` or `# ...`.
    LineComment,
    /// Inside `/* ... */`.
    BlockComment,
    /// Inside a parenthesized list. The counter holds how many nested `(`
    /// are open beyond the first.
    ParenDepth(u32),
}

impl ScanState {
    /// Whether this state is a region whose end was expected before end-of-stream.
    pub fn is_unterminated_region(self) -> bool {
        matches!(
            self,
            ScanState::DoubleQuoted
                | ScanState::SingleQuoted
                | ScanState::BlockComment
                | ScanState::ParenDepth(_)
        )
    }
}

/// A state together with the position where it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub state: ScanState,
    /// 1-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
}

/// Stack of lexical states. Never empty; the bottom frame is always `Initial`.
#[derive(Debug, Clone)]
pub struct StateStack {
    frames: Vec<Frame>,
}

impl StateStack {
    pub fn new() -> Self {
        StateStack {
            frames: vec![Frame {
                state: ScanState::Initial,
                line: 1,
                column: 0,
            }],
        }
    }

    /// The current state.
    pub fn current(&self) -> ScanState {
        self.top().state
    }

    /// The innermost frame.
    pub fn top(&self) -> &Frame {
        // The bottom frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    pub fn push(&mut self, state: ScanState, line: u32, column: u32) {
        self.frames.push(Frame {
            state,
            line,
            column,
        });
    }

    /// Leave the current state. The bottom `Initial` frame stays.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Drop every frame above the bottom `Initial` one.
    pub fn reset(&mut self) {
        self.frames.truncate(1);
    }

    /// Replace the state of the innermost frame, keeping its position.
    pub fn replace_current(&mut self, state: ScanState) {
        if self.frames.len() > 1 {
            let last = self.frames.len() - 1;
            self.frames[last].state = state;
        }
    }

    /// The innermost frame that is still waiting for its closing delimiter.
    pub fn innermost_open_region(&self) -> Option<&Frame> {
        self.frames
            .iter()
            .rev()
            .find(|f| f.state.is_unterminated_region())
    }
}

impl Default for StateStack {
    fn default() -> Self {
        Self::new()
    }
}
