//! Declaration keywords and the intents they queue.

use php_symbols_types::SymbolKind;
use std::collections::VecDeque;

/// Character that closes a declaration header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `{` closes class, interface and trait headers.
    Brace,
    /// `(` closes function headers.
    Paren,
}

/// A declaration keyword waiting for its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationIntent {
    ClassLike {
        /// Kind of symbol to emit.
        kind: SymbolKind,
        /// Lookback sequence number of the keyword.
        keyword: u64,
    },
    Function {
        keyword: u64,
    },
}

impl DeclarationIntent {
    pub fn terminator(&self) -> Terminator {
        match self {
            DeclarationIntent::ClassLike { .. } => Terminator::Brace,
            DeclarationIntent::Function { .. } => Terminator::Paren,
        }
    }

    pub fn keyword(&self) -> u64 {
        match *self {
            DeclarationIntent::ClassLike { keyword, .. } => keyword,
            DeclarationIntent::Function { keyword } => keyword,
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match *self {
            DeclarationIntent::ClassLike { kind, .. } => kind,
            DeclarationIntent::Function { .. } => SymbolKind::Function,
        }
    }
}

/// Classify an identifier as a declaration keyword.
///
/// Matching is case-insensitive. `trait` produces a class symbol; `interface`
/// produces an interface symbol only when `distinct_interfaces` is set.
pub fn classify_keyword(text: &str, distinct_interfaces: bool) -> Option<SymbolKind> {
    if text.eq_ignore_ascii_case("class") || text.eq_ignore_ascii_case("trait") {
        Some(SymbolKind::Class)
    } else if text.eq_ignore_ascii_case("interface") {
        Some(if distinct_interfaces {
            SymbolKind::Interface
        } else {
            SymbolKind::Class
        })
    } else if text.eq_ignore_ascii_case("function") {
        Some(SymbolKind::Function)
    } else {
        None
    }
}

/// Whether `text` can be the name of a declaration.
///
/// Rejects numbers and the header keywords that follow an anonymous class.
pub fn is_declared_name(text: &str) -> bool {
    match text.chars().next() {
        None => false,
        Some(c) if c.is_ascii_digit() => false,
        Some(_) => {
            !(text.eq_ignore_ascii_case("extends") || text.eq_ignore_ascii_case("implements"))
        }
    }
}

/// FIFO of outstanding declaration intents.
#[derive(Debug, Clone, Default)]
pub struct IntentQueue {
    intents: VecDeque<DeclarationIntent>,
}

impl IntentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an intent for the keyword recorded as `keyword`.
    pub fn push(&mut self, kind: SymbolKind, keyword: u64) {
        let intent = if kind.is_class_like() {
            DeclarationIntent::ClassLike { kind, keyword }
        } else {
            DeclarationIntent::Function { keyword }
        };
        self.intents.push_back(intent);
    }

    /// Remove and return, in queue order, every intent closed by `terminator`.
    pub fn take_matching(&mut self, terminator: Terminator) -> Vec<DeclarationIntent> {
        if !self.intents.iter().any(|i| i.terminator() == terminator) {
            return Vec::new();
        }
        let (ready, waiting): (Vec<_>, Vec<_>) = self
            .intents
            .drain(..)
            .partition(|i| i.terminator() == terminator);
        self.intents = waiting.into();
        ready
    }

    /// Drop every outstanding intent, returning how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.intents.len();
        self.intents.clear();
        n
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclarationIntent> {
        self.intents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keyword() {
        assert_eq!(classify_keyword("class", true), Some(SymbolKind::Class));
        assert_eq!(classify_keyword("CLASS", true), Some(SymbolKind::Class));
        assert_eq!(classify_keyword("Trait", true), Some(SymbolKind::Class));
        assert_eq!(
            classify_keyword("interface", true),
            Some(SymbolKind::Interface)
        );
        assert_eq!(classify_keyword("interface", false), Some(SymbolKind::Class));
        assert_eq!(
            classify_keyword("Function", true),
            Some(SymbolKind::Function)
        );
        assert_eq!(classify_keyword("classes", true), None);
        assert_eq!(classify_keyword("fn", true), None);
    }

    #[test]
    fn test_is_declared_name() {
        assert!(is_declared_name("Foo"));
        assert!(is_declared_name("_private"));
        assert!(is_declared_name("ünicode"));
        assert!(!is_declared_name(""));
        assert!(!is_declared_name("1"));
        assert!(!is_declared_name("extends"));
        assert!(!is_declared_name("IMPLEMENTS"));
    }

    #[test]
    fn test_take_matching_keeps_other_intents() {
        let mut queue = IntentQueue::new();
        queue.push(SymbolKind::Class, 0);
        queue.push(SymbolKind::Function, 3);
        queue.push(SymbolKind::Interface, 5);

        let ready = queue.take_matching(Terminator::Brace);
        assert_eq!(ready.len(), 2);
        assert_eq!(ready[0].keyword(), 0);
        assert_eq!(ready[1].kind(), SymbolKind::Interface);

        assert_eq!(queue.intents.len(), 1);
        assert_eq!(queue.iter().next().unwrap().terminator(), Terminator::Paren);

        assert!(queue.take_matching(Terminator::Brace).is_empty());
        assert_eq!(queue.take_matching(Terminator::Paren).len(), 1);
        assert!(queue.intents.is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut queue = IntentQueue::new();
        queue.push(SymbolKind::Function, 1);
        queue.push(SymbolKind::Class, 2);
        assert_eq!(queue.cancel_all(), 2);
        assert!(queue.intents.is_empty());
    }
}
