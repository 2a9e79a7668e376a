//! Bounded history of finalized identifiers.

use std::collections::VecDeque;

/// An identifier as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRecord {
    /// Position in the stream of records, starting at 0.
    pub seq: u64,
    pub text: String,
    /// 1-based line.
    pub line: u32,
    /// 0-based column of the first character.
    pub column: u32,
    pub brace_depth: u32,
}

impl LabelRecord {
    /// Column just past the last character.
    pub fn end_column(&self) -> u32 {
        let len = u32::try_from(self.text.chars().count()).unwrap_or(u32::MAX);
        self.column.saturating_add(len)
    }
}

/// Ring buffer of the most recent [`LabelRecord`]s.
///
/// Once full, pushing a record evicts the oldest one.
#[derive(Debug, Clone)]
pub struct LookbackBuffer {
    records: VecDeque<LabelRecord>,
    capacity: usize,
    next_seq: u64,
}

impl LookbackBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        LookbackBuffer {
            records: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    /// Append a record and return its sequence number.
    pub fn push(&mut self, text: String, line: u32, column: u32, brace_depth: u32) -> u64 {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.push_back(LabelRecord {
            seq,
            text,
            line,
            column,
            brace_depth,
        });
        seq
    }

    /// Find the record that directly follows the record `keyword`.
    ///
    /// Walks backward from the newest record. Stops when it reaches `keyword`
    /// (returning the record seen just before it, if any) or the start of the
    /// buffer (returning `None`, since the keyword has been evicted).
    pub fn name_after(&self, keyword: u64) -> Option<&LabelRecord> {
        let mut candidate = None;
        let mut idx = self.records.len();
        while idx > 0 {
            idx -= 1;
            let record = &self.records[idx];
            if record.seq == keyword {
                return candidate;
            }
            candidate = Some(record);
        }
        None
    }

    /// Look up a record by sequence number, if still buffered.
    pub fn get(&self, seq: u64) -> Option<&LabelRecord> {
        let first = self.records.front()?.seq;
        let idx = seq.checked_sub(first)?;
        self.records.get(usize::try_from(idx).ok()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(buffer: &mut LookbackBuffer, words: &[&str]) -> Vec<u64> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| buffer.push(w.to_string(), 1, i as u32 * 10, 0))
            .collect()
    }

    #[test]
    fn test_name_after_keyword() {
        let mut buffer = LookbackBuffer::new(16);
        let seqs = fill(&mut buffer, &["class", "Foo", "extends", "Bar"]);
        let name = buffer.name_after(seqs[0]).unwrap();
        assert_eq!(name.text, "Foo");
    }

    #[test]
    fn test_name_after_keyword_is_newest() {
        let mut buffer = LookbackBuffer::new(16);
        let seqs = fill(&mut buffer, &["$x", "function"]);
        assert!(buffer.name_after(seqs[1]).is_none());
    }

    #[test]
    fn test_name_after_evicted_keyword() {
        let mut buffer = LookbackBuffer::new(2);
        let seqs = fill(&mut buffer, &["class", "Foo", "implements"]);
        assert_eq!(buffer.records.len(), 2);
        assert!(buffer.get(seqs[0]).is_none());
        assert!(buffer.name_after(seqs[0]).is_none());
    }

    #[test]
    fn test_get_by_seq() {
        let mut buffer = LookbackBuffer::new(3);
        let seqs = fill(&mut buffer, &["a", "b", "c", "d"]);
        assert!(buffer.get(seqs[0]).is_none());
        assert_eq!(buffer.get(seqs[3]).unwrap().text, "d");
        assert!(buffer.get(99).is_none());
    }

    #[test]
    fn test_end_column_counts_chars() {
        let mut buffer = LookbackBuffer::new(4);
        let seq = buffer.push("Größe".to_string(), 2, 4, 0);
        assert_eq!(buffer.get(seq).unwrap().end_column(), 9);

        let seq = buffer.push("abc".to_string(), 2, u32::MAX - 1, 0);
        assert_eq!(buffer.get(seq).unwrap().end_column(), u32::MAX);
    }

    #[test]
    fn test_capacity_floor() {
        let mut buffer = LookbackBuffer::new(0);
        fill(&mut buffer, &["class", "Foo"]);
        assert_eq!(buffer.records.len(), 2);
    }
}
