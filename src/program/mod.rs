//! Program storage
//!
//! Holds program lines as statement text keyed by line number. Iteration order
//! is ascending line number, which LIST, successor lookup and AUTO rely on.

use crate::filesystem::ProgramSnapshot;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

/// Program line storage
#[derive(Debug, Clone, Default)]
pub struct ProgramStore {
    lines: BTreeMap<u32, String>,
}

impl ProgramStore {
    /// Create a new program store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a program line, replacing any line with the same number
    pub fn store_line(&mut self, line_number: u32, text: impl Into<String>) {
        self.lines.insert(line_number, text.into());
    }

    /// Get a program line
    pub fn get_line(&self, line_number: u32) -> Option<&str> {
        self.lines.get(&line_number).map(String::as_str)
    }

    /// Delete a program line, returning whether it existed
    pub fn delete_line(&mut self, line_number: u32) -> bool {
        self.lines.remove(&line_number).is_some()
    }

    pub fn contains(&self, line_number: u32) -> bool {
        self.lines.contains_key(&line_number)
    }

    pub fn first_line(&self) -> Option<u32> {
        self.lines.keys().next().copied()
    }

    /// Smallest line number strictly greater than `line_number`
    pub fn successor(&self, line_number: u32) -> Option<u32> {
        self.lines
            .range((Excluded(line_number), Unbounded))
            .next()
            .map(|(&number, _)| number)
    }

    /// Lines within an inclusive range, in ascending order
    pub fn list(&self, from: Option<u32>, to: Option<u32>) -> Vec<(u32, &str)> {
        let lower = from.map_or(Unbounded, Included);
        let upper = to.map_or(Unbounded, Included);
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Vec::new();
            }
        }
        self.lines
            .range((lower, upper))
            .map(|(&number, text)| (number, text.as_str()))
            .collect()
    }

    /// All lines in order
    pub fn lines(&self) -> impl Iterator<Item = (u32, &str)> {
        self.lines.iter().map(|(&number, text)| (number, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Copy the program into a snapshot for persistence
    pub fn snapshot(&self) -> ProgramSnapshot {
        ProgramSnapshot {
            lines: self
                .lines
                .iter()
                .map(|(&number, text)| (number, text.clone()))
                .collect(),
        }
    }

    /// Replace the whole program with the contents of a snapshot
    pub fn replace(&mut self, snapshot: ProgramSnapshot) {
        self.lines = snapshot.lines.into_iter().collect();
    }

    /// Clear all program lines
    pub fn clear_program(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn sample() -> ProgramStore {
        let mut program = ProgramStore::new();
        program.store_line(30, "PRINT C");
        program.store_line(10, "PRINT A");
        program.store_line(20, "PRINT B");
        program
    }

    #[test]
    fn test_lines_are_ordered() {
        let program = sample();
        let numbers: Vec<u32> = program.lines().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![10, 20, 30]);
        assert_eq!(program.first_line(), Some(10));
    }

    #[test]
    fn test_replace_and_delete() {
        let mut program = sample();
        program.store_line(20, "PRINT X");
        assert_eq!(program.get_line(20), Some("PRINT X"));
        assert!(program.delete_line(20));
        assert!(!program.delete_line(20));
        assert!(!program.contains(20));
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_successor() {
        let program = sample();
        assert_eq!(program.successor(0), Some(10));
        assert_eq!(program.successor(10), Some(20));
        assert_eq!(program.successor(15), Some(20));
        assert_eq!(program.successor(30), None);
    }

    #[test]
    fn test_list_ranges() {
        let program = sample();
        assert_eq!(program.list(None, None).len(), 3);
        assert_eq!(program.list(Some(20), None), vec![(20, "PRINT B"), (30, "PRINT C")]);
        assert_eq!(program.list(None, Some(15)), vec![(10, "PRINT A")]);
        assert!(program.list(Some(25), Some(21)).is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let program = sample();
        let mut copy = ProgramStore::new();
        copy.store_line(99, "END");
        copy.replace(program.snapshot());
        assert_eq!(copy.snapshot(), program.snapshot());
        assert!(!copy.contains(99));
    }

    #[quickcheck]
    fn prop_listing_is_strictly_ascending(numbers: Vec<u32>) -> bool {
        let mut program = ProgramStore::new();
        for n in numbers.iter().filter(|&&n| n > 0) {
            program.store_line(*n, "REM");
        }
        let first = program.list(None, None);
        let listed: Vec<u32> = first.iter().map(|(n, _)| *n).collect();
        listed.windows(2).all(|w| w[0] < w[1]) && first == program.list(None, None)
    }
}
