use std::cmp::Ordering;

use itertools::Itertools;

use crate::{line_number::LineNumber, program_counter::ProgramCounter};

/// Maps instruction offsets to the source line they were compiled from.
/// Entries are kept sorted by program counter.
#[derive(Debug, PartialEq)]
pub struct LineNumberTable {
    entries: Vec<LineNumberTableEntry>,
}

impl LineNumberTable {
    pub fn new(entries: Vec<LineNumberTableEntry>) -> Self {
        Self {
            entries: entries.into_iter().sorted().collect(),
        }
    }

    /// The source line of the instruction at the given offset, i.e. the entry
    /// with the highest program counter not above it.
    pub fn lookup_pc(&self, pc: ProgramCounter) -> Option<LineNumber> {
        let index = match self
            .entries
            .binary_search_by(|entry| entry.program_counter.cmp(&pc))
        {
            Ok(index) => index,
            Err(0) => return None,
            Err(index) => index - 1,
        };
        Some(self.entries[index].line_number)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LineNumberTableEntry {
    pub program_counter: ProgramCounter,
    pub line_number: LineNumber,
}

impl LineNumberTableEntry {
    pub fn new(program_counter: ProgramCounter, line_number: LineNumber) -> Self {
        Self {
            program_counter,
            line_number,
        }
    }
}

impl PartialOrd for LineNumberTableEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LineNumberTableEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.program_counter.cmp(&other.program_counter)
    }
}
