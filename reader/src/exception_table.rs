use std::ops::Range;

use crate::program_counter::ProgramCounter;

/// One exception handler record: the covered code range, the handler's
/// address, and the caught class (`None` means catch-everything, as used by
/// `finally` blocks).
#[derive(Debug, PartialEq, Clone)]
pub struct ExceptionTableEntry {
    pub range: Range<ProgramCounter>,
    pub handler_pc: ProgramCounter,
    pub catch_class: Option<String>,
}

/// The exception handlers of one method's code
#[derive(Debug, Default, PartialEq, Clone)]
pub struct ExceptionTable {
    entries: Vec<ExceptionTableEntry>,
}

impl ExceptionTable {
    pub fn new(entries: Vec<ExceptionTableEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ExceptionTableEntry] {
        &self.entries
    }

    /// The handlers covering the given offset, in declaration order.
    // Tables are small, so a linear scan is fine
    pub fn lookup(&self, pc: ProgramCounter) -> Vec<&ExceptionTableEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.range.contains(&pc))
            .collect()
    }
}
