use std::{
    fmt,
    fmt::{Display, Formatter},
};

/// Offset of an instruction from the start of a method's code
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct ProgramCounter(pub u16);

impl ProgramCounter {
    /// Applies a signed branch offset, as branch instructions encode their
    /// targets relative to their own address. Returns `None` when the result
    /// falls outside the addressable code range.
    pub fn offset_by(&self, offset: i32) -> Option<ProgramCounter> {
        let target = i64::from(self.0) + i64::from(offset);
        u16::try_from(target).ok().map(ProgramCounter)
    }
}

impl Display for ProgramCounter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::program_counter::ProgramCounter;

    #[test]
    fn applies_signed_offsets_within_range() {
        assert_eq!(
            Some(ProgramCounter(7)),
            ProgramCounter(10).offset_by(-3)
        );
        assert_eq!(None, ProgramCounter(10).offset_by(-11));
        assert_eq!(None, ProgramCounter(65530).offset_by(100));
    }
}
