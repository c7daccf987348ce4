use std::{
    fmt,
    fmt::{Display, Formatter},
};

/// The format version of a class file. Any version from the first released
/// one onwards is accepted; the engine reads modern archives.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct ClassFileVersion {
    pub major: u16,
    pub minor: u16,
}

impl ClassFileVersion {
    pub fn new(major: u16, minor: u16) -> Self {
        ClassFileVersion { major, minor }
    }

    /// The Java release this version corresponds to, when there is one.
    /// Majors below 45 were never produced by any compiler.
    pub fn java_release(&self) -> Option<u16> {
        if self.major >= 45 {
            Some(self.major - 44)
        } else {
            None
        }
    }
}

impl Display for ClassFileVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
