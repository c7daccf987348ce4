use thiserror::Error;

use crate::{buffer::BufferError, constant_pool::InvalidConstantPoolIndexError};

/// Anything that can make a class file unreadable as a whole
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClassReaderError {
    #[error("malformed class file: {0}")]
    MalformedClassFile(String),

    #[error("unsupported class file version {0}.{1}")]
    UnsupportedVersion(u16, u16),

    #[error("invalid type descriptor: {0}")]
    InvalidTypeDescriptor(String),
}

pub type Result<T> = std::result::Result<T, ClassReaderError>;

impl From<BufferError> for ClassReaderError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::UnexpectedEndOfData => {
                Self::MalformedClassFile("unexpected end of class file".to_string())
            }
            BufferError::InvalidCesu8String => {
                Self::MalformedClassFile("invalid modified utf-8 string".to_string())
            }
        }
    }
}

impl From<InvalidConstantPoolIndexError> for ClassReaderError {
    fn from(err: InvalidConstantPoolIndexError) -> Self {
        Self::MalformedClassFile(err.to_string())
    }
}
