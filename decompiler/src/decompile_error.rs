use thiserror::Error;

use decaf_reader::class_reader_error::ClassReaderError;

/// The only failures that cross the public boundary. Anything going wrong
/// below the top-level class degrades into diagnostic text inside the
/// rendered output instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecompileError {
    #[error("class not found: {0}")]
    ClassNotFound(String),

    #[error("malformed class file {0}: {1}")]
    MalformedClassFile(String, ClassReaderError),
}
