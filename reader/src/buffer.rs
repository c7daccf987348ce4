use cesu8::from_java_cesu8;
use thiserror::Error;

/// A cursor over a raw byte slice, reading the big-endian values the class
/// file format is made of.
pub struct Buffer<'a> {
    data: &'a [u8],
    position: usize,
}

/// Errors for reads that run past the end of the data, or decode invalid text
#[derive(Error, Debug, PartialEq)]
pub enum BufferError {
    #[error("unexpected end of data")]
    UnexpectedEndOfData,

    #[error("invalid modified utf-8 string")]
    InvalidCesu8String,
}

type Result<T> = std::result::Result<T, BufferError>;

impl<'a> Buffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Buffer { data, position: 0 }
    }

    fn advance(&mut self, size: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(size)
            .filter(|end| *end <= self.data.len())
            .ok_or(BufferError::UnexpectedEndOfData)?;
        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.advance(1).map(|bytes| bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.advance(2)
            .map(|bytes| u16::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.advance(4)
            .map(|bytes| u32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.advance(4)
            .map(|bytes| i32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.advance(8)
            .map(|bytes| i64::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.advance(4)
            .map(|bytes| f32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.advance(8)
            .map(|bytes| f64::from_be_bytes(bytes.try_into().unwrap()))
    }

    /// Reads `len` bytes and decodes them as a modified utf-8 string.
    pub fn read_utf8(&mut self, len: usize) -> Result<String> {
        self.advance(len)
            .and_then(|bytes| from_java_cesu8(bytes).map_err(|_| BufferError::InvalidCesu8String))
            .map(|cow_string| cow_string.into_owned())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.advance(len)
    }

    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }
}
