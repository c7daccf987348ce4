use std::{fmt, vec::Vec};
use thiserror::Error;

/// One typed entry of the constant pool.
#[derive(Debug, PartialEq)]
pub enum ConstantPoolEntry {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    ClassRef(u16),
    StringRef(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandleRef(u8, u16),
    MethodTypeRef(u16),
    DynamicRef(u16, u16),
    InvokeDynamicRef(u16, u16),
}

#[derive(Debug)]
enum PhysicalEntry {
    Entry(ConstantPoolEntry),
    // Long and Double take two slots; the second is unaddressable
    Tombstone,
}

/// The constant pool of a class. Indices are 1-based, and eight-byte literals
/// occupy two slots.
#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<PhysicalEntry>,
}

/// Signals an access to a missing entry, a tombstone slot, or an entry whose
/// tag does not match what the caller expected.
#[derive(Error, Debug, PartialEq)]
#[error("invalid constant pool index: {index}")]
pub struct InvalidConstantPoolIndexError {
    pub index: u16,
}

impl InvalidConstantPoolIndexError {
    pub(crate) fn new(index: u16) -> Self {
        InvalidConstantPoolIndexError { index }
    }
}

type Result<T> = std::result::Result<T, InvalidConstantPoolIndexError>;

impl ConstantPool {
    pub fn new() -> ConstantPool {
        Default::default()
    }

    pub fn add(&mut self, entry: ConstantPoolEntry) {
        let needs_tombstone = matches!(
            &entry,
            ConstantPoolEntry::Long(_) | ConstantPoolEntry::Double(_)
        );
        self.entries.push(PhysicalEntry::Entry(entry));
        if needs_tombstone {
            self.entries.push(PhysicalEntry::Tombstone);
        }
    }

    /// Number of physical slots, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accesses an entry given its 1-based index.
    pub fn get(&self, index: u16) -> Result<&ConstantPoolEntry> {
        self.entries
            .get(index.wrapping_sub(1) as usize)
            .and_then(|entry| match entry {
                PhysicalEntry::Entry(entry) => Some(entry),
                PhysicalEntry::Tombstone => None,
            })
            .ok_or_else(|| InvalidConstantPoolIndexError::new(index))
    }

    /// Resolves an entry that must be an utf-8 string.
    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            ConstantPoolEntry::Utf8(text) => Ok(text),
            _ => Err(InvalidConstantPoolIndexError::new(index)),
        }
    }

    /// Resolves a class reference down to the class name it points at.
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            ConstantPoolEntry::ClassRef(name_index) => self.utf8(*name_index),
            _ => Err(InvalidConstantPoolIndexError::new(index)),
        }
    }

    /// Resolves a string reference down to its text.
    pub fn string(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            ConstantPoolEntry::StringRef(utf8_index) => self.utf8(*utf8_index),
            _ => Err(InvalidConstantPoolIndexError::new(index)),
        }
    }

    /// Resolves a name-and-type entry into its (name, descriptor) pair.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.get(index)? {
            ConstantPoolEntry::NameAndType(name_index, descriptor_index) => {
                Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?))
            }
            _ => Err(InvalidConstantPoolIndexError::new(index)),
        }
    }

    /// Resolves a field reference into (class name, field name, descriptor).
    pub fn field_ref(&self, index: u16) -> Result<(&str, &str, &str)> {
        match self.get(index)? {
            ConstantPoolEntry::FieldRef(class_index, name_and_type_index) => {
                let class_name = self.class_name(*class_index)?;
                let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
                Ok((class_name, name, descriptor))
            }
            _ => Err(InvalidConstantPoolIndexError::new(index)),
        }
    }

    /// Resolves a method or interface-method reference into
    /// (class name, method name, descriptor).
    pub fn method_ref(&self, index: u16) -> Result<(&str, &str, &str)> {
        match self.get(index)? {
            ConstantPoolEntry::MethodRef(class_index, name_and_type_index)
            | ConstantPoolEntry::InterfaceMethodRef(class_index, name_and_type_index) => {
                let class_name = self.class_name(*class_index)?;
                let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
                Ok((class_name, name, descriptor))
            }
            _ => Err(InvalidConstantPoolIndexError::new(index)),
        }
    }

    /// Resolves a dynamic call site entry into its (name, descriptor) pair.
    pub fn invoke_dynamic(&self, index: u16) -> Result<(&str, &str)> {
        match self.get(index)? {
            ConstantPoolEntry::InvokeDynamicRef(_, name_and_type_index)
            | ConstantPoolEntry::DynamicRef(_, name_and_type_index) => {
                self.name_and_type(*name_and_type_index)
            }
            _ => Err(InvalidConstantPoolIndexError::new(index)),
        }
    }

    /// Human-readable form of an entry, chasing references.
    pub fn text_of(&self, index: u16) -> Result<String> {
        let text = match self.get(index)? {
            ConstantPoolEntry::Utf8(s) => s.clone(),
            ConstantPoolEntry::Integer(n) => n.to_string(),
            ConstantPoolEntry::Float(n) => n.to_string(),
            ConstantPoolEntry::Long(n) => n.to_string(),
            ConstantPoolEntry::Double(n) => n.to_string(),
            ConstantPoolEntry::ClassRef(n) => self.text_of(*n)?,
            ConstantPoolEntry::StringRef(n) => self.text_of(*n)?,
            ConstantPoolEntry::FieldRef(i, j)
            | ConstantPoolEntry::MethodRef(i, j)
            | ConstantPoolEntry::InterfaceMethodRef(i, j) => {
                format!("{}.{}", self.text_of(*i)?, self.text_of(*j)?)
            }
            ConstantPoolEntry::NameAndType(i, j) => {
                format!("{}: {}", self.text_of(*i)?, self.text_of(*j)?)
            }
            ConstantPoolEntry::MethodHandleRef(kind, i) => {
                format!("handle({}): {}", kind, self.text_of(*i)?)
            }
            ConstantPoolEntry::MethodTypeRef(i) => self.text_of(*i)?,
            ConstantPoolEntry::DynamicRef(_, j) | ConstantPoolEntry::InvokeDynamicRef(_, j) => {
                format!("dynamic {}", self.text_of(*j)?)
            }
        };
        Ok(text)
    }
}

impl fmt::Display for ConstantPool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Constant pool: (size: {})", self.entries.len())?;
        for raw_index in 0..self.entries.len() {
            let index = (raw_index + 1) as u16;
            if let Ok(text) = self.text_of(index) {
                writeln!(f, "    {index}, {text}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::constant_pool::{ConstantPool, ConstantPoolEntry, InvalidConstantPoolIndexError};

    #[test]
    fn entries_are_one_based_and_eight_byte_literals_take_two_slots() {
        let mut pool = ConstantPool::new();
        pool.add(ConstantPoolEntry::Utf8("hey".to_string()));
        pool.add(ConstantPoolEntry::Long(123));
        pool.add(ConstantPoolEntry::Integer(42));

        assert_eq!(4, pool.len());
        assert_eq!(
            ConstantPoolEntry::Utf8("hey".to_string()),
            *pool.get(1).unwrap()
        );
        assert_eq!(ConstantPoolEntry::Long(123), *pool.get(2).unwrap());
        assert_eq!(Err(InvalidConstantPoolIndexError::new(3)), pool.get(3));
        assert_eq!(ConstantPoolEntry::Integer(42), *pool.get(4).unwrap());
        assert_eq!(Err(InvalidConstantPoolIndexError::new(0)), pool.get(0));
        assert_eq!(Err(InvalidConstantPoolIndexError::new(5)), pool.get(5));
    }

    #[test]
    fn typed_accessors_chase_references_and_check_tags() {
        let mut pool = ConstantPool::new();
        pool.add(ConstantPoolEntry::Utf8("java/lang/String".to_string()));
        pool.add(ConstantPoolEntry::ClassRef(1));
        pool.add(ConstantPoolEntry::Utf8("length".to_string()));
        pool.add(ConstantPoolEntry::Utf8("()I".to_string()));
        pool.add(ConstantPoolEntry::NameAndType(3, 4));
        pool.add(ConstantPoolEntry::MethodRef(2, 5));
        pool.add(ConstantPoolEntry::StringRef(1));

        assert_eq!("java/lang/String", pool.class_name(2).unwrap());
        assert_eq!(("length", "()I"), pool.name_and_type(5).unwrap());
        assert_eq!(
            ("java/lang/String", "length", "()I"),
            pool.method_ref(6).unwrap()
        );
        assert_eq!("java/lang/String", pool.string(7).unwrap());

        // tag mismatches are rejected with the offending index
        assert_eq!(Err(InvalidConstantPoolIndexError::new(1)), pool.class_name(1));
        assert_eq!(Err(InvalidConstantPoolIndexError::new(6)), pool.field_ref(6));
    }

    #[test]
    fn text_of_renders_referenced_entries() {
        let mut pool = ConstantPool::new();
        pool.add(ConstantPoolEntry::Utf8("hey".to_string()));
        pool.add(ConstantPoolEntry::Utf8("joe".to_string()));
        pool.add(ConstantPoolEntry::FieldRef(1, 2));
        pool.add(ConstantPoolEntry::Double(3.56));

        assert_eq!("hey.joe", pool.text_of(3).unwrap());
        assert_eq!("3.56", pool.text_of(4).unwrap());
        assert_eq!(Err(InvalidConstantPoolIndexError::new(5)), pool.text_of(5));
    }
}
