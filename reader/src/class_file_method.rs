use std::{fmt, fmt::Formatter};

use crate::{
    attribute::Attribute, exception_table::ExceptionTable, line_number_table::LineNumberTable,
    method_descriptor::MethodDescriptor, method_flags::MethodFlags,
};

/// Models a method in a class
#[derive(Debug, PartialEq)]
pub struct ClassFileMethod {
    pub flags: MethodFlags,
    pub name: String,
    pub type_descriptor: String,
    pub parsed_type_descriptor: MethodDescriptor,
    pub attributes: Vec<Attribute>,
    /// Abstract and native methods have no code
    pub code: Option<ClassFileMethodCode>,
    pub deprecated: bool,
}

impl ClassFileMethod {
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn is_native(&self) -> bool {
        self.flags.contains(MethodFlags::NATIVE)
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }

    pub fn is_synthetic(&self) -> bool {
        self.flags.contains(MethodFlags::SYNTHETIC) || self.flags.contains(MethodFlags::BRIDGE)
    }

    pub fn is_void(&self) -> bool {
        self.parsed_type_descriptor.return_type.is_none()
    }
}

impl fmt::Display for ClassFileMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:?} {}: {}{}",
            self.flags,
            self.name,
            self.parsed_type_descriptor,
            if self.deprecated { " (deprecated)" } else { "" }
        )?;
        if let Some(code) = &self.code {
            writeln!(f, "  code: {code}")?;
        }
        write!(f, "  raw_attributes: {:?}", self.attributes)
    }
}

/// The `Code` attribute of a method: the bytecode itself plus the
/// handler table and whatever nested attributes the compiler emitted.
#[derive(Debug, PartialEq)]
pub struct ClassFileMethodCode {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: ExceptionTable,
    pub line_number_table: Option<LineNumberTable>,
    pub attributes: Vec<Attribute>,
}

impl fmt::Display for ClassFileMethodCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max_stack = {}, max_locals = {}, {} code bytes, {} exception handlers",
            self.max_stack,
            self.max_locals,
            self.code.len(),
            self.exception_table.entries().len(),
        )
    }
}
