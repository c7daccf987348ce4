use std::fmt;

use crate::{
    attribute::Attribute, class_access_flags::ClassAccessFlags, class_file_field::ClassFileField,
    class_file_method::ClassFileMethod, class_file_version::ClassFileVersion,
    constant_pool::ConstantPool,
};

/// Represents the content of a .class file.
#[derive(Debug, Default)]
pub struct ClassFile {
    pub version: ClassFileVersion,
    pub constants: ConstantPool,
    pub flags: ClassAccessFlags,
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassFileField>,
    pub methods: Vec<ClassFileMethod>,
    pub attributes: Vec<Attribute>,
    /// From the `SourceFile` attribute, when the compiler emitted one
    pub source_file: Option<String>,
    pub deprecated: bool,
}

impl ClassFile {
    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassAccessFlags::INTERFACE)
    }

    pub fn is_enum(&self) -> bool {
        self.flags.contains(ClassAccessFlags::ENUM)
    }

    pub fn find_method(&self, name: &str, type_descriptor: &str) -> Option<&ClassFileMethod> {
        self.methods
            .iter()
            .find(|method| method.name == name && method.type_descriptor == type_descriptor)
    }
}

impl fmt::Display for ClassFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Class {} ", self.name)?;
        if let Some(superclass) = self.superclass.as_ref() {
            write!(f, "(extends {superclass}) ")?;
        }
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "flags: {:?}", self.flags)?;
        writeln!(f, "interfaces: {:?}", self.interfaces)?;
        writeln!(f, "fields:")?;
        for field in self.fields.iter() {
            writeln!(f, "  - {field}")?;
        }
        writeln!(f, "methods:")?;
        for method in self.methods.iter() {
            writeln!(f, "  - {method}")?;
        }
        Ok(())
    }
}
