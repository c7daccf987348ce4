use decaf_reader::{
    class_file::ClassFile, field_type::FieldType, method_descriptor::MethodDescriptor,
};

/// The skeleton of a class kept in the symbol table: just enough structure
/// to reason about inheritance and members, without code.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldSignature>,
    pub methods: Vec<MethodSignature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSignature {
    pub name: String,
    pub field_type: FieldType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub name: String,
    pub descriptor: MethodDescriptor,
}

impl ClassInfo {
    pub fn from_class_file(class_file: &ClassFile) -> ClassInfo {
        ClassInfo {
            name: class_file.name.clone(),
            superclass: class_file.superclass.clone(),
            interfaces: class_file.interfaces.clone(),
            fields: class_file
                .fields
                .iter()
                .map(|field| FieldSignature {
                    name: field.name.clone(),
                    field_type: field.type_descriptor.clone(),
                })
                .collect(),
            methods: class_file
                .methods
                .iter()
                .map(|method| MethodSignature {
                    name: method.name.clone(),
                    descriptor: method.parsed_type_descriptor.clone(),
                })
                .collect(),
        }
    }
}

/// What the resolver knows about a name.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Part of the archive, fetched and parsed
    Internal(ClassInfo),
    /// Outside the archive; never fetched, rendered opaquely
    External,
    /// Part of the archive but absent or unparseable
    Unresolved,
    /// Resolution has started but not finished. Only observable on
    /// re-entrant requests, which happen on inheritance cycles
    InProgress,
}
