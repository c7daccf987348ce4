use std::{fmt, fmt::Formatter, str::Chars};

use itertools::Itertools;

use crate::{
    class_reader_error::{ClassReaderError, ClassReaderError::InvalidTypeDescriptor},
    field_type::FieldType,
};

/// The signature of a method: parameter types and return type
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub return_type: Option<FieldType>,
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        f.write_str(&self.parameters.iter().join(", "))?;
        match &self.return_type {
            Some(field_type) => write!(f, ") -> {field_type}"),
            None => f.write_str(") -> void"),
        }
    }
}

impl MethodDescriptor {
    /// Parses the `(parameters)return` descriptor form, where `V` stands for
    /// a void return.
    pub fn parse(descriptor: &str) -> Result<MethodDescriptor, ClassReaderError> {
        let mut chars = descriptor.chars();
        match chars.next() {
            Some('(') => {
                let parameters = Self::parse_parameters(descriptor, &mut chars)?;
                if Some(')') == chars.next() {
                    let return_type = Self::parse_return_type(descriptor, &mut chars)?;
                    Ok(MethodDescriptor {
                        parameters,
                        return_type,
                    })
                } else {
                    Err(InvalidTypeDescriptor(descriptor.to_string()))
                }
            }
            _ => Err(InvalidTypeDescriptor(descriptor.to_string())),
        }
    }

    fn parse_parameters(
        descriptor: &str,
        chars: &mut Chars,
    ) -> Result<Vec<FieldType>, ClassReaderError> {
        let mut parameters = Vec::new();
        loop {
            match chars.clone().next() {
                Some(')') => return Ok(parameters),
                Some(_) => parameters.push(FieldType::parse_from(descriptor, chars)?),
                None => return Err(InvalidTypeDescriptor(descriptor.to_string())),
            }
        }
    }

    fn parse_return_type(
        descriptor: &str,
        chars: &mut Chars,
    ) -> Result<Option<FieldType>, ClassReaderError> {
        let return_type = match chars.clone().next() {
            Some('V') => {
                chars.next();
                None
            }
            Some(_) => Some(FieldType::parse_from(descriptor, chars)?),
            None => return Err(InvalidTypeDescriptor(descriptor.to_string())),
        };
        if chars.next().is_none() {
            Ok(return_type)
        } else {
            Err(InvalidTypeDescriptor(descriptor.to_string()))
        }
    }

    pub fn num_arguments(&self) -> usize {
        self.parameters.len()
    }
}
