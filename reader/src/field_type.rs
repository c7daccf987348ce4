use std::{fmt, fmt::Formatter, str::Chars};

use itertools::Itertools;

use crate::class_reader_error::{ClassReaderError::InvalidTypeDescriptor, Result};

/// A field or value type, parsed from its descriptor form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Base(BaseType),
    /// An object type, by internal (slash-separated) class name
    Object(String),
    Array(Box<FieldType>),
}

/// The primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => write!(f, "{base}"),
            FieldType::Object(name) => write!(f, "{}", name.replace('/', ".")),
            FieldType::Array(component) => write!(f, "{component}[]"),
        }
    }
}

impl FieldType {
    pub fn parse(type_descriptor: &str) -> Result<FieldType> {
        let mut chars = type_descriptor.chars();
        let parsed = Self::parse_from(type_descriptor, &mut chars)?;
        match chars.next() {
            None => Ok(parsed),
            Some(_) => Err(InvalidTypeDescriptor(type_descriptor.to_string())),
        }
    }

    pub(crate) fn parse_from(type_descriptor: &str, chars: &mut Chars) -> Result<FieldType> {
        let first_char = chars
            .next()
            .ok_or_else(|| InvalidTypeDescriptor(type_descriptor.to_string()))?;
        Ok(match first_char {
            'B' => FieldType::Base(BaseType::Byte),
            'C' => FieldType::Base(BaseType::Char),
            'D' => FieldType::Base(BaseType::Double),
            'F' => FieldType::Base(BaseType::Float),
            'I' => FieldType::Base(BaseType::Int),
            'J' => FieldType::Base(BaseType::Long),
            'S' => FieldType::Base(BaseType::Short),
            'Z' => FieldType::Base(BaseType::Boolean),
            'L' => {
                let class_name: String = chars.take_while_ref(|c| *c != ';').collect();
                match chars.next() {
                    Some(';') => FieldType::Object(class_name),
                    _ => return Err(InvalidTypeDescriptor(type_descriptor.to_string())),
                }
            }
            '[' => {
                let component = Self::parse_from(type_descriptor, chars)?;
                FieldType::Array(Box::new(component))
            }
            _ => return Err(InvalidTypeDescriptor(type_descriptor.to_string())),
        })
    }

    /// Long and double values take two operand stack slots
    pub fn is_wide(&self) -> bool {
        matches!(
            self,
            FieldType::Base(BaseType::Long) | FieldType::Base(BaseType::Double)
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        class_reader_error::ClassReaderError,
        field_type::{BaseType, FieldType},
    };

    #[test]
    fn cannot_parse_empty_descriptor() {
        assert!(matches!(
            FieldType::parse(""),
            Err(ClassReaderError::InvalidTypeDescriptor(s)) if s.is_empty()
        ));
    }

    #[test]
    fn cannot_parse_invalid_primitive() {
        assert!(matches!(
            FieldType::parse("W"),
            Err(ClassReaderError::InvalidTypeDescriptor(s)) if s == "W"
        ));
    }

    #[test]
    fn cannot_parse_object_without_semicolon() {
        assert!(matches!(
            FieldType::parse("Ljava/lang/String"),
            Err(ClassReaderError::InvalidTypeDescriptor(_))
        ));
    }

    #[test]
    fn cannot_parse_trailing_garbage() {
        assert!(matches!(
            FieldType::parse("II"),
            Err(ClassReaderError::InvalidTypeDescriptor(_))
        ));
    }

    #[test]
    fn can_parse_primitives() {
        assert_eq!(
            FieldType::Base(BaseType::Int),
            FieldType::parse("I").unwrap()
        );
        assert_eq!(
            FieldType::Base(BaseType::Boolean),
            FieldType::parse("Z").unwrap()
        );
    }

    #[test]
    fn can_parse_object_types() {
        assert_eq!(
            FieldType::Object("java/lang/String".to_string()),
            FieldType::parse("Ljava/lang/String;").unwrap()
        );
    }

    #[test]
    fn can_parse_array_types() {
        assert_eq!(
            FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Base(
                BaseType::Byte
            ))))),
            FieldType::parse("[[B").unwrap()
        );
    }

    #[test]
    fn displays_source_style_names() {
        assert_eq!("int", FieldType::parse("I").unwrap().to_string());
        assert_eq!(
            "java.lang.String",
            FieldType::parse("Ljava/lang/String;").unwrap().to_string()
        );
        assert_eq!("double[]", FieldType::parse("[D").unwrap().to_string());
    }

    #[test]
    fn wide_types_are_long_and_double() {
        assert!(FieldType::parse("J").unwrap().is_wide());
        assert!(FieldType::parse("D").unwrap().is_wide());
        assert!(!FieldType::parse("I").unwrap().is_wide());
        assert!(!FieldType::parse("[J").unwrap().is_wide());
    }
}
