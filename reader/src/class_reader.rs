use log::warn;
use result::prelude::*;

use crate::{
    attribute::Attribute,
    buffer::Buffer,
    class_access_flags::ClassAccessFlags,
    class_file::ClassFile,
    class_file_field::{ClassFileField, FieldConstantValue},
    class_file_method::{ClassFileMethod, ClassFileMethodCode},
    class_file_version::ClassFileVersion,
    class_reader_error::ClassReaderError::{MalformedClassFile, UnsupportedVersion},
    class_reader_error::Result,
    constant_pool::ConstantPool,
    constant_pool::ConstantPoolEntry,
    exception_table::{ExceptionTable, ExceptionTableEntry},
    field_flags::FieldFlags,
    field_type::FieldType,
    line_number::LineNumber,
    line_number_table::{LineNumberTable, LineNumberTableEntry},
    method_descriptor::MethodDescriptor,
    method_flags::MethodFlags,
    program_counter::ProgramCounter,
};

struct ClassFileReader<'a> {
    buffer: Buffer<'a>,
    class_file: ClassFile,
}

impl<'a> ClassFileReader<'a> {
    fn new(data: &[u8]) -> ClassFileReader {
        ClassFileReader {
            buffer: Buffer::new(data),
            class_file: Default::default(),
        }
    }

    fn read(mut self) -> Result<ClassFile> {
        self.check_magic_number()?;
        self.read_version()?;
        self.read_constants()?;
        self.read_access_flags()?;
        self.class_file.name = self.read_class_reference()?;
        self.class_file.superclass = self.read_class_reference_optional()?;
        self.read_interfaces()?;
        self.read_fields()?;
        self.read_methods()?;
        self.read_class_attributes()?;

        Ok(self.class_file)
    }

    fn check_magic_number(&mut self) -> Result<()> {
        match self.buffer.read_u32() {
            Ok(0xCAFEBABE) => Ok(()),
            Ok(_) => Err(MalformedClassFile("invalid magic number".to_owned())),
            Err(err) => Err(err.into()),
        }
    }

    fn read_version(&mut self) -> Result<()> {
        let minor_version = self.buffer.read_u16()?;
        let major_version = self.buffer.read_u16()?;

        let version = ClassFileVersion::new(major_version, minor_version);
        if version.java_release().is_none() {
            return Err(UnsupportedVersion(major_version, minor_version));
        }
        self.class_file.version = version;
        Ok(())
    }

    fn read_constants(&mut self) -> Result<()> {
        let constants_count = self.buffer.read_u16()?;
        let physical_slots = constants_count
            .checked_sub(1)
            .ok_or_else(|| MalformedClassFile("invalid constant pool count".to_string()))?
            as usize;

        while self.class_file.constants.len() < physical_slots {
            let tag = self.buffer.read_u8()?;
            let constant = match tag {
                1 => self.read_utf8_constant()?,
                3 => self.read_int_constant()?,
                4 => self.read_float_constant()?,
                5 => self.read_long_constant()?,
                6 => self.read_double_constant()?,
                7 => ConstantPoolEntry::ClassRef(self.buffer.read_u16()?),
                8 => ConstantPoolEntry::StringRef(self.buffer.read_u16()?),
                9 => {
                    let (class_ref, name_and_type) = self.read_reference_pair()?;
                    ConstantPoolEntry::FieldRef(class_ref, name_and_type)
                }
                10 => {
                    let (class_ref, name_and_type) = self.read_reference_pair()?;
                    ConstantPoolEntry::MethodRef(class_ref, name_and_type)
                }
                11 => {
                    let (class_ref, name_and_type) = self.read_reference_pair()?;
                    ConstantPoolEntry::InterfaceMethodRef(class_ref, name_and_type)
                }
                12 => {
                    let (name, descriptor) = self.read_reference_pair()?;
                    ConstantPoolEntry::NameAndType(name, descriptor)
                }
                15 => {
                    let kind = self.buffer.read_u8()?;
                    let reference = self.buffer.read_u16()?;
                    ConstantPoolEntry::MethodHandleRef(kind, reference)
                }
                16 => ConstantPoolEntry::MethodTypeRef(self.buffer.read_u16()?),
                17 => {
                    let (bootstrap_index, name_and_type) = self.read_reference_pair()?;
                    ConstantPoolEntry::DynamicRef(bootstrap_index, name_and_type)
                }
                18 => {
                    let (bootstrap_index, name_and_type) = self.read_reference_pair()?;
                    ConstantPoolEntry::InvokeDynamicRef(bootstrap_index, name_and_type)
                }
                _ => {
                    warn!(
                        "unknown constant pool tag {} at slot {}",
                        tag,
                        self.class_file.constants.len() + 1
                    );
                    return Err(MalformedClassFile(format!(
                        "unknown constant pool tag: 0x{tag:X}"
                    )));
                }
            };
            self.class_file.constants.add(constant);
        }

        // An eight-byte constant in the last slot would have pushed its
        // tombstone past the declared count
        if self.class_file.constants.len() > physical_slots {
            return Err(MalformedClassFile(
                "eight-byte constant overflows the constant pool count".to_string(),
            ));
        }

        Ok(())
    }

    fn read_utf8_constant(&mut self) -> Result<ConstantPoolEntry> {
        let len = self.buffer.read_u16()?;
        self.buffer
            .read_utf8(len as usize)
            .map(ConstantPoolEntry::Utf8)
            .map_err(|err| err.into())
    }

    fn read_int_constant(&mut self) -> Result<ConstantPoolEntry> {
        self.buffer
            .read_i32()
            .map(ConstantPoolEntry::Integer)
            .map_err(|err| err.into())
    }

    fn read_float_constant(&mut self) -> Result<ConstantPoolEntry> {
        self.buffer
            .read_f32()
            .map(ConstantPoolEntry::Float)
            .map_err(|err| err.into())
    }

    fn read_long_constant(&mut self) -> Result<ConstantPoolEntry> {
        self.buffer
            .read_i64()
            .map(ConstantPoolEntry::Long)
            .map_err(|err| err.into())
    }

    fn read_double_constant(&mut self) -> Result<ConstantPoolEntry> {
        self.buffer
            .read_f64()
            .map(ConstantPoolEntry::Double)
            .map_err(|err| err.into())
    }

    fn read_reference_pair(&mut self) -> Result<(u16, u16)> {
        let first = self.buffer.read_u16()?;
        let second = self.buffer.read_u16()?;
        Ok((first, second))
    }

    fn read_access_flags(&mut self) -> Result<()> {
        let bits = self.buffer.read_u16()?;
        let flags = ClassAccessFlags::from_bits_truncate(bits);
        if flags.bits() != bits {
            warn!("ignoring unknown class access flag bits: 0x{:04x}", bits);
        }
        self.class_file.flags = flags;
        Ok(())
    }

    fn read_class_reference(&mut self) -> Result<String> {
        let class_constant_index = self.buffer.read_u16()?;
        let name = self.class_file.constants.class_name(class_constant_index)?;
        Ok(name.to_string())
    }

    fn read_class_reference_optional(&mut self) -> Result<Option<String>> {
        let class_constant_index = self.buffer.read_u16()?;
        if class_constant_index == 0 {
            Ok(None)
        } else {
            let name = self.class_file.constants.class_name(class_constant_index)?;
            Ok(Some(name.to_string()))
        }
    }

    fn read_string_reference(&self, index: u16) -> Result<String> {
        Self::read_string_reference_from(&self.class_file.constants, index)
    }

    fn read_string_reference_from(constants_pool: &ConstantPool, index: u16) -> Result<String> {
        let text = constants_pool.utf8(index)?;
        Ok(text.to_string())
    }

    fn read_interfaces(&mut self) -> Result<()> {
        let interfaces_count = self.buffer.read_u16()?;
        self.class_file.interfaces = (0..interfaces_count)
            .map(|_| self.read_class_reference())
            .collect::<Result<Vec<String>>>()?;
        Ok(())
    }

    fn read_fields(&mut self) -> Result<()> {
        let fields_count = self.buffer.read_u16()?;
        self.class_file.fields = (0..fields_count)
            .map(|_| self.read_field())
            .collect::<Result<Vec<ClassFileField>>>()?;
        Ok(())
    }

    fn read_field(&mut self) -> Result<ClassFileField> {
        let flags = self.read_field_flags()?;
        let name_constant_index = self.buffer.read_u16()?;
        let name = self.read_string_reference(name_constant_index)?;
        let type_constant_index = self.buffer.read_u16()?;
        let type_descriptor_raw = self.read_string_reference(type_constant_index)?;
        let type_descriptor = FieldType::parse(&type_descriptor_raw)?;

        let raw_attributes = self.read_raw_attributes()?;
        let constant_value = self.extract_constant_value(&raw_attributes)?;
        let deprecated = Self::search_deprecated_attribute(&raw_attributes);

        Ok(ClassFileField {
            flags,
            name,
            type_descriptor,
            constant_value,
            deprecated,
        })
    }

    fn read_field_flags(&mut self) -> Result<FieldFlags> {
        let bits = self.buffer.read_u16()?;
        let flags = FieldFlags::from_bits_truncate(bits);
        if flags.bits() != bits {
            warn!("ignoring unknown field access flag bits: 0x{:04x}", bits);
        }
        Ok(flags)
    }

    fn extract_constant_value(
        &self,
        raw_attributes: &[Attribute],
    ) -> Result<Option<FieldConstantValue>> {
        raw_attributes
            .iter()
            .filter(|attr| attr.name == "ConstantValue")
            .map(|attr| {
                let mut buf = Buffer::new(&attr.bytes);
                let constant_index = buf.read_u16()?;
                self.class_file
                    .constants
                    .get(constant_index)
                    .map_err(|err| err.into())
                    .and_then(|entry| match entry {
                        ConstantPoolEntry::StringRef(utf8_index) => {
                            let referred_string = self.read_string_reference(*utf8_index)?;
                            Ok(FieldConstantValue::String(referred_string))
                        }
                        ConstantPoolEntry::Integer(v) => Ok(FieldConstantValue::Int(*v)),
                        ConstantPoolEntry::Float(v) => Ok(FieldConstantValue::Float(*v)),
                        ConstantPoolEntry::Long(v) => Ok(FieldConstantValue::Long(*v)),
                        ConstantPoolEntry::Double(v) => Ok(FieldConstantValue::Double(*v)),
                        v => Err(MalformedClassFile(format!(
                            "invalid type for ConstantValue: {v:?}"
                        ))),
                    })
            })
            .next()
            .invert()
    }

    fn search_deprecated_attribute(raw_attributes: &[Attribute]) -> bool {
        raw_attributes.iter().any(|attr| attr.name == "Deprecated")
    }

    fn read_methods(&mut self) -> Result<()> {
        let methods_count = self.buffer.read_u16()?;
        self.class_file.methods = (0..methods_count)
            .map(|_| self.read_method())
            .collect::<Result<Vec<ClassFileMethod>>>()?;
        Ok(())
    }

    fn read_method(&mut self) -> Result<ClassFileMethod> {
        let flags = self.read_method_flags()?;
        let name_constant_index = self.buffer.read_u16()?;
        let name = self.read_string_reference(name_constant_index)?;
        let type_constant_index = self.buffer.read_u16()?;
        let type_descriptor = self.read_string_reference(type_constant_index)?;
        let parsed_type_descriptor = MethodDescriptor::parse(&type_descriptor)?;
        let raw_attributes = self.read_raw_attributes()?;
        let code = if flags.contains(MethodFlags::NATIVE) || flags.contains(MethodFlags::ABSTRACT) {
            None
        } else {
            let code = self.extract_code(&raw_attributes)?;
            if code.is_none() {
                warn!("method {} has no code attribute", name);
            }
            code
        };
        let deprecated = Self::search_deprecated_attribute(&raw_attributes);

        Ok(ClassFileMethod {
            flags,
            name,
            type_descriptor,
            parsed_type_descriptor,
            attributes: raw_attributes,
            code,
            deprecated,
        })
    }

    fn read_method_flags(&mut self) -> Result<MethodFlags> {
        let bits = self.buffer.read_u16()?;
        let flags = MethodFlags::from_bits_truncate(bits);
        if flags.bits() != bits {
            warn!("ignoring unknown method access flag bits: 0x{:04x}", bits);
        }
        Ok(flags)
    }

    fn extract_code(&self, raw_attributes: &[Attribute]) -> Result<Option<ClassFileMethodCode>> {
        raw_attributes
            .iter()
            .filter(|attr| attr.name == "Code")
            .map(|attr| {
                let mut buf = Buffer::new(&attr.bytes);
                let max_stack = buf.read_u16()?;
                let max_locals = buf.read_u16()?;
                let code_length = buf.read_u32()? as usize;
                let code = Vec::from(buf.read_bytes(code_length)?);
                let exception_table =
                    Self::read_exception_table(&self.class_file.constants, &mut buf)?;
                let attributes =
                    Self::read_raw_attributes_from(&self.class_file.constants, &mut buf)?;
                let line_number_table = Self::extract_line_number_table(&attributes)?;
                Result::<ClassFileMethodCode>::Ok(ClassFileMethodCode {
                    max_stack,
                    max_locals,
                    code,
                    exception_table,
                    line_number_table,
                    attributes,
                })
            })
            .next()
            .invert()
    }

    fn read_exception_table(
        constants_pool: &ConstantPool,
        buf: &mut Buffer,
    ) -> Result<ExceptionTable> {
        let entries_count = buf.read_u16()?;
        let entries = (0..entries_count)
            .map(|_| {
                let start_pc = ProgramCounter(buf.read_u16()?);
                let end_pc = ProgramCounter(buf.read_u16()?);
                let handler_pc = ProgramCounter(buf.read_u16()?);
                let catch_type = buf.read_u16()?;
                // Zero means the handler catches everything, as in finally
                let catch_class = if catch_type == 0 {
                    None
                } else {
                    Some(constants_pool.class_name(catch_type)?.to_string())
                };
                Ok(ExceptionTableEntry {
                    range: start_pc..end_pc,
                    handler_pc,
                    catch_class,
                })
            })
            .collect::<Result<Vec<ExceptionTableEntry>>>()?;
        Ok(ExceptionTable::new(entries))
    }

    fn extract_line_number_table(attributes: &[Attribute]) -> Result<Option<LineNumberTable>> {
        attributes
            .iter()
            .filter(|attr| attr.name == "LineNumberTable")
            .map(|attr| {
                let mut buf = Buffer::new(&attr.bytes);
                let entries_count = buf.read_u16()?;
                let entries = (0..entries_count)
                    .map(|_| {
                        let program_counter = ProgramCounter(buf.read_u16()?);
                        let line_number = LineNumber(buf.read_u16()?);
                        Ok(LineNumberTableEntry::new(program_counter, line_number))
                    })
                    .collect::<Result<Vec<LineNumberTableEntry>>>()?;
                Ok(LineNumberTable::new(entries))
            })
            .next()
            .invert()
    }

    fn read_class_attributes(&mut self) -> Result<()> {
        let raw_attributes = self.read_raw_attributes()?;
        self.class_file.deprecated = Self::search_deprecated_attribute(&raw_attributes);
        self.class_file.source_file = self.search_source_file_attribute(&raw_attributes)?;
        self.class_file.attributes = raw_attributes;
        Ok(())
    }

    fn search_source_file_attribute(&self, raw_attributes: &[Attribute]) -> Result<Option<String>> {
        raw_attributes
            .iter()
            .find(|attr| attr.name == "SourceFile")
            .map(|attr| {
                let mut buf = Buffer::new(&attr.bytes);
                let constant_index = buf.read_u16()?;
                self.read_string_reference(constant_index)
            })
            .invert()
    }

    fn read_raw_attributes(&mut self) -> Result<Vec<Attribute>> {
        Self::read_raw_attributes_from(&self.class_file.constants, &mut self.buffer)
    }

    fn read_raw_attributes_from(
        constants_pool: &ConstantPool,
        buffer: &mut Buffer,
    ) -> Result<Vec<Attribute>> {
        let attributes_count = buffer.read_u16()?;
        (0..attributes_count)
            .map(|_| Self::read_raw_attribute(constants_pool, buffer))
            .collect::<Result<Vec<Attribute>>>()
    }

    fn read_raw_attribute(constants_pool: &ConstantPool, buffer: &mut Buffer) -> Result<Attribute> {
        let name_constant_index = buffer.read_u16()?;
        let name = Self::read_string_reference_from(constants_pool, name_constant_index)?;
        let len = buffer.read_u32()?;
        let bytes = buffer.read_bytes(len as usize)?;
        Ok(Attribute {
            name,
            bytes: Vec::from(bytes),
        })
    }
}

/// Reads a class file from its raw byte form.
pub fn read_buffer(buf: &[u8]) -> Result<ClassFile> {
    ClassFileReader::new(buf).read()
}

#[cfg(test)]
mod tests {
    use crate::{
        class_reader::read_buffer,
        class_reader_error::ClassReaderError,
        constant_pool::ConstantPoolEntry,
        field_type::{BaseType, FieldType},
        program_counter::ProgramCounter,
    };

    #[test]
    fn magic_number_is_required() {
        let data = vec![0x00, 0x01, 0x02, 0x03];
        assert!(matches!(
            read_buffer(&data),
            Err(ClassReaderError::MalformedClassFile(s)) if s == "invalid magic number"
        ));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let data = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00];
        assert!(matches!(
            read_buffer(&data),
            Err(ClassReaderError::MalformedClassFile(s)) if s == "unexpected end of class file"
        ));
    }

    #[test]
    fn pre_java_versions_are_rejected() {
        let data = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x2C];
        assert!(matches!(
            read_buffer(&data),
            Err(ClassReaderError::UnsupportedVersion(0x2C, 0))
        ));
    }

    #[test]
    fn unknown_constant_pool_tags_are_rejected() {
        let mut data = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        data.extend([0x00, 0x02]);
        data.push(99);
        assert!(matches!(
            read_buffer(&data),
            Err(ClassReaderError::MalformedClassFile(s)) if s.starts_with("unknown constant pool tag")
        ));
    }

    fn minimal_class_bytes() -> Vec<u8> {
        let mut data = vec![0xCA, 0xFE, 0xBA, 0xBE];
        data.extend([0x00, 0x00, 0x00, 0x34]);
        data.extend([0x00, 0x05]);
        // #1 utf8 "Foo", #2 class #1, #3 utf8 "java/lang/Object", #4 class #3
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"Foo");
        data.push(7);
        data.extend((1u16).to_be_bytes());
        data.push(1);
        data.extend((16u16).to_be_bytes());
        data.extend(b"java/lang/Object");
        data.push(7);
        data.extend((3u16).to_be_bytes());
        // flags, this, super, no interfaces, fields, methods or attributes
        data.extend([0x00, 0x21]);
        data.extend([0x00, 0x02]);
        data.extend([0x00, 0x04]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);
        data
    }

    #[test_log::test]
    fn reads_a_minimal_class() {
        let class_file = read_buffer(&minimal_class_bytes()).expect("should read the class");
        assert_eq!("Foo", class_file.name);
        assert_eq!(Some("java/lang/Object".to_string()), class_file.superclass);
        assert_eq!(Some(8), class_file.version.java_release());
        assert!(class_file.interfaces.is_empty());
        assert!(class_file.fields.is_empty());
        assert!(class_file.methods.is_empty());
        assert!(!class_file.deprecated);
        assert_eq!(None, class_file.source_file);
    }

    #[test]
    fn reads_every_declared_field_and_method() {
        let mut data = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        data.extend([0x00, 0x0C]);
        // #1 utf8 "Foo", #2 class #1, #3 utf8 "java/lang/Object", #4 class #3,
        // #5 utf8 "count", #6 utf8 "I", #7 utf8 "bar", #8 utf8 "()I",
        // #9 utf8 "Code", #10 utf8 "baz", #11 utf8 "()V"
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"Foo");
        data.push(7);
        data.extend((1u16).to_be_bytes());
        data.push(1);
        data.extend((16u16).to_be_bytes());
        data.extend(b"java/lang/Object");
        data.push(7);
        data.extend((3u16).to_be_bytes());
        data.push(1);
        data.extend((5u16).to_be_bytes());
        data.extend(b"count");
        data.push(1);
        data.extend((1u16).to_be_bytes());
        data.extend(b"I");
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"bar");
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"()I");
        data.push(1);
        data.extend((4u16).to_be_bytes());
        data.extend(b"Code");
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"baz");
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"()V");
        data.extend([0x04, 0x21]);
        data.extend([0x00, 0x02]);
        data.extend([0x00, 0x04]);
        data.extend([0x00, 0x00]);
        // one field: private int count
        data.extend([0x00, 0x01]);
        data.extend([0x00, 0x02]);
        data.extend((5u16).to_be_bytes());
        data.extend((6u16).to_be_bytes());
        data.extend([0x00, 0x00]);
        // two methods: static bar with a body, abstract baz without
        data.extend([0x00, 0x02]);
        data.extend([0x00, 0x09]);
        data.extend((7u16).to_be_bytes());
        data.extend((8u16).to_be_bytes());
        data.extend([0x00, 0x01]);
        data.extend((9u16).to_be_bytes());
        let code_body: Vec<u8> = {
            let mut body = Vec::new();
            body.extend((1u16).to_be_bytes());
            body.extend((0u16).to_be_bytes());
            body.extend((2u32).to_be_bytes());
            body.extend([0x08, 0xAC]); // iconst_5, ireturn
            body.extend((0u16).to_be_bytes());
            body.extend((0u16).to_be_bytes());
            body
        };
        data.extend((code_body.len() as u32).to_be_bytes());
        data.extend(&code_body);
        data.extend([0x04, 0x01]);
        data.extend((10u16).to_be_bytes());
        data.extend((11u16).to_be_bytes());
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);

        let class_file = read_buffer(&data).expect("should read the class");
        assert_eq!(11, class_file.constants.len());
        assert_eq!(1, class_file.fields.len());
        assert_eq!(2, class_file.methods.len());

        let field = &class_file.fields[0];
        assert_eq!("count", field.name);
        assert_eq!(FieldType::Base(BaseType::Int), field.type_descriptor);

        assert_eq!("bar", class_file.methods[0].name);
        assert!(class_file.methods[0].code.is_some());
        assert_eq!("baz", class_file.methods[1].name);
        assert!(class_file.methods[1].code.is_none());
    }

    #[test]
    fn eight_byte_constants_take_two_slots() {
        let mut data = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        data.extend([0x00, 0x07]);
        // #1..#2 long, #3 utf8 "Foo", #4 class #3, #5 utf8 "Bar", #6 class #5
        data.push(5);
        data.extend((301i64).to_be_bytes());
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"Foo");
        data.push(7);
        data.extend((3u16).to_be_bytes());
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"Bar");
        data.push(7);
        data.extend((5u16).to_be_bytes());
        data.extend([0x00, 0x21]);
        data.extend([0x00, 0x04]);
        data.extend([0x00, 0x06]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);

        let class_file = read_buffer(&data).expect("should read the class");
        assert_eq!("Foo", class_file.name);
        assert_eq!(Some("Bar".to_string()), class_file.superclass);
        assert_eq!(
            Ok(&ConstantPoolEntry::Long(301)),
            class_file.constants.get(1)
        );
        assert!(class_file.constants.get(2).is_err());
    }

    #[test]
    fn exception_table_ranges_are_decoded() {
        let mut data = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        data.extend([0x00, 0x0A]);
        // #1 utf8 "Foo", #2 class #1, #3 utf8 "java/lang/Object", #4 class #3,
        // #5 utf8 "run", #6 utf8 "()V", #7 utf8 "Code",
        // #8 utf8 "java/lang/Exception", #9 class #8
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"Foo");
        data.push(7);
        data.extend((1u16).to_be_bytes());
        data.push(1);
        data.extend((16u16).to_be_bytes());
        data.extend(b"java/lang/Object");
        data.push(7);
        data.extend((3u16).to_be_bytes());
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"run");
        data.push(1);
        data.extend((3u16).to_be_bytes());
        data.extend(b"()V");
        data.push(1);
        data.extend((4u16).to_be_bytes());
        data.extend(b"Code");
        data.push(1);
        data.extend((19u16).to_be_bytes());
        data.extend(b"java/lang/Exception");
        data.push(7);
        data.extend((8u16).to_be_bytes());
        data.extend([0x00, 0x21]);
        data.extend([0x00, 0x02]);
        data.extend([0x00, 0x04]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);
        // one method with a Code attribute holding one handler
        data.extend([0x00, 0x01]);
        data.extend([0x00, 0x01]);
        data.extend((5u16).to_be_bytes());
        data.extend((6u16).to_be_bytes());
        data.extend([0x00, 0x01]);
        data.extend((7u16).to_be_bytes());
        let code_body: Vec<u8> = {
            let mut body = Vec::new();
            body.extend((1u16).to_be_bytes());
            body.extend((1u16).to_be_bytes());
            body.extend((1u32).to_be_bytes());
            body.push(0xB1);
            body.extend((1u16).to_be_bytes());
            body.extend((0u16).to_be_bytes());
            body.extend((1u16).to_be_bytes());
            body.extend((0u16).to_be_bytes());
            body.extend((9u16).to_be_bytes());
            body.extend((0u16).to_be_bytes());
            body
        };
        data.extend((code_body.len() as u32).to_be_bytes());
        data.extend(&code_body);
        data.extend([0x00, 0x00]);

        let class_file = read_buffer(&data).expect("should read the class");
        let method = &class_file.methods[0];
        let code = method.code.as_ref().expect("should have code");
        assert_eq!(1, code.exception_table.entries().len());
        let entry = &code.exception_table.entries()[0];
        assert_eq!(ProgramCounter(0)..ProgramCounter(1), entry.range);
        assert_eq!(ProgramCounter(0), entry.handler_pc);
        assert_eq!(
            Some("java/lang/Exception".to_string()),
            entry.catch_class
        );
    }
}
