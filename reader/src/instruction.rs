use std::fmt;

use log::warn;

use crate::{
    class_reader_error::ClassReaderError,
    constant_pool::{ConstantPool, ConstantPoolEntry, InvalidConstantPoolIndexError},
    field_type::{BaseType, FieldType},
    method_descriptor::MethodDescriptor,
    opcodes::{InstructionLength, OpCode},
    program_counter::ProgramCounter,
};

/// A field reference operand, resolved through the constant pool
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOperand {
    pub class_name: String,
    pub field_name: String,
    pub field_type: FieldType,
}

/// A method reference operand, resolved through the constant pool
#[derive(Debug, Clone, PartialEq)]
pub struct MethodOperand {
    pub class_name: String,
    pub method_name: String,
    pub descriptor: MethodDescriptor,
}

/// A constant pushed by the `ldc` family
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedConstant {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    Class(String),
    /// Method handles, method types and dynamic constants keep only their
    /// textual form
    Opaque(String),
}

impl fmt::Display for LoadedConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadedConstant::Integer(n) => write!(f, "{n}"),
            LoadedConstant::Float(n) => write!(f, "{n}f"),
            LoadedConstant::Long(n) => write!(f, "{n}L"),
            LoadedConstant::Double(n) => write!(f, "{n}"),
            LoadedConstant::String(s) => write!(f, "{s:?}"),
            LoadedConstant::Class(name) => write!(f, "{name}"),
            LoadedConstant::Opaque(text) => write!(f, "{text}"),
        }
    }
}

/// The decoded operands of one instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Byte(i8),
    Short(i16),
    LocalIndex(u16),
    Constant(LoadedConstant),
    Field(FieldOperand),
    Method(MethodOperand),
    /// A dynamic call site, kept as its name and descriptor
    Dynamic {
        name: String,
        descriptor: MethodDescriptor,
    },
    /// A class reference, by internal name (array classes keep their
    /// descriptor form)
    Type(String),
    PrimitiveArrayType(BaseType),
    /// Branch target, relative to the address of the branching instruction
    BranchOffset(i32),
    Increment {
        index: u16,
        delta: i16,
    },
    Dimensions {
        class_name: String,
        dimensions: u8,
    },
    TableSwitch {
        default_offset: i32,
        low: i32,
        jump_offsets: Vec<i32>,
    },
    LookupSwitch {
        default_offset: i32,
        pairs: Vec<(i32, i32)>,
    },
}

/// One decoded instruction. Bytes that cannot be decoded become
/// `Unsupported` entries rather than scan failures.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Known {
        address: ProgramCounter,
        op_code: OpCode,
        operand: Operand,
    },
    Unsupported {
        address: ProgramCounter,
        op_byte: u8,
        length: usize,
    },
}

impl Instruction {
    pub fn address(&self) -> ProgramCounter {
        match self {
            Instruction::Known { address, .. } => *address,
            Instruction::Unsupported { address, .. } => *address,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Known {
                address,
                op_code,
                operand,
            } => {
                write!(f, "{address}: {op_code}")?;
                match operand {
                    Operand::None => Ok(()),
                    Operand::Byte(v) => write!(f, " {v}"),
                    Operand::Short(v) => write!(f, " {v}"),
                    Operand::LocalIndex(index) => write!(f, " {index}"),
                    Operand::Constant(constant) => write!(f, " {constant}"),
                    Operand::Field(field) => {
                        write!(f, " {}.{}", field.class_name, field.field_name)
                    }
                    Operand::Method(method) => {
                        write!(f, " {}.{}", method.class_name, method.method_name)
                    }
                    Operand::Dynamic { name, .. } => write!(f, " {name}"),
                    Operand::Type(name) => write!(f, " {name}"),
                    Operand::PrimitiveArrayType(base) => write!(f, " {base}"),
                    Operand::BranchOffset(offset) => match address.offset_by(*offset) {
                        Some(target) => write!(f, " {target}"),
                        None => write!(f, " {offset:+}"),
                    },
                    Operand::Increment { index, delta } => write!(f, " {index} by {delta}"),
                    Operand::Dimensions {
                        class_name,
                        dimensions,
                    } => write!(f, " {class_name} dims {dimensions}"),
                    Operand::TableSwitch {
                        low, jump_offsets, ..
                    } => {
                        write!(f, " [{}..{}]", low, low + jump_offsets.len() as i32 - 1)
                    }
                    Operand::LookupSwitch { pairs, .. } => write!(f, " ({} cases)", pairs.len()),
                }
            }
            Instruction::Unsupported {
                address,
                op_byte,
                length,
            } => {
                write!(f, "{address}: <unsupported 0x{op_byte:02x}, {length} bytes>")
            }
        }
    }
}

enum OperandProblem {
    Truncated,
    Constant(InvalidConstantPoolIndexError),
    Descriptor(ClassReaderError),
    Layout(String),
}

impl fmt::Display for OperandProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandProblem::Truncated => write!(f, "code ends mid-instruction"),
            OperandProblem::Constant(e) => write!(f, "{e}"),
            OperandProblem::Descriptor(e) => write!(f, "{e}"),
            OperandProblem::Layout(message) => write!(f, "{message}"),
        }
    }
}

impl From<InvalidConstantPoolIndexError> for OperandProblem {
    fn from(error: InvalidConstantPoolIndexError) -> Self {
        OperandProblem::Constant(error)
    }
}

impl From<ClassReaderError> for OperandProblem {
    fn from(error: ClassReaderError) -> Self {
        OperandProblem::Descriptor(error)
    }
}

/// Decodes a whole code array. The scan always terminates and never fails:
/// anything undecodable becomes an [Instruction::Unsupported] entry.
pub fn decode_code(code: &[u8], constant_pool: &ConstantPool) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut position = 0usize;
    while position < code.len() {
        if position > u16::MAX as usize {
            warn!("code longer than the addressable range, truncating the scan");
            break;
        }
        let (instruction, next_position) = decode_at(code, position, constant_pool);
        instructions.push(instruction);
        position = next_position;
    }
    instructions
}

fn decode_at(code: &[u8], position: usize, constant_pool: &ConstantPool) -> (Instruction, usize) {
    let address = ProgramCounter(position as u16);
    let op_byte = code[position];
    let op_code = match OpCode::try_from(op_byte) {
        Ok(op_code) => op_code,
        Err(_) => {
            warn!("unknown opcode 0x{op_byte:02x} at {address}");
            return (
                Instruction::Unsupported {
                    address,
                    op_byte,
                    length: 1,
                },
                position + 1,
            );
        }
    };

    let decoded = if op_code == OpCode::Wide {
        decode_wide(code, position)
    } else {
        decode_operand(op_code, code, position, constant_pool)
            .map(|(operand, size)| (op_code, operand, size))
    };
    match decoded {
        Ok((op_code, operand, size)) => (
            Instruction::Known {
                address,
                op_code,
                operand,
            },
            position + size,
        ),
        Err(OperandProblem::Truncated) | Err(OperandProblem::Layout(_)) => {
            // without a trustworthy length the rest of the stream cannot be
            // realigned, so it is consumed as one opaque chunk
            let length = code.len() - position;
            warn!("cannot decode {op_code} at {address}, keeping {length} raw bytes");
            (
                Instruction::Unsupported {
                    address,
                    op_byte,
                    length,
                },
                code.len(),
            )
        }
        Err(problem) => {
            let length = match op_code.instruction_length() {
                InstructionLength::Fixed(n) => n,
                InstructionLength::Variable => 1,
            };
            warn!("cannot decode {op_code} at {address}: {problem}");
            (
                Instruction::Unsupported {
                    address,
                    op_byte,
                    length,
                },
                position + length,
            )
        }
    }
}

fn read_u8(code: &[u8], position: usize) -> Result<u8, OperandProblem> {
    code.get(position)
        .copied()
        .ok_or(OperandProblem::Truncated)
}

fn read_u16(code: &[u8], position: usize) -> Result<u16, OperandProblem> {
    code.get(position..position + 2)
        .map(|bytes| u16::from_be_bytes(bytes.try_into().unwrap()))
        .ok_or(OperandProblem::Truncated)
}

fn read_i32(code: &[u8], position: usize) -> Result<i32, OperandProblem> {
    code.get(position..position + 4)
        .map(|bytes| i32::from_be_bytes(bytes.try_into().unwrap()))
        .ok_or(OperandProblem::Truncated)
}

fn decode_operand(
    op_code: OpCode,
    code: &[u8],
    position: usize,
    constant_pool: &ConstantPool,
) -> Result<(Operand, usize), OperandProblem> {
    use OpCode::*;
    let operands_start = position + 1;
    Ok(match op_code {
        Bipush => (Operand::Byte(read_u8(code, operands_start)? as i8), 2),
        Sipush => (Operand::Short(read_u16(code, operands_start)? as i16), 3),
        Ldc => {
            let index = read_u8(code, operands_start)? as u16;
            (
                Operand::Constant(load_constant(constant_pool, index, false)?),
                2,
            )
        }
        Ldc_w => {
            let index = read_u16(code, operands_start)?;
            (
                Operand::Constant(load_constant(constant_pool, index, false)?),
                3,
            )
        }
        Ldc2_w => {
            let index = read_u16(code, operands_start)?;
            (
                Operand::Constant(load_constant(constant_pool, index, true)?),
                3,
            )
        }
        Iload | Lload | Fload | Dload | Aload | Istore | Lstore | Fstore | Dstore | Astore
        | Ret => (
            Operand::LocalIndex(read_u8(code, operands_start)? as u16),
            2,
        ),
        Iinc => {
            let index = read_u8(code, operands_start)? as u16;
            let delta = read_u8(code, operands_start + 1)? as i8 as i16;
            (Operand::Increment { index, delta }, 3)
        }
        Goto | Jsr => (
            Operand::BranchOffset(read_u16(code, operands_start)? as i16 as i32),
            3,
        ),
        Goto_w | Jsr_w => (Operand::BranchOffset(read_i32(code, operands_start)?), 5),
        Getstatic | Putstatic | Getfield | Putfield => {
            let index = read_u16(code, operands_start)?;
            let (class_name, field_name, descriptor) = constant_pool.field_ref(index)?;
            let field_type = FieldType::parse(descriptor)?;
            (
                Operand::Field(FieldOperand {
                    class_name: class_name.to_string(),
                    field_name: field_name.to_string(),
                    field_type,
                }),
                3,
            )
        }
        Invokevirtual | Invokespecial | Invokestatic | Invokeinterface => {
            let index = read_u16(code, operands_start)?;
            let size = if op_code == Invokeinterface {
                // count and zero bytes carry no extra information
                read_u16(code, operands_start + 2)?;
                5
            } else {
                3
            };
            let (class_name, method_name, descriptor) = constant_pool.method_ref(index)?;
            let descriptor = MethodDescriptor::parse(descriptor)?;
            (
                Operand::Method(MethodOperand {
                    class_name: class_name.to_string(),
                    method_name: method_name.to_string(),
                    descriptor,
                }),
                size,
            )
        }
        Invokedynamic => {
            let index = read_u16(code, operands_start)?;
            read_u16(code, operands_start + 2)?;
            let (name, descriptor) = constant_pool.invoke_dynamic(index)?;
            let name = name.to_string();
            let descriptor = MethodDescriptor::parse(descriptor)?;
            (Operand::Dynamic { name, descriptor }, 5)
        }
        New | Anewarray | Checkcast | Instanceof => {
            let index = read_u16(code, operands_start)?;
            let class_name = constant_pool.class_name(index)?;
            (Operand::Type(class_name.to_string()), 3)
        }
        Newarray => {
            let base = match read_u8(code, operands_start)? {
                4 => BaseType::Boolean,
                5 => BaseType::Char,
                6 => BaseType::Float,
                7 => BaseType::Double,
                8 => BaseType::Byte,
                9 => BaseType::Short,
                10 => BaseType::Int,
                11 => BaseType::Long,
                other => {
                    return Err(OperandProblem::Constant(InvalidConstantPoolIndexError::new(
                        other as u16,
                    )))
                }
            };
            (Operand::PrimitiveArrayType(base), 2)
        }
        Multianewarray => {
            let index = read_u16(code, operands_start)?;
            let dimensions = read_u8(code, operands_start + 2)?;
            let class_name = constant_pool.class_name(index)?;
            (
                Operand::Dimensions {
                    class_name: class_name.to_string(),
                    dimensions,
                },
                4,
            )
        }
        Tableswitch => decode_table_switch(code, position)?,
        Lookupswitch => decode_lookup_switch(code, position)?,
        _ if op_code.is_conditional_branch() => (
            Operand::BranchOffset(read_u16(code, operands_start)? as i16 as i32),
            3,
        ),
        _ => (Operand::None, 1),
    })
}

/// Switch payloads start at the next 4-byte boundary counted from the start
/// of the code array.
fn switch_padding(position: usize) -> usize {
    (4 - (position + 1) % 4) % 4
}

fn decode_table_switch(code: &[u8], position: usize) -> Result<(Operand, usize), OperandProblem> {
    let mut cursor = position + 1 + switch_padding(position);
    let default_offset = read_i32(code, cursor)?;
    let low = read_i32(code, cursor + 4)?;
    let high = read_i32(code, cursor + 8)?;
    cursor += 12;
    if high < low {
        return Err(OperandProblem::Layout(format!(
            "tableswitch bounds {low}..{high} are reversed"
        )));
    }
    let count = (high as i64 - low as i64 + 1) as usize;
    let mut jump_offsets = Vec::with_capacity(count.min(1024));
    for n in 0..count {
        jump_offsets.push(read_i32(code, cursor + 4 * n)?);
    }
    cursor += 4 * count;
    Ok((
        Operand::TableSwitch {
            default_offset,
            low,
            jump_offsets,
        },
        cursor - position,
    ))
}

fn decode_lookup_switch(code: &[u8], position: usize) -> Result<(Operand, usize), OperandProblem> {
    let mut cursor = position + 1 + switch_padding(position);
    let default_offset = read_i32(code, cursor)?;
    let npairs = read_i32(code, cursor + 4)?;
    cursor += 8;
    if npairs < 0 {
        return Err(OperandProblem::Layout(format!(
            "lookupswitch declares {npairs} pairs"
        )));
    }
    let mut pairs = Vec::with_capacity((npairs as usize).min(1024));
    for n in 0..npairs as usize {
        let match_value = read_i32(code, cursor + 8 * n)?;
        let jump_offset = read_i32(code, cursor + 8 * n + 4)?;
        pairs.push((match_value, jump_offset));
    }
    cursor += 8 * npairs as usize;
    Ok((
        Operand::LookupSwitch {
            default_offset,
            pairs,
        },
        cursor - position,
    ))
}

/// The wide prefix re-encodes the local variable instructions with 16 bit
/// operands. The decoded instruction keeps the inner opcode, so consumers
/// never see the prefix itself.
fn decode_wide(code: &[u8], position: usize) -> Result<(OpCode, Operand, usize), OperandProblem> {
    use OpCode::*;
    let sub_op_byte = read_u8(code, position + 1)?;
    let sub_op =
        OpCode::try_from(sub_op_byte).map_err(|_| OperandProblem::Layout(format!(
            "wide prefix before unknown opcode 0x{sub_op_byte:02x}"
        )))?;
    match sub_op {
        Iload | Lload | Fload | Dload | Aload | Istore | Lstore | Fstore | Dstore | Astore
        | Ret => {
            let index = read_u16(code, position + 2)?;
            Ok((sub_op, Operand::LocalIndex(index), 4))
        }
        Iinc => {
            let index = read_u16(code, position + 2)?;
            let delta = read_u16(code, position + 4)? as i16;
            Ok((sub_op, Operand::Increment { index, delta }, 6))
        }
        _ => Err(OperandProblem::Layout(format!(
            "wide prefix before {sub_op}"
        ))),
    }
}

fn load_constant(
    constant_pool: &ConstantPool,
    index: u16,
    wide: bool,
) -> Result<LoadedConstant, OperandProblem> {
    let constant = match constant_pool.get(index)? {
        ConstantPoolEntry::Integer(n) if !wide => LoadedConstant::Integer(*n),
        ConstantPoolEntry::Float(n) if !wide => LoadedConstant::Float(*n),
        ConstantPoolEntry::Long(n) if wide => LoadedConstant::Long(*n),
        ConstantPoolEntry::Double(n) if wide => LoadedConstant::Double(*n),
        ConstantPoolEntry::StringRef(_) if !wide => {
            LoadedConstant::String(constant_pool.string(index)?.to_string())
        }
        ConstantPoolEntry::ClassRef(_) if !wide => {
            LoadedConstant::Class(constant_pool.class_name(index)?.to_string())
        }
        ConstantPoolEntry::MethodHandleRef(_, _)
        | ConstantPoolEntry::MethodTypeRef(_)
        | ConstantPoolEntry::DynamicRef(_, _)
            if !wide =>
        {
            LoadedConstant::Opaque(constant_pool.text_of(index)?)
        }
        _ => {
            return Err(OperandProblem::Constant(InvalidConstantPoolIndexError::new(
                index,
            )))
        }
    };
    Ok(constant)
}
