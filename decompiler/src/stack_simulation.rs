use std::collections::{btree_map::Entry, BTreeMap};

use thiserror::Error;

use decaf_reader::{
    field_type::{BaseType, FieldType},
    instruction::{Instruction, LoadedConstant, MethodOperand, Operand},
    method_descriptor::MethodDescriptor,
    opcodes::OpCode,
    program_counter::ProgramCounter,
};

use crate::{
    control_flow::BasicBlock,
    expression::{BinaryOp, ComparisonOp, Expr, InvokeKind, Stmt},
};

/// Why a block could not be turned into statements. One failure dumps the
/// whole method as a bytecode listing, it never aborts the class.
#[derive(Debug, Error, PartialEq)]
pub enum SimulationFailure {
    #[error("operand stack underflow at {0}")]
    StackUnderflow(ProgramCounter),
    #[error("undecodable instruction 0x{1:02x} at {0}")]
    UndecodedInstruction(ProgramCounter, u8),
    #[error("{1} at {0} does not fit the value model")]
    UnmodeledInstruction(ProgramCounter, OpCode),
    #[error("cannot duplicate an effectful value at {0}")]
    EffectfulDuplicate(ProgramCounter),
}

/// Per method state shared by all block simulations: slot naming, slot
/// types and the identity of uninitialized objects.
pub struct MethodContext {
    pub class_name: String,
    pub is_static: bool,
    /// Established by the parameters and refined by the first typed store
    pub local_types: BTreeMap<u16, Option<FieldType>>,
    next_object_id: usize,
}

impl MethodContext {
    pub fn new(class_name: &str, descriptor: &MethodDescriptor, is_static: bool) -> MethodContext {
        let mut local_types = BTreeMap::new();
        if !is_static {
            local_types.insert(0, Some(FieldType::Object(class_name.to_string())));
        }
        for (slot, parameter) in parameter_slots(descriptor, is_static) {
            local_types.insert(slot, Some(parameter));
        }
        MethodContext {
            class_name: class_name.to_string(),
            is_static,
            local_types,
            next_object_id: 0,
        }
    }

    pub fn local_name(&self, index: u16) -> String {
        format!("var{index}")
    }

    fn record_local_type(&mut self, index: u16, field_type: Option<FieldType>) {
        match self.local_types.entry(index) {
            Entry::Occupied(mut slot) => {
                if slot.get().is_none() {
                    *slot.get_mut() = field_type;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(field_type);
            }
        }
    }

    fn claim_object_id(&mut self) -> usize {
        let id = self.next_object_id;
        self.next_object_id += 1;
        id
    }

    /// Object identities must repeat when the same blocks are simulated a
    /// second time with refined entry stacks.
    pub(crate) fn reset_object_ids(&mut self) {
        self.next_object_id = 0;
    }
}

/// The local variable slot of each parameter, in declaration order. Long
/// and double parameters take two slots.
pub fn parameter_slots(descriptor: &MethodDescriptor, is_static: bool) -> Vec<(u16, FieldType)> {
    let mut slot: u16 = if is_static { 0 } else { 1 };
    let mut slots = Vec::with_capacity(descriptor.parameters.len());
    for parameter in &descriptor.parameters {
        slots.push((slot, parameter.clone()));
        let width = match parameter {
            FieldType::Base(BaseType::Long | BaseType::Double) => 2,
            _ => 1,
        };
        slot = slot.saturating_add(width);
    }
    slots
}

/// The statement view of one basic block.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedBlock {
    pub start: ProgramCounter,
    pub statements: Vec<Stmt>,
    /// Values still on the operand stack when the block ends
    pub exit_stack: Vec<Expr>,
    /// The taken condition of a conditional terminator
    pub condition: Option<Expr>,
    /// The scrutinee of a switch terminator
    pub selector: Option<Expr>,
}

/// Abstractly executes one block over an entry stack of expressions.
pub fn simulate_block(
    block: &BasicBlock,
    entry_stack: Vec<Expr>,
    context: &mut MethodContext,
) -> Result<SimulatedBlock, SimulationFailure> {
    let mut simulator = Simulator {
        stack: entry_stack,
        statements: Vec::new(),
        condition: None,
        selector: None,
        context,
    };
    for instruction in &block.instructions {
        simulator.run(instruction)?;
    }
    Ok(SimulatedBlock {
        start: block.start,
        statements: simulator.statements,
        exit_stack: simulator.stack,
        condition: simulator.condition,
        selector: simulator.selector,
    })
}

struct Simulator<'a> {
    stack: Vec<Expr>,
    statements: Vec<Stmt>,
    condition: Option<Expr>,
    selector: Option<Expr>,
    context: &'a mut MethodContext,
}

impl Simulator<'_> {
    fn run(&mut self, instruction: &Instruction) -> Result<(), SimulationFailure> {
        let (at, op_code, operand) = match instruction {
            Instruction::Known {
                address,
                op_code,
                operand,
            } => (*address, *op_code, operand),
            Instruction::Unsupported {
                address, op_byte, ..
            } => {
                return Err(SimulationFailure::UndecodedInstruction(*address, *op_byte));
            }
        };

        use OpCode::*;
        match (op_code, operand) {
            (Nop, _) => {}

            (Aconst_null, _) => self.stack.push(Expr::Null),
            (Iconst_m1, _) => self.push_integer(-1),
            (Iconst_0, _) => self.push_integer(0),
            (Iconst_1, _) => self.push_integer(1),
            (Iconst_2, _) => self.push_integer(2),
            (Iconst_3, _) => self.push_integer(3),
            (Iconst_4, _) => self.push_integer(4),
            (Iconst_5, _) => self.push_integer(5),
            (Lconst_0, _) => self.push_literal(LoadedConstant::Long(0)),
            (Lconst_1, _) => self.push_literal(LoadedConstant::Long(1)),
            (Fconst_0, _) => self.push_literal(LoadedConstant::Float(0.0)),
            (Fconst_1, _) => self.push_literal(LoadedConstant::Float(1.0)),
            (Fconst_2, _) => self.push_literal(LoadedConstant::Float(2.0)),
            (Dconst_0, _) => self.push_literal(LoadedConstant::Double(0.0)),
            (Dconst_1, _) => self.push_literal(LoadedConstant::Double(1.0)),
            (Bipush, Operand::Byte(value)) => self.push_integer(*value as i32),
            (Sipush, Operand::Short(value)) => self.push_integer(*value as i32),
            (Ldc | Ldc_w | Ldc2_w, Operand::Constant(constant)) => {
                self.push_literal(constant.clone())
            }

            (Iload | Lload | Fload | Dload | Aload, Operand::LocalIndex(index)) => {
                self.load(*index)
            }
            (Iload_0 | Lload_0 | Fload_0 | Dload_0 | Aload_0, _) => self.load(0),
            (Iload_1 | Lload_1 | Fload_1 | Dload_1 | Aload_1, _) => self.load(1),
            (Iload_2 | Lload_2 | Fload_2 | Dload_2 | Aload_2, _) => self.load(2),
            (Iload_3 | Lload_3 | Fload_3 | Dload_3 | Aload_3, _) => self.load(3),

            (Istore | Lstore | Fstore | Dstore | Astore, Operand::LocalIndex(index)) => {
                self.store(at, *index)?
            }
            (Istore_0 | Lstore_0 | Fstore_0 | Dstore_0 | Astore_0, _) => self.store(at, 0)?,
            (Istore_1 | Lstore_1 | Fstore_1 | Dstore_1 | Astore_1, _) => self.store(at, 1)?,
            (Istore_2 | Lstore_2 | Fstore_2 | Dstore_2 | Astore_2, _) => self.store(at, 2)?,
            (Istore_3 | Lstore_3 | Fstore_3 | Dstore_3 | Astore_3, _) => self.store(at, 3)?,

            (Iaload | Laload | Faload | Daload | Aaload | Baload | Caload | Saload, _) => {
                let index = self.pop(at)?;
                let array = self.pop(at)?;
                self.stack.push(Expr::ArrayGet {
                    array: Box::new(array),
                    index: Box::new(index),
                });
            }
            (Iastore | Lastore | Fastore | Dastore | Aastore | Bastore | Castore | Sastore, _) => {
                let value = self.pop(at)?;
                let index = self.pop(at)?;
                let array = self.pop(at)?;
                self.statements.push(Stmt::ArrayPut {
                    array,
                    index,
                    value,
                });
            }

            (Pop, _) => {
                let value = self.pop(at)?;
                self.discard(value);
            }
            (Pop2, _) => {
                let top = self.pop(at)?;
                if top.is_wide() {
                    self.discard(top);
                } else {
                    let under = self.pop(at)?;
                    self.discard(under);
                    self.discard(top);
                }
            }
            (Dup, _) => {
                let copy = match self.stack.last() {
                    Some(top) => duplicate(top, at)?,
                    None => return Err(SimulationFailure::StackUnderflow(at)),
                };
                self.stack.push(copy);
            }
            (Dup_x1, _) => {
                let v1 = self.pop(at)?;
                let v2 = self.pop(at)?;
                let copy = duplicate(&v1, at)?;
                self.stack.extend([copy, v2, v1]);
            }
            (Dup_x2, _) => {
                let v1 = self.pop(at)?;
                let v2 = self.pop(at)?;
                let copy = duplicate(&v1, at)?;
                if v2.is_wide() {
                    self.stack.extend([copy, v2, v1]);
                } else {
                    let v3 = self.pop(at)?;
                    self.stack.extend([copy, v3, v2, v1]);
                }
            }
            (Dup2, _) => {
                let v1 = self.pop(at)?;
                if v1.is_wide() {
                    let copy = duplicate(&v1, at)?;
                    self.stack.extend([copy, v1]);
                } else {
                    let v2 = self.pop(at)?;
                    let copies = [duplicate(&v2, at)?, duplicate(&v1, at)?];
                    self.stack.extend(copies);
                    self.stack.extend([v2, v1]);
                }
            }
            (Dup2_x1, _) => {
                let v1 = self.pop(at)?;
                if v1.is_wide() {
                    let v2 = self.pop(at)?;
                    let copy = duplicate(&v1, at)?;
                    self.stack.extend([copy, v2, v1]);
                } else {
                    let v2 = self.pop(at)?;
                    let v3 = self.pop(at)?;
                    let copies = [duplicate(&v2, at)?, duplicate(&v1, at)?];
                    self.stack.extend(copies);
                    self.stack.extend([v3, v2, v1]);
                }
            }
            (Dup2_x2, _) => {
                let v1 = self.pop(at)?;
                if v1.is_wide() {
                    let v2 = self.pop(at)?;
                    let copy = duplicate(&v1, at)?;
                    if v2.is_wide() {
                        self.stack.extend([copy, v2, v1]);
                    } else {
                        let v3 = self.pop(at)?;
                        self.stack.extend([copy, v3, v2, v1]);
                    }
                } else {
                    let v2 = self.pop(at)?;
                    let v3 = self.pop(at)?;
                    let copies = [duplicate(&v2, at)?, duplicate(&v1, at)?];
                    if v3.is_wide() {
                        self.stack.extend(copies);
                        self.stack.extend([v3, v2, v1]);
                    } else {
                        let v4 = self.pop(at)?;
                        self.stack.extend(copies);
                        self.stack.extend([v4, v3, v2, v1]);
                    }
                }
            }
            (Swap, _) => {
                let v1 = self.pop(at)?;
                let v2 = self.pop(at)?;
                self.stack.extend([v1, v2]);
            }

            (Iadd | Ladd | Fadd | Dadd, _) => self.push_binary(at, BinaryOp::Add)?,
            (Isub | Lsub | Fsub | Dsub, _) => self.push_binary(at, BinaryOp::Sub)?,
            (Imul | Lmul | Fmul | Dmul, _) => self.push_binary(at, BinaryOp::Mul)?,
            (Idiv | Ldiv | Fdiv | Ddiv, _) => self.push_binary(at, BinaryOp::Div)?,
            (Irem | Lrem | Frem | Drem, _) => self.push_binary(at, BinaryOp::Rem)?,
            (Ineg | Lneg | Fneg | Dneg, _) => {
                let value = self.pop(at)?;
                self.stack.push(Expr::Negate(Box::new(value)));
            }
            (Ishl | Lshl, _) => self.push_binary(at, BinaryOp::Shl)?,
            (Ishr | Lshr, _) => self.push_binary(at, BinaryOp::Shr)?,
            (Iushr | Lushr, _) => self.push_binary(at, BinaryOp::Ushr)?,
            (Iand | Land, _) => self.push_binary(at, BinaryOp::And)?,
            (Ior | Lor, _) => self.push_binary(at, BinaryOp::Or)?,
            (Ixor | Lxor, _) => self.push_binary(at, BinaryOp::Xor)?,
            (Iinc, Operand::Increment { index, delta }) => {
                let name = self.context.local_name(*index);
                self.statements.push(Stmt::Increment {
                    name,
                    delta: *delta,
                });
            }

            (I2l | F2l | D2l, _) => self.push_cast(at, BaseType::Long)?,
            (I2f | L2f | D2f, _) => self.push_cast(at, BaseType::Float)?,
            (I2d | L2d | F2d, _) => self.push_cast(at, BaseType::Double)?,
            (L2i | F2i | D2i, _) => self.push_cast(at, BaseType::Int)?,
            (I2b, _) => self.push_cast(at, BaseType::Byte)?,
            (I2c, _) => self.push_cast(at, BaseType::Char)?,
            (I2s, _) => self.push_cast(at, BaseType::Short)?,

            (Lcmp | Fcmpl | Fcmpg | Dcmpl | Dcmpg, _) => {
                let right = self.pop(at)?;
                let left = self.pop(at)?;
                self.stack.push(Expr::CompareValue {
                    left: Box::new(left),
                    right: Box::new(right),
                });
            }

            (Ifeq, _) => self.condition_zero(at, ComparisonOp::Eq)?,
            (Ifne, _) => self.condition_zero(at, ComparisonOp::Ne)?,
            (Iflt, _) => self.condition_zero(at, ComparisonOp::Lt)?,
            (Ifge, _) => self.condition_zero(at, ComparisonOp::Ge)?,
            (Ifgt, _) => self.condition_zero(at, ComparisonOp::Gt)?,
            (Ifle, _) => self.condition_zero(at, ComparisonOp::Le)?,
            (If_icmpeq | If_acmpeq, _) => self.condition_pair(at, ComparisonOp::Eq)?,
            (If_icmpne | If_acmpne, _) => self.condition_pair(at, ComparisonOp::Ne)?,
            (If_icmplt, _) => self.condition_pair(at, ComparisonOp::Lt)?,
            (If_icmpge, _) => self.condition_pair(at, ComparisonOp::Ge)?,
            (If_icmpgt, _) => self.condition_pair(at, ComparisonOp::Gt)?,
            (If_icmple, _) => self.condition_pair(at, ComparisonOp::Le)?,
            (Ifnull, _) => self.condition_null(at, ComparisonOp::Eq)?,
            (Ifnonnull, _) => self.condition_null(at, ComparisonOp::Ne)?,

            (Goto | Goto_w | Ret, _) => {}
            (Jsr | Jsr_w, _) => self.stack.push(Expr::Opaque("<return address>".to_string())),
            (Tableswitch | Lookupswitch, _) => {
                let selector = self.pop(at)?;
                self.selector = Some(selector);
            }

            (Ireturn | Lreturn | Freturn | Dreturn | Areturn, _) => {
                let value = self.pop(at)?;
                self.statements.push(Stmt::Return(Some(value)));
            }
            (Return, _) => self.statements.push(Stmt::Return(None)),

            (Getstatic, Operand::Field(field)) => self.stack.push(Expr::StaticFieldGet {
                field: field.clone(),
            }),
            (Putstatic, Operand::Field(field)) => {
                let value = self.pop(at)?;
                self.statements.push(Stmt::StaticFieldPut {
                    field: field.clone(),
                    value,
                });
            }
            (Getfield, Operand::Field(field)) => {
                let object = self.pop(at)?;
                self.stack.push(Expr::FieldGet {
                    object: Box::new(object),
                    field: field.clone(),
                });
            }
            (Putfield, Operand::Field(field)) => {
                let value = self.pop(at)?;
                let object = self.pop(at)?;
                self.statements.push(Stmt::FieldPut {
                    object,
                    field: field.clone(),
                    value,
                });
            }

            (Invokevirtual, Operand::Method(method)) => {
                self.invoke_with_receiver(at, method, InvokeKind::Virtual)?
            }
            (Invokeinterface, Operand::Method(method)) => {
                self.invoke_with_receiver(at, method, InvokeKind::Interface)?
            }
            (Invokespecial, Operand::Method(method)) => self.invoke_special(at, method)?,
            (Invokestatic, Operand::Method(method)) => {
                let arguments = self.pop_arguments(at, &method.descriptor)?;
                let call = Expr::Invoke {
                    kind: InvokeKind::Static,
                    receiver: None,
                    method: method.clone(),
                    arguments,
                };
                self.push_or_discard(call, method.descriptor.return_type.is_some());
            }
            (Invokedynamic, Operand::Dynamic { name, descriptor }) => {
                let arguments = self.pop_arguments(at, descriptor)?;
                let call = Expr::DynamicInvoke {
                    name: name.clone(),
                    arguments,
                };
                self.push_or_discard(call, descriptor.return_type.is_some());
            }

            (New, Operand::Type(class_name)) => {
                let id = self.context.claim_object_id();
                self.stack.push(Expr::UninitializedNew {
                    class_name: class_name.clone(),
                    id,
                });
            }
            (Newarray, Operand::PrimitiveArrayType(base)) => {
                let length = self.pop(at)?;
                self.stack.push(Expr::NewArray {
                    element: FieldType::Base(*base),
                    length: Box::new(length),
                });
            }
            (Anewarray, Operand::Type(class_name)) => {
                let length = self.pop(at)?;
                self.stack.push(Expr::NewArray {
                    element: class_reference_type(class_name),
                    length: Box::new(length),
                });
            }
            (Arraylength, _) => {
                let array = self.pop(at)?;
                self.stack.push(Expr::ArrayLength(Box::new(array)));
            }
            (Athrow, _) => {
                let value = self.pop(at)?;
                self.statements.push(Stmt::Throw(value));
            }
            (Checkcast, Operand::Type(class_name)) => {
                let value = self.pop(at)?;
                self.stack.push(Expr::Cast {
                    target: class_reference_type(class_name),
                    value: Box::new(value),
                });
            }
            (Instanceof, Operand::Type(class_name)) => {
                let value = self.pop(at)?;
                self.stack.push(Expr::InstanceOf {
                    class_name: class_name.clone(),
                    value: Box::new(value),
                });
            }
            (Monitorenter, _) => {
                let value = self.pop(at)?;
                self.statements.push(Stmt::MonitorEnter(value));
            }
            (Monitorexit, _) => {
                let value = self.pop(at)?;
                self.statements.push(Stmt::MonitorExit(value));
            }
            (
                Multianewarray,
                Operand::Dimensions {
                    class_name,
                    dimensions,
                },
            ) => {
                let mut lengths = Vec::with_capacity(*dimensions as usize);
                for _ in 0..*dimensions {
                    lengths.push(self.pop(at)?);
                }
                lengths.reverse();
                self.stack.push(Expr::NewMultiArray {
                    class_name: class_name.clone(),
                    lengths,
                });
            }

            (other, _) => return Err(SimulationFailure::UnmodeledInstruction(at, other)),
        }
        Ok(())
    }

    fn pop(&mut self, at: ProgramCounter) -> Result<Expr, SimulationFailure> {
        self.stack
            .pop()
            .ok_or(SimulationFailure::StackUnderflow(at))
    }

    fn push_literal(&mut self, constant: LoadedConstant) {
        self.stack.push(Expr::Literal(constant));
    }

    fn push_integer(&mut self, value: i32) {
        self.push_literal(LoadedConstant::Integer(value));
    }

    fn load(&mut self, index: u16) {
        if index == 0 && !self.context.is_static {
            self.stack.push(Expr::This);
        } else {
            self.stack.push(Expr::Local {
                index,
                name: self.context.local_name(index),
            });
        }
    }

    fn store(&mut self, at: ProgramCounter, index: u16) -> Result<(), SimulationFailure> {
        let value = self.pop(at)?;
        self.context.record_local_type(index, value.static_type());
        self.statements.push(Stmt::LocalStore {
            index,
            name: self.context.local_name(index),
            value,
        });
        Ok(())
    }

    /// A value dropped from the stack still runs as a statement if it can
    /// have effects.
    fn discard(&mut self, value: Expr) {
        if value.has_side_effects() {
            self.statements.push(Stmt::Expression(value));
        }
    }

    fn push_binary(&mut self, at: ProgramCounter, op: BinaryOp) -> Result<(), SimulationFailure> {
        let right = self.pop(at)?;
        let left = self.pop(at)?;
        self.stack.push(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        });
        Ok(())
    }

    fn push_cast(&mut self, at: ProgramCounter, target: BaseType) -> Result<(), SimulationFailure> {
        let value = self.pop(at)?;
        self.stack.push(Expr::Cast {
            target: FieldType::Base(target),
            value: Box::new(value),
        });
        Ok(())
    }

    fn condition_zero(
        &mut self,
        at: ProgramCounter,
        op: ComparisonOp,
    ) -> Result<(), SimulationFailure> {
        let condition = match self.pop(at)? {
            // the three-way compare feeding the branch folds into one
            // source level comparison
            Expr::CompareValue { left, right } => Expr::Comparison { op, left, right },
            value => Expr::Comparison {
                op,
                left: Box::new(value),
                right: Box::new(Expr::Literal(LoadedConstant::Integer(0))),
            },
        };
        self.condition = Some(condition);
        Ok(())
    }

    fn condition_pair(
        &mut self,
        at: ProgramCounter,
        op: ComparisonOp,
    ) -> Result<(), SimulationFailure> {
        let right = self.pop(at)?;
        let left = self.pop(at)?;
        self.condition = Some(Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        });
        Ok(())
    }

    fn condition_null(
        &mut self,
        at: ProgramCounter,
        op: ComparisonOp,
    ) -> Result<(), SimulationFailure> {
        let value = self.pop(at)?;
        self.condition = Some(Expr::Comparison {
            op,
            left: Box::new(value),
            right: Box::new(Expr::Null),
        });
        Ok(())
    }

    fn pop_arguments(
        &mut self,
        at: ProgramCounter,
        descriptor: &MethodDescriptor,
    ) -> Result<Vec<Expr>, SimulationFailure> {
        let mut arguments = Vec::with_capacity(descriptor.parameters.len());
        for _ in &descriptor.parameters {
            arguments.push(self.pop(at)?);
        }
        arguments.reverse();
        Ok(arguments)
    }

    fn push_or_discard(&mut self, call: Expr, has_result: bool) {
        if has_result {
            self.stack.push(call);
        } else {
            self.statements.push(Stmt::Expression(call));
        }
    }

    fn invoke_with_receiver(
        &mut self,
        at: ProgramCounter,
        method: &MethodOperand,
        kind: InvokeKind,
    ) -> Result<(), SimulationFailure> {
        let arguments = self.pop_arguments(at, &method.descriptor)?;
        let receiver = self.pop(at)?;
        let call = Expr::Invoke {
            kind,
            receiver: Some(Box::new(receiver)),
            method: method.clone(),
            arguments,
        };
        self.push_or_discard(call, method.descriptor.return_type.is_some());
        Ok(())
    }

    fn invoke_special(
        &mut self,
        at: ProgramCounter,
        method: &MethodOperand,
    ) -> Result<(), SimulationFailure> {
        let arguments = self.pop_arguments(at, &method.descriptor)?;
        let receiver = self.pop(at)?;

        if method.method_name == "<init>" {
            if let Expr::UninitializedNew { class_name, id } = receiver {
                self.finish_initialization(class_name, id, arguments);
                return Ok(());
            }
            // a chained constructor call, this(...) on the own class and
            // super(...) on anything else
            let receiver = match receiver {
                Expr::This if method.class_name != self.context.class_name => Expr::Super,
                other => other,
            };
            self.statements.push(Stmt::Expression(Expr::Invoke {
                kind: InvokeKind::Special,
                receiver: Some(Box::new(receiver)),
                method: method.clone(),
                arguments,
            }));
            return Ok(());
        }

        let receiver = match receiver {
            Expr::This if method.class_name != self.context.class_name => Expr::Super,
            other => other,
        };
        let call = Expr::Invoke {
            kind: InvokeKind::Special,
            receiver: Some(Box::new(receiver)),
            method: method.clone(),
            arguments,
        };
        self.push_or_discard(call, method.descriptor.return_type.is_some());
        Ok(())
    }

    /// Rewrites every pending copy of the freshly constructed object into
    /// the `new` expression. Without a surviving copy the construction is
    /// its own statement.
    fn finish_initialization(&mut self, class_name: String, id: usize, arguments: Vec<Expr>) {
        let constructed = Expr::New {
            class_name,
            arguments,
        };
        let mut survives = false;
        for slot in self.stack.iter_mut() {
            if let Expr::UninitializedNew { id: other, .. } = slot {
                if *other == id {
                    *slot = constructed.clone();
                    survives = true;
                }
            }
        }
        if !survives {
            self.statements.push(Stmt::Expression(constructed));
        }
    }
}

fn duplicate(value: &Expr, at: ProgramCounter) -> Result<Expr, SimulationFailure> {
    // an uninitialized object is freely copied, the copies collapse back
    // into one value when the constructor runs
    if matches!(value, Expr::UninitializedNew { .. }) || !value.has_side_effects() {
        Ok(value.clone())
    } else {
        Err(SimulationFailure::EffectfulDuplicate(at))
    }
}

/// A class operand names either a plain class or, for array classes, a
/// whole type descriptor.
pub(crate) fn class_reference_type(name: &str) -> FieldType {
    if name.starts_with('[') {
        FieldType::parse(name).unwrap_or_else(|_| FieldType::Object(name.to_string()))
    } else {
        FieldType::Object(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use decaf_reader::{
        constant_pool::{ConstantPool, ConstantPoolEntry},
        exception_table::ExceptionTable,
        field_type::{BaseType, FieldType},
        instruction::{decode_code, LoadedConstant},
        method_descriptor::MethodDescriptor,
        program_counter::ProgramCounter,
    };

    use crate::{
        control_flow::ControlFlowGraph,
        expression::{BinaryOp, ComparisonOp, Expr, Stmt},
        stack_simulation::{simulate_block, MethodContext, SimulationFailure},
    };

    fn context(descriptor: &str, is_static: bool) -> MethodContext {
        let descriptor = MethodDescriptor::parse(descriptor).unwrap();
        MethodContext::new("sample/Owner", &descriptor, is_static)
    }

    fn simulate(
        code: &[u8],
        pool: &ConstantPool,
        context: &mut MethodContext,
    ) -> Result<super::SimulatedBlock, SimulationFailure> {
        let instructions = decode_code(code, pool);
        let graph = ControlFlowGraph::build(&instructions, &ExceptionTable::default()).unwrap();
        let entry = &graph.blocks[&graph.entry];
        simulate_block(entry, Vec::new(), context)
    }

    fn local(index: u16) -> Expr {
        Expr::Local {
            index,
            name: format!("var{index}"),
        }
    }

    #[test]
    fn adds_parameters_into_a_return() {
        let mut context = context("(II)I", true);
        // iload_0, iload_1, iadd, ireturn
        let block = simulate(&[0x1a, 0x1b, 0x60, 0xac], &ConstantPool::new(), &mut context)
            .unwrap();

        assert_eq!(
            vec![Stmt::Return(Some(Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(local(0)),
                right: Box::new(local(1)),
            }))],
            block.statements
        );
        assert!(block.exit_stack.is_empty());
    }

    #[test]
    fn slot_zero_of_an_instance_method_is_this() {
        let mut context = context("()Ljava/lang/Object;", false);
        // aload_0, areturn
        let block = simulate(&[0x2a, 0xb0], &ConstantPool::new(), &mut context).unwrap();
        assert_eq!(vec![Stmt::Return(Some(Expr::This))], block.statements);
    }

    #[test]
    fn first_store_types_the_slot() {
        let mut context = context("()V", true);
        // iconst_5, istore_1, return
        let block = simulate(&[0x08, 0x3c, 0xb1], &ConstantPool::new(), &mut context).unwrap();

        assert_eq!(
            vec![
                Stmt::LocalStore {
                    index: 1,
                    name: "var1".to_string(),
                    value: Expr::Literal(LoadedConstant::Integer(5)),
                },
                Stmt::Return(None),
            ],
            block.statements
        );
        assert_eq!(
            Some(&Some(FieldType::Base(BaseType::Int))),
            context.local_types.get(&1)
        );
    }

    #[test]
    fn three_way_compares_fold_into_the_branch() {
        let mut context = context("(JJ)I", true);
        // lload_0, lload_2, lcmp, ifge 8, iconst_0, ireturn, iconst_1, ireturn
        let code = [0x1e, 0x20, 0x94, 0x9c, 0x00, 0x05, 0x03, 0xac, 0x04, 0xac];
        let block = simulate(&code, &ConstantPool::new(), &mut context).unwrap();

        assert_eq!(
            Some(Expr::Comparison {
                op: ComparisonOp::Ge,
                left: Box::new(local(0)),
                right: Box::new(local(2)),
            }),
            block.condition
        );
        assert!(block.statements.is_empty());
    }

    #[test]
    fn constructors_collapse_into_new_expressions() {
        let mut pool = ConstantPool::new();
        pool.add(ConstantPoolEntry::Utf8("sample/Point".to_string())); // 1
        pool.add(ConstantPoolEntry::ClassRef(1)); // 2
        pool.add(ConstantPoolEntry::Utf8("<init>".to_string())); // 3
        pool.add(ConstantPoolEntry::Utf8("()V".to_string())); // 4
        pool.add(ConstantPoolEntry::NameAndType(3, 4)); // 5
        pool.add(ConstantPoolEntry::MethodRef(2, 5)); // 6

        let mut context = context("()V", true);
        // new #2, dup, invokespecial #6, astore_1, return
        let code = [0xbb, 0x00, 0x02, 0x59, 0xb7, 0x00, 0x06, 0x4c, 0xb1];
        let block = simulate(&code, &pool, &mut context).unwrap();

        assert_eq!(
            vec![
                Stmt::LocalStore {
                    index: 1,
                    name: "var1".to_string(),
                    value: Expr::New {
                        class_name: "sample/Point".to_string(),
                        arguments: Vec::new(),
                    },
                },
                Stmt::Return(None),
            ],
            block.statements
        );
    }

    #[test]
    fn constructor_chaining_targets_the_superclass() {
        let mut pool = ConstantPool::new();
        pool.add(ConstantPoolEntry::Utf8("java/lang/Object".to_string())); // 1
        pool.add(ConstantPoolEntry::ClassRef(1)); // 2
        pool.add(ConstantPoolEntry::Utf8("<init>".to_string())); // 3
        pool.add(ConstantPoolEntry::Utf8("()V".to_string())); // 4
        pool.add(ConstantPoolEntry::NameAndType(3, 4)); // 5
        pool.add(ConstantPoolEntry::MethodRef(2, 5)); // 6

        let mut context = context("()V", false);
        // aload_0, invokespecial #6, return
        let block = simulate(&[0x2a, 0xb7, 0x00, 0x06, 0xb1], &pool, &mut context).unwrap();

        match &block.statements[0] {
            Stmt::Expression(Expr::Invoke { receiver, .. }) => {
                assert_eq!(Some(&Box::new(Expr::Super)), receiver.as_ref());
            }
            other => panic!("expected a super call, got {other:?}"),
        }
    }

    #[test]
    fn discarded_call_results_still_run() {
        let mut pool = ConstantPool::new();
        pool.add(ConstantPoolEntry::Utf8("sample/Owner".to_string())); // 1
        pool.add(ConstantPoolEntry::ClassRef(1)); // 2
        pool.add(ConstantPoolEntry::Utf8("roll".to_string())); // 3
        pool.add(ConstantPoolEntry::Utf8("()I".to_string())); // 4
        pool.add(ConstantPoolEntry::NameAndType(3, 4)); // 5
        pool.add(ConstantPoolEntry::MethodRef(2, 5)); // 6

        let mut context = context("()V", true);
        // invokestatic #6, pop, return
        let block = simulate(&[0xb8, 0x00, 0x06, 0x57, 0xb1], &pool, &mut context).unwrap();

        assert_eq!(2, block.statements.len());
        assert!(matches!(
            block.statements[0],
            Stmt::Expression(Expr::Invoke { .. })
        ));
    }

    #[test]
    fn an_empty_stack_cannot_be_popped() {
        let mut context = context("()V", true);
        // pop, return
        let outcome = simulate(&[0x57, 0xb1], &ConstantPool::new(), &mut context);
        assert_eq!(
            Err(SimulationFailure::StackUnderflow(ProgramCounter(0))),
            outcome.map(|_| ())
        );
    }
}
