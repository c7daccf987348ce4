use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use decaf_reader::{instruction::LoadedConstant, program_counter::ProgramCounter};

use crate::{
    control_flow::{ControlFlowGraph, Terminator},
    expression::{ComparisonOp, Expr, Stmt},
    stack_simulation::SimulatedBlock,
};

/// A statement tree recovered from the control flow graph.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredStmt {
    Plain(Stmt),
    If {
        condition: Expr,
        then_body: Vec<StructuredStmt>,
        else_body: Vec<StructuredStmt>,
    },
    /// `None` is an unconditional loop, rendered as `while (true)`
    While {
        condition: Option<Expr>,
        body: Vec<StructuredStmt>,
    },
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<StructuredStmt>>,
    },
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub keys: Vec<i32>,
    pub body: Vec<StructuredStmt>,
}

/// One block of the labeled fallback rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBlock {
    pub label: ProgramCounter,
    /// `Some` marks an exception handler entry; the inner value is the
    /// caught class, catch-all handlers carry `None`
    pub handler: Option<Option<String>>,
    pub statements: Vec<Stmt>,
    pub transfers: Vec<Transfer>,
    /// `Some` when the simulation gave up on this block; the listing
    /// stands in for the statements
    pub dump: Option<BlockDump>,
}

/// The raw rendering of a block whose operand stack could not be followed.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDump {
    pub reason: String,
    pub lines: Vec<String>,
}

/// An explicit control transfer of a labeled block.
#[derive(Debug, Clone, PartialEq)]
pub enum Transfer {
    Goto(ProgramCounter),
    ConditionalGoto {
        condition: Expr,
        target: ProgramCounter,
    },
    SwitchGoto {
        selector: Expr,
        targets: Vec<(Option<i32>, ProgramCounter)>,
    },
    SubroutineCall {
        target: ProgramCounter,
        resume: ProgramCounter,
    },
    SubroutineReturn,
}

/// The rendered form of one method body.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodBody {
    Structured {
        statements: Vec<StructuredStmt>,
        /// Exception handler regions and unreachable blocks, kept as
        /// labeled blocks after the statements
        appendix: Vec<LabeledBlock>,
    },
    /// The flow did not fit the statement forms, every block keeps a label
    Labeled(Vec<LabeledBlock>),
    /// The body could not be understood at all; a bytecode listing remains
    Dumped { reason: String, lines: Vec<String> },
}

enum StructureFailure {
    /// jsr and ret have no statement form
    Subroutine,
    /// a jump crosses a loop it is not directly inside of
    LabeledJump,
    /// control flows from one switch case into a sibling case
    CaseFallThrough,
    /// a loop break inside a switch case would bind to the switch
    ShadowedBreak,
    /// internal inconsistency between the graph and the simulation
    MissingBlock,
}

/// Builds the statement tree of a method, falling back to labeled blocks
/// when the flow cannot be expressed with if, while and switch. A block
/// the simulation dumped forces the labeled form, since any structure
/// would depend on values that were never recovered.
pub fn structure_method(
    graph: &ControlFlowGraph,
    simulated: &BTreeMap<ProgramCounter, SimulatedBlock>,
    dumps: &BTreeMap<ProgramCounter, BlockDump>,
) -> MethodBody {
    if !dumps.is_empty() {
        return MethodBody::Labeled(labeled_blocks(graph, simulated, dumps, false));
    }
    let mut structurer = Structurer::new(graph, simulated);
    match structurer.emit_region(Some(graph.entry), &[], false) {
        Ok(statements) => MethodBody::Structured {
            statements,
            appendix: labeled_blocks(graph, simulated, dumps, true),
        },
        Err(_) => MethodBody::Labeled(labeled_blocks(graph, simulated, dumps, false)),
    }
}

struct Structurer<'a> {
    graph: &'a ControlFlowGraph,
    simulated: &'a BTreeMap<ProgramCounter, SimulatedBlock>,
    rpo_index: HashMap<ProgramCounter, usize>,
    predecessors: BTreeMap<ProgramCounter, BTreeSet<ProgramCounter>>,
    loop_stack: Vec<LoopContext>,
    /// One entry per switch case being emitted: the entries of its sibling
    /// cases, which no walk inside the case may reach.
    case_bounds: Vec<BTreeSet<ProgramCounter>>,
}

struct LoopContext {
    header: ProgramCounter,
    exit: Option<ProgramCounter>,
    /// How many switch cases were open when the loop was entered; a break
    /// emitted under a deeper case would bind to the switch instead.
    case_depth: usize,
}

impl<'a> Structurer<'a> {
    fn new(
        graph: &'a ControlFlowGraph,
        simulated: &'a BTreeMap<ProgramCounter, SimulatedBlock>,
    ) -> Structurer<'a> {
        let rpo_index = graph
            .reverse_postorder()
            .into_iter()
            .enumerate()
            .map(|(index, pc)| (pc, index))
            .collect();
        Structurer {
            graph,
            simulated,
            rpo_index,
            predecessors: graph.predecessors(),
            loop_stack: Vec::new(),
            case_bounds: Vec::new(),
        }
    }

    /// Emits the linear run of statements from `start` until a stop block,
    /// a loop boundary or the end of control. `entering_loop_body` lets the
    /// body of a loop start at the very block that bounds it.
    fn emit_region(
        &mut self,
        start: Option<ProgramCounter>,
        stops: &[ProgramCounter],
        entering_loop_body: bool,
    ) -> Result<Vec<StructuredStmt>, StructureFailure> {
        let mut out = Vec::new();
        let mut current = start;
        let mut first = entering_loop_body;
        while let Some(pc) = current {
            if !first {
                if let Some(active) = self.loop_stack.last() {
                    if pc == active.header {
                        out.push(StructuredStmt::Continue);
                        break;
                    }
                    if Some(pc) == active.exit {
                        // an exit that is also this region's stop ends the
                        // region; whoever owns the stop emits the break
                        if stops.contains(&pc) {
                            break;
                        }
                        // Java reads a break under a case as leaving the
                        // switch, not the loop
                        if self.case_bounds.len() > active.case_depth {
                            return Err(StructureFailure::ShadowedBreak);
                        }
                        out.push(StructuredStmt::Break);
                        break;
                    }
                }
                if self.case_bounds.iter().any(|bounds| bounds.contains(&pc)) {
                    return Err(StructureFailure::CaseFallThrough);
                }
                if stops.contains(&pc) {
                    break;
                }
                // a jump into an enclosing loop would need a label
                let crosses_outer = self
                    .loop_stack
                    .iter()
                    .rev()
                    .skip(1)
                    .any(|outer| pc == outer.header || Some(pc) == outer.exit);
                if crosses_outer {
                    return Err(StructureFailure::LabeledJump);
                }
            }
            first = false;

            if self.is_loop_header(pc) && !self.in_loop_of(pc) {
                current = self.emit_loop(pc, &mut out)?;
                continue;
            }
            current = self.emit_block(pc, stops, &mut out)?;
        }
        Ok(out)
    }

    /// Emits one block's statements and whatever its terminator calls for,
    /// returning where the linear walk continues.
    fn emit_block(
        &mut self,
        pc: ProgramCounter,
        stops: &[ProgramCounter],
        out: &mut Vec<StructuredStmt>,
    ) -> Result<Option<ProgramCounter>, StructureFailure> {
        let simulated = self
            .simulated
            .get(&pc)
            .ok_or(StructureFailure::MissingBlock)?;
        let block = self
            .graph
            .blocks
            .get(&pc)
            .ok_or(StructureFailure::MissingBlock)?;
        out.extend(simulated.statements.iter().cloned().map(StructuredStmt::Plain));

        match &block.terminator {
            Terminator::FallThrough { next } | Terminator::Jump { target: next } => {
                Ok(Some(*next))
            }
            Terminator::Branch { taken, not_taken } => {
                self.emit_if(pc, *taken, *not_taken, stops, out)
            }
            Terminator::Switch { targets } => self.emit_switch(pc, targets, stops, out),
            Terminator::Return | Terminator::Throw | Terminator::End => Ok(None),
            Terminator::Subroutine { .. } | Terminator::Ret => {
                Err(StructureFailure::Subroutine)
            }
        }
    }

    /// The taken arm holds the else branch: compilers jump when the source
    /// condition is false.
    fn emit_if(
        &mut self,
        at: ProgramCounter,
        taken: ProgramCounter,
        not_taken: ProgramCounter,
        stops: &[ProgramCounter],
        out: &mut Vec<StructuredStmt>,
    ) -> Result<Option<ProgramCounter>, StructureFailure> {
        let taken_condition = self.condition_of(at);
        let merge = self.reconvergence(&[taken, not_taken], at);

        let then_body = self.emit_arm(not_taken, merge, stops)?;
        let else_body = self.emit_arm(taken, merge, stops)?;

        let (condition, then_body, else_body) = if then_body.is_empty() && !else_body.is_empty() {
            (taken_condition, else_body, Vec::new())
        } else {
            (negate_condition(taken_condition), then_body, else_body)
        };
        if !(then_body.is_empty() && else_body.is_empty()) {
            out.push(StructuredStmt::If {
                condition,
                then_body,
                else_body,
            });
        }
        Ok(merge)
    }

    fn emit_arm(
        &mut self,
        start: ProgramCounter,
        merge: Option<ProgramCounter>,
        stops: &[ProgramCounter],
    ) -> Result<Vec<StructuredStmt>, StructureFailure> {
        if Some(start) == merge {
            return Ok(Vec::new());
        }
        let mut arm_stops: Vec<ProgramCounter> = stops.to_vec();
        arm_stops.extend(merge);
        self.emit_region(Some(start), &arm_stops, false)
    }

    fn emit_switch(
        &mut self,
        at: ProgramCounter,
        targets: &[(Option<i32>, ProgramCounter)],
        stops: &[ProgramCounter],
        out: &mut Vec<StructuredStmt>,
    ) -> Result<Option<ProgramCounter>, StructureFailure> {
        let selector = self
            .simulated
            .get(&at)
            .and_then(|simulated| simulated.selector.clone())
            .unwrap_or_else(|| Expr::Opaque("<selector>".to_string()));

        // keys grouped by shared target, in encounter order
        let mut arm_keys: Vec<(ProgramCounter, Vec<i32>)> = Vec::new();
        let mut default_target = None;
        for (key, target) in targets {
            match key {
                None => default_target = Some(*target),
                Some(key) => match arm_keys.iter_mut().find(|(pc, _)| pc == target) {
                    Some((_, keys)) => keys.push(*key),
                    None => arm_keys.push((*target, vec![*key])),
                },
            }
        }

        let mut all_starts: Vec<ProgramCounter> =
            arm_keys.iter().map(|(target, _)| *target).collect();
        all_starts.extend(default_target);
        let merge = self.reconvergence(&all_starts, at);

        let mut cases = Vec::with_capacity(arm_keys.len());
        for (target, keys) in &arm_keys {
            let body = self.emit_case(*target, merge, &all_starts, stops)?;
            cases.push(SwitchCase {
                keys: keys.clone(),
                body,
            });
        }
        let default = match default_target {
            Some(target) if Some(target) != merge => {
                Some(self.emit_case(target, merge, &all_starts, stops)?)
            }
            _ => None,
        };

        out.push(StructuredStmt::Switch {
            selector,
            cases,
            default,
        });
        Ok(merge)
    }

    fn emit_case(
        &mut self,
        start: ProgramCounter,
        merge: Option<ProgramCounter>,
        all_starts: &[ProgramCounter],
        stops: &[ProgramCounter],
    ) -> Result<Vec<StructuredStmt>, StructureFailure> {
        if Some(start) == merge {
            return Ok(Vec::new());
        }
        let mut case_stops: Vec<ProgramCounter> = stops.to_vec();
        case_stops.extend(merge);
        // reaching a sibling entry is fall-through, which the case form
        // cannot express; an entry that doubles as the merge stays a stop
        let siblings: BTreeSet<ProgramCounter> = all_starts
            .iter()
            .filter(|pc| **pc != start && Some(**pc) != merge)
            .copied()
            .collect();
        self.case_bounds.push(siblings);
        let body = self.emit_region(Some(start), &case_stops, false);
        self.case_bounds.pop();
        body
    }

    fn emit_loop(
        &mut self,
        header: ProgramCounter,
        out: &mut Vec<StructuredStmt>,
    ) -> Result<Option<ProgramCounter>, StructureFailure> {
        let members = self.natural_loop(header);
        let header_block = self
            .graph
            .blocks
            .get(&header)
            .ok_or(StructureFailure::MissingBlock)?;
        let header_simulated = self
            .simulated
            .get(&header)
            .ok_or(StructureFailure::MissingBlock)?;

        // the while-with-condition shape: an empty header that only tests
        let conditional = match &header_block.terminator {
            Terminator::Branch { taken, not_taken } if header_simulated.statements.is_empty() => {
                match (members.contains(taken), members.contains(not_taken)) {
                    (true, false) => Some((self.condition_of(header), *taken, *not_taken)),
                    (false, true) => {
                        Some((negate_condition(self.condition_of(header)), *not_taken, *taken))
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        let (condition, body_start, exit) = match conditional {
            Some((condition, body_start, exit)) => {
                (Some(condition), Some(body_start), Some(exit))
            }
            None => {
                let exit = self.loop_exit(&members);
                (None, Some(header), exit)
            }
        };

        self.loop_stack.push(LoopContext {
            header,
            exit,
            case_depth: self.case_bounds.len(),
        });
        let entering_at_header = body_start == Some(header);
        let body = self.emit_region(body_start, &[header], entering_at_header);
        self.loop_stack.pop();
        let mut body = body?;
        // the jump back to the test is implicit
        if body.last() == Some(&StructuredStmt::Continue) {
            body.pop();
        }

        out.push(StructuredStmt::While { condition, body });
        Ok(exit)
    }

    fn condition_of(&self, pc: ProgramCounter) -> Expr {
        self.simulated
            .get(&pc)
            .and_then(|simulated| simulated.condition.clone())
            .unwrap_or_else(|| Expr::Opaque("<condition>".to_string()))
    }

    fn is_loop_header(&self, pc: ProgramCounter) -> bool {
        let Some(index) = self.rpo_index.get(&pc) else {
            return false;
        };
        self.predecessors
            .get(&pc)
            .map(|predecessors| {
                predecessors
                    .iter()
                    .any(|predecessor| self.rpo_index.get(predecessor) >= Some(index))
            })
            .unwrap_or(false)
    }

    fn in_loop_of(&self, header: ProgramCounter) -> bool {
        self.loop_stack.iter().any(|context| context.header == header)
    }

    /// The blocks of the natural loop of `header`: everything that reaches
    /// a back edge without passing through the header.
    fn natural_loop(&self, header: ProgramCounter) -> BTreeSet<ProgramCounter> {
        let header_index = self.rpo_index.get(&header);
        let mut members = BTreeSet::from([header]);
        let mut worklist: Vec<ProgramCounter> = self
            .predecessors
            .get(&header)
            .map(|predecessors| {
                predecessors
                    .iter()
                    .filter(|tail| self.rpo_index.get(tail) >= header_index)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        while let Some(pc) = worklist.pop() {
            if !members.insert(pc) {
                continue;
            }
            if let Some(predecessors) = self.predecessors.get(&pc) {
                worklist.extend(predecessors.iter().copied());
            }
        }
        members
    }

    /// The earliest block outside the loop that a member branches to.
    fn loop_exit(&self, members: &BTreeSet<ProgramCounter>) -> Option<ProgramCounter> {
        members
            .iter()
            .filter_map(|pc| self.graph.blocks.get(pc))
            .flat_map(|block| block.terminator.successors())
            .filter(|successor| !members.contains(successor))
            .min_by_key(|successor| self.rpo_index.get(successor).copied())
    }

    /// The first block, in reverse postorder, that every start can reach
    /// without going back before the branch itself.
    fn reconvergence(
        &self,
        starts: &[ProgramCounter],
        branch: ProgramCounter,
    ) -> Option<ProgramCounter> {
        let after = self.rpo_index.get(&branch)?;
        let mut common: Option<HashSet<ProgramCounter>> = None;
        for start in starts {
            let reachable = self.reachable_from(*start);
            common = Some(match common {
                None => reachable,
                Some(common) => common.intersection(&reachable).copied().collect(),
            });
        }
        common?
            .into_iter()
            .filter(|pc| self.rpo_index.get(pc).map_or(false, |index| index > after))
            .min_by_key(|pc| self.rpo_index.get(pc).copied())
    }

    fn reachable_from(&self, start: ProgramCounter) -> HashSet<ProgramCounter> {
        let mut reachable = HashSet::new();
        let mut worklist = vec![start];
        while let Some(pc) = worklist.pop() {
            if !reachable.insert(pc) {
                continue;
            }
            if let Some(block) = self.graph.blocks.get(&pc) {
                worklist.extend(block.terminator.successors());
            }
        }
        reachable
    }
}

fn negate_condition(condition: Expr) -> Expr {
    match condition {
        Expr::Comparison { op, left, right } => Expr::Comparison {
            op: op.negated(),
            left,
            right,
        },
        other => Expr::Comparison {
            op: ComparisonOp::Eq,
            left: Box::new(other),
            right: Box::new(Expr::Literal(LoadedConstant::Integer(0))),
        },
    }
}

/// The labeled rendering of blocks: the whole graph for the fallback mode,
/// or only the handler regions as an appendix to a structured body. Dead
/// blocks appear in both modes as annotated listings, never as statements.
fn labeled_blocks(
    graph: &ControlFlowGraph,
    simulated: &BTreeMap<ProgramCounter, SimulatedBlock>,
    dumps: &BTreeMap<ProgramCounter, BlockDump>,
    handlers_only: bool,
) -> Vec<LabeledBlock> {
    let from_entry = if handlers_only {
        let mut reachable = HashSet::new();
        let mut worklist = vec![graph.entry];
        while let Some(pc) = worklist.pop() {
            if !reachable.insert(pc) {
                continue;
            }
            if let Some(block) = graph.blocks.get(&pc) {
                worklist.extend(block.terminator.successors());
            }
        }
        reachable
    } else {
        HashSet::new()
    };

    let included: Vec<ProgramCounter> = graph
        .blocks
        .iter()
        .filter(|(pc, block)| block.dead || !from_entry.contains(pc))
        .map(|(pc, _)| *pc)
        .collect();

    let mut blocks = Vec::with_capacity(included.len());
    for (position, pc) in included.iter().enumerate() {
        let Some(block) = graph.blocks.get(pc) else {
            continue;
        };
        if block.dead {
            blocks.push(LabeledBlock {
                label: *pc,
                handler: graph.handlers.get(pc).cloned(),
                statements: Vec::new(),
                transfers: Vec::new(),
                dump: Some(BlockDump {
                    reason: "unreachable code".to_string(),
                    lines: block
                        .instructions
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                }),
            });
            continue;
        }
        let statements = simulated
            .get(pc)
            .map(|simulated| simulated.statements.clone())
            .unwrap_or_default();
        let condition = |fallback: &str| {
            simulated
                .get(pc)
                .and_then(|simulated| simulated.condition.clone())
                .unwrap_or_else(|| Expr::Opaque(fallback.to_string()))
        };
        let next_label = included.get(position + 1).copied();

        let mut transfers = Vec::new();
        match &block.terminator {
            Terminator::FallThrough { next } | Terminator::Jump { target: next } => {
                if Some(*next) != next_label {
                    transfers.push(Transfer::Goto(*next));
                }
            }
            Terminator::Branch { taken, not_taken } => {
                transfers.push(Transfer::ConditionalGoto {
                    condition: condition("<condition>"),
                    target: *taken,
                });
                if Some(*not_taken) != next_label {
                    transfers.push(Transfer::Goto(*not_taken));
                }
            }
            Terminator::Switch { targets } => {
                let selector = simulated
                    .get(pc)
                    .and_then(|simulated| simulated.selector.clone())
                    .unwrap_or_else(|| Expr::Opaque("<selector>".to_string()));
                transfers.push(Transfer::SwitchGoto {
                    selector,
                    targets: targets.clone(),
                });
            }
            Terminator::Subroutine { target, resume } => {
                transfers.push(Transfer::SubroutineCall {
                    target: *target,
                    resume: *resume,
                });
            }
            Terminator::Ret => transfers.push(Transfer::SubroutineReturn),
            Terminator::Return | Terminator::Throw | Terminator::End => {}
        }

        blocks.push(LabeledBlock {
            label: *pc,
            handler: graph.handlers.get(pc).cloned(),
            statements,
            transfers,
            dump: dumps.get(pc).cloned(),
        });
    }
    blocks
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use decaf_reader::{
        constant_pool::ConstantPool,
        exception_table::ExceptionTable,
        instruction::{decode_code, LoadedConstant},
        method_descriptor::MethodDescriptor,
        program_counter::ProgramCounter,
    };

    use crate::{
        control_flow::ControlFlowGraph,
        expression::{ComparisonOp, Expr, Stmt},
        stack_simulation::{simulate_block, MethodContext, SimulatedBlock},
        structuring::{structure_method, MethodBody, StructuredStmt},
    };

    fn body_of(code: &[u8], descriptor: &str) -> MethodBody {
        let pool = ConstantPool::new();
        let instructions = decode_code(code, &pool);
        let graph = ControlFlowGraph::build(&instructions, &ExceptionTable::default()).unwrap();
        let descriptor = MethodDescriptor::parse(descriptor).unwrap();
        let mut context = MethodContext::new("sample/Owner", &descriptor, true);

        let mut entry_stacks: BTreeMap<ProgramCounter, Vec<Expr>> = BTreeMap::new();
        entry_stacks.insert(graph.entry, Vec::new());
        let mut simulated: BTreeMap<ProgramCounter, SimulatedBlock> = BTreeMap::new();
        for pc in graph.reverse_postorder() {
            let block = &graph.blocks[&pc];
            let entry = entry_stacks.get(&pc).cloned().unwrap_or_default();
            let outcome = simulate_block(block, entry, &mut context).unwrap();
            for successor in block.terminator.successors() {
                entry_stacks
                    .entry(successor)
                    .or_insert_with(|| outcome.exit_stack.clone());
            }
            simulated.insert(pc, outcome);
        }
        structure_method(&graph, &simulated, &BTreeMap::new())
    }

    fn statements_of(body: MethodBody) -> Vec<StructuredStmt> {
        match body {
            MethodBody::Structured { statements, .. } => statements,
            other => panic!("expected a structured body, got {other:?}"),
        }
    }

    #[test]
    fn a_reconverging_branch_becomes_if_else() {
        // if (var0 != 0) { var1 = 1; } else { var1 = 0; } return var1;
        //  0: iload_0   1: ifeq 9
        //  4: iconst_1  5: istore_1  6: goto 11
        //  9: iconst_0 10: istore_1
        // 11: iload_1  12: ireturn
        let code = [
            0x1a, 0x99, 0x00, 0x08, 0x04, 0x3c, 0xa7, 0x00, 0x05, 0x03, 0x3c, 0x1b, 0xac,
        ];
        let statements = statements_of(body_of(&code, "(I)I"));

        assert_eq!(2, statements.len());
        match &statements[0] {
            StructuredStmt::If {
                condition,
                then_body,
                else_body,
            } => {
                assert_eq!(
                    &Expr::Comparison {
                        op: ComparisonOp::Ne,
                        left: Box::new(Expr::Local {
                            index: 0,
                            name: "var0".to_string(),
                        }),
                        right: Box::new(Expr::Literal(LoadedConstant::Integer(0))),
                    },
                    condition
                );
                assert!(matches!(
                    then_body[..],
                    [StructuredStmt::Plain(Stmt::LocalStore { index: 1, .. })]
                ));
                assert!(matches!(
                    else_body[..],
                    [StructuredStmt::Plain(Stmt::LocalStore { index: 1, .. })]
                ));
            }
            other => panic!("expected an if, got {other:?}"),
        }
        assert!(matches!(
            statements[1],
            StructuredStmt::Plain(Stmt::Return(Some(_)))
        ));
    }

    #[test]
    fn a_counting_loop_becomes_while() {
        // var1 = 0; while (var1 < var0) var1 = var1 + 1; return var1
        //  0: iconst_0   1: istore_1
        //  2: iload_1    3: iload_0    4: if_icmpge 14
        //  7: iload_1    8: iconst_1   9: iadd   10: istore_1   11: goto 2
        // 14: iload_1   15: ireturn
        let code = [
            0x03, 0x3c, 0x1b, 0x1a, 0xa2, 0x00, 0x0a, 0x1b, 0x04, 0x60, 0x3c, 0xa7, 0xff, 0xf7,
            0x1b, 0xac,
        ];
        let statements = statements_of(body_of(&code, "(I)I"));

        assert_eq!(3, statements.len());
        match &statements[1] {
            StructuredStmt::While {
                condition: Some(Expr::Comparison { op, .. }),
                body,
            } => {
                assert_eq!(ComparisonOp::Lt, *op);
                assert_eq!(1, body.len());
            }
            other => panic!("expected a conditional while, got {other:?}"),
        }
        assert!(matches!(
            statements[2],
            StructuredStmt::Plain(Stmt::Return(Some(_)))
        ));
    }

    #[test]
    fn subroutines_fall_back_to_labels() {
        // 0: jsr 4, 3: return, 4: astore_1, 5: ret 1
        let code = [0xa8, 0x00, 0x04, 0xb1, 0x4c, 0xa9, 0x01];
        let body = body_of(&code, "()V");
        assert!(matches!(body, MethodBody::Labeled(_)));
    }

    #[test]
    fn a_lookup_switch_groups_its_keys() {
        // switch (var0) { case 1, 2 -> return 7; default -> return 9; }
        //  0: iload_0
        //  1: lookupswitch default 32, 1 -> 28, 2 -> 28, 27 bytes long
        // 28: bipush 7, 30: ireturn
        // 32: bipush 9, 34: ireturn
        let mut code = vec![0x1a, 0xab, 0x00, 0x00];
        code.extend(31i32.to_be_bytes()); // default at 32
        code.extend(2i32.to_be_bytes()); // npairs
        code.extend(1i32.to_be_bytes());
        code.extend(27i32.to_be_bytes()); // 1 -> 28
        code.extend(2i32.to_be_bytes());
        code.extend(27i32.to_be_bytes()); // 2 -> 28
        code.extend([0x10, 0x07, 0xac, 0x00, 0x10, 0x09, 0xac]);
        let statements = statements_of(body_of(&code, "(I)I"));

        assert_eq!(1, statements.len());
        match &statements[0] {
            StructuredStmt::Switch {
                cases, default, ..
            } => {
                assert_eq!(1, cases.len());
                assert_eq!(vec![1, 2], cases[0].keys);
                assert!(matches!(
                    cases[0].body[..],
                    [StructuredStmt::Plain(Stmt::Return(Some(_)))]
                ));
                assert!(default.is_some());
            }
            other => panic!("expected a switch, got {other:?}"),
        }
    }

    #[test]
    fn case_fall_through_falls_back_to_labels() {
        // case 0 stores and falls into case 1, which a case body cannot say
        //  0: iload_0
        //  1: tableswitch default 28, 0 -> 24, 1 -> 26
        // 24: iconst_2, istore_1
        // 26: iconst_3, istore_1
        // 28: iload_1, ireturn
        let mut code = vec![0x1a, 0xaa, 0x00, 0x00];
        code.extend(27i32.to_be_bytes()); // default at 28
        code.extend(0i32.to_be_bytes()); // low
        code.extend(1i32.to_be_bytes()); // high
        code.extend(23i32.to_be_bytes()); // 0 -> 24
        code.extend(25i32.to_be_bytes()); // 1 -> 26
        code.extend([0x05, 0x3c, 0x06, 0x3c, 0x1b, 0xac]);
        let body = body_of(&code, "(I)I");
        assert!(matches!(body, MethodBody::Labeled(_)));
    }

    #[test]
    fn a_loop_break_inside_a_case_falls_back_to_labels() {
        // an endless loop whose keyed cases leave it; a break written under
        // a case label would bind to the switch
        //  0: iload_0
        //  1: lookupswitch default 38, 0 -> 28, 1 -> 33
        // 28: iconst_1, istore_1, goto 41
        // 33: iconst_2, istore_1, goto 43
        // 38: goto 0
        // 41: iload_1, ireturn
        // 43: iconst_5, ireturn
        let mut code = vec![0x1a, 0xab, 0x00, 0x00];
        code.extend(37i32.to_be_bytes()); // default at 38
        code.extend(2i32.to_be_bytes()); // npairs
        code.extend(0i32.to_be_bytes());
        code.extend(27i32.to_be_bytes()); // 0 -> 28
        code.extend(1i32.to_be_bytes());
        code.extend(32i32.to_be_bytes()); // 1 -> 33
        code.extend([0x04, 0x3c, 0xa7, 0x00, 0x0b]);
        code.extend([0x05, 0x3c, 0xa7, 0x00, 0x08]);
        code.extend([0xa7, 0xff, 0xda]);
        code.extend([0x1b, 0xac, 0x08, 0xac]);
        let body = body_of(&code, "(I)I");
        assert!(matches!(body, MethodBody::Labeled(_)));
    }
}
