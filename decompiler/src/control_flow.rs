use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::debug;

use decaf_reader::{
    exception_table::ExceptionTable,
    instruction::{Instruction, Operand},
    opcodes::OpCode,
    program_counter::ProgramCounter,
};

/// How control leaves a basic block. Every target stored here is the start
/// address of another block in the same graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    FallThrough {
        next: ProgramCounter,
    },
    Jump {
        target: ProgramCounter,
    },
    Branch {
        taken: ProgramCounter,
        not_taken: ProgramCounter,
    },
    /// Case targets in encounter order, the default last with a `None` key
    Switch {
        targets: Vec<(Option<i32>, ProgramCounter)>,
    },
    Return,
    Throw,
    Subroutine {
        target: ProgramCounter,
        resume: ProgramCounter,
    },
    Ret,
    /// Execution runs off the end of the code array
    End,
}

impl Terminator {
    pub fn successors(&self) -> Vec<ProgramCounter> {
        match self {
            Terminator::FallThrough { next } => vec![*next],
            Terminator::Jump { target } => vec![*target],
            Terminator::Branch { taken, not_taken } => vec![*taken, *not_taken],
            Terminator::Switch { targets } => targets.iter().map(|(_, pc)| *pc).collect(),
            Terminator::Subroutine { target, resume } => vec![*target, *resume],
            Terminator::Return | Terminator::Throw | Terminator::Ret | Terminator::End => {
                Vec::new()
            }
        }
    }
}

/// A maximal straight-line run of instructions. The terminating instruction
/// stays in `instructions` so that later passes can consume its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub start: ProgramCounter,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
    /// Not reachable from the entry, by control or handler edges
    pub dead: bool,
}

/// The control flow graph of one method body.
#[derive(Debug)]
pub struct ControlFlowGraph {
    pub blocks: BTreeMap<ProgramCounter, BasicBlock>,
    pub entry: ProgramCounter,
    /// Edges from a covered block to the handlers that may take over from it
    pub handler_edges: BTreeMap<ProgramCounter, BTreeSet<ProgramCounter>>,
    /// Handler entry points, each with the class it catches (`None` is a
    /// catch-all; the first table entry wins when handlers are shared)
    pub handlers: BTreeMap<ProgramCounter, Option<String>>,
}

impl ControlFlowGraph {
    /// Partitions a decoded method body into basic blocks. `None` means the
    /// code array was empty and there is nothing to build a graph from.
    pub fn build(
        instructions: &[Instruction],
        exception_table: &ExceptionTable,
    ) -> Option<ControlFlowGraph> {
        let entry = instructions.first()?.address();
        let starts: BTreeSet<ProgramCounter> =
            instructions.iter().map(|i| i.address()).collect();

        let mut leaders = BTreeSet::new();
        leaders.insert(entry);
        for (index, instruction) in instructions.iter().enumerate() {
            let Instruction::Known {
                address,
                op_code,
                operand,
            } = instruction
            else {
                continue;
            };
            for target in branch_targets(*address, operand) {
                match target.filter(|t| starts.contains(t)) {
                    Some(target) => {
                        leaders.insert(target);
                    }
                    None => debug!("branch at {address} targets no instruction, edge dropped"),
                }
            }
            if ends_block(*op_code) {
                if let Some(follower) = instructions.get(index + 1) {
                    leaders.insert(follower.address());
                }
            }
        }
        for entry in exception_table.entries() {
            for boundary in [entry.range.start, entry.range.end, entry.handler_pc] {
                if starts.contains(&boundary) {
                    leaders.insert(boundary);
                }
            }
        }

        let mut blocks = BTreeMap::new();
        let mut current: Vec<Instruction> = Vec::new();
        for (index, instruction) in instructions.iter().enumerate() {
            current.push(instruction.clone());
            let next_start = instructions.get(index + 1).map(Instruction::address);
            let block_ends = match next_start {
                Some(address) => leaders.contains(&address),
                None => true,
            };
            if block_ends {
                let terminator = classify(instruction, next_start, &starts);
                let start = current[0].address();
                blocks.insert(
                    start,
                    BasicBlock {
                        start,
                        instructions: std::mem::take(&mut current),
                        terminator,
                        dead: false,
                    },
                );
            }
        }

        let mut handler_edges: BTreeMap<ProgramCounter, BTreeSet<ProgramCounter>> =
            BTreeMap::new();
        let mut handlers = BTreeMap::new();
        for entry in exception_table.entries() {
            if entry.range.start > entry.range.end || !blocks.contains_key(&entry.handler_pc) {
                debug!(
                    "exception handler at {} has no usable range or target, entry dropped",
                    entry.handler_pc
                );
                continue;
            }
            handlers
                .entry(entry.handler_pc)
                .or_insert_with(|| entry.catch_class.clone());
            for (start, _) in blocks.range(entry.range.clone()) {
                handler_edges
                    .entry(*start)
                    .or_default()
                    .insert(entry.handler_pc);
            }
        }

        let mut graph = ControlFlowGraph {
            blocks,
            entry,
            handler_edges,
            handlers,
        };
        graph.mark_dead_blocks();
        Some(graph)
    }

    fn mark_dead_blocks(&mut self) {
        let mut reachable = HashSet::new();
        let mut worklist = vec![self.entry];
        while let Some(pc) = worklist.pop() {
            if !reachable.insert(pc) {
                continue;
            }
            if let Some(block) = self.blocks.get(&pc) {
                worklist.extend(block.terminator.successors());
            }
            if let Some(handlers) = self.handler_edges.get(&pc) {
                worklist.extend(handlers.iter().copied());
            }
        }
        for (pc, block) in self.blocks.iter_mut() {
            block.dead = !reachable.contains(pc);
        }
    }

    /// Blocks in reverse postorder over control edges. Handler regions are
    /// not control-reachable from the entry, so they follow as separate
    /// components in address order. Dead blocks are left out.
    pub fn reverse_postorder(&self) -> Vec<ProgramCounter> {
        let mut postorder = Vec::new();
        let mut visited = HashSet::new();
        self.postorder_from(self.entry, &mut visited, &mut postorder);
        let mut order: Vec<ProgramCounter> = postorder.into_iter().rev().collect();

        for (pc, block) in &self.blocks {
            if block.dead || visited.contains(pc) {
                continue;
            }
            let mut component = Vec::new();
            self.postorder_from(*pc, &mut visited, &mut component);
            order.extend(component.into_iter().rev());
        }
        order
    }

    fn postorder_from(
        &self,
        start: ProgramCounter,
        visited: &mut HashSet<ProgramCounter>,
        postorder: &mut Vec<ProgramCounter>,
    ) {
        if visited.contains(&start) {
            return;
        }
        // iterative depth-first walk, (block, next successor to visit)
        let mut stack = vec![(start, 0usize)];
        visited.insert(start);
        while let Some((pc, cursor)) = stack.pop() {
            let successors = match self.blocks.get(&pc) {
                Some(block) => block.terminator.successors(),
                None => Vec::new(),
            };
            match successors.get(cursor) {
                Some(successor) => {
                    stack.push((pc, cursor + 1));
                    if visited.insert(*successor) {
                        stack.push((*successor, 0));
                    }
                }
                None => postorder.push(pc),
            }
        }
    }

    /// Control-edge predecessors of every live block.
    pub fn predecessors(&self) -> BTreeMap<ProgramCounter, BTreeSet<ProgramCounter>> {
        let mut predecessors: BTreeMap<ProgramCounter, BTreeSet<ProgramCounter>> =
            BTreeMap::new();
        for (start, block) in &self.blocks {
            if block.dead {
                continue;
            }
            for successor in block.terminator.successors() {
                predecessors.entry(successor).or_default().insert(*start);
            }
        }
        predecessors
    }
}

fn ends_block(op_code: OpCode) -> bool {
    use OpCode::*;
    matches!(
        op_code,
        Goto | Goto_w | Jsr | Jsr_w | Ret | Tableswitch | Lookupswitch | Athrow
    ) || op_code.is_conditional_branch()
        || op_code.is_return()
}

/// Raw jump targets of one instruction, before validation. `None` entries
/// are offsets that leave the addressable range.
fn branch_targets(address: ProgramCounter, operand: &Operand) -> Vec<Option<ProgramCounter>> {
    match operand {
        Operand::BranchOffset(offset) => vec![address.offset_by(*offset)],
        Operand::TableSwitch {
            default_offset,
            jump_offsets,
            ..
        } => {
            let mut targets = vec![address.offset_by(*default_offset)];
            targets.extend(jump_offsets.iter().map(|o| address.offset_by(*o)));
            targets
        }
        Operand::LookupSwitch {
            default_offset,
            pairs,
        } => {
            let mut targets = vec![address.offset_by(*default_offset)];
            targets.extend(pairs.iter().map(|(_, o)| address.offset_by(*o)));
            targets
        }
        _ => Vec::new(),
    }
}

fn classify(
    instruction: &Instruction,
    next: Option<ProgramCounter>,
    starts: &BTreeSet<ProgramCounter>,
) -> Terminator {
    let fall_through = |next: Option<ProgramCounter>| match next {
        Some(next) => Terminator::FallThrough { next },
        None => Terminator::End,
    };
    let Instruction::Known {
        address,
        op_code,
        operand,
    } = instruction
    else {
        return fall_through(next);
    };
    let resolve = |offset: i32| address.offset_by(offset).filter(|t| starts.contains(t));

    use OpCode::*;
    match (op_code, operand) {
        (Goto | Goto_w, Operand::BranchOffset(offset)) => match resolve(*offset) {
            Some(target) => Terminator::Jump { target },
            None => Terminator::End,
        },
        (Jsr | Jsr_w, Operand::BranchOffset(offset)) => match (resolve(*offset), next) {
            (Some(target), Some(resume)) => Terminator::Subroutine { target, resume },
            (Some(target), None) => Terminator::Jump { target },
            (None, next) => fall_through(next),
        },
        (Ret, _) => Terminator::Ret,
        (Athrow, _) => Terminator::Throw,
        (
            Tableswitch,
            Operand::TableSwitch {
                default_offset,
                low,
                jump_offsets,
            },
        ) => {
            let mut targets = Vec::new();
            for (n, offset) in jump_offsets.iter().enumerate() {
                if let Some(target) = resolve(*offset) {
                    targets.push((Some(low + n as i32), target));
                }
            }
            if let Some(target) = resolve(*default_offset) {
                targets.push((None, target));
            }
            Terminator::Switch { targets }
        }
        (
            Lookupswitch,
            Operand::LookupSwitch {
                default_offset,
                pairs,
            },
        ) => {
            let mut targets = Vec::new();
            for (key, offset) in pairs {
                if let Some(target) = resolve(*offset) {
                    targets.push((Some(*key), target));
                }
            }
            if let Some(target) = resolve(*default_offset) {
                targets.push((None, target));
            }
            Terminator::Switch { targets }
        }
        (op, Operand::BranchOffset(offset)) if op.is_conditional_branch() => {
            match (resolve(*offset), next) {
                (Some(taken), Some(not_taken)) => Terminator::Branch { taken, not_taken },
                (Some(target), None) => Terminator::Jump { target },
                (None, next) => fall_through(next),
            }
        }
        (op, _) if op.is_return() => Terminator::Return,
        _ => fall_through(next),
    }
}

#[cfg(test)]
mod tests {
    use decaf_reader::{
        constant_pool::ConstantPool,
        exception_table::{ExceptionTable, ExceptionTableEntry},
        instruction::{decode_code, Instruction},
        program_counter::ProgramCounter,
    };

    use super::{ControlFlowGraph, Terminator};

    fn graph_of(code: &[u8], exception_table: &ExceptionTable) -> ControlFlowGraph {
        let pool = ConstantPool::new();
        let instructions = decode_code(code, &pool);
        ControlFlowGraph::build(&instructions, exception_table)
            .expect("graph should build from non empty code")
    }

    #[test]
    fn straight_line_code_is_one_block() {
        // iconst_5, ireturn
        let graph = graph_of(&[0x08, 0xac], &ExceptionTable::default());
        assert_eq!(1, graph.blocks.len());
        let block = &graph.blocks[&ProgramCounter(0)];
        assert_eq!(2, block.instructions.len());
        assert_eq!(Terminator::Return, block.terminator);
        assert!(!block.dead);
    }

    #[test]
    fn empty_code_has_no_graph() {
        let instructions: Vec<Instruction> = Vec::new();
        assert!(ControlFlowGraph::build(&instructions, &ExceptionTable::default()).is_none());
    }

    #[test]
    fn conditional_branches_split_blocks() {
        // 0: iload_0, 1: ifeq 8, 4: iconst_1, 5: goto 9, 8: iconst_0, 9: ireturn
        let code = [0x1a, 0x99, 0x00, 0x07, 0x04, 0xa7, 0x00, 0x04, 0x03, 0xac];
        let graph = graph_of(&code, &ExceptionTable::default());

        let starts: Vec<u16> = graph.blocks.keys().map(|pc| pc.0).collect();
        assert_eq!(vec![0, 4, 8, 9], starts);
        assert_eq!(
            Terminator::Branch {
                taken: ProgramCounter(8),
                not_taken: ProgramCounter(4),
            },
            graph.blocks[&ProgramCounter(0)].terminator
        );
        assert_eq!(
            Terminator::Jump {
                target: ProgramCounter(9)
            },
            graph.blocks[&ProgramCounter(4)].terminator
        );
    }

    #[test]
    fn reverse_postorder_walks_the_fall_through_arm_first() {
        let code = [0x1a, 0x99, 0x00, 0x07, 0x04, 0xa7, 0x00, 0x04, 0x03, 0xac];
        let graph = graph_of(&code, &ExceptionTable::default());
        let order: Vec<u16> = graph.reverse_postorder().iter().map(|pc| pc.0).collect();
        assert_eq!(vec![0, 4, 8, 9], order);
    }

    #[test]
    fn merge_points_know_their_predecessors() {
        let code = [0x1a, 0x99, 0x00, 0x07, 0x04, 0xa7, 0x00, 0x04, 0x03, 0xac];
        let graph = graph_of(&code, &ExceptionTable::default());
        let predecessors = graph.predecessors();
        let of_merge: Vec<u16> = predecessors[&ProgramCounter(9)]
            .iter()
            .map(|pc| pc.0)
            .collect();
        assert_eq!(vec![4, 8], of_merge);
    }

    #[test]
    fn every_instruction_lands_in_exactly_one_block() {
        let code = [0x1a, 0x99, 0x00, 0x07, 0x04, 0xa7, 0x00, 0x04, 0x03, 0xac];
        let pool = ConstantPool::new();
        let instructions = decode_code(&code, &pool);
        let graph = ControlFlowGraph::build(&instructions, &ExceptionTable::default())
            .expect("graph should build from non empty code");

        assert_eq!(ProgramCounter(0), graph.entry);
        assert!(graph.blocks.contains_key(&graph.entry));

        let mut covered: Vec<ProgramCounter> = graph
            .blocks
            .values()
            .flat_map(|block| block.instructions.iter().map(Instruction::address))
            .collect();
        covered.sort();
        let decoded: Vec<ProgramCounter> =
            instructions.iter().map(Instruction::address).collect();
        assert_eq!(decoded, covered);
    }

    #[test]
    fn code_after_a_return_is_dead() {
        // 0: return, 1: nop, 2: return
        let graph = graph_of(&[0xb1, 0x00, 0xb1], &ExceptionTable::default());
        assert!(!graph.blocks[&ProgramCounter(0)].dead);
        assert!(graph.blocks[&ProgramCounter(1)].dead);
    }

    #[test]
    fn branches_into_the_middle_of_an_instruction_are_dropped() {
        // 0: goto 2 lands inside the goto itself
        let graph = graph_of(&[0xa7, 0x00, 0x02, 0xb1], &ExceptionTable::default());
        assert_eq!(Terminator::End, graph.blocks[&ProgramCounter(0)].terminator);
    }

    #[test]
    fn handlers_are_reachable_through_their_covered_range() {
        // 0: iconst_0, 1: ireturn / handler 2: athrow
        let code = [0x03, 0xac, 0xbf];
        let table = ExceptionTable::new(vec![ExceptionTableEntry {
            range: ProgramCounter(0)..ProgramCounter(2),
            handler_pc: ProgramCounter(2),
            catch_class: None,
        }]);
        let graph = graph_of(&code, &table);

        assert!(!graph.blocks[&ProgramCounter(2)].dead);
        assert_eq!(
            Some(&None),
            graph.handlers.get(&ProgramCounter(2)),
            "catch-all handlers keep a None class"
        );
        let from_entry = &graph.handler_edges[&ProgramCounter(0)];
        assert!(from_entry.contains(&ProgramCounter(2)));
        let order: Vec<u16> = graph.reverse_postorder().iter().map(|pc| pc.0).collect();
        assert_eq!(vec![0, 2], order, "handler components follow the main walk");
    }

    #[test]
    fn switch_targets_carry_their_keys() {
        // 0: iload_0, 1: lookupswitch default 20 { 5 -> 22 }, 20: return,
        // 21: nop, 22: return
        let mut code = vec![0x1a, 0xab];
        code.extend([0x00, 0x00]); // padding to a 4 byte boundary
        code.extend(19i32.to_be_bytes()); // default, relative to pc 1
        code.extend(1i32.to_be_bytes()); // npairs
        code.extend(5i32.to_be_bytes());
        code.extend(21i32.to_be_bytes());
        code.extend([0xb1, 0x00, 0xb1]);
        let graph = graph_of(&code, &ExceptionTable::default());

        match &graph.blocks[&ProgramCounter(0)].terminator {
            Terminator::Switch { targets } => {
                assert_eq!(
                    &vec![(Some(5), ProgramCounter(22)), (None, ProgramCounter(20))],
                    targets
                );
            }
            other => panic!("expected a switch terminator, got {other:?}"),
        }
        assert!(graph.blocks[&ProgramCounter(21)].dead);
    }
}
