use std::collections::{btree_map::Entry, BTreeMap};

use log::debug;

use decaf_reader::{
    class_file_method::ClassFileMethod, exception_table::ExceptionTable, field_type::FieldType,
    instruction::Instruction, program_counter::ProgramCounter,
};

use crate::{
    control_flow::ControlFlowGraph,
    expression::Expr,
    stack_simulation::{simulate_block, MethodContext, SimulatedBlock},
    structuring::{structure_method, BlockDump, MethodBody},
};

/// Everything the renderer needs for one method body.
#[derive(Debug)]
pub struct MethodArtifacts {
    pub body: MethodBody,
    /// Slot types established by the parameters and the simulation
    pub local_types: BTreeMap<u16, Option<FieldType>>,
}

const LISTING_LIMIT: usize = 20;

/// Turns one decoded method body into a statement tree. Never fails: a
/// body that cannot be understood becomes a bytecode listing.
pub fn reconstruct_method(
    class_name: &str,
    method: &ClassFileMethod,
    instructions: &[Instruction],
    exception_table: &ExceptionTable,
) -> MethodArtifacts {
    let mut context = MethodContext::new(
        class_name,
        &method.parsed_type_descriptor,
        method.is_static(),
    );

    let Some(graph) = ControlFlowGraph::build(instructions, exception_table) else {
        return MethodArtifacts {
            body: MethodBody::Dumped {
                reason: "the code attribute is empty".to_string(),
                lines: Vec::new(),
            },
            local_types: context.local_types,
        };
    };

    match simulate_all(&graph, &mut context) {
        Ok(simulation) => {
            if !simulation.failures.is_empty() {
                debug!(
                    "{} blocks of {}.{} did not reconstruct",
                    simulation.failures.len(),
                    class_name,
                    method.name
                );
            }
            let dumps = block_dumps(&graph, simulation.failures);
            MethodArtifacts {
                body: structure_method(&graph, &simulation.blocks, &dumps),
                local_types: context.local_types,
            }
        }
        Err(reason) => {
            debug!("dumping the body of {}.{}: {reason}", class_name, method.name);
            MethodArtifacts {
                body: MethodBody::Dumped {
                    reason,
                    lines: listing(instructions),
                },
                local_types: context.local_types,
            }
        }
    }
}

struct Simulation {
    blocks: BTreeMap<ProgramCounter, SimulatedBlock>,
    /// Blocks that could not be followed, with the reason
    failures: BTreeMap<ProgramCounter, String>,
}

/// Simulates every live block in reverse postorder, feeding each exit
/// stack into the successors' entry stacks. A second pass settles stacks
/// that a back edge changed after its target had already run. A block
/// that cannot be followed is recorded as a failure instead of failing
/// the whole method; its successors keep whatever entry stack another
/// path gave them.
fn simulate_all(
    graph: &ControlFlowGraph,
    context: &mut MethodContext,
) -> Result<Simulation, String> {
    let order = graph.reverse_postorder();
    let mut entry_stacks: BTreeMap<ProgramCounter, Vec<Expr>> = BTreeMap::new();
    entry_stacks.insert(graph.entry, Vec::new());
    for (pc, catch_class) in &graph.handlers {
        entry_stacks.insert(*pc, vec![Expr::CaughtException(catch_class.clone())]);
    }

    for _ in 0..2 {
        context.reset_object_ids();
        let mut blocks = BTreeMap::new();
        let mut failures: BTreeMap<ProgramCounter, String> = BTreeMap::new();
        let mut changed = false;
        for pc in &order {
            if failures.contains_key(pc) {
                continue;
            }
            let Some(block) = graph.blocks.get(pc) else {
                continue;
            };
            let Some(entry_stack) = entry_stacks.get(pc).cloned() else {
                failures.insert(*pc, "the incoming operand stack is unknown".to_string());
                continue;
            };
            let outcome = match simulate_block(block, entry_stack, context) {
                Ok(outcome) => outcome,
                Err(failure) => {
                    failures.insert(*pc, failure.to_string());
                    continue;
                }
            };
            for successor in block.terminator.successors() {
                match entry_stacks.entry(successor) {
                    Entry::Vacant(slot) => {
                        slot.insert(outcome.exit_stack.clone());
                    }
                    Entry::Occupied(mut slot) => {
                        match merge_stacks(slot.get(), &outcome.exit_stack) {
                            Some(merged) => {
                                if merged != *slot.get() {
                                    slot.insert(merged);
                                    changed = true;
                                }
                            }
                            None => {
                                failures.insert(
                                    successor,
                                    format!("the operand stack depth disagrees at {successor}"),
                                );
                                blocks.remove(&successor);
                            }
                        }
                    }
                }
            }
            blocks.insert(*pc, outcome);
        }
        if !changed {
            return Ok(Simulation { blocks, failures });
        }
    }
    Err("the operand stacks never settled".to_string())
}

/// Pairs each failure with the raw listing of its block.
fn block_dumps(
    graph: &ControlFlowGraph,
    failures: BTreeMap<ProgramCounter, String>,
) -> BTreeMap<ProgramCounter, BlockDump> {
    failures
        .into_iter()
        .map(|(pc, reason)| {
            let lines = graph
                .blocks
                .get(&pc)
                .map(|block| listing(&block.instructions))
                .unwrap_or_default();
            (pc, BlockDump { reason, lines })
        })
        .collect()
}

/// Slot-wise union of two operand stacks. A depth disagreement has no
/// useful repair; a value disagreement degrades that slot to opaque.
fn merge_stacks(left: &[Expr], right: &[Expr]) -> Option<Vec<Expr>> {
    if left.len() != right.len() {
        return None;
    }
    Some(
        left.iter()
            .zip(right)
            .map(|(a, b)| {
                if a == b {
                    a.clone()
                } else {
                    Expr::Opaque("<merged>".to_string())
                }
            })
            .collect(),
    )
}

fn listing(instructions: &[Instruction]) -> Vec<String> {
    let mut lines: Vec<String> = instructions
        .iter()
        .take(LISTING_LIMIT)
        .map(|instruction| instruction.to_string())
        .collect();
    if instructions.len() > LISTING_LIMIT {
        lines.push(format!(
            "... {} more instructions",
            instructions.len() - LISTING_LIMIT
        ));
    }
    lines
}
