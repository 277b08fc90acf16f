//! Whole-program compilation and assembly to TEAL text.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::blocks::{BlockExit, BlockGraph, TealOp};
use crate::error::IrError;
use crate::expr::Expr;
use crate::slot::{ScratchSlot, NUM_SLOTS};
use crate::subroutine::SubroutineDecl;

/// Oldest TEAL version with every instruction this compiler emits.
pub const MIN_VERSION: u8 = 5;
pub const MAX_VERSION: u8 = 8;

/// A lowered subroutine body and its entry label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSubroutine {
    pub label: String,
    pub body: BlockGraph,
}

/// A program body plus every subroutine reachable from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub main: BlockGraph,
    pub subroutines: Vec<CompiledSubroutine>,
}

/// Lower and normalize `expr` and every subroutine it can reach.
///
/// Each subroutine is compiled once, in the order it is first referenced.
pub fn compile_program(expr: &Expr) -> Program {
    let mut main = BlockGraph::lower(expr);
    main.normalize();

    let subroutines = collect_reachable_subroutines(expr)
        .into_iter()
        .map(|decl| {
            let mut body = BlockGraph::lower_subroutine(&decl);
            body.normalize();
            trace!(label = %decl.label(), blocks = body.blocks.len(), "subroutine lowered");
            CompiledSubroutine {
                label: decl.label(),
                body,
            }
        })
        .collect();

    Program { main, subroutines }
}

/// Collect subroutines reachable from `expr`, following calls inside
/// subroutine bodies as well.
fn collect_reachable_subroutines(expr: &Expr) -> Vec<Rc<SubroutineDecl>> {
    let mut seen: FxHashSet<u32> = FxHashSet::default();
    let mut reachable = Vec::new();
    let mut worklist: Vec<Rc<SubroutineDecl>> = Vec::new();
    collect_calls(expr, &mut worklist);
    // Keep first-reference order: the worklist is consumed front to back.
    let mut cursor = 0;
    while cursor < worklist.len() {
        let decl = Rc::clone(&worklist[cursor]);
        cursor += 1;
        if !seen.insert(decl.id()) {
            continue;
        }
        collect_calls(decl.body(), &mut worklist);
        reachable.push(decl);
    }
    reachable
}

fn collect_calls(expr: &Expr, out: &mut Vec<Rc<SubroutineDecl>>) {
    if let Expr::Call { sub, .. } = expr {
        out.push(Rc::clone(sub));
    }
    for child in expr.children() {
        collect_calls(child, out);
    }
}

impl Program {
    /// Assign concrete slot numbers in first-use order across the main body
    /// and then each subroutine.
    fn slot_numbers(&self) -> Result<FxHashMap<ScratchSlot, usize>, IrError> {
        let mut numbers: FxHashMap<ScratchSlot, usize> = FxHashMap::default();
        let graphs = std::iter::once(&self.main).chain(self.subroutines.iter().map(|s| &s.body));
        for graph in graphs {
            for slot in graph.slots() {
                let next = numbers.len();
                numbers.entry(slot).or_insert(next);
            }
        }
        if numbers.len() > NUM_SLOTS {
            return Err(IrError::TooManySlots {
                used: numbers.len(),
            });
        }
        Ok(numbers)
    }

    /// Render the program as TEAL source for `version`.
    pub fn assemble(&self, version: u8) -> Result<String, IrError> {
        if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
            return Err(IrError::UnsupportedVersion(version));
        }
        let numbers = self.slot_numbers()?;
        let slot_number = |slot: ScratchSlot| numbers[&slot];

        let mut lines = vec![format!("#pragma version {version}")];
        emit_graph(&self.main, "main", None, &slot_number, &mut lines);
        for sub in &self.subroutines {
            emit_graph(&sub.body, &sub.label, Some(&sub.label), &slot_number, &mut lines);
        }
        Ok(lines.join("\n"))
    }
}

fn emit_graph(
    graph: &BlockGraph,
    prefix: &str,
    entry_label: Option<&str>,
    slot_number: &impl Fn(ScratchSlot) -> usize,
    lines: &mut Vec<String>,
) {
    let label = |b: usize| format!("{prefix}_l{b}");

    // A block needs a label when something other than its predecessor in
    // layout order transfers control to it.
    let mut targeted: FxHashSet<usize> = FxHashSet::default();
    for (i, block) in graph.blocks.iter().enumerate() {
        match block.exit {
            BlockExit::Goto(t) if t != i + 1 => {
                targeted.insert(t);
            }
            BlockExit::Branch { nonzero, zero } => {
                targeted.insert(nonzero);
                if zero != i + 1 {
                    targeted.insert(zero);
                }
            }
            _ => {}
        }
    }

    for (i, block) in graph.blocks.iter().enumerate() {
        if i == 0 {
            if let Some(entry) = entry_label {
                lines.push(format!("{entry}:"));
            }
        }
        if targeted.contains(&i) {
            lines.push(format!("{}:", label(i)));
        }
        lines.extend(block.ops.iter().map(|op| op.render(slot_number)));
        match block.exit {
            BlockExit::Goto(t) if t != i + 1 => lines.push(format!("b {}", label(t))),
            BlockExit::Goto(_) | BlockExit::Halt => {}
            BlockExit::Branch { nonzero, zero } => {
                lines.push(format!("bnz {}", label(nonzero)));
                if zero != i + 1 {
                    lines.push(format!("b {}", label(zero)));
                }
            }
            // Running off the end returns the top of the stack; subroutine
            // code follows the main body, so make the return explicit.
            BlockExit::FallOff => lines.push(TealOp::Return.render(slot_number)),
        }
    }
}
