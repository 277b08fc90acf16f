//! Expression-to-basic-block lowering and block normalization.
//!
//! Lowering walks the operation tree once, appending instructions to the
//! currently open block and opening new blocks at every control-flow join.
//! The raw graph is deliberately naive (empty join blocks, dead blocks after
//! a `return`); `normalize` cleans it up into the form that is compared in
//! tests and assembled into TEAL.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::bytes::Bytes;
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::slot::ScratchSlot;
use crate::subroutine::SubroutineDecl;
use crate::types::{GlobalField, OnComplete, TxnField};

/// A single instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TealOp {
    Int(u64),
    IntConst(OnComplete),
    Byte(Bytes),
    Method(String),
    Txn(TxnField),
    /// `txna ApplicationArgs i`.
    Txna(u8),
    Global(GlobalField),
    Binary(BinaryOp),
    Unary(UnaryOp),
    And,
    Or,
    Concat,
    Extract(u8, u8),
    Extract3,
    ExtractUint16,
    Substring3,
    GetBit,
    SetBit,
    Load(ScratchSlot),
    Store(ScratchSlot),
    Log,
    Pop,
    Callsub(String),
    Retsub,
    Return,
    Err,
}

impl TealOp {
    /// Render the instruction, resolving scratch slots through `slot_number`.
    pub fn render(&self, slot_number: impl Fn(ScratchSlot) -> usize) -> String {
        match self {
            TealOp::Int(n) => format!("int {n}"),
            TealOp::IntConst(oc) => format!("int {}", oc.teal_name()),
            TealOp::Byte(b) => format!("byte {}", b.teal_operand()),
            TealOp::Method(sig) => format!("method \"{sig}\""),
            TealOp::Txn(field) => format!("txn {}", field.teal_name()),
            TealOp::Txna(i) => format!("txna ApplicationArgs {i}"),
            TealOp::Global(field) => format!("global {}", field.teal_name()),
            TealOp::Binary(op) => op.teal_name().to_string(),
            TealOp::Unary(op) => op.teal_name().to_string(),
            TealOp::And => "&&".to_string(),
            TealOp::Or => "||".to_string(),
            TealOp::Concat => "concat".to_string(),
            TealOp::Extract(start, length) => format!("extract {start} {length}"),
            TealOp::Extract3 => "extract3".to_string(),
            TealOp::ExtractUint16 => "extract_uint16".to_string(),
            TealOp::Substring3 => "substring3".to_string(),
            TealOp::GetBit => "getbit".to_string(),
            TealOp::SetBit => "setbit".to_string(),
            TealOp::Load(slot) => format!("load {}", slot_number(*slot)),
            TealOp::Store(slot) => format!("store {}", slot_number(*slot)),
            TealOp::Log => "log".to_string(),
            TealOp::Pop => "pop".to_string(),
            TealOp::Callsub(label) => format!("callsub {label}"),
            TealOp::Retsub => "retsub".to_string(),
            TealOp::Return => "return".to_string(),
            TealOp::Err => "err".to_string(),
        }
    }

    fn slot(&self) -> Option<ScratchSlot> {
        match self {
            TealOp::Load(slot) | TealOp::Store(slot) => Some(*slot),
            _ => None,
        }
    }

    fn slot_mut(&mut self) -> Option<&mut ScratchSlot> {
        match self {
            TealOp::Load(slot) | TealOp::Store(slot) => Some(slot),
            _ => None,
        }
    }
}

pub type BlockId = usize;

/// How control leaves a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockExit {
    Goto(BlockId),
    /// Pops the top of the stack; jumps to `nonzero` if it is nonzero.
    Branch { nonzero: BlockId, zero: BlockId },
    /// The last instruction already ends execution (`return`, `err`, `retsub`).
    Halt,
    /// Execution runs off the end of the program body.
    FallOff,
}

impl BlockExit {
    fn successors(self) -> Vec<BlockId> {
        match self {
            BlockExit::Goto(t) => vec![t],
            // Zero target first: it is the fall-through path when laid out.
            BlockExit::Branch { nonzero, zero } => vec![zero, nonzero],
            BlockExit::Halt | BlockExit::FallOff => Vec::new(),
        }
    }

    fn remap(self, map: &FxHashMap<BlockId, BlockId>) -> BlockExit {
        match self {
            BlockExit::Goto(t) => BlockExit::Goto(map[&t]),
            BlockExit::Branch { nonzero, zero } => BlockExit::Branch {
                nonzero: map[&nonzero],
                zero: map[&zero],
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub ops: Vec<TealOp>,
    pub exit: BlockExit,
}

/// A control-flow graph. Block 0 is the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGraph {
    pub blocks: Vec<BasicBlock>,
}

impl BlockGraph {
    /// Lower a program body. The final block falls off the end.
    pub fn lower(expr: &Expr) -> BlockGraph {
        let mut lowerer = Lowerer::default();
        let entry = lowerer.new_block();
        lowerer.lower(expr, entry);
        trace!(blocks = lowerer.blocks.len(), "expression lowered");
        BlockGraph {
            blocks: lowerer.blocks,
        }
    }

    /// Lower a subroutine: argument prologue, body, then `retsub`.
    pub fn lower_subroutine(decl: &SubroutineDecl) -> BlockGraph {
        let mut lowerer = Lowerer::default();
        let entry = lowerer.new_block();
        for slot in decl.arg_slots().iter().rev() {
            lowerer.emit(entry, TealOp::Store(*slot));
        }
        let end = lowerer.lower(decl.body(), entry);
        lowerer.emit(end, TealOp::Retsub);
        lowerer.blocks[end].exit = BlockExit::Halt;
        BlockGraph {
            blocks: lowerer.blocks,
        }
    }

    /// Remove unreachable blocks, fold straight-line chains, and renumber
    /// blocks in layout order. Applying it twice changes nothing.
    pub fn normalize(&mut self) {
        let reachable = self.layout_order();
        let reachable_set: FxHashSet<BlockId> = reachable.iter().copied().collect();

        let mut preds: FxHashMap<BlockId, usize> = FxHashMap::default();
        for &b in &reachable {
            for s in self.blocks[b].exit.successors() {
                *preds.entry(s).or_insert(0) += 1;
            }
        }

        let mut merged_away: FxHashSet<BlockId> = FxHashSet::default();
        for &b in &reachable {
            if merged_away.contains(&b) {
                continue;
            }
            while let BlockExit::Goto(t) = self.blocks[b].exit {
                if t == 0 || t == b || preds.get(&t).copied() != Some(1) {
                    break;
                }
                let absorbed = std::mem::replace(
                    &mut self.blocks[t],
                    BasicBlock {
                        ops: Vec::new(),
                        exit: BlockExit::Halt,
                    },
                );
                self.blocks[b].ops.extend(absorbed.ops);
                self.blocks[b].exit = absorbed.exit;
                merged_away.insert(t);
            }
        }

        let order: Vec<BlockId> = self
            .layout_order()
            .into_iter()
            .filter(|b| reachable_set.contains(b) && !merged_away.contains(b))
            .collect();
        let map: FxHashMap<BlockId, BlockId> =
            order.iter().enumerate().map(|(new, &old)| (old, new)).collect();
        let blocks = order
            .iter()
            .map(|&old| {
                let block = &self.blocks[old];
                BasicBlock {
                    ops: block.ops.clone(),
                    exit: block.exit.remap(&map),
                }
            })
            .collect();
        self.blocks = blocks;
    }

    /// Renumber scratch slots by first use, so that graphs differing only in
    /// which slot handles they were given compare equal.
    pub fn canonicalize_slots(&mut self) {
        let mut numbering: FxHashMap<ScratchSlot, u32> = FxHashMap::default();
        for block in &mut self.blocks {
            for op in &mut block.ops {
                if let Some(slot) = op.slot_mut() {
                    let next = numbering.len() as u32;
                    let id = *numbering.entry(*slot).or_insert(next);
                    *slot = ScratchSlot::with_id(id);
                }
            }
        }
    }

    /// Every slot referenced, in first-use order.
    pub fn slots(&self) -> Vec<ScratchSlot> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for block in &self.blocks {
            for slot in block.ops.iter().filter_map(TealOp::slot) {
                if seen.insert(slot) {
                    out.push(slot);
                }
            }
        }
        out
    }

    /// Depth-first preorder from the entry, zero branch first.
    fn layout_order(&self) -> Vec<BlockId> {
        let mut order = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![0];
        while let Some(b) = stack.pop() {
            if b >= self.blocks.len() || !seen.insert(b) {
                continue;
            }
            order.push(b);
            for s in self.blocks[b].exit.successors().into_iter().rev() {
                if !seen.contains(&s) {
                    stack.push(s);
                }
            }
        }
        order
    }
}

#[derive(Default)]
struct Lowerer {
    blocks: Vec<BasicBlock>,
}

impl Lowerer {
    fn new_block(&mut self) -> BlockId {
        self.blocks.push(BasicBlock {
            ops: Vec::new(),
            exit: BlockExit::FallOff,
        });
        self.blocks.len() - 1
    }

    fn emit(&mut self, block: BlockId, op: TealOp) {
        self.blocks[block].ops.push(op);
    }

    /// Close `block` with a terminating instruction. Anything lowered after
    /// it lands in a fresh block nothing jumps to.
    fn halt(&mut self, block: BlockId, op: TealOp) -> BlockId {
        self.emit(block, op);
        self.blocks[block].exit = BlockExit::Halt;
        self.new_block()
    }

    fn lower_all<'e>(&mut self, exprs: impl IntoIterator<Item = &'e Expr>, cur: BlockId) -> BlockId {
        exprs.into_iter().fold(cur, |b, e| self.lower(e, b))
    }

    /// Lower `expr` starting in `cur`; returns the block left open afterwards.
    fn lower(&mut self, expr: &Expr, cur: BlockId) -> BlockId {
        match expr {
            Expr::Int(n) => {
                self.emit(cur, TealOp::Int(*n));
                cur
            }
            Expr::OnCompleteConst(oc) => {
                self.emit(cur, TealOp::IntConst(*oc));
                cur
            }
            Expr::Bytes(b) => {
                self.emit(cur, TealOp::Byte(b.clone()));
                cur
            }
            Expr::MethodSelector(sig) => {
                self.emit(cur, TealOp::Method(sig.clone()));
                cur
            }
            Expr::Txn(field) => {
                self.emit(cur, TealOp::Txn(*field));
                cur
            }
            Expr::TxnArg(i) => {
                self.emit(cur, TealOp::Txna(*i));
                cur
            }
            Expr::Global(field) => {
                self.emit(cur, TealOp::Global(*field));
                cur
            }
            Expr::Binary { op, lhs, rhs } => {
                let b = self.lower(lhs, cur);
                let b = self.lower(rhs, b);
                self.emit(b, TealOp::Binary(*op));
                b
            }
            Expr::Unary { op, arg } => {
                let b = self.lower(arg, cur);
                self.emit(b, TealOp::Unary(*op));
                b
            }
            Expr::And(terms) => self.lower_nary(terms, TealOp::And, 1, cur),
            Expr::Or(terms) => self.lower_nary(terms, TealOp::Or, 0, cur),
            Expr::Concat(lhs, rhs) => {
                let b = self.lower_all([&**lhs, &**rhs], cur);
                self.emit(b, TealOp::Concat);
                b
            }
            Expr::Extract {
                source,
                start,
                length,
            } => {
                let b = self.lower(source, cur);
                self.emit(b, TealOp::Extract(*start, *length));
                b
            }
            Expr::Extract3 {
                source,
                start,
                length,
            } => {
                let b = self.lower_all([&**source, &**start, &**length], cur);
                self.emit(b, TealOp::Extract3);
                b
            }
            Expr::ExtractUint16 { source, offset } => {
                let b = self.lower_all([&**source, &**offset], cur);
                self.emit(b, TealOp::ExtractUint16);
                b
            }
            Expr::Substring3 { source, start, end } => {
                let b = self.lower_all([&**source, &**start, &**end], cur);
                self.emit(b, TealOp::Substring3);
                b
            }
            Expr::GetBit { source, index } => {
                let b = self.lower_all([&**source, &**index], cur);
                self.emit(b, TealOp::GetBit);
                b
            }
            Expr::SetBit {
                target,
                index,
                value,
            } => {
                let b = self.lower_all([&**target, &**index, &**value], cur);
                self.emit(b, TealOp::SetBit);
                b
            }
            Expr::Load(slot, _) => {
                self.emit(cur, TealOp::Load(*slot));
                cur
            }
            Expr::Store(slot, value) => {
                let b = self.lower(value, cur);
                self.emit(b, TealOp::Store(*slot));
                b
            }
            Expr::Log(message) => {
                let b = self.lower(message, cur);
                self.emit(b, TealOp::Log);
                b
            }
            Expr::Pop(value) => {
                let b = self.lower(value, cur);
                self.emit(b, TealOp::Pop);
                b
            }
            Expr::Seq(exprs) => self.lower_all(exprs, cur),
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let b = self.lower(cond, cur);
                let then_block = self.new_block();
                let then_end = self.lower(then_branch, then_block);
                match else_branch {
                    Some(else_branch) => {
                        let else_block = self.new_block();
                        let else_end = self.lower(else_branch, else_block);
                        let join = self.new_block();
                        self.blocks[b].exit = BlockExit::Branch {
                            nonzero: then_block,
                            zero: else_block,
                        };
                        self.blocks[then_end].exit = BlockExit::Goto(join);
                        self.blocks[else_end].exit = BlockExit::Goto(join);
                        join
                    }
                    None => {
                        let join = self.new_block();
                        self.blocks[b].exit = BlockExit::Branch {
                            nonzero: then_block,
                            zero: join,
                        };
                        self.blocks[then_end].exit = BlockExit::Goto(join);
                        join
                    }
                }
            }
            Expr::Return(value) => {
                let b = self.lower(value, cur);
                self.halt(b, TealOp::Return)
            }
            Expr::Err => self.halt(cur, TealOp::Err),
            Expr::Call { sub, args } => {
                let b = self.lower_all(args, cur);
                self.emit(b, TealOp::Callsub(sub.label()));
                b
            }
        }
    }

    fn lower_nary(&mut self, terms: &[Expr], op: TealOp, identity: u64, cur: BlockId) -> BlockId {
        let Some((first, rest)) = terms.split_first() else {
            self.emit(cur, TealOp::Int(identity));
            return cur;
        };
        let mut b = self.lower(first, cur);
        for term in rest {
            b = self.lower(term, b);
            self.emit(b, op.clone());
        }
        b
    }
}
