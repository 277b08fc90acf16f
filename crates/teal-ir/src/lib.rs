//! Expression trees and their lowering to TEAL for the router compiler.
//!
//! ## Architecture
//!
//! - [`expr`]: the operation tree handlers and dispatch logic are built from
//! - [`subroutine`]: routine declarations and the shared calling convention
//! - [`blocks`]: lowering to a basic-block graph, normalization
//! - [`program`]: reachability over subroutines and TEAL text assembly
//!
//! ## Pipeline
//!
//! ```text
//! Expr -> BlockGraph (lower) -> BlockGraph (normalize) -> Program -> TEAL text
//! ```

pub mod blocks;
pub mod bytes;
pub mod error;
pub mod expr;
pub mod program;
pub mod slot;
pub mod subroutine;
pub mod types;

pub use blocks::{BasicBlock, BlockExit, BlockGraph, TealOp};
pub use bytes::Bytes;
pub use error::IrError;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use program::{compile_program, CompiledSubroutine, Program};
pub use slot::ScratchSlot;
pub use subroutine::{Subroutine, SubroutineDecl};
pub use types::{GlobalField, OnComplete, TealType, TxnField};

/// Lower, normalize, and canonicalize a single expression.
///
/// Two expressions built independently from the same shape produce equal
/// graphs, whichever scratch slot handles they were allocated.
pub fn assemble_canonical(expr: &Expr) -> BlockGraph {
    let mut graph = BlockGraph::lower(expr);
    graph.normalize();
    graph.canonicalize_slots();
    graph
}
