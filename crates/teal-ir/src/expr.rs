//! The operation tree handed to the lowering pass.

use std::rc::Rc;

use crate::bytes::Bytes;
use crate::slot::ScratchSlot;
use crate::subroutine::SubroutineDecl;
use crate::types::{GlobalField, OnComplete, TealType, TxnField};

/// Binary operators. Every one of them leaves a `uint64` on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOp {
    pub fn teal_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Btoi,
    Itob,
    Len,
}

impl UnaryOp {
    pub fn teal_name(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Btoi => "btoi",
            UnaryOp::Itob => "itob",
            UnaryOp::Len => "len",
        }
    }
}

/// An expression in the operation tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(u64),
    /// A completion kind, emitted as its named constant.
    OnCompleteConst(OnComplete),
    Bytes(Bytes),
    /// The 4-byte selector of a method signature (`method "sig"`).
    MethodSelector(String),
    Txn(TxnField),
    /// `ApplicationArgs[i]` of the current transaction.
    TxnArg(u8),
    Global(GlobalField),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Concat(Box<Expr>, Box<Expr>),
    Extract {
        source: Box<Expr>,
        start: u8,
        length: u8,
    },
    Extract3 {
        source: Box<Expr>,
        start: Box<Expr>,
        length: Box<Expr>,
    },
    ExtractUint16 {
        source: Box<Expr>,
        offset: Box<Expr>,
    },
    Substring3 {
        source: Box<Expr>,
        start: Box<Expr>,
        end: Box<Expr>,
    },
    GetBit {
        source: Box<Expr>,
        index: Box<Expr>,
    },
    SetBit {
        target: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    Load(ScratchSlot, TealType),
    Store(ScratchSlot, Box<Expr>),
    Log(Box<Expr>),
    Pop(Box<Expr>),
    Seq(Vec<Expr>),
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    /// End the program with the value on top of the stack.
    Return(Box<Expr>),
    Err,
    Call {
        sub: Rc<SubroutineDecl>,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// `return 1`.
    pub fn approve() -> Expr {
        Expr::Return(Box::new(Expr::Int(1)))
    }

    /// `return 0`.
    pub fn reject() -> Expr {
        Expr::Return(Box::new(Expr::Int(0)))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Eq, lhs, rhs)
    }

    pub fn neq(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Neq, lhs, rhs)
    }

    pub fn unary(op: UnaryOp, arg: Expr) -> Expr {
        Expr::Unary {
            op,
            arg: Box::new(arg),
        }
    }

    pub fn not(arg: Expr) -> Expr {
        Expr::unary(UnaryOp::Not, arg)
    }

    pub fn btoi(arg: Expr) -> Expr {
        Expr::unary(UnaryOp::Btoi, arg)
    }

    pub fn itob(arg: Expr) -> Expr {
        Expr::unary(UnaryOp::Itob, arg)
    }

    pub fn len(arg: Expr) -> Expr {
        Expr::unary(UnaryOp::Len, arg)
    }

    pub fn concat(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Concat(Box::new(lhs), Box::new(rhs))
    }

    pub fn log(message: Expr) -> Expr {
        Expr::Log(Box::new(message))
    }

    pub fn store(slot: ScratchSlot, value: Expr) -> Expr {
        Expr::Store(slot, Box::new(value))
    }

    pub fn if_then(cond: Expr, then_branch: Expr) -> Expr {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: None,
        }
    }

    pub fn if_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        }
    }

    /// The stack type this expression leaves behind.
    pub fn type_of(&self) -> TealType {
        match self {
            Expr::Int(_) | Expr::OnCompleteConst(_) => TealType::Uint64,
            Expr::Bytes(_) | Expr::MethodSelector(_) | Expr::TxnArg(_) => TealType::Bytes,
            Expr::Txn(field) => field.type_of(),
            Expr::Global(field) => field.type_of(),
            Expr::Binary { .. } | Expr::And(_) | Expr::Or(_) => TealType::Uint64,
            Expr::Unary { op, .. } => match op {
                UnaryOp::Itob => TealType::Bytes,
                UnaryOp::Not | UnaryOp::Btoi | UnaryOp::Len => TealType::Uint64,
            },
            Expr::Concat(..)
            | Expr::Extract { .. }
            | Expr::Extract3 { .. }
            | Expr::Substring3 { .. } => TealType::Bytes,
            Expr::ExtractUint16 { .. } | Expr::GetBit { .. } => TealType::Uint64,
            Expr::SetBit { target, .. } => target.type_of(),
            Expr::Load(_, ty) => *ty,
            Expr::Store(..) | Expr::Log(_) | Expr::Pop(_) | Expr::Return(_) | Expr::Err => {
                TealType::None
            }
            Expr::Seq(exprs) => exprs.last().map_or(TealType::None, Expr::type_of),
            Expr::If {
                then_branch,
                else_branch,
                ..
            } => match else_branch {
                Some(_) => then_branch.type_of(),
                None => TealType::None,
            },
            Expr::Call { sub, .. } => sub.return_type(),
        }
    }

    /// Whether evaluating this expression always ends the program.
    pub fn has_return(&self) -> bool {
        match self {
            Expr::Return(_) | Expr::Err => true,
            Expr::Seq(exprs) => exprs.last().is_some_and(Expr::has_return),
            Expr::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => then_branch.has_return() && else_branch.has_return(),
            _ => false,
        }
    }

    /// Direct subexpressions, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Int(_)
            | Expr::OnCompleteConst(_)
            | Expr::Bytes(_)
            | Expr::MethodSelector(_)
            | Expr::Txn(_)
            | Expr::TxnArg(_)
            | Expr::Global(_)
            | Expr::Load(..)
            | Expr::Err => Vec::new(),
            Expr::Binary { lhs, rhs, .. } | Expr::Concat(lhs, rhs) => vec![&**lhs, &**rhs],
            Expr::Unary { arg, .. } => vec![&**arg],
            Expr::And(exprs) | Expr::Or(exprs) | Expr::Seq(exprs) => exprs.iter().collect(),
            Expr::Extract { source, .. } => vec![&**source],
            Expr::Extract3 {
                source,
                start,
                length,
            } => vec![&**source, &**start, &**length],
            Expr::ExtractUint16 { source, offset } => vec![&**source, &**offset],
            Expr::Substring3 { source, start, end } => vec![&**source, &**start, &**end],
            Expr::GetBit { source, index } => vec![&**source, &**index],
            Expr::SetBit {
                target,
                index,
                value,
            } => vec![&**target, &**index, &**value],
            Expr::Store(_, value) | Expr::Log(value) | Expr::Pop(value) | Expr::Return(value) => {
                vec![&**value]
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![&**cond, &**then_branch];
                if let Some(e) = else_branch {
                    out.push(&**e);
                }
                out
            }
            Expr::Call { args, .. } => args.iter().collect(),
        }
    }
}
