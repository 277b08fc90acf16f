use std::rc::Rc;

use teal_abi::AbiSubroutine;
use teal_ir::{Expr, Subroutine};

/// Something the router can run: a raw expression, a plain subroutine, or an
/// ABI subroutine.
#[derive(Debug, Clone)]
pub enum Handler {
    Expr(Expr),
    Subroutine(Rc<Subroutine>),
    Abi(Rc<AbiSubroutine>),
}

impl Handler {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Handler::Expr(_) => "expression",
            Handler::Subroutine(_) => "subroutine",
            Handler::Abi(_) => "ABI subroutine",
        }
    }
}

impl From<Expr> for Handler {
    fn from(expr: Expr) -> Self {
        Handler::Expr(expr)
    }
}

impl From<Rc<Subroutine>> for Handler {
    fn from(sub: Rc<Subroutine>) -> Self {
        Handler::Subroutine(sub)
    }
}

impl From<Rc<AbiSubroutine>> for Handler {
    fn from(sub: Rc<AbiSubroutine>) -> Self {
        Handler::Abi(sub)
    }
}
