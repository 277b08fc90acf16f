//! Compile-time condition algebra.
//!
//! A guard is either statically decided or a runtime `uint64` expression.
//! Folding happens here so the router never emits a comparison whose outcome
//! is already known.

use std::ops::Not;

use teal_ir::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    AlwaysFalse,
    AlwaysTrue,
    Runtime(Expr),
}

impl Cond {
    pub fn runtime(expr: Expr) -> Cond {
        Cond::Runtime(expr)
    }

    pub fn and(self, other: Cond) -> Cond {
        Cond::all([self, other])
    }

    pub fn or(self, other: Cond) -> Cond {
        Cond::any([self, other])
    }

    /// Conjunction: false if any operand is false, true operands dropped.
    pub fn all(conds: impl IntoIterator<Item = Cond>) -> Cond {
        let mut terms = Vec::new();
        for cond in conds {
            match cond {
                Cond::AlwaysFalse => return Cond::AlwaysFalse,
                Cond::AlwaysTrue => {}
                Cond::Runtime(expr) => terms.push(expr),
            }
        }
        Cond::from_terms(terms, Cond::AlwaysTrue, Expr::And)
    }

    /// Disjunction: true if any operand is true, false operands dropped.
    pub fn any(conds: impl IntoIterator<Item = Cond>) -> Cond {
        let mut terms = Vec::new();
        for cond in conds {
            match cond {
                Cond::AlwaysTrue => return Cond::AlwaysTrue,
                Cond::AlwaysFalse => {}
                Cond::Runtime(expr) => terms.push(expr),
            }
        }
        Cond::from_terms(terms, Cond::AlwaysFalse, Expr::Or)
    }

    fn from_terms(mut terms: Vec<Expr>, empty: Cond, join: fn(Vec<Expr>) -> Expr) -> Cond {
        match terms.len() {
            0 => empty,
            1 => Cond::Runtime(terms.remove(0)),
            _ => Cond::Runtime(join(terms)),
        }
    }

    /// The statically known truth value, if any.
    pub fn as_constant(&self) -> Option<bool> {
        match self {
            Cond::AlwaysFalse => Some(false),
            Cond::AlwaysTrue => Some(true),
            Cond::Runtime(_) => None,
        }
    }

    /// The condition as an expression, constants becoming `int 0` / `int 1`.
    pub fn into_expr(self) -> Expr {
        match self {
            Cond::AlwaysFalse => Expr::Int(0),
            Cond::AlwaysTrue => Expr::Int(1),
            Cond::Runtime(expr) => expr,
        }
    }
}

impl Not for Cond {
    type Output = Cond;

    fn not(self) -> Cond {
        match self {
            Cond::AlwaysFalse => Cond::AlwaysTrue,
            Cond::AlwaysTrue => Cond::AlwaysFalse,
            Cond::Runtime(expr) => Cond::Runtime(Expr::not(expr)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teal_ir::TxnField;

    fn a() -> Cond {
        Cond::runtime(Expr::Txn(TxnField::NumAppArgs))
    }

    fn b() -> Cond {
        Cond::runtime(Expr::eq(Expr::Txn(TxnField::ApplicationId), Expr::Int(0)))
    }

    #[test]
    fn constants_fold_out_of_and() {
        assert_eq!(a().and(Cond::AlwaysTrue), a());
        assert_eq!(a().and(Cond::AlwaysFalse), Cond::AlwaysFalse);
        assert_eq!(Cond::AlwaysTrue.and(Cond::AlwaysTrue), Cond::AlwaysTrue);
    }

    #[test]
    fn constants_fold_out_of_or() {
        assert_eq!(a().or(Cond::AlwaysFalse), a());
        assert_eq!(a().or(Cond::AlwaysTrue), Cond::AlwaysTrue);
        assert_eq!(Cond::any([]), Cond::AlwaysFalse);
        assert_eq!(Cond::all([]), Cond::AlwaysTrue);
    }

    #[test]
    fn runtime_terms_join_flat() {
        let joined = Cond::all([a(), Cond::AlwaysTrue, b()]);
        assert_eq!(
            joined,
            Cond::Runtime(Expr::And(vec![a().into_expr(), b().into_expr()]))
        );
    }

    #[test]
    fn not_flips_constants() {
        assert_eq!(!Cond::AlwaysTrue, Cond::AlwaysFalse);
        assert_eq!((!Cond::AlwaysFalse).as_constant(), Some(true));
        assert_eq!(!a(), Cond::Runtime(Expr::not(a().into_expr())));
        assert_eq!(!!a(), Cond::Runtime(Expr::not(Expr::not(a().into_expr()))));
        assert_eq!(a().as_constant(), None);
    }
}
