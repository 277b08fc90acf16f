//! Subroutine declarations and the calling convention shared by raw and ABI routines.
//!
//! Arguments are pushed in declaration order. The callee's prologue pops them
//! into its own argument slots (last argument first), and a value-returning
//! routine leaves exactly one value on the stack before `retsub`.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::IrError;
use crate::expr::Expr;
use crate::slot::ScratchSlot;
use crate::types::TealType;

static NEXT_SUBROUTINE_ID: AtomicU32 = AtomicU32::new(0);

/// A compiled-once routine body with its argument slots.
pub struct SubroutineDecl {
    id: u32,
    name: String,
    arg_slots: Vec<ScratchSlot>,
    return_type: TealType,
    body: Expr,
}

impl SubroutineDecl {
    pub fn new(
        name: impl Into<String>,
        arg_slots: Vec<ScratchSlot>,
        return_type: TealType,
        body: Expr,
    ) -> Rc<SubroutineDecl> {
        Rc::new(SubroutineDecl {
            id: NEXT_SUBROUTINE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            arg_slots,
            return_type,
            body,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Assembly label, unique per declaration.
    pub fn label(&self) -> String {
        format!("{}_{}", self.name, self.id)
    }

    pub fn arg_slots(&self) -> &[ScratchSlot] {
        &self.arg_slots
    }

    pub fn arity(&self) -> usize {
        self.arg_slots.len()
    }

    pub fn return_type(&self) -> TealType {
        self.return_type
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }
}

impl PartialEq for SubroutineDecl {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for SubroutineDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubroutineDecl")
            .field("label", &self.label())
            .field("arity", &self.arity())
            .field("return_type", &self.return_type)
            .finish()
    }
}

/// A raw routine whose arguments are plain stack values.
#[derive(Debug)]
pub struct Subroutine {
    decl: Rc<SubroutineDecl>,
    param_types: Vec<TealType>,
}

impl Subroutine {
    /// Declare a routine. `body` receives one scratch load per parameter.
    pub fn new<F>(
        name: impl Into<String>,
        return_type: TealType,
        param_types: Vec<TealType>,
        body: F,
    ) -> Rc<Subroutine>
    where
        F: FnOnce(&[Expr]) -> Expr,
    {
        let slots: Vec<ScratchSlot> = param_types.iter().map(|_| ScratchSlot::new()).collect();
        let args: Vec<Expr> = slots
            .iter()
            .zip(&param_types)
            .map(|(slot, ty)| Expr::Load(*slot, *ty))
            .collect();
        let body = body(&args);
        Rc::new(Subroutine {
            decl: SubroutineDecl::new(name, slots, return_type, body),
            param_types,
        })
    }

    pub fn name(&self) -> &str {
        self.decl.name()
    }

    pub fn argument_count(&self) -> usize {
        self.param_types.len()
    }

    pub fn return_type(&self) -> TealType {
        self.decl.return_type()
    }

    pub fn decl(&self) -> &Rc<SubroutineDecl> {
        &self.decl
    }

    /// Invoke the routine with `args`.
    pub fn call(&self, args: Vec<Expr>) -> Result<Expr, IrError> {
        if args.len() != self.argument_count() {
            return Err(IrError::ArityMismatch {
                name: self.name().to_string(),
                expected: self.argument_count(),
                found: args.len(),
            });
        }
        Ok(Expr::Call {
            sub: Rc::clone(&self.decl),
            args,
        })
    }
}
