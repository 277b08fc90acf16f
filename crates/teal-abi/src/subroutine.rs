//! Routines with ABI-typed parameters and an optional ABI output.
//!
//! Each ABI parameter is received as an [`AbiValue`] whose slot is the
//! routine's argument slot. The output value is allocated by the routine and
//! loaded as its last step, so callers see a single stack result.

use std::fmt;
use std::rc::Rc;

use teal_ir::{Expr, ScratchSlot, SubroutineDecl, TealType};

use crate::error::AbiError;
use crate::method::Method;
use crate::type_spec::TypeSpec;
use crate::value::AbiValue;

/// The declared type of one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiParam {
    Abi(TypeSpec),
    /// A plain stack value. Routines with such parameters cannot be routed.
    Raw(TealType),
}

/// What the body closure receives for one parameter.
#[derive(Debug, Clone)]
pub enum SubroutineArg {
    Abi(AbiValue),
    Raw(Expr),
}

impl SubroutineArg {
    pub fn abi(&self) -> Option<&AbiValue> {
        match self {
            SubroutineArg::Abi(value) => Some(value),
            SubroutineArg::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&Expr> {
        match self {
            SubroutineArg::Raw(expr) => Some(expr),
            SubroutineArg::Abi(_) => None,
        }
    }
}

pub struct AbiSubroutine {
    params: Vec<(String, AbiParam)>,
    output: Option<TypeSpec>,
    decl: Rc<SubroutineDecl>,
}

impl AbiSubroutine {
    /// Declare an ABI routine.
    ///
    /// `body` receives one argument per parameter and the output value, if
    /// any. It is responsible for storing into the output.
    pub fn new<F>(
        name: impl Into<String>,
        params: Vec<(&str, AbiParam)>,
        output: Option<TypeSpec>,
        body: F,
    ) -> Rc<AbiSubroutine>
    where
        F: FnOnce(&[SubroutineArg], Option<&AbiValue>) -> Expr,
    {
        let mut slots = Vec::with_capacity(params.len());
        let mut args = Vec::with_capacity(params.len());
        for (_, param) in &params {
            match param {
                AbiParam::Abi(spec) => {
                    let value = AbiValue::new(spec.clone());
                    slots.push(value.slot());
                    args.push(SubroutineArg::Abi(value));
                }
                AbiParam::Raw(ty) => {
                    let slot = ScratchSlot::new();
                    slots.push(slot);
                    args.push(SubroutineArg::Raw(Expr::Load(slot, *ty)));
                }
            }
        }

        let output_value = output.clone().map(AbiValue::new);
        let body = body(&args, output_value.as_ref());
        let (body, return_type) = match &output_value {
            Some(out) => (Expr::Seq(vec![body, out.get()]), out.type_spec().storage_type()),
            None => (body, TealType::None),
        };

        Rc::new(AbiSubroutine {
            params: params
                .into_iter()
                .map(|(name, param)| (name.to_string(), param))
                .collect(),
            output,
            decl: SubroutineDecl::new(name, slots, return_type, body),
        })
    }

    pub fn name(&self) -> &str {
        self.decl.name()
    }

    pub fn params(&self) -> &[(String, AbiParam)] {
        &self.params
    }

    pub fn argument_count(&self) -> usize {
        self.params.len()
    }

    pub fn output_type(&self) -> Option<&TypeSpec> {
        self.output.as_ref()
    }

    pub fn decl(&self) -> &Rc<SubroutineDecl> {
        &self.decl
    }

    /// Whether every parameter is ABI-typed.
    pub fn is_routable(&self) -> bool {
        self.params
            .iter()
            .all(|(_, param)| matches!(param, AbiParam::Abi(_)))
    }

    /// Parameter types, in order.
    pub fn expected_arg_types(&self) -> Result<Vec<TypeSpec>, AbiError> {
        self.params
            .iter()
            .map(|(param_name, param)| match param {
                AbiParam::Abi(spec) => Ok(spec.clone()),
                AbiParam::Raw(_) => Err(AbiError::NotRoutable {
                    name: self.name().to_string(),
                    param: param_name.clone(),
                }),
            })
            .collect()
    }

    /// The output type string, `void` when there is none.
    pub fn type_of(&self) -> String {
        self.output
            .as_ref()
            .map_or_else(|| "void".to_string(), TypeSpec::to_string)
    }

    /// The method description of this routine, optionally under another name.
    pub fn method(&self, name_override: Option<&str>) -> Result<Method, AbiError> {
        Ok(Method::new(
            name_override.unwrap_or(self.name()),
            self.expected_arg_types()?,
            self.output.clone(),
        ))
    }

    /// `name(arg,...)output` for this routine.
    pub fn method_signature(&self, name_override: Option<&str>) -> Result<String, AbiError> {
        Ok(self.method(name_override)?.signature())
    }

    /// Invoke with ABI values matching the parameter types.
    pub fn call(&self, args: &[AbiValue]) -> Result<Expr, AbiError> {
        if args.len() != self.argument_count() {
            return Err(AbiError::ArityMismatch {
                name: self.name().to_string(),
                expected: self.argument_count(),
                found: args.len(),
            });
        }
        let expected = self.expected_arg_types()?;
        for (spec, arg) in expected.iter().zip(args) {
            if spec != arg.type_spec() {
                return Err(AbiError::TypeMismatch {
                    expected: spec.clone(),
                    found: arg.type_spec().clone(),
                });
            }
        }
        Ok(Expr::Call {
            sub: Rc::clone(&self.decl),
            args: args.iter().map(AbiValue::get).collect(),
        })
    }

    /// Invoke and store the output into `output`.
    pub fn call_into(&self, args: &[AbiValue], output: &AbiValue) -> Result<Expr, AbiError> {
        let Some(spec) = &self.output else {
            return Err(AbiError::NoOutput(self.name().to_string()));
        };
        if spec != output.type_spec() {
            return Err(AbiError::TypeMismatch {
                expected: spec.clone(),
                found: output.type_spec().clone(),
            });
        }
        Ok(Expr::store(output.slot(), self.call(args)?))
    }
}

impl fmt::Debug for AbiSubroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbiSubroutine")
            .field("name", &self.name())
            .field("params", &self.params)
            .field("output", &self.output)
            .finish()
    }
}
