//! Wrapping handlers into self-contained program branches.
//!
//! A wrapped bare handler runs its action and approves. A wrapped method
//! decodes its arguments from the application arguments, calls the routine,
//! logs the encoded result if there is one, and approves.

use teal_abi::{method_return, AbiSubroutine, AbiValue, TypeSpec};
use teal_ir::{Expr, TealType};
use tracing::trace;

use crate::error::RouterError;
use crate::handler::Handler;

/// Application arguments a single call can carry.
pub const MAX_APP_ARGS: usize = 16;

/// Arguments a method can receive directly. Argument 0 holds the selector.
pub const METHOD_ARG_NUM_CUTOFF: usize = MAX_APP_ARGS - 1;

/// Wrap `handler` for the method path or the bare path.
pub fn wrap_handler(is_method_call: bool, handler: &Handler) -> Result<Expr, RouterError> {
    if is_method_call {
        wrap_method(handler)
    } else {
        wrap_bare(handler)
    }
}

/// Wrap a bare-call action.
pub fn wrap_bare(handler: &Handler) -> Result<Expr, RouterError> {
    match handler {
        Handler::Expr(expr) => {
            let ty = expr.type_of();
            if ty != TealType::None {
                return Err(RouterError::BareReturnType { found: ty });
            }
            if expr.has_return() {
                Ok(expr.clone())
            } else {
                Ok(Expr::Seq(vec![expr.clone(), Expr::approve()]))
            }
        }
        Handler::Subroutine(sub) => {
            if sub.return_type() != TealType::None {
                return Err(RouterError::BareReturnType {
                    found: sub.return_type(),
                });
            }
            if sub.argument_count() != 0 {
                return Err(RouterError::BareArity {
                    name: sub.name().to_string(),
                    found: sub.argument_count(),
                });
            }
            Ok(Expr::Seq(vec![sub.call(Vec::new())?, Expr::approve()]))
        }
        Handler::Abi(sub) => {
            if sub.output_type().is_some() {
                return Err(RouterError::BareOutput {
                    name: sub.name().to_string(),
                    found: sub.type_of(),
                });
            }
            if sub.argument_count() != 0 {
                return Err(RouterError::BareArity {
                    name: sub.name().to_string(),
                    found: sub.argument_count(),
                });
            }
            Ok(Expr::Seq(vec![sub.call(&[])?, Expr::approve()]))
        }
    }
}

/// Wrap a method handler. Only ABI subroutines qualify.
pub fn wrap_method(handler: &Handler) -> Result<Expr, RouterError> {
    match handler {
        Handler::Abi(sub) => wrap_abi_method(sub),
        other => Err(RouterError::NotAbiHandler {
            found: other.kind_name(),
        }),
    }
}

fn wrap_abi_method(sub: &AbiSubroutine) -> Result<Expr, RouterError> {
    let specs = sub.expected_arg_types()?;
    let args: Vec<AbiValue> = specs.iter().cloned().map(AbiValue::new).collect();
    let mut steps = decode_args(&specs, &args)?;

    match sub.output_type() {
        None => steps.push(sub.call(&args)?),
        Some(spec) => {
            let output = AbiValue::new(spec.clone());
            steps.push(Expr::Seq(vec![
                sub.call_into(&args, &output)?,
                method_return(&output),
            ]));
        }
    }
    steps.push(Expr::approve());

    trace!(method = sub.name(), args = args.len(), "method wrapped");
    Ok(Expr::Seq(steps))
}

/// Decode each argument from its application argument.
///
/// Past the cutoff, the last directly addressable argument carries a tuple
/// of every remaining parameter.
fn decode_args(specs: &[TypeSpec], args: &[AbiValue]) -> Result<Vec<Expr>, RouterError> {
    if args.len() <= METHOD_ARG_NUM_CUTOFF {
        return Ok(args
            .iter()
            .zip(1u8..)
            .map(|(arg, index)| arg.decode(Expr::TxnArg(index)))
            .collect());
    }

    let direct = METHOD_ARG_NUM_CUTOFF - 1;
    let mut steps: Vec<Expr> = args[..direct]
        .iter()
        .zip(1u8..)
        .map(|(arg, index)| arg.decode(Expr::TxnArg(index)))
        .collect();

    let tuple = AbiValue::new(TypeSpec::Tuple(specs[direct..].to_vec()));
    steps.push(tuple.decode(Expr::TxnArg(METHOD_ARG_NUM_CUTOFF as u8)));
    for (i, arg) in args[direct..].iter().enumerate() {
        steps.push(tuple.tuple_element(i)?.store_into(arg)?);
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use teal_abi::AbiParam;
    use teal_ir::{Bytes, Subroutine};

    fn void_abi(name: &str, params: usize) -> Rc<AbiSubroutine> {
        let params = (0..params)
            .map(|_| ("x", AbiParam::Abi(TypeSpec::uint64())))
            .collect();
        AbiSubroutine::new(name, params, None, |_, _| {
            Expr::log(Expr::Bytes(Bytes::utf8("hi")))
        })
    }

    #[test]
    fn bare_expression_gets_implicit_approve() {
        let body = Expr::log(Expr::Bytes(Bytes::utf8("hi")));
        let wrapped = wrap_bare(&Handler::Expr(body.clone())).unwrap();
        assert_eq!(wrapped, Expr::Seq(vec![body, Expr::approve()]));
    }

    #[test]
    fn bare_expression_with_return_is_kept() {
        let wrapped = wrap_bare(&Handler::Expr(Expr::reject())).unwrap();
        assert_eq!(wrapped, Expr::reject());
    }

    #[test]
    fn bare_expression_must_be_none_typed() {
        let err = wrap_bare(&Handler::Expr(Expr::Int(1))).unwrap_err();
        assert_eq!(
            err,
            RouterError::BareReturnType {
                found: TealType::Uint64
            }
        );
    }

    #[test]
    fn bare_subroutine_shapes() {
        let ok = Subroutine::new("noop", TealType::None, vec![], |_| {
            Expr::log(Expr::Bytes(Bytes::utf8("noop")))
        });
        assert!(wrap_bare(&Handler::Subroutine(ok)).is_ok());

        let valued = Subroutine::new("one", TealType::Uint64, vec![], |_| Expr::Int(1));
        assert!(matches!(
            wrap_bare(&Handler::Subroutine(valued)),
            Err(RouterError::BareReturnType {
                found: TealType::Uint64
            })
        ));

        let takes_arg = Subroutine::new("arg", TealType::None, vec![TealType::Uint64], |args| {
            Expr::Pop(Box::new(args[0].clone()))
        });
        assert!(matches!(
            wrap_bare(&Handler::Subroutine(takes_arg)),
            Err(RouterError::BareArity { found: 1, .. })
        ));
    }

    #[test]
    fn bare_abi_subroutine_shapes() {
        assert!(wrap_bare(&Handler::Abi(void_abi("v", 0))).is_ok());
        assert!(matches!(
            wrap_bare(&Handler::Abi(void_abi("v", 2))),
            Err(RouterError::BareArity { found: 2, .. })
        ));
        let valued = AbiSubroutine::new("r", vec![], Some(TypeSpec::uint64()), |_, out| {
            out.unwrap().set(Expr::Int(1)).unwrap()
        });
        assert!(matches!(
            wrap_bare(&Handler::Abi(valued)),
            Err(RouterError::BareOutput { .. })
        ));
    }

    #[test]
    fn method_path_rejects_non_abi_handlers() {
        let err = wrap_handler(true, &Handler::Expr(Expr::approve())).unwrap_err();
        assert_eq!(err, RouterError::NotAbiHandler { found: "expression" });
    }

    #[test]
    fn method_path_rejects_raw_parameters() {
        let sub = AbiSubroutine::new(
            "raw",
            vec![("n", AbiParam::Raw(TealType::Uint64))],
            None,
            |_, _| Expr::log(Expr::Bytes(Bytes::utf8("raw"))),
        );
        assert!(matches!(
            wrap_method(&Handler::Abi(sub)),
            Err(RouterError::NotRoutable { .. })
        ));
    }

    #[test]
    fn arguments_under_cutoff_decode_directly() {
        let wrapped = wrap_method(&Handler::Abi(void_abi("m", 3))).unwrap();
        let Expr::Seq(steps) = wrapped else {
            panic!("expected a sequence");
        };
        assert_eq!(steps.len(), 3 + 2);
        for (i, step) in steps[..3].iter().enumerate() {
            let Expr::Store(_, value) = step else {
                panic!("expected a decode store");
            };
            assert_eq!(**value, Expr::btoi(Expr::TxnArg(i as u8 + 1)));
        }
        assert_eq!(steps.last(), Some(&Expr::approve()));
    }
}
