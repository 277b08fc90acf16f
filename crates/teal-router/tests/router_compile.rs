//! End-to-end router compilation: TEAL text and the interface descriptor.

use std::rc::Rc;

use teal_abi::{AbiParam, AbiSubroutine, AbiValue, Contract, Method, TypeSpec};
use teal_ir::{BinaryOp, Bytes, Expr, OnComplete};
use teal_router::{
    BareCallActions, CallConfig, CompileOptions, MethodConfig, OnCompleteAction, Router,
    RouterError,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn ping() -> Rc<AbiSubroutine> {
    AbiSubroutine::new("ping", vec![], None, |_, _| {
        Expr::log(Expr::Bytes(Bytes::utf8("pong")))
    })
}

fn add() -> Rc<AbiSubroutine> {
    AbiSubroutine::new(
        "add",
        vec![
            ("a", AbiParam::Abi(TypeSpec::uint64())),
            ("b", AbiParam::Abi(TypeSpec::uint64())),
        ],
        Some(TypeSpec::uint64()),
        |args, out| {
            let sum = Expr::binary(
                BinaryOp::Add,
                args[0].abi().unwrap().get(),
                args[1].abi().unwrap().get(),
            );
            out.unwrap().set(sum).unwrap()
        },
    )
}

fn echo() -> Rc<AbiSubroutine> {
    AbiSubroutine::new(
        "echo",
        vec![("s", AbiParam::Abi(TypeSpec::String))],
        Some(TypeSpec::String),
        |args, out| args[0].abi().unwrap().store_into(out.unwrap()).unwrap(),
    )
}

fn qrem() -> Rc<AbiSubroutine> {
    AbiSubroutine::new(
        "qrem",
        vec![
            ("a", AbiParam::Abi(TypeSpec::uint64())),
            ("b", AbiParam::Abi(TypeSpec::uint64())),
        ],
        Some(TypeSpec::Tuple(vec![TypeSpec::uint64(), TypeSpec::uint64()])),
        |args, out| {
            let (a, b) = (args[0].abi().unwrap(), args[1].abi().unwrap());
            let q = AbiValue::new(TypeSpec::uint64());
            let r = AbiValue::new(TypeSpec::uint64());
            Expr::Seq(vec![
                q.set(Expr::binary(BinaryOp::Div, a.get(), b.get())).unwrap(),
                r.set(Expr::binary(BinaryOp::Mod, a.get(), b.get())).unwrap(),
                out.unwrap().set_tuple(&[q, r]).unwrap(),
            ])
        },
    )
}

/// Subroutine labels carry a process-wide id; pin it for snapshots.
fn pin_label(teal: &str, sub: &AbiSubroutine) -> String {
    teal.replace(&sub.decl().label(), sub.name())
}

// ── Tests ───────────────────────────────────────────────────────────────

#[test]
fn compiles_bare_and_method_branches() {
    let actions = BareCallActions::default()
        .with(OnComplete::OptIn, OnCompleteAction::always(Expr::approve()));
    let mut router = Router::with_bare_calls("demo", actions).unwrap();
    let ping = ping();
    router.add_method_handler(Rc::clone(&ping), None, None).unwrap();

    let compiled = router.compile_program(&CompileOptions::default()).unwrap();

    insta::assert_snapshot!(pin_label(&compiled.approval, &ping), @r#"
    #pragma version 6
    txn NumAppArgs
    int 0
    ==
    txn OnCompletion
    int OptIn
    ==
    &&
    bnz main_l4
    txna ApplicationArgs 0
    method "ping()void"
    ==
    bnz main_l3
    int 0
    return
    main_l3:
    callsub ping
    int 1
    return
    main_l4:
    int 1
    return
    ping:
    byte "pong"
    log
    retsub
    "#);

    insta::assert_snapshot!(pin_label(&compiled.clear_state, &ping), @r#"
    #pragma version 6
    txna ApplicationArgs 0
    method "ping()void"
    ==
    bnz main_l2
    int 0
    return
    main_l2:
    callsub ping
    int 1
    return
    ping:
    byte "pong"
    log
    retsub
    "#);
}

#[test]
fn descriptor_json() {
    let mut router = Router::new("calculator");
    router.add_method_handler(add(), None, None).unwrap();
    router.add_method_handler(ping(), None, None).unwrap();

    insta::assert_snapshot!(router.contract_construct().to_json().unwrap(), @r#"
    {
      "name": "calculator",
      "methods": [
        {
          "name": "add",
          "args": [
            {
              "type": "uint64"
            },
            {
              "type": "uint64"
            }
          ],
          "returns": {
            "type": "uint64"
          }
        },
        {
          "name": "ping",
          "args": [],
          "returns": {
            "type": "void"
          }
        }
      ]
    }
    "#);
}

#[test]
fn descriptor_matches_reference_in_registration_order() {
    let mut router = Router::new("ordered");
    let handlers = [echo(), add(), ping()];
    for handler in &handlers {
        router.add_method_handler(Rc::clone(handler), None, None).unwrap();
    }

    let reference = Contract::new(
        "ordered",
        vec![
            Method::from_signature("echo(string)string").unwrap(),
            Method::from_signature("add(uint64,uint64)uint64").unwrap(),
            Method::from_signature("ping()void").unwrap(),
        ],
    );
    assert_eq!(router.contract_construct(), reference);

    let signatures: Vec<String> = router
        .contract_construct()
        .methods
        .iter()
        .map(Method::signature)
        .collect();
    for (signature, handler) in signatures.iter().zip(&handlers) {
        assert_eq!(*signature, handler.method_signature(None).unwrap());
    }
}

#[test]
fn method_branches_follow_registration_order() {
    let mut router = Router::new("ordered");
    router.add_method_handler(echo(), None, None).unwrap();
    router.add_method_handler(add(), None, None).unwrap();

    let teal = router.compile_program(&CompileOptions::default()).unwrap().approval;
    let echo_at = teal.find("method \"echo(string)string\"").unwrap();
    let add_at = teal.find("method \"add(uint64,uint64)uint64\"").unwrap();
    assert!(echo_at < add_at);
    assert!(teal.contains("byte 0x151f7c75"));
}

#[test]
fn renamed_registration_collides_with_existing_signature() {
    let mut router = Router::new("dupes");
    router.add_method_handler(add(), None, None).unwrap();
    let other = AbiSubroutine::new(
        "plus",
        vec![
            ("x", AbiParam::Abi(TypeSpec::uint64())),
            ("y", AbiParam::Abi(TypeSpec::uint64())),
        ],
        Some(TypeSpec::uint64()),
        |args, out| args[0].abi().unwrap().store_into(out.unwrap()).unwrap(),
    );
    let err = router
        .add_method_handler_named(other, "add", None, None)
        .unwrap_err();
    assert_eq!(
        err,
        RouterError::DuplicateMethod {
            signature: "add(uint64,uint64)uint64".to_string(),
            existing: "add(uint64,uint64)uint64".to_string(),
        }
    );
}

#[test]
fn create_only_method_in_approval_program() {
    let mut router = Router::new("create");
    let config = MethodConfig::never().with(OnComplete::NoOp, CallConfig::Create);
    router.add_method_handler(ping(), None, Some(config)).unwrap();

    let compiled = router.compile_program(&CompileOptions::new(8).unwrap()).unwrap();
    assert!(compiled.approval.starts_with("#pragma version 8\n"));
    assert!(compiled.approval.contains("txn ApplicationID\nint 0\n==\n"));
    assert!(compiled.approval.contains("int NoOp"));
    // The clear-state slot is never, so the clear program only rejects.
    assert_eq!(compiled.clear_state, "#pragma version 8\nint 0\nreturn");
}

#[test]
fn subroutine_is_shared_between_branches() {
    let mut router = Router::new("shared");
    let add = add();
    router.add_method_handler(Rc::clone(&add), None, None).unwrap();
    router
        .add_method_handler_named(Rc::clone(&add), "sum", None, None)
        .unwrap();

    let compiled = router.compile().unwrap();
    assert_eq!(compiled.approval.subroutines.len(), 1);
    let teal = compiled.approval.assemble(6).unwrap();
    assert_eq!(teal.matches("retsub").count(), 1);
    assert_eq!(teal.matches(&format!("callsub {}", add.decl().label())).count(), 2);
}

#[test]
fn tuple_returning_method() {
    let mut router = Router::new("math");
    let qrem = qrem();
    let method = router.add_method_handler(Rc::clone(&qrem), None, None).unwrap();
    assert_eq!(method.signature(), "qrem(uint64,uint64)(uint64,uint64)");
    assert_eq!(method.returns.type_name, "(uint64,uint64)");

    let teal = router.compile_program(&CompileOptions::default()).unwrap().approval;
    assert!(teal.contains("method \"qrem(uint64,uint64)(uint64,uint64)\""));
    let body = &teal[teal.find(&format!("{}:", qrem.decl().label())).unwrap()..];
    assert!(body.contains("/\n"));
    assert!(body.contains("%\n"));
    assert!(body.contains("concat"));
    assert!(teal.contains("byte 0x151f7c75"));
}
