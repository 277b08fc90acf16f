//! The method registry and dispatch assembler.
//!
//! ## Dispatch order
//!
//! Both programs are a chain of guarded branches tried in order, ending in
//! an explicit reject:
//!
//! 1. Bare-call actions in completion-kind order. Each is guarded by
//!    `NumAppArgs == 0`, its completion kind (approval program only), and its
//!    call config.
//! 2. Methods in registration order. Each is guarded by a selector match on
//!    argument 0, the method config's condition for that program, and the
//!    method's explicit condition if it has one.
//!
//! Guards that fold to a constant are resolved here: a false guard drops its
//! branch and a true guard replaces everything after it.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use teal_abi::{AbiSubroutine, Contract, Method};
use teal_ir::{compile_program, Expr, OnComplete, Program, TealType, TxnField};
use tracing::debug;

use crate::ast_builder::{wrap_bare, wrap_method};
use crate::cond::Cond;
use crate::error::RouterError;
use crate::handler::Handler;
use crate::method_config::MethodConfig;
use crate::on_complete::{BareCallActions, OnCompleteAction};
use crate::options::CompileOptions;

/// The approval program, the clear-state program, and the descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterPrograms<T> {
    pub approval: T,
    pub clear_state: T,
    pub contract: Contract,
}

#[derive(Debug)]
struct MethodEntry {
    method: Method,
    handler: Rc<AbiSubroutine>,
    config: MethodConfig,
    condition: Option<Expr>,
    wrapped: Expr,
}

#[derive(Debug)]
pub struct Router {
    name: String,
    bare_calls: BareCallActions,
    methods: Vec<MethodEntry>,
    selectors: FxHashMap<[u8; 4], String>,
}

impl Router {
    pub fn new(name: impl Into<String>) -> Router {
        Router {
            name: name.into(),
            bare_calls: BareCallActions::default(),
            methods: Vec::new(),
            selectors: FxHashMap::default(),
        }
    }

    /// A router starting from the given bare-call actions.
    pub fn with_bare_calls(
        name: impl Into<String>,
        bare_calls: BareCallActions,
    ) -> Result<Router, RouterError> {
        for (_, action) in bare_calls.iter() {
            check_bare(action)?;
        }
        let mut router = Router::new(name);
        router.bare_calls = bare_calls;
        Ok(router)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bare_calls(&self) -> &BareCallActions {
        &self.bare_calls
    }

    /// Replace the bare-call action for `kind`.
    pub fn set_bare_call_action(
        &mut self,
        kind: OnComplete,
        action: OnCompleteAction,
    ) -> Result<(), RouterError> {
        check_bare(&action)?;
        debug!(kind = kind.field_name(), config = ?action.call_config(), "bare call action set");
        self.bare_calls.set(kind, action);
        Ok(())
    }

    /// Register a method handler under its own name.
    ///
    /// `method_config` defaults to [`MethodConfig::arc4_compliant`].
    pub fn add_method_handler(
        &mut self,
        handler: impl Into<Handler>,
        explicit_condition: Option<Expr>,
        method_config: Option<MethodConfig>,
    ) -> Result<Method, RouterError> {
        self.register(handler.into(), None, explicit_condition, method_config)
    }

    /// Register a method handler under `name` instead of the routine's name.
    pub fn add_method_handler_named(
        &mut self,
        handler: impl Into<Handler>,
        name: &str,
        explicit_condition: Option<Expr>,
        method_config: Option<MethodConfig>,
    ) -> Result<Method, RouterError> {
        self.register(handler.into(), Some(name), explicit_condition, method_config)
    }

    fn register(
        &mut self,
        handler: Handler,
        name: Option<&str>,
        condition: Option<Expr>,
        method_config: Option<MethodConfig>,
    ) -> Result<Method, RouterError> {
        let Handler::Abi(sub) = &handler else {
            return Err(RouterError::NotAbiHandler {
                found: handler.kind_name(),
            });
        };
        let method = sub.method(name)?;
        let signature = method.signature();

        let config = method_config.unwrap_or_else(MethodConfig::arc4_compliant);
        if config.is_never() {
            return Err(RouterError::UnreachableMethod { signature });
        }

        if let Some(condition) = &condition {
            let found = condition.type_of();
            if found != TealType::Uint64 {
                return Err(RouterError::ConditionType { found });
            }
        }

        let selector = method.selector();
        if let Some(existing) = self.selectors.get(&selector) {
            return Err(RouterError::DuplicateMethod {
                signature,
                existing: existing.clone(),
            });
        }

        let wrapped = wrap_method(&handler)?;
        debug!(
            signature = %signature,
            selector = %hex::encode(selector),
            config = ?config.slots(),
            "method registered"
        );
        self.selectors.insert(selector, signature);
        self.methods.push(MethodEntry {
            method: method.clone(),
            handler: Rc::clone(sub),
            config,
            condition,
            wrapped,
        });
        Ok(method)
    }

    /// Registered handlers with their configs, in registration order.
    pub fn methods(&self) -> impl Iterator<Item = (&Method, &Rc<AbiSubroutine>, MethodConfig)> {
        self.methods
            .iter()
            .map(|entry| (&entry.method, &entry.handler, entry.config))
    }

    /// The interface descriptor: every registered method, in registration order.
    pub fn contract_construct(&self) -> Contract {
        Contract::new(
            self.name.clone(),
            self.methods.iter().map(|entry| entry.method.clone()).collect(),
        )
    }

    /// Both programs as expression trees.
    pub fn build_program(&self) -> Result<RouterPrograms<Expr>, RouterError> {
        let mut approval = Vec::new();
        let mut clear_state = Vec::new();

        for (kind, action) in self.bare_calls.iter() {
            let Some(handler) = action.action() else {
                continue;
            };
            let body = wrap_bare(handler)?;
            let config_cond = action.call_config().condition_under_config();
            if kind == OnComplete::ClearState {
                clear_state.push((Cond::all([no_app_args(), config_cond]), body));
            } else {
                approval.push((
                    Cond::all([no_app_args(), on_completion_is(kind), config_cond]),
                    body,
                ));
            }
        }

        for entry in &self.methods {
            let selector = Cond::Runtime(Expr::eq(
                Expr::TxnArg(0),
                Expr::MethodSelector(entry.method.signature()),
            ));
            let explicit = entry.condition.clone().map_or(Cond::AlwaysTrue, Cond::Runtime);
            approval.push((
                Cond::all([
                    selector.clone(),
                    entry.config.approval_cond(),
                    explicit.clone(),
                ]),
                entry.wrapped.clone(),
            ));
            clear_state.push((
                Cond::all([selector, entry.config.clear_state_cond(), explicit]),
                entry.wrapped.clone(),
            ));
        }

        debug!(
            contract = %self.name,
            approval_branches = approval.len(),
            clear_state_branches = clear_state.len(),
            "dispatch assembled"
        );
        Ok(RouterPrograms {
            approval: dispatch_chain(approval),
            clear_state: dispatch_chain(clear_state),
            contract: self.contract_construct(),
        })
    }

    /// Both programs lowered to basic-block graphs, with their subroutines.
    pub fn compile(&self) -> Result<RouterPrograms<Program>, RouterError> {
        let built = self.build_program()?;
        Ok(RouterPrograms {
            approval: compile_program(&built.approval),
            clear_state: compile_program(&built.clear_state),
            contract: built.contract,
        })
    }

    /// Both programs as TEAL source.
    pub fn compile_program(
        &self,
        options: &CompileOptions,
    ) -> Result<RouterPrograms<String>, RouterError> {
        options.validate()?;
        let compiled = self.compile()?;
        let approval = compiled.approval.assemble(options.version)?;
        let clear_state = compiled.clear_state.assemble(options.version)?;
        debug!(
            contract = %self.name,
            version = options.version,
            approval_lines = approval.lines().count(),
            clear_state_lines = clear_state.lines().count(),
            "programs compiled"
        );
        Ok(RouterPrograms {
            approval,
            clear_state,
            contract: compiled.contract,
        })
    }
}

fn check_bare(action: &OnCompleteAction) -> Result<(), RouterError> {
    match action.action() {
        Some(handler) => wrap_bare(handler).map(|_| ()),
        None => Ok(()),
    }
}

fn no_app_args() -> Cond {
    Cond::Runtime(Expr::eq(Expr::Txn(TxnField::NumAppArgs), Expr::Int(0)))
}

fn on_completion_is(kind: OnComplete) -> Cond {
    Cond::Runtime(Expr::eq(
        Expr::Txn(TxnField::OnCompletion),
        Expr::OnCompleteConst(kind),
    ))
}

/// Nest branches into an if/else chain ending in reject.
fn dispatch_chain(branches: Vec<(Cond, Expr)>) -> Expr {
    branches
        .into_iter()
        .rev()
        .fold(Expr::reject(), |rest, (cond, body)| match cond {
            Cond::AlwaysFalse => rest,
            Cond::AlwaysTrue => body,
            Cond::Runtime(guard) => Expr::if_else(guard, body, rest),
        })
}
