//! Method-dispatch compiler for routed applications.
//!
//! ## Architecture
//!
//! - [`call_config`]: when a handler may run relative to creation
//! - [`cond`]: guards folded at compile time
//! - [`on_complete`]: bare-call actions per completion kind
//! - [`method_config`]: per-method call configs and their guards
//! - [`ast_builder`]: wrapping handlers into self-contained branches
//! - [`router`]: registration, dispatch assembly, and the descriptor
//!
//! ## Pipeline
//!
//! ```text
//! Router (handlers + configs) -> guarded branches -> approval / clear-state Expr
//!     -> Program (basic blocks) -> TEAL text
//! ```

pub mod ast_builder;
pub mod call_config;
pub mod cond;
pub mod error;
pub mod handler;
pub mod method_config;
pub mod on_complete;
pub mod options;
pub mod router;

pub use ast_builder::{wrap_handler, MAX_APP_ARGS, METHOD_ARG_NUM_CUTOFF};
pub use call_config::CallConfig;
pub use cond::Cond;
pub use error::RouterError;
pub use handler::Handler;
pub use method_config::MethodConfig;
pub use on_complete::{BareCallActions, OnCompleteAction};
pub use options::CompileOptions;
pub use router::{Router, RouterPrograms};
