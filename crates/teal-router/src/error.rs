use std::fmt;

use teal_abi::AbiError;
use teal_ir::{IrError, TealType};

use crate::call_config::CallConfig;

/// A contract definition that cannot be compiled.
///
/// All of these are raised while building or compiling a [`crate::Router`];
/// none of them can occur in a deployed program.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterError {
    /// An action was bound together with `CallConfig::Never`.
    Contradiction { config: CallConfig },
    /// A method was registered with a config that never runs.
    UnreachableMethod { signature: String },
    /// A bare handler returns a value.
    BareReturnType { found: TealType },
    /// A bare handler takes arguments.
    BareArity { name: String, found: usize },
    /// An ABI routine used as a bare handler has a non-void output.
    BareOutput { name: String, found: String },
    /// A method handler has a parameter that is not ABI-typed.
    NotRoutable { name: String, param: String },
    /// Something other than an ABI routine was registered as a method.
    NotAbiHandler { found: &'static str },
    /// A method signature or selector is already registered.
    DuplicateMethod { signature: String, existing: String },
    /// An explicit method condition does not produce a `uint64`.
    ConditionType { found: TealType },
    /// The requested TEAL version is outside the supported range.
    InvalidVersion(u8),
    /// Compile options could not be read or parsed.
    Options(String),
    Abi(AbiError),
    Ir(IrError),
}

const BARE_SHAPES: &str = "a none-typed expression, a zero-argument none-returning subroutine, \
                           or a zero-argument void ABI subroutine";

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::Contradiction { config } => write!(
                f,
                "contradicting on-complete action: an action is set with call config {config:?}"
            ),
            RouterError::UnreachableMethod { signature } => write!(
                f,
                "method {signature} is never executed under its call config"
            ),
            RouterError::BareReturnType { found } => write!(
                f,
                "bare handler must return none, found {found}; expected {BARE_SHAPES}"
            ),
            RouterError::BareArity { name, found } => write!(
                f,
                "bare handler {name} takes {found} argument(s); expected {BARE_SHAPES}"
            ),
            RouterError::BareOutput { name, found } => write!(
                f,
                "bare handler {name} returns {found}; expected {BARE_SHAPES}"
            ),
            RouterError::NotRoutable { name, param } => write!(
                f,
                "method handler {name} is not routable: parameter {param} is not ABI-typed"
            ),
            RouterError::NotAbiHandler { found } => write!(
                f,
                "only ABI-returning subroutines are registrable as methods, found {found}"
            ),
            RouterError::DuplicateMethod {
                signature,
                existing,
            } => {
                if signature == existing {
                    write!(f, "method {signature} is already registered")
                } else {
                    write!(
                        f,
                        "method {signature} has the same selector as registered method {existing}"
                    )
                }
            }
            RouterError::ConditionType { found } => write!(
                f,
                "method condition must be uint64, found {found}"
            ),
            RouterError::InvalidVersion(v) => write!(
                f,
                "unsupported TEAL version {v}, expected {}..={}",
                teal_ir::program::MIN_VERSION,
                teal_ir::program::MAX_VERSION
            ),
            RouterError::Options(msg) => write!(f, "{msg}"),
            RouterError::Abi(err) => write!(f, "{err}"),
            RouterError::Ir(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<AbiError> for RouterError {
    fn from(err: AbiError) -> Self {
        match err {
            AbiError::NotRoutable { name, param } => RouterError::NotRoutable { name, param },
            other => RouterError::Abi(other),
        }
    }
}

impl From<IrError> for RouterError {
    fn from(err: IrError) -> Self {
        RouterError::Ir(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contradiction_names_the_config() {
        let err = RouterError::Contradiction {
            config: CallConfig::Never,
        };
        assert!(err.to_string().contains("call config Never"));
    }

    #[test]
    fn bare_shape_errors_name_what_was_found() {
        let err = RouterError::BareReturnType {
            found: TealType::Uint64,
        };
        assert!(err.to_string().contains("found uint64"));
        let err = RouterError::BareArity {
            name: "f".to_string(),
            found: 2,
        };
        assert!(err.to_string().contains("takes 2 argument(s)"));
    }

    #[test]
    fn not_routable_is_lifted_from_abi() {
        let err: RouterError = AbiError::NotRoutable {
            name: "m".to_string(),
            param: "x".to_string(),
        }
        .into();
        assert_eq!(
            err,
            RouterError::NotRoutable {
                name: "m".to_string(),
                param: "x".to_string(),
            }
        );
    }
}
