use std::fmt;

use teal_ir::TealType;

use crate::type_spec::TypeSpec;

/// An error in ABI type construction, value access, or signature handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// A type string does not follow the canonical ABI grammar.
    InvalidType(String),
    /// A method signature is not of the form `name(type,...)return_type`.
    InvalidSignature(String),
    /// A static byte length was requested for a dynamic type.
    DynamicLength(TypeSpec),
    /// A tuple element index is past the end of the tuple.
    IndexOutOfRange { index: usize, len: usize },
    /// An operation that only applies to tuples was given another type.
    NotATuple(TypeSpec),
    /// Two ABI values of different types were combined.
    TypeMismatch { expected: TypeSpec, found: TypeSpec },
    /// An expression of the wrong stack type was assigned to an ABI value.
    ValueType {
        spec: TypeSpec,
        expected: TealType,
        found: TealType,
    },
    /// A routine declares a parameter that is not ABI-typed.
    NotRoutable { name: String, param: String },
    /// A void routine's result was stored into a value.
    NoOutput(String),
    /// A tuple was built from the wrong number of components.
    TupleArity {
        spec: TypeSpec,
        expected: usize,
        found: usize,
    },
    /// An encoding length does not fit the ABI's size limits.
    TooLarge(TypeSpec),
    /// A routine was invoked with the wrong number of arguments.
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for AbiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiError::InvalidType(s) => write!(f, "invalid ABI type: {s:?}"),
            AbiError::InvalidSignature(s) => write!(f, "invalid method signature: {s:?}"),
            AbiError::DynamicLength(spec) => {
                write!(f, "type {spec} is dynamic and has no static byte length")
            }
            AbiError::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for tuple of length {len}")
            }
            AbiError::NotATuple(spec) => write!(f, "type {spec} is not a tuple"),
            AbiError::TypeMismatch { expected, found } => {
                write!(f, "expected ABI type {expected}, found {found}")
            }
            AbiError::ValueType {
                spec,
                expected,
                found,
            } => write!(
                f,
                "cannot set {spec} from a {found} expression, expected {expected}"
            ),
            AbiError::NotRoutable { name, param } => write!(
                f,
                "subroutine {name} is not routable: parameter {param} is not ABI-typed"
            ),
            AbiError::TupleArity {
                spec,
                expected,
                found,
            } => write!(
                f,
                "tuple {spec} has {expected} element(s), built from {found}"
            ),
            AbiError::TooLarge(spec) => write!(f, "encoding of {spec} is too large"),
            AbiError::NoOutput(name) => write!(f, "subroutine {name} has no output"),
            AbiError::ArityMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "subroutine {name} takes {expected} argument(s), called with {found}"
            ),
        }
    }
}

impl std::error::Error for AbiError {}
