//! ABI layer for routed applications.
//!
//! - [`type_spec`]: ABI types, their encoding lengths, and parsing
//! - [`value`]: typed scratch values and tuple element projection
//! - [`subroutine`]: routines with ABI-typed parameters and output
//! - [`method`]: signatures, selectors, and the contract descriptor

pub mod error;
pub mod method;
pub mod subroutine;
pub mod type_spec;
pub mod value;

pub use error::AbiError;
pub use method::{method_selector, Contract, Method, MethodArg, MethodReturns};
pub use subroutine::{AbiParam, AbiSubroutine, SubroutineArg};
pub use type_spec::TypeSpec;
pub use value::{method_return, AbiValue, TupleElement, RETURN_PREFIX};
