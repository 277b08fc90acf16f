use std::fmt;

/// An error raised while building or assembling an expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    /// A byte literal named a base other than base16, base32, or base64.
    InvalidBase(String),
    /// A byte literal's text is not valid in its declared base.
    InvalidBytes { base: &'static str, text: String },
    /// A template variable name does not start with `TMPL_`.
    InvalidTemplate(String),
    /// A program uses more scratch slots than the AVM provides.
    TooManySlots { used: usize },
    /// A subroutine was invoked with the wrong number of arguments.
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    /// The requested TEAL version is outside the supported range.
    UnsupportedVersion(u8),
}

impl fmt::Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrError::InvalidBase(base) => write!(
                f,
                "invalid base {base}, need to be base32, base64, or base16"
            ),
            IrError::InvalidBytes { base, text } => {
                write!(f, "{text:?} is not a valid {base} string")
            }
            IrError::InvalidTemplate(name) => {
                write!(f, "template variable {name:?} must start with TMPL_")
            }
            IrError::TooManySlots { used } => write!(
                f,
                "program uses {used} scratch slots, at most {} are available",
                crate::slot::NUM_SLOTS
            ),
            IrError::ArityMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "subroutine {name} takes {expected} argument(s), called with {found}"
            ),
            IrError::UnsupportedVersion(v) => write!(
                f,
                "unsupported TEAL version {v}, expected {}..={}",
                crate::program::MIN_VERSION,
                crate::program::MAX_VERSION
            ),
        }
    }
}

impl std::error::Error for IrError {}
