use teal_ir::{Expr, TxnField};

use crate::cond::Cond;

/// When a handler may run relative to application creation.
///
/// A two-bit mask: bit 0 allows ordinary calls, bit 1 allows the creating
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallConfig {
    #[default]
    Never = 0,
    Call = 1,
    Create = 2,
    All = 3,
}

impl CallConfig {
    pub const VARIANTS: [CallConfig; 4] = [
        CallConfig::Never,
        CallConfig::Call,
        CallConfig::Create,
        CallConfig::All,
    ];

    const CAN_CALL: u8 = 1;
    const CAN_CREATE: u8 = 2;

    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn from_bits(bits: u8) -> CallConfig {
        match bits & 3 {
            0 => CallConfig::Never,
            1 => CallConfig::Call,
            2 => CallConfig::Create,
            _ => CallConfig::All,
        }
    }

    pub fn allows_call(self) -> bool {
        self.bits() & Self::CAN_CALL != 0
    }

    pub fn allows_create(self) -> bool {
        self.bits() & Self::CAN_CREATE != 0
    }

    /// The guard that holds exactly when this config permits the current
    /// invocation.
    pub fn condition_under_config(self) -> Cond {
        match self {
            CallConfig::Never => Cond::AlwaysFalse,
            CallConfig::All => Cond::AlwaysTrue,
            CallConfig::Call => Cond::Runtime(Expr::neq(
                Expr::Txn(TxnField::ApplicationId),
                Expr::Int(0),
            )),
            CallConfig::Create => Cond::Runtime(Expr::eq(
                Expr::Txn(TxnField::ApplicationId),
                Expr::Int(0),
            )),
        }
    }
}

impl std::ops::BitOr for CallConfig {
    type Output = CallConfig;

    fn bitor(self, rhs: CallConfig) -> CallConfig {
        CallConfig::from_bits(self.bits() | rhs.bits())
    }
}

impl std::ops::BitAnd for CallConfig {
    type Output = CallConfig;

    fn bitand(self, rhs: CallConfig) -> CallConfig {
        CallConfig::from_bits(self.bits() & rhs.bits())
    }
}
