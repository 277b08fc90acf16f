//! Value types and the fixed enumerations the AVM exposes to programs.

use std::fmt;

/// The stack type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TealType {
    Uint64,
    Bytes,
    /// Either stack type; used for raw subroutine arguments.
    Anytype,
    /// The expression leaves nothing on the stack.
    None,
}

impl TealType {
    /// Whether a value of type `self` may be used where `expected` is required.
    pub fn satisfies(self, expected: TealType) -> bool {
        self == expected || (expected == TealType::Anytype && self != TealType::None)
    }
}

impl fmt::Display for TealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TealType::Uint64 => write!(f, "uint64"),
            TealType::Bytes => write!(f, "bytes"),
            TealType::Anytype => write!(f, "any"),
            TealType::None => write!(f, "none"),
        }
    }
}

/// The completion kind an application call requests.
///
/// Discriminants match the on-chain `OnCompletion` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OnComplete {
    NoOp = 0,
    OptIn = 1,
    CloseOut = 2,
    ClearState = 3,
    UpdateApplication = 4,
    DeleteApplication = 5,
}

impl OnComplete {
    /// All six completion kinds in discriminant order.
    pub const ALL: [OnComplete; 6] = [
        OnComplete::NoOp,
        OnComplete::OptIn,
        OnComplete::CloseOut,
        OnComplete::ClearState,
        OnComplete::UpdateApplication,
        OnComplete::DeleteApplication,
    ];

    /// The five completion kinds handled by the approval program.
    pub const APPROVAL: [OnComplete; 5] = [
        OnComplete::NoOp,
        OnComplete::OptIn,
        OnComplete::CloseOut,
        OnComplete::UpdateApplication,
        OnComplete::DeleteApplication,
    ];

    pub fn value(self) -> u64 {
        self as u64
    }

    /// Named-constant spelling accepted by the assembler (`int NoOp`).
    pub fn teal_name(self) -> &'static str {
        match self {
            OnComplete::NoOp => "NoOp",
            OnComplete::OptIn => "OptIn",
            OnComplete::CloseOut => "CloseOut",
            OnComplete::ClearState => "ClearState",
            OnComplete::UpdateApplication => "UpdateApplication",
            OnComplete::DeleteApplication => "DeleteApplication",
        }
    }

    /// Snake-case field name, as used by configuration structs.
    pub fn field_name(self) -> &'static str {
        match self {
            OnComplete::NoOp => "no_op",
            OnComplete::OptIn => "opt_in",
            OnComplete::CloseOut => "close_out",
            OnComplete::ClearState => "clear_state",
            OnComplete::UpdateApplication => "update_application",
            OnComplete::DeleteApplication => "delete_application",
        }
    }
}

impl fmt::Display for OnComplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.teal_name())
    }
}

/// Fields of the current transaction readable with `txn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnField {
    ApplicationId,
    OnCompletion,
    Sender,
    NumAppArgs,
}

impl TxnField {
    pub fn type_of(self) -> TealType {
        match self {
            TxnField::Sender => TealType::Bytes,
            TxnField::ApplicationId | TxnField::OnCompletion | TxnField::NumAppArgs => {
                TealType::Uint64
            }
        }
    }

    pub fn teal_name(self) -> &'static str {
        match self {
            TxnField::ApplicationId => "ApplicationID",
            TxnField::OnCompletion => "OnCompletion",
            TxnField::Sender => "Sender",
            TxnField::NumAppArgs => "NumAppArgs",
        }
    }
}

/// Global fields readable with `global`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalField {
    CreatorAddress,
    CurrentApplicationId,
}

impl GlobalField {
    pub fn type_of(self) -> TealType {
        match self {
            GlobalField::CreatorAddress => TealType::Bytes,
            GlobalField::CurrentApplicationId => TealType::Uint64,
        }
    }

    pub fn teal_name(self) -> &'static str {
        match self {
            GlobalField::CreatorAddress => "CreatorAddress",
            GlobalField::CurrentApplicationId => "CurrentApplicationID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_complete_values_match_discriminants() {
        for (i, oc) in OnComplete::ALL.iter().enumerate() {
            assert_eq!(oc.value(), i as u64);
        }
    }

    #[test]
    fn approval_kinds_exclude_clear_state() {
        assert!(!OnComplete::APPROVAL.contains(&OnComplete::ClearState));
        assert_eq!(OnComplete::APPROVAL.len(), 5);
    }

    #[test]
    fn anytype_accepts_values_but_not_none() {
        assert!(TealType::Uint64.satisfies(TealType::Anytype));
        assert!(TealType::Bytes.satisfies(TealType::Anytype));
        assert!(!TealType::None.satisfies(TealType::Anytype));
        assert!(!TealType::Bytes.satisfies(TealType::Uint64));
    }
}
