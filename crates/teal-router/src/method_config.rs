use teal_ir::{Expr, OnComplete, TxnField};

use crate::call_config::CallConfig;
use crate::cond::Cond;

/// The [`CallConfig`] of one method under each completion kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MethodConfig {
    pub no_op: CallConfig,
    pub opt_in: CallConfig,
    pub close_out: CallConfig,
    pub clear_state: CallConfig,
    pub update_application: CallConfig,
    pub delete_application: CallConfig,
}

impl MethodConfig {
    pub fn never() -> Self {
        MethodConfig::default()
    }

    /// Callable under every completion kind, at creation and afterwards.
    pub fn arc4_compliant() -> Self {
        MethodConfig::from_slots([CallConfig::All; 6])
    }

    /// Build from slots in [`OnComplete::ALL`] order.
    pub fn from_slots(slots: [CallConfig; 6]) -> Self {
        let [no_op, opt_in, close_out, clear_state, update_application, delete_application] =
            slots;
        MethodConfig {
            no_op,
            opt_in,
            close_out,
            clear_state,
            update_application,
            delete_application,
        }
    }

    pub fn slots(&self) -> [CallConfig; 6] {
        OnComplete::ALL.map(|kind| self.get(kind))
    }

    pub fn get(&self, kind: OnComplete) -> CallConfig {
        match kind {
            OnComplete::NoOp => self.no_op,
            OnComplete::OptIn => self.opt_in,
            OnComplete::CloseOut => self.close_out,
            OnComplete::ClearState => self.clear_state,
            OnComplete::UpdateApplication => self.update_application,
            OnComplete::DeleteApplication => self.delete_application,
        }
    }

    pub fn with(mut self, kind: OnComplete, config: CallConfig) -> Self {
        let slot = match kind {
            OnComplete::NoOp => &mut self.no_op,
            OnComplete::OptIn => &mut self.opt_in,
            OnComplete::CloseOut => &mut self.close_out,
            OnComplete::ClearState => &mut self.clear_state,
            OnComplete::UpdateApplication => &mut self.update_application,
            OnComplete::DeleteApplication => &mut self.delete_application,
        };
        *slot = config;
        self
    }

    pub fn is_never(&self) -> bool {
        self.slots().iter().all(|c| *c == CallConfig::Never)
    }

    pub fn is_arc4_compliant(&self) -> bool {
        self.slots().iter().all(|c| *c == CallConfig::All)
    }

    /// Guard for this method's branch in the approval program.
    ///
    /// One term per non-never approval kind: `OnCompletion == kind`, ANDed
    /// with the slot's creation condition unless the slot is `All`.
    pub fn approval_cond(&self) -> Cond {
        if OnComplete::APPROVAL
            .iter()
            .all(|kind| self.get(*kind) == CallConfig::All)
        {
            return Cond::AlwaysTrue;
        }
        Cond::any(OnComplete::APPROVAL.into_iter().map(|kind| {
            let config = self.get(kind);
            if config == CallConfig::Never {
                return Cond::AlwaysFalse;
            }
            Cond::all([
                Cond::Runtime(Expr::eq(
                    Expr::Txn(TxnField::OnCompletion),
                    Expr::OnCompleteConst(kind),
                )),
                config.condition_under_config(),
            ])
        }))
    }

    /// Guard for this method's branch in the clear-state program.
    pub fn clear_state_cond(&self) -> Cond {
        self.clear_state.condition_under_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oc_is(kind: OnComplete) -> Expr {
        Expr::eq(Expr::Txn(TxnField::OnCompletion), Expr::OnCompleteConst(kind))
    }

    #[test]
    fn never_and_arc4() {
        assert!(MethodConfig::never().is_never());
        assert!(!MethodConfig::never().is_arc4_compliant());
        let arc4 = MethodConfig::arc4_compliant();
        assert!(arc4.is_arc4_compliant());
        assert_eq!(arc4.approval_cond(), Cond::AlwaysTrue);
        assert_eq!(arc4.clear_state_cond(), Cond::AlwaysTrue);
        assert_eq!(MethodConfig::never().approval_cond(), Cond::AlwaysFalse);
        assert_eq!(MethodConfig::never().clear_state_cond(), Cond::AlwaysFalse);
    }

    #[test]
    fn single_call_slot_has_no_or() {
        let config = MethodConfig::never().with(OnComplete::OptIn, CallConfig::Call);
        let Cond::Runtime(expr) = CallConfig::Call.condition_under_config() else {
            unreachable!()
        };
        assert_eq!(
            config.approval_cond(),
            Cond::Runtime(Expr::And(vec![oc_is(OnComplete::OptIn), expr]))
        );
    }

    #[test]
    fn all_slot_contributes_bare_comparison() {
        let config = MethodConfig::never()
            .with(OnComplete::NoOp, CallConfig::All)
            .with(OnComplete::CloseOut, CallConfig::All);
        assert_eq!(
            config.approval_cond(),
            Cond::Runtime(Expr::Or(vec![
                oc_is(OnComplete::NoOp),
                oc_is(OnComplete::CloseOut)
            ]))
        );
    }

    #[test]
    fn clear_state_only_config() {
        let config = MethodConfig::never().with(OnComplete::ClearState, CallConfig::Create);
        assert!(!config.is_never());
        assert_eq!(config.approval_cond(), Cond::AlwaysFalse);
        assert_eq!(
            config.clear_state_cond(),
            CallConfig::Create.condition_under_config()
        );
    }

    #[test]
    fn slots_round_trip() {
        let slots = [
            CallConfig::Call,
            CallConfig::Never,
            CallConfig::All,
            CallConfig::Create,
            CallConfig::Never,
            CallConfig::Call,
        ];
        assert_eq!(MethodConfig::from_slots(slots).slots(), slots);
    }
}
