//! Bare-call actions, one per completion kind.

use teal_ir::OnComplete;

use crate::call_config::CallConfig;
use crate::error::RouterError;
use crate::handler::Handler;

/// An optional bare-call handler with the config under which it runs.
#[derive(Debug, Clone, Default)]
pub struct OnCompleteAction {
    action: Option<Handler>,
    call_config: CallConfig,
}

impl OnCompleteAction {
    /// Pair an action with a config. An action that can never run is rejected.
    pub fn new(action: Option<Handler>, call_config: CallConfig) -> Result<Self, RouterError> {
        if action.is_some() && call_config == CallConfig::Never {
            return Err(RouterError::Contradiction {
                config: call_config,
            });
        }
        Ok(OnCompleteAction {
            action,
            call_config,
        })
    }

    pub fn never() -> Self {
        OnCompleteAction::default()
    }

    pub fn call_only(action: impl Into<Handler>) -> Self {
        OnCompleteAction {
            action: Some(action.into()),
            call_config: CallConfig::Call,
        }
    }

    pub fn create_only(action: impl Into<Handler>) -> Self {
        OnCompleteAction {
            action: Some(action.into()),
            call_config: CallConfig::Create,
        }
    }

    pub fn always(action: impl Into<Handler>) -> Self {
        OnCompleteAction {
            action: Some(action.into()),
            call_config: CallConfig::All,
        }
    }

    pub fn action(&self) -> Option<&Handler> {
        self.action.as_ref()
    }

    pub fn call_config(&self) -> CallConfig {
        self.call_config
    }

    pub fn is_empty(&self) -> bool {
        self.action.is_none()
    }
}

/// The bare-call action for each completion kind. Unset slots never run.
#[derive(Debug, Clone, Default)]
pub struct BareCallActions {
    pub no_op: OnCompleteAction,
    pub opt_in: OnCompleteAction,
    pub close_out: OnCompleteAction,
    pub clear_state: OnCompleteAction,
    pub update_application: OnCompleteAction,
    pub delete_application: OnCompleteAction,
}

impl BareCallActions {
    pub fn get(&self, kind: OnComplete) -> &OnCompleteAction {
        match kind {
            OnComplete::NoOp => &self.no_op,
            OnComplete::OptIn => &self.opt_in,
            OnComplete::CloseOut => &self.close_out,
            OnComplete::ClearState => &self.clear_state,
            OnComplete::UpdateApplication => &self.update_application,
            OnComplete::DeleteApplication => &self.delete_application,
        }
    }

    pub fn set(&mut self, kind: OnComplete, action: OnCompleteAction) {
        let slot = match kind {
            OnComplete::NoOp => &mut self.no_op,
            OnComplete::OptIn => &mut self.opt_in,
            OnComplete::CloseOut => &mut self.close_out,
            OnComplete::ClearState => &mut self.clear_state,
            OnComplete::UpdateApplication => &mut self.update_application,
            OnComplete::DeleteApplication => &mut self.delete_application,
        };
        *slot = action;
    }

    pub fn with(mut self, kind: OnComplete, action: OnCompleteAction) -> Self {
        self.set(kind, action);
        self
    }

    /// Set slots in completion-kind order.
    pub fn iter(&self) -> impl Iterator<Item = (OnComplete, &OnCompleteAction)> {
        OnComplete::ALL
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .filter(|(_, action)| !action.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
