use std::collections::BTreeSet;

use alloy_sol_types::SolCall;
use dapp_filter_types::{AuthorizationVerdict, Selector};

use crate::{abi::IERC20, decoder::CallDescriptor, filters::Filter};

/// Configurable allow-list of selectors for targets without a dedicated filter.
///
/// Only the selector is checked; argument words are not interpreted.
#[derive(Clone, Debug, Default)]
pub struct SelectorFilter {
    allowed: BTreeSet<Selector>,
    allow_value_transfer: bool,
    allow_approvals: bool,
}

impl SelectorFilter {
    pub fn new(allowed: impl IntoIterator<Item = Selector>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Also accept bare value transfers to the target.
    pub fn with_value_transfer(mut self, allow: bool) -> Self {
        self.allow_value_transfer = allow;
        self
    }

    /// Also accept ERC-20 `approve` calls naming the target as spender.
    pub fn with_approvals(mut self, allow: bool) -> Self {
        self.allow_approvals = allow;
        self
    }

    pub fn selectors(&self) -> impl Iterator<Item = &Selector> {
        self.allowed.iter()
    }
}

impl Filter for SelectorFilter {
    fn name(&self) -> &'static str {
        "selectors"
    }

    fn authorize(&self, call: &CallDescriptor) -> AuthorizationVerdict {
        let ok = if call.is_token_call() {
            self.allow_approvals && call.has_selector(IERC20::approveCall::SELECTOR)
        } else if call.is_bare_transfer() {
            self.allow_value_transfer
        } else {
            call.selector.is_some_and(|sel| self.allowed.contains(&sel))
        };
        super::verdict(ok, call)
    }
}
