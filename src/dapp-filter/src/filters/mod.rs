//! Per-target call filters.
//!
//! A filter is a flat allow-list over one target's ABI surface. It sees only the
//! decoded call and the configuration it was built with, so its verdicts are
//! deterministic. Anything it does not explicitly recognise is rejected.

use core::fmt;

use dapp_filter_types::{format_selector, AuthorizationVerdict};

use crate::decoder::CallDescriptor;

pub mod curve;
pub mod lido;
pub mod maker;
pub mod selectors;

pub use curve::CurveFilter;
pub use lido::LidoFilter;
pub use maker::{DaiJoinFilter, MakerModules, PotFilter, VatFilter};
pub use selectors::SelectorFilter;

/// Decision function registered for one target.
pub trait Filter: fmt::Debug + Send + Sync {
    /// Short identifier used in logs and tooling output.
    fn name(&self) -> &'static str;

    fn authorize(&self, call: &CallDescriptor) -> AuthorizationVerdict;
}

/// Denial for a call that fell through every allow rule.
pub(crate) fn unrecognised(call: &CallDescriptor) -> AuthorizationVerdict {
    if call.is_bare_transfer() {
        return AuthorizationVerdict::deny("value transfer not allowed");
    }
    match call.selector {
        Some(sel) if call.is_token_call() => AuthorizationVerdict::deny(format!(
            "token method {} naming {} not allowed",
            format_selector(&sel),
            call.spender
        )),
        Some(sel) => AuthorizationVerdict::deny(format!(
            "method {} not allowed or arguments undecodable",
            format_selector(&sel)
        )),
        None => AuthorizationVerdict::deny("malformed call"),
    }
}

/// Allow when `ok`, otherwise deny with the fall-through reason.
pub(crate) fn verdict(ok: bool, call: &CallDescriptor) -> AuthorizationVerdict {
    if ok {
        AuthorizationVerdict::allow()
    } else {
        unrecognised(call)
    }
}
