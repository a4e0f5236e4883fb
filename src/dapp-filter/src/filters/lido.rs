use dapp_filter_types::AuthorizationVerdict;

use crate::{abi::ILido, decoder::CallDescriptor, filters::Filter};

/// Liquid-staking pool: staking through the fallback or `submit(referral)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LidoFilter;

impl Filter for LidoFilter {
    fn name(&self) -> &'static str {
        "lido"
    }

    fn authorize(&self, call: &CallDescriptor) -> AuthorizationVerdict {
        if call.is_token_call() {
            return super::unrecognised(call);
        }
        // Bare value is staked by the pool's fallback.
        if call.is_bare_transfer() {
            return AuthorizationVerdict::allow();
        }
        super::verdict(call.decode::<ILido::submitCall>().is_some(), call)
    }
}
