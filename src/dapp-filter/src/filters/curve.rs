use dapp_filter_types::AuthorizationVerdict;

use crate::{
    abi::{ICurvePool, IERC20},
    decoder::CallDescriptor,
    filters::Filter,
};

/// Stable-swap pool: token approvals naming the pool, and `exchange`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurveFilter;

impl Filter for CurveFilter {
    fn name(&self) -> &'static str {
        "curve"
    }

    fn authorize(&self, call: &CallDescriptor) -> AuthorizationVerdict {
        let ok = if call.is_token_call() {
            call.decode::<IERC20::approveCall>().is_some()
        } else {
            call.decode::<ICurvePool::exchangeCall>().is_some()
        };
        super::verdict(ok, call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;
    use crate::filters::testing::{bare, call, TOKEN};
    use alloy_primitives::{address, Address, U256};

    const POOL: Address = address!("dc24316b9ae028f1497c275eb9192a3ea0f67022");

    fn approve(spender: Address) -> Vec<u8> {
        IERC20::approveCall {
            spender,
            amount: U256::from(10u64),
        }
        .abi_encode()
    }

    #[test]
    fn allows_approving_the_pool() {
        assert!(CurveFilter.authorize(&call(TOKEN, approve(POOL))).allowed);
    }

    #[test]
    fn allows_exchange_with_any_parameters() {
        let data = ICurvePool::exchangeCall {
            i: 1,
            j: 0,
            dx: U256::from(10u64),
            min_dy: U256::from(1u64),
        }
        .abi_encode();
        assert!(CurveFilter.authorize(&call(POOL, data)).allowed);
    }

    #[test]
    fn rejects_token_transfer_to_pool() {
        let data = IERC20::transferCall {
            to: POOL,
            amount: U256::from(10u64),
        }
        .abi_encode();
        assert!(!CurveFilter.authorize(&call(TOKEN, data)).allowed);
    }

    #[test]
    fn rejects_admin_methods_and_value() {
        assert!(!CurveFilter.authorize(&call(POOL, ICurvePool::kill_meCall {}.abi_encode())).allowed);
        let fee = ICurvePool::commit_new_feeCall {
            new_fee: U256::ZERO,
            new_admin_fee: U256::ZERO,
        }
        .abi_encode();
        assert!(!CurveFilter.authorize(&call(POOL, fee)).allowed);
        assert!(!CurveFilter.authorize(&bare(POOL, 1)).allowed);
    }

    #[test]
    fn rejects_approve_called_on_the_pool_itself() {
        // spender == target: not a token approval, and `approve` is not a pool method.
        assert!(!CurveFilter.authorize(&call(POOL, approve(POOL))).allowed);
    }
}
