//! Filters for the three cooperating modules of the Maker savings rate:
//! the pot (savings), the vat (ledger) and the DAI join adapter.
//!
//! Only the vat needs its counterparts: `hope`/`nope` may only name the pot or
//! the adapter. [`MakerModules::filters`] builds all three with that wiring.

use std::sync::Arc;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use dapp_filter_types::AuthorizationVerdict;

use crate::{
    abi::{IDaiJoin, IERC20, IPot, IVat},
    decoder::CallDescriptor,
    filters::Filter,
};

/// Addresses of the cooperating modules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerModules {
    pub pot: Address,
    pub vat: Address,
    pub dai_join: Address,
}

impl MakerModules {
    /// `(target, filter)` pairs ready for registration.
    pub fn filters(&self) -> [(Address, Arc<dyn Filter>); 3] {
        [
            (self.pot, Arc::new(PotFilter)),
            (self.dai_join, Arc::new(DaiJoinFilter)),
            (self.vat, Arc::new(VatFilter::new(self.dai_join, self.pot))),
        ]
    }
}

/// Savings module: `drip`, `join`, `exit`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PotFilter;

impl Filter for PotFilter {
    fn name(&self) -> &'static str {
        "pot"
    }

    fn authorize(&self, call: &CallDescriptor) -> AuthorizationVerdict {
        let ok = !call.is_token_call()
            && (call.decode::<IPot::dripCall>().is_some()
                || call.decode::<IPot::joinCall>().is_some()
                || call.decode::<IPot::exitCall>().is_some());
        super::verdict(ok, call)
    }
}

/// Token adapter: `join`, `exit`, and DAI approvals naming the adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct DaiJoinFilter;

impl Filter for DaiJoinFilter {
    fn name(&self) -> &'static str {
        "dai_join"
    }

    fn authorize(&self, call: &CallDescriptor) -> AuthorizationVerdict {
        let ok = if call.is_token_call() {
            call.decode::<IERC20::approveCall>().is_some()
        } else {
            call.decode::<IDaiJoin::joinCall>().is_some()
                || call.decode::<IDaiJoin::exitCall>().is_some()
        };
        super::verdict(ok, call)
    }
}

/// Ledger: `hope`/`nope` restricted to the adapter and the savings module.
#[derive(Clone, Copy, Debug)]
pub struct VatFilter {
    dai_join: Address,
    pot: Address,
}

impl VatFilter {
    pub fn new(dai_join: Address, pot: Address) -> Self {
        Self { dai_join, pot }
    }

    fn is_counterparty(&self, usr: Address) -> bool {
        usr == self.dai_join || usr == self.pot
    }
}

impl Filter for VatFilter {
    fn name(&self) -> &'static str {
        "vat"
    }

    fn authorize(&self, call: &CallDescriptor) -> AuthorizationVerdict {
        if call.is_token_call() {
            return super::unrecognised(call);
        }
        let usr = call
            .decode::<IVat::hopeCall>()
            .map(|c| c.usr)
            .or_else(|| call.decode::<IVat::nopeCall>().map(|c| c.usr));
        match usr {
            Some(usr) if self.is_counterparty(usr) => AuthorizationVerdict::allow(),
            Some(usr) => AuthorizationVerdict::deny(format!("{usr} is not a cooperating module")),
            None => super::unrecognised(call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::testing::{bare, call, OTHER, TOKEN};
    use alloy_primitives::{address, U256};
    use alloy_sol_types::SolCall;

    const MODULES: MakerModules = MakerModules {
        pot: address!("197e90f9fad81970ba7976f33cbd77088e5d7cf7"),
        vat: address!("35d1b3f3d7966a1dfe207aa4514c12a259a0492b"),
        dai_join: address!("9759a6ac90977b93b58547b4a71c78317f391a28"),
    };

    fn vat_filter() -> VatFilter {
        VatFilter::new(MODULES.dai_join, MODULES.pot)
    }

    fn dai_transfer(to: Address) -> Vec<u8> {
        IERC20::transferCall {
            to,
            amount: U256::from(5u64),
        }
        .abi_encode()
    }

    #[test]
    fn pot_allows_user_journey() {
        let wad = U256::from(10u64);
        for data in [
            IPot::dripCall {}.abi_encode(),
            IPot::joinCall { wad }.abi_encode(),
            IPot::exitCall { wad }.abi_encode(),
        ] {
            assert!(PotFilter.authorize(&call(MODULES.pot, data)).allowed);
        }
    }

    #[test]
    fn pot_rejects_cage_value_and_transfers() {
        assert!(!PotFilter.authorize(&call(MODULES.pot, IPot::cageCall {}.abi_encode())).allowed);
        assert!(!PotFilter.authorize(&bare(MODULES.pot, 1)).allowed);
        assert!(!PotFilter.authorize(&call(TOKEN, dai_transfer(MODULES.pot))).allowed);
    }

    #[test]
    fn dai_join_allows_join_exit_and_approval() {
        let wad = U256::from(3u64);
        let join = IDaiJoin::joinCall { usr: OTHER, wad }.abi_encode();
        let exit = IDaiJoin::exitCall { usr: OTHER, wad }.abi_encode();
        let approve = IERC20::approveCall {
            spender: MODULES.dai_join,
            amount: wad,
        }
        .abi_encode();
        assert!(DaiJoinFilter.authorize(&call(MODULES.dai_join, join)).allowed);
        assert!(DaiJoinFilter.authorize(&call(MODULES.dai_join, exit)).allowed);
        assert!(DaiJoinFilter.authorize(&call(TOKEN, approve)).allowed);
    }

    #[test]
    fn dai_join_rejects_live_value_and_transfers() {
        let live = IDaiJoin::liveCall {}.abi_encode();
        assert!(!DaiJoinFilter.authorize(&call(MODULES.dai_join, live)).allowed);
        assert!(!DaiJoinFilter.authorize(&bare(MODULES.dai_join, 1)).allowed);
        assert!(!DaiJoinFilter.authorize(&call(TOKEN, dai_transfer(MODULES.dai_join))).allowed);
    }

    #[test]
    fn vat_allows_hope_and_nope_of_counterparts_only() {
        let filter = vat_filter();
        for usr in [MODULES.pot, MODULES.dai_join] {
            let hope = IVat::hopeCall { usr }.abi_encode();
            let nope = IVat::nopeCall { usr }.abi_encode();
            assert!(filter.authorize(&call(MODULES.vat, hope)).allowed);
            assert!(filter.authorize(&call(MODULES.vat, nope)).allowed);
        }
        let verdict = filter.authorize(&call(MODULES.vat, IVat::hopeCall { usr: OTHER }.abi_encode()));
        assert!(!verdict.allowed);
        assert!(verdict.reason.unwrap().contains("not a cooperating module"));
    }

    #[test]
    fn vat_rejects_vice_value_transfers_and_dirty_arguments() {
        let filter = vat_filter();
        assert!(!filter.authorize(&call(MODULES.vat, IVat::viceCall {}.abi_encode())).allowed);
        assert!(!filter.authorize(&bare(MODULES.vat, 1)).allowed);
        assert!(!filter.authorize(&call(TOKEN, dai_transfer(MODULES.vat))).allowed);

        // High bytes set on the address word: not canonical ABI.
        let mut dirty = IVat::hopeCall { usr: MODULES.pot }.abi_encode();
        dirty[4] = 1;
        assert!(!filter.authorize(&call(MODULES.vat, dirty)).allowed);
    }

    #[test]
    fn wiring_registers_each_module() {
        let filters = MODULES.filters();
        let names: Vec<_> = filters.iter().map(|(a, f)| (*a, f.name())).collect();
        assert_eq!(
            names,
            vec![
                (MODULES.pot, "pot"),
                (MODULES.dai_join, "dai_join"),
                (MODULES.vat, "vat"),
            ]
        );
        let hope = IVat::hopeCall { usr: MODULES.pot }.abi_encode();
        assert!(filters[2].1.authorize(&call(MODULES.vat, hope)).allowed);
    }
}
