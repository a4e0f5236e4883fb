//! Savings-rate modules: the vat ledger, the pot and the DAI join adapter.
//!
//! Internal DAI in the vat is denominated in rad (wad * ray). The pot keeps a
//! constant rate accumulator of one ray.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;

use super::{add, decode, encode_word, ray, selector_of, slot, ChainState, Env, Frame, MockContract};
use crate::{
    abi::{IDaiJoin, IERC20, IPot, IVat},
    multicall::Revert,
};

fn only(admin: Address, frame: &Frame, reason: &str) -> Result<(), Revert> {
    if frame.caller != admin {
        return Err(Revert::new(reason));
    }
    Ok(())
}

fn live(env: &Env<'_>, module: Address) -> U256 {
    U256::from(u8::from(env.load(module, slot("caged", &[])).is_zero()))
}

fn vat_move(env: &mut Env<'_>, frame: &Frame, vat: Address, src: Address, dst: Address, rad: U256) -> Result<(), Revert> {
    let data = IVat::moveCall { src, dst, rad }.abi_encode();
    env.call(frame.this, vat, U256::ZERO, &data).map(drop)
}

/// Ledger of internal DAI balances with per-owner delegation (`hope`/`nope`).
#[derive(Clone, Copy, Debug)]
pub struct MockVat {
    admin: Address,
}

impl MockVat {
    pub fn new(admin: Address) -> Self {
        Self { admin }
    }

    /// Seed internal DAI.
    pub fn credit(state: &mut ChainState, vat: Address, usr: Address, rad: U256) {
        let key = slot("dai", &[usr]);
        let balance = state.load(vat, key).saturating_add(rad);
        state.store(vat, key, balance);
    }

    pub fn dai(state: &ChainState, vat: Address, usr: Address) -> U256 {
        state.load(vat, slot("dai", &[usr]))
    }

    pub fn can(state: &ChainState, vat: Address, owner: Address, usr: Address) -> bool {
        !state.load(vat, slot("can", &[owner, usr])).is_zero()
    }

    fn move_dai(env: &mut Env<'_>, frame: &Frame, c: IVat::moveCall) -> Result<Vec<u8>, Revert> {
        let vat = frame.this;
        let wish = c.src == frame.caller || !env.load(vat, slot("can", &[c.src, frame.caller])).is_zero();
        if !wish {
            return Err(Revert::new("Vat/not-allowed"));
        }
        let src_key = slot("dai", &[c.src]);
        let debited = env.load(vat, src_key).checked_sub(c.rad).ok_or_else(Revert::empty)?;
        env.store(vat, src_key, debited);
        let dst_key = slot("dai", &[c.dst]);
        let credited = add(env.load(vat, dst_key), c.rad)?;
        env.store(vat, dst_key, credited);
        Ok(Vec::new())
    }
}

impl MockContract for MockVat {
    fn call(&self, env: &mut Env<'_>, frame: &Frame, data: &[u8]) -> Result<Vec<u8>, Revert> {
        if !frame.value.is_zero() {
            return Err(Revert::empty());
        }
        let vat = frame.this;
        match selector_of(data).ok_or_else(Revert::empty)? {
            IVat::hopeCall::SELECTOR => {
                let c = decode::<IVat::hopeCall>(data)?;
                env.store(vat, slot("can", &[frame.caller, c.usr]), U256::from(1u64));
                Ok(Vec::new())
            },
            IVat::nopeCall::SELECTOR => {
                let c = decode::<IVat::nopeCall>(data)?;
                env.store(vat, slot("can", &[frame.caller, c.usr]), U256::ZERO);
                Ok(Vec::new())
            },
            IVat::moveCall::SELECTOR => Self::move_dai(env, frame, decode(data)?),
            IVat::daiCall::SELECTOR => {
                let c = decode::<IVat::daiCall>(data)?;
                Ok(encode_word(env.load(vat, slot("dai", &[c.usr]))))
            },
            IVat::viceCall::SELECTOR => Ok(encode_word(U256::ZERO)),
            IVat::liveCall::SELECTOR => Ok(encode_word(live(env, vat))),
            IVat::cageCall::SELECTOR => {
                only(self.admin, frame, "Vat/not-authorized")?;
                env.store(vat, slot("caged", &[]), U256::from(1u64));
                Ok(Vec::new())
            },
            _ => Err(Revert::empty()),
        }
    }
}

/// Adapter minting internal DAI against ERC-20 DAI and back.
///
/// `join` pulls the caller's tokens into the adapter; `exit` pays out of that
/// reserve, so the adapter must hold tokens before anyone exits.
#[derive(Clone, Copy, Debug)]
pub struct MockDaiJoin {
    vat: Address,
    dai: Address,
    admin: Address,
}

impl MockDaiJoin {
    pub fn new(vat: Address, dai: Address, admin: Address) -> Self {
        Self { vat, dai, admin }
    }
}

impl MockContract for MockDaiJoin {
    fn call(&self, env: &mut Env<'_>, frame: &Frame, data: &[u8]) -> Result<Vec<u8>, Revert> {
        if !frame.value.is_zero() {
            return Err(Revert::empty());
        }
        match selector_of(data).ok_or_else(Revert::empty)? {
            IDaiJoin::joinCall::SELECTOR => {
                let c = decode::<IDaiJoin::joinCall>(data)?;
                vat_move(env, frame, self.vat, frame.this, c.usr, c.wad.saturating_mul(ray()))?;
                let pull = IERC20::transferFromCall {
                    from: frame.caller,
                    to: frame.this,
                    amount: c.wad,
                };
                env.call(frame.this, self.dai, U256::ZERO, &pull.abi_encode())?;
                Ok(Vec::new())
            },
            IDaiJoin::exitCall::SELECTOR => {
                let c = decode::<IDaiJoin::exitCall>(data)?;
                if live(env, frame.this).is_zero() {
                    return Err(Revert::new("DaiJoin/not-live"));
                }
                vat_move(env, frame, self.vat, frame.caller, frame.this, c.wad.saturating_mul(ray()))?;
                let pay = IERC20::transferCall {
                    to: c.usr,
                    amount: c.wad,
                };
                env.call(frame.this, self.dai, U256::ZERO, &pay.abi_encode())?;
                Ok(Vec::new())
            },
            IDaiJoin::liveCall::SELECTOR => Ok(encode_word(live(env, frame.this))),
            IDaiJoin::cageCall::SELECTOR => {
                only(self.admin, frame, "DaiJoin/not-authorized")?;
                env.store(frame.this, slot("caged", &[]), U256::from(1u64));
                Ok(Vec::new())
            },
            _ => Err(Revert::empty()),
        }
    }
}

/// Savings module. Deposits are normalised by `chi`, fixed at one ray.
#[derive(Clone, Copy, Debug)]
pub struct MockPot {
    vat: Address,
    admin: Address,
}

impl MockPot {
    pub fn new(vat: Address, admin: Address) -> Self {
        Self { vat, admin }
    }

    pub fn pie(state: &ChainState, pot: Address, usr: Address) -> U256 {
        state.load(pot, slot("pie", &[usr]))
    }

    fn adjust_pie(env: &mut Env<'_>, pot: Address, usr: Address, wad: U256, deposit: bool) -> Result<(), Revert> {
        for key in [slot("pie", &[usr]), slot("Pie", &[])] {
            let current = env.load(pot, key);
            let next = if deposit {
                add(current, wad)?
            } else {
                current.checked_sub(wad).ok_or_else(Revert::empty)?
            };
            env.store(pot, key, next);
        }
        Ok(())
    }
}

impl MockContract for MockPot {
    fn call(&self, env: &mut Env<'_>, frame: &Frame, data: &[u8]) -> Result<Vec<u8>, Revert> {
        if !frame.value.is_zero() {
            return Err(Revert::empty());
        }
        let pot = frame.this;
        match selector_of(data).ok_or_else(Revert::empty)? {
            IPot::dripCall::SELECTOR | IPot::chiCall::SELECTOR => Ok(encode_word(ray())),
            IPot::joinCall::SELECTOR => {
                let c = decode::<IPot::joinCall>(data)?;
                vat_move(env, frame, self.vat, frame.caller, pot, c.wad.saturating_mul(ray()))?;
                Self::adjust_pie(env, pot, frame.caller, c.wad, true)?;
                Ok(Vec::new())
            },
            IPot::exitCall::SELECTOR => {
                let c = decode::<IPot::exitCall>(data)?;
                Self::adjust_pie(env, pot, frame.caller, c.wad, false)?;
                vat_move(env, frame, self.vat, pot, frame.caller, c.wad.saturating_mul(ray()))?;
                Ok(Vec::new())
            },
            IPot::pieCall::SELECTOR => {
                let c = decode::<IPot::pieCall>(data)?;
                Ok(encode_word(env.load(pot, slot("pie", &[c.usr]))))
            },
            IPot::cageCall::SELECTOR => {
                only(self.admin, frame, "Pot/not-authorized")?;
                env.store(pot, slot("caged", &[]), U256::from(1u64));
                Ok(Vec::new())
            },
            _ => Err(Revert::empty()),
        }
    }
}
