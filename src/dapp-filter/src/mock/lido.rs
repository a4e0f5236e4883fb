use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};

use super::{add, decode, encode_word, mul_div, selector_of, slot, sub, ChainState, Env, Frame, MockContract};
use crate::{
    abi::{ILido, IERC20},
    multicall::Revert,
};

/// Pooled ether and shares of the seed deposit. The rate sits just above one
/// so conversions round like on mainnet.
pub const SEED_POOLED: u64 = 1_000_000_003;
pub const SEED_SHARES: u64 = 1_000_000_000;

/// Rebasing staking token. Balances are shares converted at the pool rate.
#[derive(Clone, Copy, Debug)]
pub struct MockLido {
    admin: Address,
}

impl MockLido {
    pub fn new(admin: Address) -> Self {
        Self { admin }
    }

    /// Credit `admin` with the seed deposit at `lido`.
    pub fn seed(state: &mut ChainState, lido: Address, admin: Address) {
        state.store(lido, slot("totalPooled", &[]), U256::from(SEED_POOLED));
        state.store(lido, slot("totalShares", &[]), U256::from(SEED_SHARES));
        state.store(lido, slot("shares", &[admin]), U256::from(SEED_SHARES));
        let balance = state.balance(lido).saturating_add(U256::from(SEED_POOLED));
        state.set_balance(lido, balance);
    }

    fn totals(env: &Env<'_>, lido: Address) -> (U256, U256) {
        (
            env.load(lido, slot("totalPooled", &[])),
            env.load(lido, slot("totalShares", &[])),
        )
    }

    fn shares_by_pooled_eth(env: &Env<'_>, lido: Address, eth: U256) -> Result<U256, Revert> {
        let (pooled, shares) = Self::totals(env, lido);
        if pooled.is_zero() {
            return Ok(eth);
        }
        mul_div(eth, shares, pooled)
    }

    fn pooled_eth_by_shares(env: &Env<'_>, lido: Address, shares: U256) -> Result<U256, Revert> {
        let (pooled, total) = Self::totals(env, lido);
        if total.is_zero() {
            return Ok(U256::ZERO);
        }
        mul_div(shares, pooled, total)
    }

    fn submit(&self, env: &mut Env<'_>, frame: &Frame) -> Result<Vec<u8>, Revert> {
        let lido = frame.this;
        if !env.load(lido, slot("stopped", &[])).is_zero() {
            return Err(Revert::new("STAKING_PAUSED"));
        }
        if frame.value.is_zero() {
            return Err(Revert::new("ZERO_DEPOSIT"));
        }
        let minted = Self::shares_by_pooled_eth(env, lido, frame.value)?;
        let (pooled, total) = Self::totals(env, lido);
        env.store(lido, slot("totalPooled", &[]), add(pooled, frame.value)?);
        env.store(lido, slot("totalShares", &[]), add(total, minted)?);
        let key = slot("shares", &[frame.caller]);
        let held = add(env.load(lido, key), minted)?;
        env.store(lido, key, held);
        Ok(encode_word(minted))
    }

    fn transfer_shares(env: &mut Env<'_>, lido: Address, from: Address, to: Address, eth: U256) -> Result<(), Revert> {
        let shares = Self::shares_by_pooled_eth(env, lido, eth)?;
        let from_key = slot("shares", &[from]);
        let debited = sub(env.load(lido, from_key), shares, "TRANSFER_AMOUNT_EXCEEDS_BALANCE")?;
        env.store(lido, from_key, debited);
        let to_key = slot("shares", &[to]);
        let credited = add(env.load(lido, to_key), shares)?;
        env.store(lido, to_key, credited);
        Ok(())
    }

    fn set_stopped(&self, env: &mut Env<'_>, frame: &Frame, stopped: bool) -> Result<Vec<u8>, Revert> {
        if frame.caller != self.admin {
            return Err(Revert::new("APP_AUTH_FAILED"));
        }
        env.store(frame.this, slot("stopped", &[]), U256::from(u8::from(stopped)));
        Ok(Vec::new())
    }
}

impl MockContract for MockLido {
    fn call(&self, env: &mut Env<'_>, frame: &Frame, data: &[u8]) -> Result<Vec<u8>, Revert> {
        if data.is_empty() {
            return self.submit(env, frame);
        }
        let lido = frame.this;
        match selector_of(data).ok_or_else(Revert::empty)? {
            ILido::submitCall::SELECTOR => {
                decode::<ILido::submitCall>(data)?;
                self.submit(env, frame)
            },
            ILido::stopCall::SELECTOR => self.set_stopped(env, frame, true),
            ILido::resumeCall::SELECTOR => self.set_stopped(env, frame, false),
            ILido::sharesOfCall::SELECTOR => {
                let c = decode::<ILido::sharesOfCall>(data)?;
                Ok(encode_word(env.load(lido, slot("shares", &[c.account]))))
            },
            ILido::getPooledEthBySharesCall::SELECTOR => {
                let c = decode::<ILido::getPooledEthBySharesCall>(data)?;
                Ok(encode_word(Self::pooled_eth_by_shares(env, lido, c.sharesAmount)?))
            },
            IERC20::balanceOfCall::SELECTOR => {
                let c = decode::<IERC20::balanceOfCall>(data)?;
                let shares = env.load(lido, slot("shares", &[c.owner]));
                Ok(encode_word(Self::pooled_eth_by_shares(env, lido, shares)?))
            },
            IERC20::allowanceCall::SELECTOR => {
                let c = decode::<IERC20::allowanceCall>(data)?;
                Ok(encode_word(env.load(lido, slot("allowance", &[c.owner, c.spender]))))
            },
            IERC20::approveCall::SELECTOR => {
                let c = decode::<IERC20::approveCall>(data)?;
                env.store(lido, slot("allowance", &[frame.caller, c.spender]), c.amount);
                Ok(true.abi_encode())
            },
            IERC20::transferCall::SELECTOR => {
                let c = decode::<IERC20::transferCall>(data)?;
                Self::transfer_shares(env, lido, frame.caller, c.to, c.amount)?;
                Ok(true.abi_encode())
            },
            IERC20::transferFromCall::SELECTOR => {
                let c = decode::<IERC20::transferFromCall>(data)?;
                let key = slot("allowance", &[c.from, frame.caller]);
                let remaining = sub(env.load(lido, key), c.amount, "TRANSFER_AMOUNT_EXCEEDS_ALLOWANCE")?;
                env.store(lido, key, remaining);
                Self::transfer_shares(env, lido, c.from, c.to, c.amount)?;
                Ok(true.abi_encode())
            },
            _ => Err(Revert::empty()),
        }
    }
}
