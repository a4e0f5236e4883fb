use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};

use super::{add, decode, encode_word, selector_of, slot, sub, ChainState, Env, Frame, MockContract};
use crate::{abi::IERC20, multicall::Revert};

/// DAI-style ERC-20 token. Not payable.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockErc20;

impl MockErc20 {
    pub fn mint(state: &mut ChainState, token: Address, to: Address, amount: U256) {
        let key = slot("balance", &[to]);
        let balance = state.load(token, key).saturating_add(amount);
        state.store(token, key, balance);
    }

    pub fn balance_of(state: &ChainState, token: Address, owner: Address) -> U256 {
        state.load(token, slot("balance", &[owner]))
    }

    pub fn allowance(state: &ChainState, token: Address, owner: Address, spender: Address) -> U256 {
        state.load(token, slot("allowance", &[owner, spender]))
    }

    fn move_tokens(env: &mut Env<'_>, token: Address, from: Address, to: Address, amount: U256) -> Result<(), Revert> {
        let from_key = slot("balance", &[from]);
        let debited = sub(env.load(token, from_key), amount, "Dai/insufficient-balance")?;
        env.store(token, from_key, debited);
        let to_key = slot("balance", &[to]);
        let credited = add(env.load(token, to_key), amount)?;
        env.store(token, to_key, credited);
        Ok(())
    }
}

impl MockContract for MockErc20 {
    fn call(&self, env: &mut Env<'_>, frame: &Frame, data: &[u8]) -> Result<Vec<u8>, Revert> {
        if !frame.value.is_zero() {
            return Err(Revert::empty());
        }
        let token = frame.this;
        match selector_of(data).ok_or_else(Revert::empty)? {
            IERC20::balanceOfCall::SELECTOR => {
                let c = decode::<IERC20::balanceOfCall>(data)?;
                Ok(encode_word(Self::balance_of(env.state(), token, c.owner)))
            },
            IERC20::allowanceCall::SELECTOR => {
                let c = decode::<IERC20::allowanceCall>(data)?;
                Ok(encode_word(Self::allowance(env.state(), token, c.owner, c.spender)))
            },
            IERC20::transferCall::SELECTOR => {
                let c = decode::<IERC20::transferCall>(data)?;
                Self::move_tokens(env, token, frame.caller, c.to, c.amount)?;
                Ok(true.abi_encode())
            },
            IERC20::approveCall::SELECTOR => {
                let c = decode::<IERC20::approveCall>(data)?;
                env.store(token, slot("allowance", &[frame.caller, c.spender]), c.amount);
                Ok(true.abi_encode())
            },
            IERC20::transferFromCall::SELECTOR => {
                let c = decode::<IERC20::transferFromCall>(data)?;
                if c.from != frame.caller {
                    let key = slot("allowance", &[c.from, frame.caller]);
                    let allowance = env.load(token, key);
                    if allowance != U256::MAX {
                        env.store(token, key, sub(allowance, c.amount, "Dai/insufficient-allowance")?);
                    }
                }
                Self::move_tokens(env, token, c.from, c.to, c.amount)?;
                Ok(true.abi_encode())
            },
            _ => Err(Revert::empty()),
        }
    }
}
