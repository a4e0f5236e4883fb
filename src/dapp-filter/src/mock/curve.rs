use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;

use super::{decode, encode_word, mul_div, selector_of, Env, Frame, MockContract};
use crate::{
    abi::{ICurvePool, IERC20},
    multicall::Revert,
};

/// Exchange fee in basis points.
pub const FEE_BPS: u64 = 4;

const ETH: i128 = 0;
const STETH: i128 = 1;

/// Two-coin ETH/stETH pool quoting at par minus [`FEE_BPS`].
#[derive(Clone, Copy, Debug)]
pub struct MockCurvePool {
    steth: Address,
    owner: Address,
}

impl MockCurvePool {
    pub fn new(steth: Address, owner: Address) -> Self {
        Self { steth, owner }
    }

    fn quote(i: i128, j: i128, dx: U256) -> Result<U256, Revert> {
        match (i, j) {
            (ETH, STETH) | (STETH, ETH) => mul_div(dx, U256::from(10_000 - FEE_BPS), U256::from(10_000u64)),
            _ => Err(Revert::empty()),
        }
    }

    fn exchange(&self, env: &mut Env<'_>, frame: &Frame, c: ICurvePool::exchangeCall) -> Result<Vec<u8>, Revert> {
        let dy = Self::quote(c.i, c.j, c.dx)?;
        if dy < c.min_dy {
            return Err(Revert::new("Exchange resulted in fewer coins than expected"));
        }
        if c.i == STETH {
            if !frame.value.is_zero() {
                return Err(Revert::empty());
            }
            let pull = IERC20::transferFromCall {
                from: frame.caller,
                to: frame.this,
                amount: c.dx,
            };
            env.call(frame.this, self.steth, U256::ZERO, &pull.abi_encode())?;
            env.call(frame.this, frame.caller, dy, &[])?;
        } else {
            if frame.value != c.dx {
                return Err(Revert::empty());
            }
            let pay = IERC20::transferCall {
                to: frame.caller,
                amount: dy,
            };
            env.call(frame.this, self.steth, U256::ZERO, &pay.abi_encode())?;
        }
        Ok(encode_word(dy))
    }

    fn only_owner(&self, frame: &Frame) -> Result<Vec<u8>, Revert> {
        if frame.caller != self.owner {
            return Err(Revert::empty());
        }
        Ok(Vec::new())
    }
}

impl MockContract for MockCurvePool {
    fn call(&self, env: &mut Env<'_>, frame: &Frame, data: &[u8]) -> Result<Vec<u8>, Revert> {
        match selector_of(data).ok_or_else(Revert::empty)? {
            ICurvePool::exchangeCall::SELECTOR => self.exchange(env, frame, decode(data)?),
            ICurvePool::get_dyCall::SELECTOR => {
                let c = decode::<ICurvePool::get_dyCall>(data)?;
                Ok(encode_word(Self::quote(c.i, c.j, c.dx)?))
            },
            ICurvePool::kill_meCall::SELECTOR | ICurvePool::commit_new_feeCall::SELECTOR => self.only_owner(frame),
            _ => Err(Revert::empty()),
        }
    }
}
