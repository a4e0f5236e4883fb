//! In-memory execution backend for off-chain testing.
//!
//! Runs batches against simple Rust models of the filtered contracts, without
//! requiring a node. State is journaled per checkpoint so a failed batch leaves
//! no trace.

use std::{collections::BTreeMap, sync::Arc};

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};

use crate::{
    abi::{Call, IERC20},
    multicall::{ExecutionBackend, ExecutionOptions, Revert},
};

pub mod curve;
pub mod lido;
pub mod maker;
pub mod token;

pub use curve::MockCurvePool;
pub use lido::MockLido;
pub use maker::{MockDaiJoin, MockPot, MockVat};
pub use token::MockErc20;

/// Gas charged for every top-level call.
pub const GAS_PER_CALL: u64 = 21_000;

/// Gas price used when a batch does not override it (1 gwei).
pub const DEFAULT_GAS_PRICE: u64 = 1_000_000_000;

/// 10^18.
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// 10^27.
pub fn ray() -> U256 {
    U256::from(10u64).pow(U256::from(27u64))
}

pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(WAD)
}

/// Balances and contract storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainState {
    balances: BTreeMap<Address, U256>,
    storage: BTreeMap<(Address, B256), U256>,
}

impl ChainState {
    pub fn balance(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn set_balance(&mut self, account: Address, amount: U256) {
        if amount.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    pub fn load(&self, contract: Address, key: B256) -> U256 {
        self.storage.get(&(contract, key)).copied().unwrap_or_default()
    }

    pub fn store(&mut self, contract: Address, key: B256, value: U256) {
        if value.is_zero() {
            self.storage.remove(&(contract, key));
        } else {
            self.storage.insert((contract, key), value);
        }
    }

    /// Move native value. Fails without a reason, like an out-of-funds call.
    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), Revert> {
        let debited = self.balance(from).checked_sub(value).ok_or_else(Revert::empty)?;
        self.set_balance(from, debited);
        let credited = self.balance(to).checked_add(value).ok_or_else(Revert::empty)?;
        self.set_balance(to, credited);
        Ok(())
    }
}

/// Storage key for a named variable, optionally keyed by addresses.
pub fn slot(name: &str, keys: &[Address]) -> B256 {
    let mut preimage = name.as_bytes().to_vec();
    for key in keys {
        preimage.extend_from_slice(key.as_slice());
    }
    keccak256(preimage)
}

/// Context of one (possibly nested) call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    pub this: Address,
    pub caller: Address,
    pub value: U256,
}

/// A contract model. Behaviour lives in code; state lives in [`ChainState`]
/// under the contract's own address.
pub trait MockContract: Send + Sync {
    fn call(&self, env: &mut Env<'_>, frame: &Frame, data: &[u8]) -> Result<Vec<u8>, Revert>;
}

/// What a running contract can reach: state and other contracts.
pub struct Env<'a> {
    state: &'a mut ChainState,
    contracts: &'a BTreeMap<Address, Arc<dyn MockContract>>,
}

impl Env<'_> {
    pub fn state(&mut self) -> &mut ChainState {
        &mut *self.state
    }

    pub fn load(&self, contract: Address, key: B256) -> U256 {
        self.state.load(contract, key)
    }

    pub fn store(&mut self, contract: Address, key: B256, value: U256) {
        self.state.store(contract, key, value)
    }

    /// Call `to` from `from`. Accounts without code accept any payload.
    pub fn call(&mut self, from: Address, to: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Revert> {
        if !value.is_zero() {
            self.state.transfer(from, to, value)?;
        }
        let contracts = self.contracts;
        match contracts.get(&to) {
            Some(contract) => contract.call(self, &Frame { this: to, caller: from, value }, data),
            None => Ok(Vec::new()),
        }
    }
}

/// Decode `data` as `C`, reverting without a reason on malformed input.
pub(crate) fn decode<C: SolCall>(data: &[u8]) -> Result<C, Revert> {
    C::abi_decode(data, true).map_err(|_| Revert::empty())
}

/// First four bytes of `data`.
pub(crate) fn selector_of(data: &[u8]) -> Option<[u8; 4]> {
    data.get(..4).and_then(|s| s.try_into().ok())
}

pub(crate) fn encode_word(value: U256) -> Vec<u8> {
    value.abi_encode()
}

/// Checked subtraction reverting with `reason`.
pub(crate) fn sub(a: U256, b: U256, reason: &str) -> Result<U256, Revert> {
    a.checked_sub(b).ok_or_else(|| Revert::new(reason))
}

pub(crate) fn add(a: U256, b: U256) -> Result<U256, Revert> {
    a.checked_add(b).ok_or_else(Revert::empty)
}

/// `a * b / c`, rounding down.
pub(crate) fn mul_div(a: U256, b: U256, c: U256) -> Result<U256, Revert> {
    if c.is_zero() {
        return Err(Revert::empty());
    }
    Ok(a.checked_mul(b).ok_or_else(Revert::empty)? / c)
}

/// In-memory chain implementing [`ExecutionBackend`].
pub struct MockChain {
    state: ChainState,
    contracts: BTreeMap<Address, Arc<dyn MockContract>>,
    journal: Vec<ChainState>,
    gas_price: U256,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: ChainState::default(),
            contracts: BTreeMap::new(),
            journal: Vec::new(),
            gas_price: U256::from(DEFAULT_GAS_PRICE),
        }
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn deploy(&mut self, address: Address, contract: impl MockContract + 'static) {
        self.contracts.insert(address, Arc::new(contract));
    }

    pub fn fund(&mut self, account: Address, amount: U256) {
        let balance = self.state.balance(account).saturating_add(amount);
        self.state.set_balance(account, balance);
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.state.balance(account)
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChainState {
        &mut self.state
    }

    /// Run a call and discard its effects.
    pub fn view(&mut self, from: Address, to: Address, data: &[u8]) -> Result<Vec<u8>, Revert> {
        let saved = self.state.clone();
        let mut env = Env {
            state: &mut self.state,
            contracts: &self.contracts,
        };
        let out = env.call(from, to, U256::ZERO, data);
        self.state = saved;
        out
    }

    /// ERC-20 `balanceOf` of any deployed token model.
    pub fn token_balance(&mut self, token: Address, owner: Address) -> Result<U256, Revert> {
        let out = self.view(owner, token, &IERC20::balanceOfCall { owner }.abi_encode())?;
        U256::abi_decode(&out, true).map_err(|_| Revert::empty())
    }
}

impl ExecutionBackend for MockChain {
    type Checkpoint = usize;

    fn checkpoint(&mut self) -> usize {
        self.journal.push(self.state.clone());
        self.journal.len() - 1
    }

    fn call(&mut self, wallet: Address, call: &Call, options: &ExecutionOptions) -> Result<Bytes, Revert> {
        let fee = options
            .gas_price
            .unwrap_or(self.gas_price)
            .saturating_mul(U256::from(GAS_PER_CALL));
        let remaining = sub(self.state.balance(wallet), fee, "insufficient funds for gas")?;
        self.state.set_balance(wallet, remaining);

        let mut env = Env {
            state: &mut self.state,
            contracts: &self.contracts,
        };
        env.call(wallet, call.to, call.value, &call.data).map(Bytes::from)
    }

    fn revert_to(&mut self, checkpoint: usize) {
        self.journal.truncate(checkpoint + 1);
        if let Some(saved) = self.journal.pop() {
            self.state = saved;
        }
    }

    fn commit(&mut self, checkpoint: usize) {
        self.journal.truncate(checkpoint);
    }
}
