use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use dapp_filter_types::Selector;

use crate::{
    abi::{
        constants::{SPENDER_IN_FIRST_ARG, SPENDER_IN_SECOND_ARG},
        Call, IMultiCall,
    },
    errors::DecodeError,
};

const WORD: usize = 32;
const SELECTOR_LEN: usize = 4;
/// Selector plus two argument words; shortest payload spender recovery looks into.
const SPENDER_PAYLOAD_MIN: usize = SELECTOR_LEN + 2 * WORD;

/// Decoded form of one outbound call.
///
/// Argument words are kept raw: their layout is only known to the filter that
/// recognises the selector. The original payload is retained so execution can
/// forward it unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallDescriptor {
    pub target: Address,
    pub value: U256,
    /// `None` for a bare value transfer (or a payload too short to hold one).
    pub selector: Option<Selector>,
    pub args: Vec<B256>,
    /// Address whose filter decides on this call. Equals `target` except for
    /// token approvals and transfers, where it is the approved party / recipient.
    pub spender: Address,
    payload: Bytes,
    defect: Option<DecodeError>,
}

impl CallDescriptor {
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Empty payload: a plain value transfer hitting the target's receive/fallback.
    pub fn is_bare_transfer(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn is_malformed(&self) -> bool {
        self.defect.is_some()
    }

    /// Why the payload could not be parsed, for malformed descriptors.
    pub fn defect(&self) -> Option<&DecodeError> {
        self.defect.as_ref()
    }

    /// The call authorises (or pays) a third party on a token contract.
    pub fn is_token_call(&self) -> bool {
        self.spender != self.target
    }

    pub fn has_selector(&self, sel: Selector) -> bool {
        self.selector == Some(sel)
    }

    pub fn word(&self, index: usize) -> Option<B256> {
        self.args.get(index).copied()
    }

    /// Argument `index` read as an address; `None` when absent or not left-padded with zeros.
    pub fn address_arg(&self, index: usize) -> Option<Address> {
        self.word(index).and_then(word_to_address)
    }

    pub fn uint_arg(&self, index: usize) -> Option<U256> {
        self.word(index).map(|w| U256::from_be_bytes(w.0))
    }

    /// Strict ABI decoding of the whole payload as `C`. `None` on selector
    /// mismatch or non-canonical encoding.
    pub fn decode<C: SolCall>(&self) -> Option<C> {
        if self.selector != Some(C::SELECTOR) {
            return None;
        }
        C::abi_decode(&self.payload, true).ok()
    }
}

/// Build a descriptor from a raw call. Never fails: payloads that cannot be
/// parsed produce a descriptor flagged as malformed.
pub fn decode_call(target: Address, value: U256, payload: Bytes) -> CallDescriptor {
    let mut descriptor = CallDescriptor {
        target,
        value,
        selector: None,
        args: Vec::new(),
        spender: target,
        payload,
        defect: None,
    };
    if descriptor.payload.is_empty() {
        return descriptor;
    }

    let bytes = descriptor.payload.clone();
    let mut i = 0usize;
    let selector = match read_selector(&bytes, &mut i) {
        Ok(sel) => sel,
        Err(e) => {
            descriptor.defect = Some(e);
            return descriptor;
        },
    };
    descriptor.selector = Some(selector);

    while i < bytes.len() {
        match read_word(&bytes, &mut i) {
            Ok(word) => descriptor.args.push(word),
            Err(e) => {
                descriptor.defect = Some(e);
                return descriptor;
            },
        }
    }

    match recover_spender(&descriptor) {
        Some(Ok(spender)) => descriptor.spender = spender,
        Some(Err(e)) => descriptor.defect = Some(e),
        None => {},
    }
    descriptor
}

/// `Some(Ok(spender))` for token approval / transfer payloads, `Some(Err)` when
/// such a payload names a non-canonical address, `None` for everything else.
fn recover_spender(descriptor: &CallDescriptor) -> Option<Result<Address, DecodeError>> {
    if descriptor.payload.len() < SPENDER_PAYLOAD_MIN {
        return None;
    }
    let selector = descriptor.selector?;
    let index = if SPENDER_IN_FIRST_ARG.contains(&selector) {
        0
    } else if SPENDER_IN_SECOND_ARG.contains(&selector) {
        1
    } else {
        return None;
    };
    Some(
        descriptor
            .address_arg(index)
            .ok_or(DecodeError::DirtyAddress(index)),
    )
}

/// Decode ABI-encoded `multiCall(address,(address,uint256,bytes)[])` calldata.
pub fn decode_multicall(calldata: &[u8]) -> Result<(Address, Vec<Call>), DecodeError> {
    if calldata.len() < SELECTOR_LEN {
        return Err(DecodeError::Truncated(calldata.len()));
    }
    if calldata[..SELECTOR_LEN] != IMultiCall::multiCallCall::SELECTOR {
        return Err(DecodeError::NotMultiCall);
    }
    let call = IMultiCall::multiCallCall::abi_decode(calldata, true)
        .map_err(|e| DecodeError::Abi(e.to_string()))?;
    Ok((call.wallet, call.transactions))
}

pub fn encode_multicall(wallet: Address, transactions: Vec<Call>) -> Vec<u8> {
    IMultiCall::multiCallCall {
        wallet,
        transactions,
    }
    .abi_encode()
}

pub fn encode_transaction(to: Address, value: U256, data: impl Into<Bytes>) -> Call {
    Call {
        to,
        value,
        data: data.into(),
    }
}

fn word_to_address(word: B256) -> Option<Address> {
    if word[..12].iter().any(|b| *b != 0) {
        return None;
    }
    Some(Address::from_word(word))
}

fn read_selector(bytes: &[u8], i: &mut usize) -> Result<Selector, DecodeError> {
    if bytes.len() < *i + SELECTOR_LEN {
        return Err(DecodeError::Truncated(bytes.len()));
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&bytes[*i..*i + SELECTOR_LEN]);
    *i += SELECTOR_LEN;
    Ok(sel)
}

fn read_word(bytes: &[u8], i: &mut usize) -> Result<B256, DecodeError> {
    if bytes.len() < *i + WORD {
        return Err(DecodeError::MisalignedArgs(bytes.len() - SELECTOR_LEN));
    }
    let word = B256::from_slice(&bytes[*i..*i + WORD]);
    *i += WORD;
    Ok(word)
}
