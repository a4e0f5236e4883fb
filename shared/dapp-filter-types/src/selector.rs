use alloy_primitives::keccak256;

/// 4-byte method selector.
pub type Selector = [u8; 4];

/// Selector of a canonical Solidity signature, eg `"join(address,uint256)"`.
pub fn selector(sig: &str) -> Selector {
    let h = keccak256(sig.as_bytes());
    [h[0], h[1], h[2], h[3]]
}

/// `0x`-prefixed lowercase hex rendering.
pub fn format_selector(sel: &Selector) -> String {
    format!("0x{}", hex::encode(sel))
}

/// Accepts either a raw selector (`0x095ea7b3`) or a signature (`approve(address,uint256)`).
pub fn parse_selector(input: &str) -> Option<Selector> {
    let trimmed = input.trim();
    if trimmed.contains('(') {
        return trimmed.ends_with(')').then(|| selector(trimmed));
    }
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let raw = hex::decode(digits).ok()?;
    Selector::try_from(raw.as_slice()).ok()
}
