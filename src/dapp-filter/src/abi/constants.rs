//! Constants shared by the decoder, the filters and the executor.

use alloy_sol_types::SolCall;
use dapp_filter_types::Selector;

use crate::abi::interfaces::IERC20;

/// Surfaced to the batch caller for every authorisation rejection.
pub const NOT_AUTHORISED: &str = "TM: call not authorised";

/// Surfaced when an authorised call reverted without a reason.
pub const CALL_FAILED: &str = "TM: call failed";

pub const ERC20_TRANSFER: Selector = IERC20::transferCall::SELECTOR;
pub const ERC20_APPROVE: Selector = IERC20::approveCall::SELECTOR;

// setApprovalForAll(address,bool)
pub const ERC721_SET_APPROVAL_FOR_ALL: Selector = [0xa2, 0x2c, 0xb4, 0x65];
// transferFrom(address,address,uint256)
pub const ERC721_TRANSFER_FROM: Selector = [0x23, 0xb8, 0x72, 0xdd];
// safeTransferFrom(address,address,uint256)
pub const ERC721_SAFE_TRANSFER_FROM: Selector = [0x42, 0x84, 0x2e, 0x0e];
// safeTransferFrom(address,address,uint256,bytes)
pub const ERC721_SAFE_TRANSFER_FROM_BYTES: Selector = [0xb8, 0x8d, 0x4f, 0xde];
// safeTransferFrom(address,address,uint256,uint256,bytes)
pub const ERC1155_SAFE_TRANSFER_FROM: Selector = [0xf2, 0x42, 0x43, 0x2a];

/// Token methods whose first argument is the spender.
pub const SPENDER_IN_FIRST_ARG: [Selector; 3] =
    [ERC20_TRANSFER, ERC20_APPROVE, ERC721_SET_APPROVAL_FOR_ALL];

/// Token methods whose second argument is the spender.
pub const SPENDER_IN_SECOND_ARG: [Selector; 4] = [
    ERC721_TRANSFER_FROM,
    ERC721_SAFE_TRANSFER_FROM,
    ERC721_SAFE_TRANSFER_FROM_BYTES,
    ERC1155_SAFE_TRANSFER_FROM,
];

#[cfg(test)]
mod tests {
    use super::*;
    use dapp_filter_types::selector;

    #[test]
    fn token_selectors_match_signatures() {
        assert_eq!(ERC20_TRANSFER, selector("transfer(address,uint256)"));
        assert_eq!(ERC20_APPROVE, selector("approve(address,uint256)"));
        assert_eq!(
            ERC721_SET_APPROVAL_FOR_ALL,
            selector("setApprovalForAll(address,bool)")
        );
        assert_eq!(
            ERC721_TRANSFER_FROM,
            selector("transferFrom(address,address,uint256)")
        );
        assert_eq!(
            ERC721_SAFE_TRANSFER_FROM,
            selector("safeTransferFrom(address,address,uint256)")
        );
        assert_eq!(
            ERC721_SAFE_TRANSFER_FROM_BYTES,
            selector("safeTransferFrom(address,address,uint256,bytes)")
        );
        assert_eq!(
            ERC1155_SAFE_TRANSFER_FROM,
            selector("safeTransferFrom(address,address,uint256,uint256,bytes)")
        );
    }
}
