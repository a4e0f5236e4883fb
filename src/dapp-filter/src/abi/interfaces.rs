//! Solidity ABI surface of the wallet entry point and of every target the
//! built-in filters recognise.
//!
//! Selectors used by the filters are taken from the generated `SolCall::SELECTOR`
//! constants so they cannot drift from the declared signatures.

use alloy_sol_types::sol;

sol! {
    /// One outbound call of a multicall batch.
    #[derive(Debug, PartialEq, Eq)]
    struct Call {
        address to;
        uint256 value;
        bytes data;
    }

    /// Wallet module entry point that executes a batch atomically.
    interface IMultiCall {
        function multiCall(address wallet, Call[] transactions) external returns (bytes[] memory);
    }

    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }

    /// Liquid-staking pool (stETH).
    interface ILido {
        function submit(address referral) external payable returns (uint256);
        function stop() external;
        function resume() external;
        function getPooledEthByShares(uint256 sharesAmount) external view returns (uint256);
        function sharesOf(address account) external view returns (uint256);
    }

    /// Stable-swap pool (stETH/ETH).
    interface ICurvePool {
        function exchange(int128 i, int128 j, uint256 dx, uint256 min_dy) external payable returns (uint256);
        function get_dy(int128 i, int128 j, uint256 dx) external view returns (uint256);
        function kill_me() external;
        function commit_new_fee(uint256 new_fee, uint256 new_admin_fee) external;
    }

    /// Savings module (Maker DSR pot).
    interface IPot {
        function drip() external returns (uint256);
        function join(uint256 wad) external;
        function exit(uint256 wad) external;
        function cage() external;
        function pie(address usr) external view returns (uint256);
        function chi() external view returns (uint256);
    }

    /// Collateral ledger (Maker vat).
    interface IVat {
        function hope(address usr) external;
        function nope(address usr) external;
        function dai(address usr) external view returns (uint256);
        function move(address src, address dst, uint256 rad) external;
        function vice() external view returns (uint256);
        function live() external view returns (uint256);
        function cage() external;
    }

    /// Token adapter between the ledger and the ERC-20 DAI token.
    interface IDaiJoin {
        function join(address usr, uint256 wad) external;
        function exit(address usr, uint256 wad) external;
        function live() external view returns (uint256);
        function cage() external;
    }
}
