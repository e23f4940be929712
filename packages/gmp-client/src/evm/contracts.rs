//! Token and bridge contract ABI definitions
//!
//! The CHOM token contract doubles as the bridge: it locks tokens and emits the
//! Axelar gateway call from `bridge`, so the bridge address equals the token
//! address on every chain.

use alloy::sol;

sol! {
    /// Standard ERC20 interface
    #[sol(rpc)]
    contract ERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}

sol! {
    /// CHOM token with Axelar GMP lock/unlock bridging
    #[sol(rpc)]
    contract ChomToken {
        /// Lock `amount` and send an unlock message to `destinationChain`.
        /// `msg.value` pays the Axelar gas service.
        function bridge(string destinationChain, uint256 amount) external payable;
    }
}
