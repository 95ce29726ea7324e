use {
    super::{ChainClient, Error},
    crate::domain::eth::{self, allowance},
    alloy::sol_types::SolCall,
};

alloy::sol! {
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// An ERC-20 token accessed through a [`ChainClient`].
///
/// https://eips.ethereum.org/EIPS/eip-20
pub struct Erc20<'a> {
    chain: &'a dyn ChainClient,
    token: eth::TokenAddress,
}

impl<'a> Erc20<'a> {
    pub fn new(chain: &'a dyn ChainClient, token: eth::TokenAddress) -> Self {
        Self { chain, token }
    }

    /// Fetch the ERC20 allowance for the spender. See the allowance method in
    /// EIP-20.
    ///
    /// https://eips.ethereum.org/EIPS/eip-20#allowance
    pub async fn allowance(
        &self,
        owner: eth::Address,
        spender: eth::Address,
    ) -> Result<allowance::Existing, Error> {
        let call = IERC20::allowanceCall { owner, spender };
        let output = self
            .chain
            .call(self.token.0, call.abi_encode().into())
            .await?;
        let amount = IERC20::allowanceCall::abi_decode_returns(&output)?;
        Ok(eth::Allowance {
            owner,
            spender,
            token: self.token,
            amount,
        }
        .into())
    }

    /// Builds the approve() transaction for an approval.
    ///
    /// https://eips.ethereum.org/EIPS/eip-20#approve
    pub fn approve(&self, approval: &allowance::Approval) -> eth::Tx {
        let call = IERC20::approveCall {
            spender: approval.0.spender,
            amount: approval.0.amount,
        };
        eth::Tx {
            from: Some(approval.0.owner),
            to: self.token.0,
            input: call.abi_encode().into(),
            value: eth::U256::ZERO,
            gas: None,
        }
    }
}
