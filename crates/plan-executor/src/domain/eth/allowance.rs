use super::{Address, TokenAddress, U256};

/// An ERC20 allowance.
///
/// https://eips.ethereum.org/EIPS/eip-20
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Allowance {
    pub owner: Address,
    pub spender: Address,
    pub token: TokenAddress,
    pub amount: U256,
}

/// An allowance that's already in effect, this essentially models the result of
/// the allowance() method, see https://eips.ethereum.org/EIPS/eip-20#methods.
#[derive(Debug, Clone, Copy)]
pub struct Existing(pub Allowance);

impl From<Allowance> for Existing {
    fn from(inner: Allowance) -> Self {
        Self(inner)
    }
}

/// An allowance that is required for some action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Required(pub Allowance);

impl Required {
    /// Check if this allowance needs to be approved, and if so, return the
    /// appropriate [`Approval`].
    ///
    /// Allowances of a different (owner, spender, token) triple never satisfy
    /// the requirement.
    pub fn approval(&self, existing: &Existing) -> Option<Approval> {
        let same_pair = self.0.owner == existing.0.owner
            && self.0.spender == existing.0.spender
            && self.0.token == existing.0.token;
        if same_pair && self.0.amount <= existing.0.amount {
            None
        } else {
            Some(Approval(self.0))
        }
    }
}

/// An approval which needs to be made with an approve() call, see
/// https://eips.ethereum.org/EIPS/eip-20#methods.
///
/// The approved amount is always exactly the required amount, never the
/// maximal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Approval(pub Allowance);
