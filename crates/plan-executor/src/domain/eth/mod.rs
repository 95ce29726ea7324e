use {
    derive_more::{Display, From, Into},
    serde::{Deserialize, Serialize},
};
pub use {
    alloy::primitives::{Address, Bytes, TxHash, U256, address},
    allowance::Allowance,
};

pub mod allowance;

/// Address that aggregators use to denote the chain's native asset (ETH on
/// mainnet) in places where an ERC20 token address is expected.
pub const NATIVE_TOKEN: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Chain ID as defined by EIP-155.
///
/// https://eips.ethereum.org/EIPS/eip-155
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into, Display)]
pub struct ChainId(pub u64);

/// Human readable network identifier, e.g. `base-mainnet`. Aggregator APIs
/// use it as a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, From, Display)]
pub struct NetworkId(pub String);

impl NetworkId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NetworkId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Family of protocols a network belongs to. Only EVM networks can execute
/// plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ProtocolFamily {
    #[display("evm")]
    Evm,
}

/// Network information for a blockchain connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: NetworkId,
    pub chain: ChainId,
    pub protocol_family: ProtocolFamily,
}

/// An ERC20 token address.
///
/// https://eips.ethereum.org/EIPS/eip-20
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Display, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenAddress(pub Address);

impl TokenAddress {
    /// Whether the address denotes the native asset rather than an ERC20
    /// contract. Native transfers need no allowance.
    pub fn is_native(&self) -> bool {
        self.0 == NATIVE_TOKEN || self.0.is_zero()
    }
}

/// A transaction ready to be handed to the signing wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    /// The sender, if the plan source pinned one. The wallet's default
    /// account is used otherwise.
    pub from: Option<Address>,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    /// Gas limit override. The node estimates the limit when missing.
    pub gas: Option<u64>,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Reverted,
}

/// The parts of a transaction receipt the executor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub hash: TxHash,
    pub status: TxStatus,
    pub block: Option<u64>,
}
