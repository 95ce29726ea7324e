use {
    crate::domain::eth,
    alloy::{
        dyn_abi::TypedData,
        network::{EthereumWallet, ReceiptResponse},
        providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
        rpc::types::TransactionRequest,
        signers::{Signer, local::PrivateKeySigner},
    },
    std::time::Duration,
    thiserror::Error,
};

pub mod erc20;

pub use erc20::Erc20;

/// The capabilities the executor needs from a blockchain connection and the
/// wallet attached to it. The hosting application owns the implementation.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// The account that signs transactions and payloads.
    fn address(&self) -> eth::Address;

    /// The network this client is connected to.
    fn network(&self) -> eth::Network;

    /// Signs and broadcasts a transaction. Returns as soon as the node
    /// accepted it.
    async fn send_transaction(&self, tx: eth::Tx) -> Result<eth::TxHash, Error>;

    /// Waits until the transaction is mined.
    async fn wait_for_receipt(&self, hash: eth::TxHash) -> Result<eth::Receipt, Error>;

    /// Signs EIP-712 typed data.
    async fn sign_typed_data(&self, data: &TypedData) -> Result<eth::Bytes, Error>;

    /// Signs an EIP-191 personal message.
    async fn sign_message(&self, message: &[u8]) -> Result<eth::Bytes, Error>;

    /// Executes a read-only call against the latest block.
    async fn call(&self, to: eth::Address, input: eth::Bytes) -> Result<eth::Bytes, Error>;
}

#[derive(Debug, Clone)]
pub struct Config {
    /// The RPC endpoint of the node.
    pub url: url::Url,
    /// The key used for signing. Its address is the executing account.
    pub signer: PrivateKeySigner,
    /// The identifier aggregators use for this network.
    pub network_id: eth::NetworkId,
    /// How many blocks to wait for after inclusion before a receipt is
    /// considered final.
    pub confirmations: u64,
    /// Upper bound on how long to wait for a receipt.
    pub receipt_timeout: Duration,
}

/// An EVM blockchain accessed through an RPC node with a local signing key.
#[derive(Clone)]
pub struct Ethereum {
    provider: DynProvider,
    signer: PrivateKeySigner,
    network: eth::Network,
    confirmations: u64,
    receipt_timeout: Duration,
}

impl Ethereum {
    /// Connects to the node and fetches the chain ID.
    pub async fn new(config: Config) -> Result<Self, Error> {
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::new(config.signer.clone()))
            .connect_http(config.url)
            .erased();
        let chain = provider.get_chain_id().await?;

        Ok(Self {
            provider,
            signer: config.signer,
            network: eth::Network {
                id: config.network_id,
                chain: eth::ChainId(chain),
                protocol_family: eth::ProtocolFamily::Evm,
            },
            confirmations: config.confirmations,
            receipt_timeout: config.receipt_timeout,
        })
    }
}

#[async_trait::async_trait]
impl ChainClient for Ethereum {
    fn address(&self) -> eth::Address {
        self.signer.address()
    }

    fn network(&self) -> eth::Network {
        self.network.clone()
    }

    async fn send_transaction(&self, tx: eth::Tx) -> Result<eth::TxHash, Error> {
        let mut request = TransactionRequest::default()
            .from(tx.from.unwrap_or_else(|| self.signer.address()))
            .to(tx.to)
            .value(tx.value)
            .input(tx.input.into());
        if let Some(gas) = tx.gas {
            request = request.gas_limit(gas);
        }

        let pending = self.provider.send_transaction(request).await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: eth::TxHash) -> Result<eth::Receipt, Error> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), hash)
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await?;

        Ok(eth::Receipt {
            hash: receipt.transaction_hash,
            status: if receipt.status() {
                eth::TxStatus::Success
            } else {
                eth::TxStatus::Reverted
            },
            block: receipt.block_number,
        })
    }

    async fn sign_typed_data(&self, data: &TypedData) -> Result<eth::Bytes, Error> {
        let signature = self.signer.sign_dynamic_typed_data(data).await?;
        Ok(eth::Bytes::copy_from_slice(&signature.as_bytes()))
    }

    async fn sign_message(&self, message: &[u8]) -> Result<eth::Bytes, Error> {
        let signature = self.signer.sign_message(message).await?;
        Ok(eth::Bytes::copy_from_slice(&signature.as_bytes()))
    }

    async fn call(&self, to: eth::Address, input: eth::Bytes) -> Result<eth::Bytes, Error> {
        let request = TransactionRequest::default().to(to).input(input.into());
        Ok(self.provider.call(request).await?)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("rpc error: {0}")]
    Rpc(#[from] alloy::transports::TransportError),
    #[error("failed waiting for receipt: {0}")]
    Receipt(#[from] alloy::providers::PendingTransactionError),
    #[error("signer error: {0}")]
    Signing(#[from] alloy::signers::Error),
    #[error("abi error: {0}")]
    Abi(#[from] alloy::sol_types::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
