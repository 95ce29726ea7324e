use {
    super::{Config, Lending, Pool},
    crate::{
        integrations::{marketplace, swap},
        support,
    },
    alloy::{primitives::B256, signers::local::PrivateKeySigner},
    plan_executor::{
        domain::eth,
        infra::{aggregator, blockchain},
    },
    serde::Deserialize,
    std::{
        collections::{HashMap, HashSet},
        path::{Path, PathBuf},
        time::Duration,
    },
    thiserror::Error,
    url::Url,
};

/// Loads the configuration from a TOML file.
pub async fn load(path: &Path) -> Result<Config, LoadError> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
    parse(&data)
}

/// Parses the configuration from TOML.
pub fn parse(data: &str) -> Result<Config, LoadError> {
    // The parser's message quotes the offending input, which may be the
    // private key, so it is dropped.
    let file: File = toml::de::from_str(data).map_err(|_| LoadError::Syntax)?;

    let chains = file
        .networks
        .iter()
        .map(|network| (network.id.clone(), eth::ChainId(network.chain_id)))
        .collect::<HashMap<_, _>>();
    let known = |id: &str| -> Result<(), LoadError> {
        if chains.contains_key(id) {
            Ok(())
        } else {
            Err(LoadError::UnknownNetwork(id.to_owned()))
        }
    };

    let networks = |ids: Vec<String>| -> Result<support::Networks, LoadError> {
        let ids = ids.into_iter().collect::<HashSet<_>>();
        ids.iter().try_for_each(|id| known(id.as_str()))?;
        Ok(support::Networks::new(ids.into_iter().map(eth::NetworkId)))
    };

    let assets = |assets: HashMap<String, HashMap<String, eth::Address>>| {
        assets
            .into_iter()
            .map(|(network, tokens)| -> Result<_, LoadError> {
                known(network.as_str())?;
                let tokens = tokens
                    .into_iter()
                    .map(|(symbol, token)| (symbol, eth::TokenAddress(token)))
                    .collect();
                Ok((eth::NetworkId(network), tokens))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(support::Assets::new)
    };

    let signer =
        PrivateKeySigner::from_bytes(&file.chain.private_key).map_err(|_| LoadError::PrivateKey)?;
    let chain_id = *chains
        .get(&file.chain.network)
        .ok_or_else(|| LoadError::UnknownNetwork(file.chain.network.clone()))?;
    let network = eth::NetworkId(file.chain.network);

    Ok(Config {
        log: observe::Config::new(&file.logging.filter, None, file.logging.json),
        chain_id,
        chain: blockchain::Config {
            url: file.chain.rpc_url,
            signer,
            network_id: network.clone(),
            confirmations: file.chain.confirmations,
            receipt_timeout: file.chain.receipt_timeout,
        },
        aggregator: aggregator::Config {
            base_url: file.aggregator.base_url,
            api_key: file.aggregator.api_key,
            timeout: file.aggregator.timeout,
            network,
        },
        swap: file
            .swap
            .map(|config| -> Result<_, LoadError> {
                Ok(swap::Config {
                    networks: networks(config.networks)?,
                    slippage_bps: config.slippage_bps,
                    spender: config.spender,
                })
            })
            .transpose()?,
        marketplace: file
            .marketplace
            .map(|config| -> Result<_, LoadError> {
                Ok(marketplace::Config {
                    networks: networks(config.networks)?,
                })
            })
            .transpose()?,
        lending: file
            .lending
            .map(|config| -> Result<_, LoadError> {
                Ok(Lending {
                    networks: networks(config.networks)?,
                    pool: match config.pool {
                        PoolConfig::Preset {
                            preset: PoolPreset::AaveV3,
                        } => Pool::AaveV3,
                        PoolConfig::Manual { address } => Pool::Address(address),
                    },
                    assets: assets(config.assets)?,
                })
            })
            .transpose()?,
    })
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error while reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("configuration is not valid TOML or has unexpected fields")]
    Syntax,
    #[error("invalid private key")]
    PrivateKey,
    #[error("network {0:?} is not listed in the network table")]
    UnknownNetwork(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct File {
    #[serde(default)]
    logging: LoggingConfig,
    chain: ChainConfig,
    aggregator: AggregatorConfig,
    /// Known networks by aggregator identifier.
    #[serde(default, rename = "network")]
    networks: Vec<NetworkConfig>,
    swap: Option<SwapConfig>,
    marketplace: Option<MarketplaceConfig>,
    lending: Option<LendingConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    filter: String,
    /// Log events as JSON.
    #[serde(default)]
    json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "info,plan_executor=debug,actions=debug".to_owned()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ChainConfig {
    /// The node's RPC endpoint.
    rpc_url: Url,
    /// Identifier of the connected network in the network table.
    network: String,
    /// Key of the executing account.
    private_key: B256,
    /// Blocks to wait for after inclusion before a transaction counts as
    /// mined.
    #[serde(default = "default_confirmations")]
    confirmations: u64,
    /// Upper bound on how long to wait for a receipt.
    #[serde(with = "humantime_serde", default = "default_receipt_timeout")]
    receipt_timeout: Duration,
}

fn default_confirmations() -> u64 {
    1
}

fn default_receipt_timeout() -> Duration {
    Duration::from_secs(120)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct AggregatorConfig {
    base_url: Url,
    api_key: Option<String>,
    #[serde(with = "humantime_serde", default = "default_aggregator_timeout")]
    timeout: Duration,
}

fn default_aggregator_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct NetworkConfig {
    id: String,
    chain_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct SwapConfig {
    networks: Vec<String>,
    #[serde(default = "default_slippage_bps")]
    slippage_bps: u32,
    /// Overrides the contract that receives the allowance.
    spender: Option<eth::Address>,
}

fn default_slippage_bps() -> u32 {
    50
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct MarketplaceConfig {
    networks: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct LendingConfig {
    networks: Vec<String>,
    #[serde(default)]
    pool: PoolConfig,
    /// Supported assets per network, by symbol.
    #[serde(default)]
    assets: HashMap<String, HashMap<String, eth::Address>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
enum PoolConfig {
    #[serde(rename_all = "kebab-case")]
    Preset { preset: PoolPreset },

    #[serde(rename_all = "kebab-case")]
    Manual {
        /// The address of an Aave V3 compatible pool contract.
        address: eth::Address,
    },
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::Preset {
            preset: PoolPreset::AaveV3,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum PoolPreset {
    AaveV3,
}
