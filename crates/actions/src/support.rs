//! Static support tables. Checks against them happen before any side effect.

use {
    plan_executor::domain::{
        eth,
        execution::{Error, ErrorKind},
    },
    std::collections::{HashMap, HashSet},
};

/// Networks an integration is enabled on.
#[derive(Debug, Clone, Default)]
pub struct Networks(HashSet<eth::NetworkId>);

impl Networks {
    pub fn new(networks: impl IntoIterator<Item = eth::NetworkId>) -> Self {
        Self(networks.into_iter().collect())
    }

    pub fn check(&self, network: &eth::Network) -> Result<(), Error> {
        if network.protocol_family == eth::ProtocolFamily::Evm && self.0.contains(&network.id) {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::UnsupportedNetwork,
                format!("network {} is not supported", network.id),
            ))
        }
    }
}

/// Token addresses by network and symbol. Symbols are case insensitive.
#[derive(Debug, Clone, Default)]
pub struct Assets(HashMap<eth::NetworkId, HashMap<String, eth::TokenAddress>>);

impl Assets {
    pub fn new(
        assets: impl IntoIterator<Item = (eth::NetworkId, HashMap<String, eth::TokenAddress>)>,
    ) -> Self {
        Self(
            assets
                .into_iter()
                .map(|(network, tokens)| {
                    let tokens = tokens
                        .into_iter()
                        .map(|(symbol, token)| (symbol.to_uppercase(), token))
                        .collect();
                    (network, tokens)
                })
                .collect(),
        )
    }

    pub fn resolve(&self, network: &eth::NetworkId, symbol: &str) -> Result<eth::TokenAddress, Error> {
        self.0
            .get(network)
            .and_then(|tokens| tokens.get(&symbol.to_uppercase()))
            .copied()
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::UnsupportedAsset,
                    format!("asset {symbol} is not supported on {network}"),
                )
            })
    }
}
