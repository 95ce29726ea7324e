//! Configuration of the action layer. All clients and keys are created from
//! it at startup and handed to the integrations.

use {
    crate::{
        integrations::{lending, marketplace, swap},
        support,
    },
    plan_executor::{
        domain::eth,
        infra::{aggregator, blockchain},
    },
};

pub mod file;

pub use file::{LoadError, load};

#[derive(Debug)]
pub struct Config {
    pub log: observe::Config,
    pub chain: blockchain::Config,
    /// Chain ID the network table lists for the configured network. The node
    /// has to report the same one.
    pub chain_id: eth::ChainId,
    pub aggregator: aggregator::Config,
    pub swap: Option<swap::Config>,
    pub marketplace: Option<marketplace::Config>,
    pub lending: Option<Lending>,
}

/// Lending configuration before the pool is resolved for the connected
/// chain.
#[derive(Debug, Clone)]
pub struct Lending {
    pub networks: support::Networks,
    pub pool: Pool,
    pub assets: support::Assets,
}

impl Lending {
    pub fn resolve(self, chain: eth::ChainId) -> Option<lending::Config> {
        Some(lending::Config {
            pool: self.pool.address(chain)?,
            networks: self.networks,
            assets: self.assets,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    /// The Aave V3 deployment of the connected chain.
    AaveV3,
    Address(eth::Address),
}

impl Pool {
    pub fn address(&self, chain: eth::ChainId) -> Option<eth::Address> {
        match self {
            Pool::AaveV3 => lending::pool::aave_v3(chain),
            Pool::Address(address) => Some(*address),
        }
    }
}
