//! The actions exposed to agents: swaps, marketplace orders and lending,
//! each built on top of the plan executor.

use {
    anyhow::Context as _,
    integrations::{
        Context,
        lending::Lending,
        marketplace::Marketplace,
        swap::Swap,
    },
    plan_executor::{
        domain::eth,
        infra::{aggregator, blockchain},
    },
    std::{path::Path, sync::Arc},
};

pub mod config;
pub mod error;
pub mod integrations;
pub mod outcome;
pub mod registry;
pub mod support;

pub use {
    config::Config,
    error::Error,
    registry::{Action, Registry},
};

/// Loads the configuration, sets up observability and connects to the
/// configured node and aggregator.
pub async fn start(path: &Path) -> anyhow::Result<Registry> {
    let config = config::load(path).await?;
    plan_executor::infra::observe::init(&config.log);
    tracing::info!(?path, "loaded configuration");
    build(config).await
}

/// Connects the clients and registers the configured actions.
pub async fn build(config: Config) -> anyhow::Result<Registry> {
    let chain = blockchain::Ethereum::new(config.chain)
        .await
        .context("failed to connect to node")?;
    let network = blockchain::ChainClient::network(&chain);
    anyhow::ensure!(
        config.chain_id == network.chain,
        "configured chain ID {} does not match the connected node's {}",
        config.chain_id,
        network.chain
    );
    let aggregator = Arc::new(aggregator::Client::new(
        reqwest::ClientBuilder::new(),
        config.aggregator,
    )?);
    let context = Context::new(Arc::new(chain), aggregator.clone());

    let mut registry = Registry::default();
    if let Some(swap) = config.swap {
        register_swap(&mut registry, Swap::new(context.clone(), aggregator.clone(), swap));
    }
    if let Some(marketplace) = config.marketplace {
        register_marketplace(
            &mut registry,
            Marketplace::new(context.clone(), aggregator.clone(), marketplace),
        );
    }
    if let Some(lending) = config.lending {
        let lending = lending
            .resolve(network.chain)
            .with_context(|| no_pool(network.chain))?;
        register_lending(&mut registry, Lending::new(context, lending));
    }
    Ok(registry)
}

/// Counters of executed plans, items, approvals and aggregator requests in
/// the prometheus text format.
pub fn metrics() -> String {
    observe::metrics::encode()
}

fn no_pool(chain: eth::ChainId) -> String {
    format!("no lending pool preset for chain {chain}, configure its address")
}

pub fn register_swap(registry: &mut Registry, swap: Swap) {
    let swap = Arc::new(swap);
    registry.register(Action::new(
        "swap",
        "Swaps an exact amount of one token for another through the router aggregator.",
        move |input| {
            let swap = swap.clone();
            async move {
                let result = swap.route(serde_json::from_value(input)?).await?;
                Ok::<_, Error>(outcome::describe("swap", &result))
            }
        },
    ));
}

pub fn register_marketplace(registry: &mut Registry, marketplace: Marketplace) {
    let marketplace = Arc::new(marketplace);
    let buy = marketplace.clone();
    registry.register(Action::new(
        "buy",
        "Buys a listed marketplace item with the executing account.",
        move |input| {
            let marketplace = buy.clone();
            async move {
                let result = marketplace.buy(serde_json::from_value(input)?).await?;
                Ok::<_, Error>(outcome::describe("buy", &result))
            }
        },
    ));
    registry.register(Action::new(
        "bid",
        "Places an offer on a marketplace item, signed by the executing account.",
        move |input| {
            let marketplace = marketplace.clone();
            async move {
                let result = marketplace.bid(serde_json::from_value(input)?).await?;
                Ok::<_, Error>(outcome::describe("bid", &result))
            }
        },
    ));
}

pub fn register_lending(registry: &mut Registry, lending: Lending) {
    let lending = Arc::new(lending);
    let supply = lending.clone();
    registry.register(Action::new(
        "supply",
        "Supplies an asset to the lending pool.",
        move |input| {
            let lending = supply.clone();
            async move {
                let result = lending.supply(serde_json::from_value(input)?).await?;
                Ok::<_, Error>(outcome::describe("supply", &result))
            }
        },
    ));
    registry.register(Action::new(
        "withdraw",
        "Withdraws an asset from the lending pool to the executing account.",
        move |input| {
            let lending = lending.clone();
            async move {
                let result = lending.withdraw(serde_json::from_value(input)?).await?;
                Ok::<_, Error>(outcome::describe("withdraw", &result))
            }
        },
    ));
}
