//! NFT marketplace orders. The marketplace returns plans that already
//! contain every approval they need, so no allowance is ensured up front.
//! Buying is a series of transactions, bidding is usually a signature whose
//! postback places the off-chain order.

use {
    super::{Context, failed},
    crate::{Error, support},
    plan_executor::{
        domain::{
            eth,
            execution::ExecutionResult,
            intent::{self, Intent},
        },
        infra::PlanFetching,
        util::serialize::HexOrDecimalU256,
    },
    serde::Deserialize,
    serde_with::serde_as,
    std::sync::Arc,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub networks: support::Networks,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuyParams {
    /// Item identifier in `<collection>:<tokenId>` form.
    pub token: String,
    #[serde(default = "one")]
    pub quantity: u64,
}

fn one() -> u64 {
    1
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BidParams {
    /// Item identifier in `<collection>:<tokenId>` form.
    pub token: String,
    #[serde_as(as = "HexOrDecimalU256")]
    pub weth_price: eth::U256,
    /// The ERC20 the offer is denominated in.
    pub currency: eth::TokenAddress,
    /// Unix timestamp after which the offer expires.
    #[serde(default)]
    pub expiration: Option<u64>,
}

pub struct Marketplace {
    context: Context,
    plans: Arc<dyn PlanFetching>,
    config: Config,
}

impl Marketplace {
    pub fn new(context: Context, plans: Arc<dyn PlanFetching>, config: Config) -> Self {
        Self {
            context,
            plans,
            config,
        }
    }

    pub async fn buy(&self, params: BuyParams) -> Result<ExecutionResult, Error> {
        let intent = Intent::Buy(intent::Buy {
            token: params.token,
            quantity: params.quantity,
            taker: self.context.chain().address(),
        });
        self.execute(intent).await
    }

    pub async fn bid(&self, params: BidParams) -> Result<ExecutionResult, Error> {
        let intent = Intent::Bid(intent::Bid {
            token: params.token,
            weth_price: params.weth_price,
            currency: params.currency,
            expiration: params.expiration,
            maker: self.context.chain().address(),
        });
        self.execute(intent).await
    }

    async fn execute(&self, intent: Intent) -> Result<ExecutionResult, Error> {
        if let Err(err) = self.config.networks.check(&self.context.chain().network()) {
            return Ok(failed(err, None));
        }
        match self.context.fetch(self.plans.as_ref(), &intent).await? {
            Ok(plan) => Ok(self.context.execute(plan).await),
            Err(err) => Ok(failed(err, None)),
        }
    }
}
