//! What the user wants to happen. A plan source turns an intent into an
//! [`ExecutionPlan`](crate::domain::plan::ExecutionPlan).

use {
    crate::{domain::eth, util::serialize::HexOrDecimalU256},
    serde::Serialize,
    serde_with::serde_as,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Intent {
    Swap(Swap),
    Buy(Buy),
    Bid(Bid),
    Supply(Lend),
    Withdraw(Lend),
}

impl Intent {
    /// Stable name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Swap(_) => "swap",
            Intent::Buy(_) => "buy",
            Intent::Bid(_) => "bid",
            Intent::Supply(_) => "supply",
            Intent::Withdraw(_) => "withdraw",
        }
    }

    /// Whether a plan for this intent embeds a price quote that goes stale.
    pub fn is_quote_sensitive(&self) -> bool {
        matches!(self, Intent::Swap(_))
    }
}

/// Exchange an exact amount of one token for another through a router.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Swap {
    pub token_in: eth::TokenAddress,
    pub token_out: eth::TokenAddress,
    #[serde_as(as = "HexOrDecimalU256")]
    pub amount_in: eth::U256,
    /// Maximum accepted slippage in basis points.
    pub slippage_bps: u32,
    pub sender: eth::Address,
    pub recipient: eth::Address,
}

/// Purchase a listed marketplace item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Buy {
    /// Item identifier in `<collection>:<tokenId>` form.
    pub token: String,
    pub quantity: u64,
    pub taker: eth::Address,
}

/// Place an off-chain offer on a marketplace item.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    /// Item identifier in `<collection>:<tokenId>` form.
    pub token: String,
    /// Offered price in atoms of `currency`.
    #[serde_as(as = "HexOrDecimalU256")]
    pub weth_price: eth::U256,
    pub currency: eth::TokenAddress,
    /// Unix timestamp after which the offer expires.
    pub expiration: Option<u64>,
    pub maker: eth::Address,
}

/// Supply an asset to, or withdraw it from, a lending pool.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lend {
    pub asset: eth::TokenAddress,
    #[serde_as(as = "HexOrDecimalU256")]
    pub amount: eth::U256,
    pub account: eth::Address,
}
