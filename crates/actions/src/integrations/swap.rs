//! Token swaps through a router aggregator.
//!
//! Router quotes go stale quickly and an approval transaction takes at least
//! one block to be mined, so the plan that was used to learn the spender is
//! thrown away once an approval was mined and a fresh one is executed:
//! `quote(plan₁) → approve → quote(plan₂) → execute(plan₂)`. The fresh quote
//! has to route through the approved spender.

use {
    super::{Context, failed, with_approval},
    crate::{Error, support},
    plan_executor::{
        domain::{
            eth,
            execution::{self, ErrorKind, ExecutionResult},
            intent::{self, Intent},
        },
        infra::{PlanFetching, observe},
        util::serialize::HexOrDecimalU256,
    },
    serde::Deserialize,
    serde_with::serde_as,
    std::sync::Arc,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub networks: support::Networks,
    /// Slippage used when the caller does not specify one.
    pub slippage_bps: u32,
    /// Contract that needs the allowance. Defaults to the target of the
    /// first transaction of the quoted plan.
    pub spender: Option<eth::Address>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Params {
    pub token_in: eth::TokenAddress,
    pub token_out: eth::TokenAddress,
    #[serde_as(as = "HexOrDecimalU256")]
    pub amount_in: eth::U256,
    #[serde(default)]
    pub slippage_bps: Option<u32>,
    /// Defaults to the executing account.
    #[serde(default)]
    pub recipient: Option<eth::Address>,
}

pub struct Swap {
    context: Context,
    plans: Arc<dyn PlanFetching>,
    config: Config,
}

impl Swap {
    pub fn new(context: Context, plans: Arc<dyn PlanFetching>, config: Config) -> Self {
        Self {
            context,
            plans,
            config,
        }
    }

    pub async fn route(&self, params: Params) -> Result<ExecutionResult, Error> {
        let chain = self.context.chain();
        if let Err(err) = self.config.networks.check(&chain.network()) {
            return Ok(failed(err, None));
        }
        if params.token_in == params.token_out {
            return Ok(failed(
                execution::Error::new(
                    ErrorKind::UnsupportedAsset,
                    "cannot swap a token for itself",
                ),
                None,
            ));
        }

        let sender = chain.address();
        let intent = Intent::Swap(intent::Swap {
            token_in: params.token_in,
            token_out: params.token_out,
            amount_in: params.amount_in,
            slippage_bps: params.slippage_bps.unwrap_or(self.config.slippage_bps),
            sender,
            recipient: params.recipient.unwrap_or(sender),
        });

        let plan = match self.context.fetch(self.plans.as_ref(), &intent).await? {
            Ok(plan) => plan,
            Err(err) => return Ok(failed(err, None)),
        };
        let Some(spender) = self.config.spender.or(plan.first_transaction_target()) else {
            // Nothing left to send, so nothing needs an allowance either.
            return Ok(self.context.execute(plan).await);
        };

        let approval = match self
            .context
            .guard()
            .ensure(sender, spender, params.token_in, params.amount_in)
            .await
        {
            Ok(approval) => approval,
            Err(err) => return Ok(failed(err, None)),
        };

        // Only a mined approval can invalidate the quote.
        let plan = if approval.is_some() && intent.is_quote_sensitive() {
            observe::refetching_plan(&intent);
            let plan = match self.context.fetch(self.plans.as_ref(), &intent).await? {
                Ok(plan) => plan,
                Err(err) => return Ok(failed(err, approval)),
            };
            // A re-routed quote would spend through a contract that holds no
            // allowance.
            let rerouted = plan
                .first_transaction_target()
                .filter(|target| self.config.spender.is_none() && *target != spender);
            if let Some(target) = rerouted {
                return Ok(failed(
                    execution::Error::new(
                        ErrorKind::QuoteFailed,
                        format!("fresh quote routes through {target} instead of approved {spender}"),
                    ),
                    approval,
                ));
            }
            plan
        } else {
            plan
        };

        let result = self.context.execute(plan).await;
        Ok(with_approval(result, approval))
    }
}
