//! Supplying to and withdrawing from an Aave V3 compatible lending pool.
//! Plans are built locally from the pool's ABI rather than fetched from an
//! aggregator.

use {
    super::{Context, failed, with_approval},
    crate::{Error, support},
    alloy::sol_types::SolCall,
    plan_executor::{
        domain::{
            eth,
            execution::{self, ErrorKind, ExecutionResult},
            intent::{self, Intent},
            plan::{ExecutionPlan, Item, Kind, Step},
        },
        infra::{
            PlanFetching,
            aggregator::FetchError,
        },
        util::serialize::HexOrDecimalU256,
    },
    serde::Deserialize,
    serde_with::serde_as,
    std::sync::Arc,
};

alloy::sol! {
    interface IPool {
        function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
        function withdraw(address asset, uint256 amount, address to) external returns (uint256);
    }
}

/// Known Aave V3 pool deployments.
pub mod pool {
    use plan_executor::domain::eth::{self, address};

    /// https://aave.com/docs/resources/addresses
    pub fn aave_v3(chain: eth::ChainId) -> Option<eth::Address> {
        match chain.0 {
            1 => Some(address!("87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2")),
            10 | 137 | 42161 => Some(address!("794a61358D6845594F94dc1DB02A252b5b4814aD")),
            8453 => Some(address!("A238Dd80C259a72e81d7e4664a9801593F98d1c5")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub networks: support::Networks,
    pub pool: eth::Address,
    pub assets: support::Assets,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Params {
    /// Asset symbol, e.g. `USDC`.
    pub asset: String,
    #[serde_as(as = "HexOrDecimalU256")]
    pub amount: eth::U256,
}

/// Builds lending plans from the pool ABI.
#[derive(Debug, Clone)]
pub struct Planner {
    pool: eth::Address,
}

impl Planner {
    pub fn new(pool: eth::Address) -> Self {
        Self { pool }
    }

    fn transaction(&self, id: &str, action: &str, input: Vec<u8>) -> ExecutionPlan {
        ExecutionPlan::new(vec![Step {
            id: id.to_owned(),
            action: action.to_owned(),
            description: format!("{action} through the lending pool"),
            kind: Kind::Transaction(vec![Item::Incomplete(eth::Tx {
                from: None,
                to: self.pool,
                input: input.into(),
                value: eth::U256::ZERO,
                gas: None,
            })]),
        }])
    }
}

#[async_trait::async_trait]
impl PlanFetching for Planner {
    async fn fetch(&self, intent: &Intent) -> Result<ExecutionPlan, FetchError> {
        match intent {
            Intent::Supply(lend) => {
                let call = IPool::supplyCall {
                    asset: lend.asset.0,
                    amount: lend.amount,
                    onBehalfOf: lend.account,
                    referralCode: 0,
                };
                Ok(self.transaction("deposit", "Supply", call.abi_encode()))
            }
            Intent::Withdraw(lend) => {
                let call = IPool::withdrawCall {
                    asset: lend.asset.0,
                    amount: lend.amount,
                    to: lend.account,
                };
                Ok(self.transaction("withdraw", "Withdraw", call.abi_encode()))
            }
            other => Err(FetchError::Unsupported(other.name())),
        }
    }
}

pub struct Lending {
    context: Context,
    plans: Arc<dyn PlanFetching>,
    config: Config,
}

impl Lending {
    pub fn new(context: Context, config: Config) -> Self {
        Self {
            context,
            plans: Arc::new(Planner::new(config.pool)),
            config,
        }
    }

    /// Supplies the asset to the pool. The pool pulls the tokens, so it
    /// needs an allowance first.
    pub async fn supply(&self, params: Params) -> Result<ExecutionResult, Error> {
        let (asset, account) = match self.prepare(&params) {
            Ok(prepared) => prepared,
            Err(err) => return Ok(failed(err, None)),
        };

        let approval = match self
            .context
            .guard()
            .ensure(account, self.config.pool, asset, params.amount)
            .await
        {
            Ok(approval) => approval,
            Err(err) => return Ok(failed(err, None)),
        };

        let intent = Intent::Supply(intent::Lend {
            asset,
            amount: params.amount,
            account,
        });
        let result = match self.context.fetch(self.plans.as_ref(), &intent).await? {
            Ok(plan) => self.context.execute(plan).await,
            Err(err) => failed(err, None),
        };
        Ok(with_approval(result, approval))
    }

    /// Withdraws the asset from the pool to the executing account.
    pub async fn withdraw(&self, params: Params) -> Result<ExecutionResult, Error> {
        let (asset, account) = match self.prepare(&params) {
            Ok(prepared) => prepared,
            Err(err) => return Ok(failed(err, None)),
        };

        let intent = Intent::Withdraw(intent::Lend {
            asset,
            amount: params.amount,
            account,
        });
        match self.context.fetch(self.plans.as_ref(), &intent).await? {
            Ok(plan) => Ok(self.context.execute(plan).await),
            Err(err) => Ok(failed(err, None)),
        }
    }

    fn prepare(
        &self,
        params: &Params,
    ) -> Result<(eth::TokenAddress, eth::Address), execution::Error> {
        let network = self.context.chain().network();
        self.config.networks.check(&network)?;
        let asset = self.config.assets.resolve(&network.id, &params.asset)?;
        if asset.is_native() {
            return Err(execution::Error::new(
                ErrorKind::UnsupportedAsset,
                "the native asset has to be wrapped before it can be supplied",
            ));
        }
        Ok((asset, self.context.chain().address()))
    }
}
