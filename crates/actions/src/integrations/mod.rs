//! The integrations the actions are built from. Each one composes the same
//! pipeline: support checks, allowance, plan, execution.

use {
    crate::Error,
    plan_executor::{
        AllowanceGuard,
        StepExecutor,
        domain::{
            eth,
            execution::{self, ErrorKind, ExecutionResult, Progress},
            intent::Intent,
            plan::ExecutionPlan,
        },
        infra::{
            ChainClient,
            PlanFetching,
            Postback,
            aggregator::FetchError,
            observe,
        },
    },
    std::sync::Arc,
};

pub mod lending;
pub mod marketplace;
pub mod swap;

/// The connections every integration executes plans with.
#[derive(Clone)]
pub struct Context {
    chain: Arc<dyn ChainClient>,
    postback: Arc<dyn Postback>,
}

impl Context {
    pub fn new(chain: Arc<dyn ChainClient>, postback: Arc<dyn Postback>) -> Self {
        Self { chain, postback }
    }

    pub fn chain(&self) -> &dyn ChainClient {
        self.chain.as_ref()
    }

    pub fn guard(&self) -> AllowanceGuard {
        AllowanceGuard::new(self.chain.clone())
    }

    /// Fetches a plan. A plan source that cannot produce a plan is an
    /// outcome, one that produces a malformed plan is a bug.
    async fn fetch(
        &self,
        plans: &dyn PlanFetching,
        intent: &Intent,
    ) -> Result<Result<ExecutionPlan, execution::Error>, Error> {
        match plans.fetch(intent).await {
            Ok(plan) => {
                observe::plan_fetched(intent, &plan);
                Ok(Ok(plan))
            }
            Err(FetchError::Invalid(err)) => {
                observe::fetch_failed(intent, &err);
                Err(err.into())
            }
            Err(err) => {
                observe::fetch_failed(intent, &err);
                Ok(Err(execution::Error::new(ErrorKind::QuoteFailed, err)))
            }
        }
    }

    /// Runs the plan on a fresh executor.
    async fn execute(&self, plan: ExecutionPlan) -> ExecutionResult {
        StepExecutor::new(self.chain.clone(), self.postback.clone())
            .run(plan)
            .await
    }
}

/// A failure that happened before plan execution. An approval that was
/// already mined is still reported.
fn failed(err: execution::Error, approval: Option<eth::TxHash>) -> ExecutionResult {
    ExecutionResult::failed(
        err,
        Progress {
            transaction_hashes: approval.into_iter().collect(),
            ..Default::default()
        },
    )
}

/// Prepends the approval transaction to the result of the plan it enabled.
fn with_approval(result: ExecutionResult, approval: Option<eth::TxHash>) -> ExecutionResult {
    let Some(hash) = approval else {
        return result;
    };
    match result {
        ExecutionResult::Success(mut progress) => {
            progress.transaction_hashes.insert(0, hash);
            ExecutionResult::Success(progress)
        }
        ExecutionResult::Failure(mut failure) => {
            failure
                .partial
                .get_or_insert_with(Progress::default)
                .transaction_hashes
                .insert(0, hash);
            ExecutionResult::Failure(failure)
        }
    }
}
