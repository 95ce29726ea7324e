//! Drives an [`ExecutionPlan`] to a terminal [`ExecutionResult`].
//!
//! Steps and their items run strictly in plan order, one at a time, because
//! later items may depend on state changed by earlier ones (an approval has
//! to be mined before the transaction spending it). Items the plan source
//! already marked complete are skipped, so a partially applied plan fetched
//! again resumes where it left off. The first failing item ends the run and
//! nothing is retried. Retrying means fetching a fresh plan.

use {
    crate::{
        domain::plan::{ExecutionPlan, Kind, Step},
        infra::{aggregator::Postback, blockchain::ChainClient, observe},
    },
    std::sync::Arc,
};

pub mod result;
pub mod signature;
pub mod transaction;

pub use {
    result::{Error, ErrorKind, ExecutionResult, Failure, Progress},
    signature::{SignatureStepHandler, Signed},
    transaction::TransactionStepHandler,
};

/// Lifecycle of a run. Only visible through the logged transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum State {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Executes exactly one plan. Construct a new executor for every attempt.
pub struct StepExecutor {
    chain: Arc<dyn ChainClient>,
    postback: Arc<dyn Postback>,
    state: State,
}

impl StepExecutor {
    pub fn new(chain: Arc<dyn ChainClient>, postback: Arc<dyn Postback>) -> Self {
        Self {
            chain,
            postback,
            state: State::Pending,
        }
    }

    pub async fn run(mut self, plan: ExecutionPlan) -> ExecutionResult {
        self.transition(State::Running);
        observe::executing(&plan);

        let mut progress = Progress::default();
        for step in plan.steps() {
            if let Err(err) = self.step(step, &mut progress).await {
                self.transition(State::Failed);
                let result = ExecutionResult::failed(err, progress);
                observe::executed(&result);
                return result;
            }
        }

        self.transition(State::Completed);
        let result = ExecutionResult::Success(progress);
        observe::executed(&result);
        result
    }

    async fn step(&self, step: &Step, progress: &mut Progress) -> Result<(), Error> {
        match &step.kind {
            Kind::Transaction(items) => {
                let handler = TransactionStepHandler::new(self.chain.as_ref());
                for (index, item) in items.iter().enumerate() {
                    let Some(tx) = item.pending() else {
                        observe::item_skipped(step, index);
                        continue;
                    };
                    let hash = handler
                        .execute(tx)
                        .await
                        .inspect_err(|err| observe::item_failed(step, index, err))?;
                    observe::item_executed(step, index);
                    progress.transaction_hashes.push(hash);
                }
            }
            Kind::Signature(items) => {
                let handler =
                    SignatureStepHandler::new(self.chain.as_ref(), self.postback.as_ref());
                for (index, item) in items.iter().enumerate() {
                    let Some(signing) = item.pending() else {
                        observe::item_skipped(step, index);
                        continue;
                    };
                    let signed = handler
                        .execute(signing)
                        .await
                        .inspect_err(|err| observe::item_failed(step, index, err))?;
                    observe::item_executed(step, index);
                    match signed {
                        Signed::Signature(signature) => progress.signatures.push(signature),
                        Signed::Posted(response) => progress.post_responses.push(response),
                    }
                }
            }
            Kind::Unrecognized(_) => observe::step_unrecognized(step),
        }
        Ok(())
    }

    fn transition(&mut self, state: State) {
        observe::executor_state(self.state, state);
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            domain::{
                eth,
                plan::{Item, PostCallback, SignPayload, Signing},
            },
            infra::{
                aggregator::MockPostback,
                blockchain::{self, MockChainClient},
            },
        },
        mockall::{Sequence, predicate::eq},
        reqwest::Method,
        serde_json::json,
    };

    fn tx(to: u8) -> eth::Tx {
        eth::Tx {
            from: None,
            to: eth::Address::repeat_byte(to),
            input: Default::default(),
            value: eth::U256::ZERO,
            gas: None,
        }
    }

    fn hash(to: &eth::Tx) -> eth::TxHash {
        eth::TxHash::repeat_byte(to.to.0[0])
    }

    fn step(id: &str, kind: Kind) -> Step {
        Step {
            id: id.into(),
            action: id.into(),
            description: String::new(),
            kind,
        }
    }

    fn transactions(items: Vec<Item<eth::Tx>>) -> Kind {
        Kind::Transaction(items)
    }

    fn mined(hash: eth::TxHash) -> Result<eth::Receipt, blockchain::Error> {
        Ok(eth::Receipt {
            hash,
            status: eth::TxStatus::Success,
            block: Some(1),
        })
    }

    fn reverted(hash: eth::TxHash) -> Result<eth::Receipt, blockchain::Error> {
        Ok(eth::Receipt {
            hash,
            status: eth::TxStatus::Reverted,
            block: Some(1),
        })
    }

    fn executor(chain: MockChainClient, postback: MockPostback) -> StepExecutor {
        StepExecutor::new(Arc::new(chain), Arc::new(postback))
    }

    fn no_postback() -> MockPostback {
        let mut postback = MockPostback::new();
        postback.expect_post().times(0);
        postback
    }

    #[tokio::test]
    async fn executes_only_incomplete_items_in_order() {
        let mut chain = MockChainClient::new();
        let mut seq = Sequence::new();
        for to in [2, 4] {
            chain
                .expect_send_transaction()
                .with(eq(tx(to)))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|tx| Ok(hash(&tx)));
            chain
                .expect_wait_for_receipt()
                .times(1)
                .in_sequence(&mut seq)
                .returning(mined);
        }

        let plan = ExecutionPlan::new(vec![
            step(
                "approve",
                transactions(vec![Item::Complete, Item::Incomplete(tx(2))]),
            ),
            step(
                "swap",
                transactions(vec![Item::Complete, Item::Incomplete(tx(4))]),
            ),
        ]);
        let result = executor(chain, no_postback()).run(plan).await;

        assert_eq!(
            result,
            ExecutionResult::Success(Progress {
                transaction_hashes: vec![eth::TxHash::repeat_byte(2), eth::TxHash::repeat_byte(4)],
                ..Default::default()
            })
        );
    }

    #[tokio::test]
    async fn completed_plan_has_no_side_effects() {
        let mut chain = MockChainClient::new();
        chain.expect_send_transaction().times(0);
        chain.expect_sign_typed_data().times(0);
        chain.expect_sign_message().times(0);

        let plan = ExecutionPlan::new(vec![
            step("swap", transactions(vec![Item::Complete, Item::Complete])),
            step("order", Kind::Signature(vec![Item::Complete])),
        ]);
        let result = executor(chain, no_postback()).run(plan).await;

        assert_eq!(result, ExecutionResult::Success(Progress::default()));
    }

    #[tokio::test]
    async fn failing_step_stops_execution() {
        let mut chain = MockChainClient::new();
        chain
            .expect_send_transaction()
            .with(eq(tx(1)))
            .times(1)
            .returning(|_| Err(blockchain::Error::Other(anyhow::anyhow!("rpc down"))));
        chain
            .expect_send_transaction()
            .with(eq(tx(2)))
            .times(0);
        chain.expect_sign_typed_data().times(0);

        let plan = ExecutionPlan::new(vec![
            step("first", transactions(vec![Item::Incomplete(tx(1))])),
            step("second", transactions(vec![Item::Incomplete(tx(2))])),
        ]);
        let result = executor(chain, no_postback()).run(plan).await;

        let ExecutionResult::Failure(failure) = result else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::SubmissionFailed);
        assert_eq!(failure.partial, None);
    }

    #[tokio::test]
    async fn preserves_partial_progress() {
        let mut chain = MockChainClient::new();
        chain
            .expect_send_transaction()
            .times(2)
            .returning(|tx| Ok(hash(&tx)));
        chain
            .expect_send_transaction()
            .with(eq(tx(3)))
            .times(0);
        chain
            .expect_wait_for_receipt()
            .with(eq(eth::TxHash::repeat_byte(1)))
            .returning(mined);
        chain
            .expect_wait_for_receipt()
            .with(eq(eth::TxHash::repeat_byte(2)))
            .returning(reverted);

        let plan = ExecutionPlan::new(vec![step(
            "batch",
            transactions(vec![
                Item::Incomplete(tx(1)),
                Item::Incomplete(tx(2)),
                Item::Incomplete(tx(3)),
            ]),
        )]);
        let result = executor(chain, no_postback()).run(plan).await;

        let ExecutionResult::Failure(failure) = result else {
            panic!("expected failure");
        };
        assert_eq!(failure.reason, ErrorKind::TransactionReverted);
        assert_eq!(
            failure.partial,
            Some(Progress {
                transaction_hashes: vec![eth::TxHash::repeat_byte(1)],
                ..Default::default()
            })
        );
    }

    #[tokio::test]
    async fn skips_unrecognized_steps() {
        let mut chain = MockChainClient::new();
        chain
            .expect_send_transaction()
            .times(2)
            .returning(|tx| Ok(hash(&tx)));
        chain.expect_wait_for_receipt().times(2).returning(mined);

        let plan = ExecutionPlan::new(vec![
            step("first", transactions(vec![Item::Incomplete(tx(1))])),
            step("future", Kind::Unrecognized("unknown".into())),
            step("second", transactions(vec![Item::Incomplete(tx(2))])),
        ]);
        let result = executor(chain, no_postback()).run(plan).await;

        assert!(result.is_success());
        assert_eq!(
            result.progress().unwrap().transaction_hashes,
            vec![eth::TxHash::repeat_byte(1), eth::TxHash::repeat_byte(2)]
        );
    }

    #[tokio::test]
    async fn collects_signatures_and_post_responses() {
        let mut chain = MockChainClient::new();
        chain
            .expect_sign_message()
            .times(2)
            .returning(|message| Ok(eth::Bytes::copy_from_slice(message)));
        let mut postback = MockPostback::new();
        postback
            .expect_post()
            .times(1)
            .returning(|_, _| Ok(json!({ "orderId": "abc" })));

        let plan = ExecutionPlan::new(vec![step(
            "order",
            Kind::Signature(vec![
                Item::Incomplete(Signing {
                    sign: SignPayload::Eip191("login".into()),
                    post: None,
                }),
                Item::Incomplete(Signing {
                    sign: SignPayload::Eip191("order".into()),
                    post: Some(PostCallback {
                        endpoint: "order/v4".into(),
                        method: Method::POST,
                        body: json!({}),
                    }),
                }),
            ]),
        )]);
        let result = executor(chain, postback).run(plan).await;

        assert_eq!(
            result,
            ExecutionResult::Success(Progress {
                signatures: vec![eth::Bytes::from_static(b"login")],
                post_responses: vec![json!({ "orderId": "abc" })],
                ..Default::default()
            })
        );
    }
}
