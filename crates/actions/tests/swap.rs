use {
    actions::{
        Registry,
        integrations::{
            Context,
            swap::{self, Swap},
        },
        support,
    },
    alloy::sol_types::SolValue,
    mockall::{Sequence, predicate::eq},
    plan_executor::{
        domain::{
            eth,
            execution::{ErrorKind, ExecutionResult, Progress},
            intent::Intent,
            plan::{ExecutionPlan, Item, Kind, Step},
        },
        infra::{
            aggregator::{MockPlanFetching, MockPostback},
            blockchain::MockChainClient,
        },
    },
    serde_json::json,
    std::sync::Arc,
};

const SENDER: eth::Address = eth::address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
const ROUTER: eth::Address = eth::address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
const TOKEN_A: eth::Address = eth::address!("0101010101010101010101010101010101010101");
const OTHER_ROUTER: eth::Address = eth::address!("cccccccccccccccccccccccccccccccccccccccc");
const TOKEN_B: eth::Address = eth::address!("0202020202020202020202020202020202020202");

const APPROVAL: eth::TxHash = eth::TxHash::new([0x11; 32]);
const SWAP: eth::TxHash = eth::TxHash::new([0x22; 32]);

/// A router plan. Every quote carries different calldata so the executed
/// one can be told apart.
fn quote(calldata: &'static [u8]) -> ExecutionPlan {
    quote_via(ROUTER, calldata)
}

fn quote_via(router: eth::Address, calldata: &'static [u8]) -> ExecutionPlan {
    ExecutionPlan::new(vec![Step {
        id: "route".into(),
        action: "Swap".into(),
        description: "Route through the router".into(),
        kind: Kind::Transaction(vec![Item::Incomplete(eth::Tx {
            from: Some(SENDER),
            to: router,
            input: eth::Bytes::from_static(calldata),
            value: eth::U256::ZERO,
            gas: None,
        })]),
    }])
}

fn chain() -> MockChainClient {
    let mut chain = MockChainClient::new();
    chain.expect_address().return_const(SENDER);
    chain.expect_network().returning(|| eth::Network {
        id: "base-mainnet".into(),
        chain: eth::ChainId(8453),
        protocol_family: eth::ProtocolFamily::Evm,
    });
    chain
}

fn swap(chain: MockChainClient, plans: MockPlanFetching) -> Swap {
    let mut postback = MockPostback::new();
    postback.expect_post().times(0);
    Swap::new(
        Context::new(Arc::new(chain), Arc::new(postback)),
        Arc::new(plans),
        swap::Config {
            networks: support::Networks::new(["base-mainnet".into()]),
            slippage_bps: 50,
            spender: None,
        },
    )
}

fn params() -> serde_json::Value {
    json!({
        "tokenIn": TOKEN_A,
        "tokenOut": TOKEN_B,
        "amountIn": "100000000",
    })
}

/// Allowance 0, so the router is approved for exactly the swapped amount,
/// the plan is quoted again and the fresh quote is executed.
fn approve_then_swap() -> (MockChainClient, MockPlanFetching) {
    let mut seq = Sequence::new();
    let mut plans = MockPlanFetching::new();
    let mut chain = chain();

    plans
        .expect_fetch()
        .withf(|intent| {
            matches!(intent, Intent::Swap(swap)
                if swap.amount_in == eth::U256::from(100_000_000) && swap.recipient == SENDER)
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(quote(b"stale")));
    chain
        .expect_call()
        .withf(|to, _| *to == TOKEN_A)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(eth::U256::ZERO.abi_encode().into()));
    chain
        .expect_send_transaction()
        .withf(|tx| tx.to == TOKEN_A)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(APPROVAL));
    chain
        .expect_wait_for_receipt()
        .with(eq(APPROVAL))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|hash| {
            Ok(eth::Receipt {
                hash,
                status: eth::TxStatus::Success,
                block: Some(10),
            })
        });
    plans
        .expect_fetch()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(quote(b"fresh")));
    chain
        .expect_send_transaction()
        .withf(|tx| tx.to == ROUTER && tx.input.as_ref() == b"fresh")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(SWAP));
    chain
        .expect_wait_for_receipt()
        .with(eq(SWAP))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|hash| {
            Ok(eth::Receipt {
                hash,
                status: eth::TxStatus::Success,
                block: Some(11),
            })
        });

    (chain, plans)
}

#[tokio::test]
async fn approves_requotes_and_swaps() {
    observe::tracing::initialize_reentrant("plan_executor=debug,actions=debug");
    let (chain, plans) = approve_then_swap();

    let result = swap(chain, plans)
        .route(serde_json::from_value(params()).unwrap())
        .await
        .unwrap();

    assert_eq!(
        result,
        ExecutionResult::Success(Progress {
            transaction_hashes: vec![APPROVAL, SWAP],
            ..Default::default()
        })
    );
}

#[tokio::test]
async fn describes_swap_outcome() {
    let (chain, plans) = approve_then_swap();
    let mut registry = Registry::default();
    actions::register_swap(&mut registry, swap(chain, plans));

    let outcome = registry.invoke("swap", params()).await.unwrap();

    assert_eq!(
        outcome,
        format!("Successfully executed swap. Transactions: {APPROVAL}, {SWAP}.")
    );
    let metrics = actions::metrics();
    assert!(metrics.contains(r#"executions{result="Success"}"#), "{metrics}");
    assert!(metrics.contains(r#"approvals{result="Approved"}"#), "{metrics}");
}

#[tokio::test]
async fn sufficient_allowance_skips_approval_and_requote() {
    let mut plans = MockPlanFetching::new();
    plans.expect_fetch().times(1).returning(|_| Ok(quote(b"swap")));
    let mut chain = chain();
    chain
        .expect_call()
        .times(1)
        .returning(|_, _| Ok(eth::U256::from(100_000_000).abi_encode().into()));
    chain
        .expect_send_transaction()
        .withf(|tx| tx.to == ROUTER)
        .times(1)
        .returning(|_| Ok(SWAP));
    chain.expect_wait_for_receipt().times(1).returning(|hash| {
        Ok(eth::Receipt {
            hash,
            status: eth::TxStatus::Success,
            block: Some(1),
        })
    });

    let result = swap(chain, plans)
        .route(serde_json::from_value(params()).unwrap())
        .await
        .unwrap();

    assert_eq!(
        result,
        ExecutionResult::Success(Progress {
            transaction_hashes: vec![SWAP],
            ..Default::default()
        })
    );
}

#[tokio::test]
async fn reverted_swap_reports_mined_approval() {
    let mut plans = MockPlanFetching::new();
    plans.expect_fetch().times(2).returning(|_| Ok(quote(b"swap")));
    let mut chain = chain();
    chain
        .expect_call()
        .returning(|_, _| Ok(eth::U256::ZERO.abi_encode().into()));
    chain
        .expect_send_transaction()
        .withf(|tx| tx.to == TOKEN_A)
        .returning(|_| Ok(APPROVAL));
    chain
        .expect_send_transaction()
        .withf(|tx| tx.to == ROUTER)
        .returning(|_| Ok(SWAP));
    chain.expect_wait_for_receipt().returning(|hash| {
        Ok(eth::Receipt {
            hash,
            status: if hash == SWAP {
                eth::TxStatus::Reverted
            } else {
                eth::TxStatus::Success
            },
            block: Some(1),
        })
    });

    let mut registry = Registry::default();
    actions::register_swap(&mut registry, swap(chain, plans));
    let outcome = registry.invoke("swap", params()).await.unwrap();

    assert_eq!(
        outcome,
        format!(
            "Failed to execute swap: TransactionReverted (transaction {SWAP} reverted). \
             Completed before the failure: Transactions: {APPROVAL}."
        )
    );
}

#[tokio::test]
async fn rerouted_quote_is_not_executed() {
    let mut seq = Sequence::new();
    let mut plans = MockPlanFetching::new();
    plans
        .expect_fetch()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(quote_via(ROUTER, b"stale")));
    plans
        .expect_fetch()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(quote_via(OTHER_ROUTER, b"fresh")));
    let mut chain = chain();
    chain
        .expect_call()
        .withf(|to, _| *to == TOKEN_A)
        .times(1)
        .returning(|_, _| Ok(eth::U256::ZERO.abi_encode().into()));
    chain
        .expect_send_transaction()
        .withf(|tx| tx.to == TOKEN_A)
        .times(1)
        .returning(|_| Ok(APPROVAL));
    chain
        .expect_send_transaction()
        .withf(|tx| tx.to == OTHER_ROUTER)
        .times(0);
    chain.expect_wait_for_receipt().times(1).returning(|hash| {
        Ok(eth::Receipt {
            hash,
            status: eth::TxStatus::Success,
            block: Some(1),
        })
    });

    let result = swap(chain, plans)
        .route(serde_json::from_value(params()).unwrap())
        .await
        .unwrap();

    let ExecutionResult::Failure(failure) = result else {
        panic!("expected failure");
    };
    assert_eq!(failure.reason, ErrorKind::QuoteFailed);
    assert!(failure.detail.contains(&OTHER_ROUTER.to_string()), "{}", failure.detail);
    assert_eq!(
        failure.partial,
        Some(Progress {
            transaction_hashes: vec![APPROVAL],
            ..Default::default()
        })
    );
}
