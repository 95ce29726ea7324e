//! This module implements the observability for plan execution. It exposes
//! functions which represent events that are meaningful to the system. These
//! functions are called when the corresponding events occur. They log the
//! event and update the metrics, if the event is worth measuring.

use crate::domain::{
    eth::{self, allowance},
    execution::{self, ExecutionResult},
    intent::Intent,
    plan::{ExecutionPlan, Kind, PostCallback, SignPayload, Step},
};

mod metrics;

/// Setup the observability. The config configures the tracing subscriber.
pub fn init(config: &observe::Config) {
    observe::tracing::initialize(config);
    metrics::init();
}

/// Observe a state transition of a step executor.
pub fn executor_state(from: execution::State, to: execution::State) {
    tracing::trace!(%from, %to, "executor state");
}

/// Observe that a plan is about to be executed.
pub fn executing(plan: &ExecutionPlan) {
    tracing::info!(
        steps = plan.steps().len(),
        pending = plan.pending_items(),
        "executing plan"
    );
}

/// Observe the terminal result of a plan execution.
pub fn executed(result: &ExecutionResult) {
    match result {
        ExecutionResult::Success(progress) => tracing::info!(?progress, "plan executed"),
        ExecutionResult::Failure(failure) => tracing::warn!(?failure, "plan execution failed"),
    }
    metrics::get()
        .executions
        .with_label_values(&[result.label()])
        .inc();
}

/// Observe that an item was skipped because the plan source reported it as
/// complete.
pub fn item_skipped(step: &Step, index: usize) {
    tracing::debug!(step = %step.id, index, "skipping complete item");
    item(step, "Skipped");
}

/// Observe that an item was executed.
pub fn item_executed(step: &Step, index: usize) {
    tracing::debug!(step = %step.id, index, "executed item");
    item(step, "Success");
}

/// Observe that an item failed. This ends the execution.
pub fn item_failed(step: &Step, index: usize, err: &execution::Error) {
    tracing::warn!(step = %step.id, action = %step.action, index, ?err, "item failed");
    item(step, err.kind.into());
}

/// Observe a step of unknown kind. It is skipped and execution continues.
pub fn step_unrecognized(step: &Step) {
    tracing::warn!(step = %step.id, kind = %step.kind.name(), "skipping step of unknown kind");
    item(step, execution::ErrorKind::UnrecognizedStepKind.into());
}

fn item(step: &Step, result: &str) {
    let kind = match step.kind {
        Kind::Transaction(_) => "transaction",
        Kind::Signature(_) => "signature",
        Kind::Unrecognized(_) => "unrecognized",
    };
    metrics::get()
        .plan_items
        .with_label_values(&[kind, result])
        .inc();
}

/// Observe that a transaction was accepted by the node.
pub fn transaction_submitted(tx: &eth::Tx, hash: eth::TxHash) {
    tracing::info!(?hash, to = ?tx.to, value = %tx.value, "submitted transaction");
}

/// Observe that a transaction was mined successfully.
pub fn transaction_confirmed(receipt: &eth::Receipt) {
    tracing::info!(hash = ?receipt.hash, block = ?receipt.block, "transaction confirmed");
}

/// Observe that a transaction was mined but reverted.
pub fn transaction_reverted(receipt: &eth::Receipt) {
    tracing::warn!(hash = ?receipt.hash, block = ?receipt.block, "transaction reverted");
}

/// Observe that a payload was signed.
pub fn signature_produced(sign: &SignPayload) {
    match sign {
        SignPayload::Eip712(data) => {
            tracing::info!(primary_type = %data.primary_type, "signed typed data")
        }
        SignPayload::Eip191(_) => tracing::info!("signed personal message"),
    }
}

/// Observe that a signature was delivered to the aggregator.
pub fn postback_sent(post: &PostCallback, response: &serde_json::Value) {
    tracing::info!(endpoint = %post.endpoint, ?response, "delivered signature");
}

/// Observe that a token is the native asset, which needs no allowance.
pub fn approval_not_needed(token: eth::TokenAddress) {
    tracing::debug!(%token, "native asset needs no approval");
    approval_result("NotNeeded");
}

/// Observe that the existing allowance already covers the requirement.
pub fn approval_sufficient(existing: &allowance::Existing) {
    tracing::debug!(?existing, "allowance sufficient");
    approval_result("Sufficient");
}

/// Observe that an approval transaction is about to be sent.
pub fn approval_required(existing: &allowance::Existing, approval: &allowance::Approval) {
    tracing::info!(?existing, ?approval, "approval required");
}

/// Observe that an approval was mined.
pub fn approval_confirmed(approval: &allowance::Approval, hash: eth::TxHash) {
    tracing::info!(?approval, ?hash, "approval confirmed");
    approval_result("Approved");
}

/// Observe that the allowance could not be ensured.
pub fn approval_failed(err: &execution::Error) {
    tracing::warn!(?err, "approval failed");
    approval_result("Failed");
}

fn approval_result(result: &str) {
    metrics::get()
        .approvals
        .with_label_values(&[result])
        .inc();
}

/// Observe a request to the aggregator API.
pub fn aggregator_request(endpoint: &str, response: &Result<reqwest::Response, reqwest::Error>) {
    let result = match response {
        Ok(response) if response.status().is_success() => {
            tracing::trace!(%endpoint, status = %response.status(), "aggregator response");
            "Success"
        }
        Ok(response) => {
            tracing::warn!(%endpoint, status = %response.status(), "aggregator error response");
            "ErrorStatus"
        }
        Err(err) => {
            tracing::warn!(%endpoint, ?err, "aggregator request failed");
            if err.is_timeout() { "Timeout" } else { "Failed" }
        }
    };
    metrics::get()
        .aggregator_requests
        .with_label_values(&[endpoint, result])
        .inc();
}

/// Observe a plan fetched for an intent.
pub fn plan_fetched(intent: &Intent, plan: &ExecutionPlan) {
    tracing::info!(intent = intent.name(), ?plan, "fetched plan");
}

/// Observe that a plan is discarded in favour of a fresh quote because an
/// approval was mined after it was fetched.
pub fn refetching_plan(intent: &Intent) {
    tracing::debug!(intent = intent.name(), "refetching plan after approval");
}

/// Observe that no plan could be obtained for an intent.
pub fn fetch_failed(intent: &Intent, err: &dyn std::error::Error) {
    tracing::warn!(intent = intent.name(), %err, "failed to fetch plan");
}
