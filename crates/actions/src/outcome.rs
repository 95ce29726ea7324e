//! Human readable descriptions of execution results.

use {
    plan_executor::domain::execution::{ExecutionResult, Progress},
    std::fmt::Write,
};

/// Describes the result of an action. A failure is never described as a
/// success and any progress made before it is listed.
pub fn describe(action: &str, result: &ExecutionResult) -> String {
    match result {
        ExecutionResult::Success(progress) => {
            let mut message = format!("Successfully executed {action}.");
            summarize(&mut message, progress);
            message
        }
        ExecutionResult::Failure(failure) => {
            let mut message = format!(
                "Failed to execute {action}: {} ({}).",
                failure.reason, failure.detail
            );
            if let Some(partial) = &failure.partial {
                message.push_str(" Completed before the failure:");
                summarize(&mut message, partial);
            }
            message
        }
    }
}

fn summarize(message: &mut String, progress: &Progress) {
    if !progress.transaction_hashes.is_empty() {
        let hashes = progress
            .transaction_hashes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(message, " Transactions: {hashes}.");
    }
    if !progress.post_responses.is_empty() {
        let responses = progress
            .post_responses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(message, " Orders: {responses}.");
    }
    if !progress.signatures.is_empty() {
        let signatures = progress
            .signatures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(message, " Signatures: {signatures}.");
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        plan_executor::domain::{
            eth,
            execution::{Error, ErrorKind},
        },
        serde_json::json,
    };

    #[test]
    fn success() {
        let result = ExecutionResult::Success(Progress {
            transaction_hashes: vec![eth::TxHash::repeat_byte(0x11)],
            post_responses: vec![json!({ "orderId": "abc" })],
            signatures: vec![],
        });
        assert_eq!(
            describe("bid", &result),
            "Successfully executed bid. Transactions: \
             0x1111111111111111111111111111111111111111111111111111111111111111. Orders: \
             {\"orderId\":\"abc\"}."
        );
    }

    #[test]
    fn failure_with_partial_progress() {
        let result = ExecutionResult::failed(
            Error::new(ErrorKind::TransactionReverted, "transaction 0x22 reverted"),
            Progress {
                signatures: vec![eth::Bytes::from_static(&[0xab, 0xcd])],
                ..Default::default()
            },
        );
        assert_eq!(
            describe("swap", &result),
            "Failed to execute swap: TransactionReverted (transaction 0x22 reverted). Completed \
             before the failure: Signatures: 0xabcd."
        );
    }

    #[test]
    fn failure_without_progress() {
        let result = ExecutionResult::failed(
            Error::new(ErrorKind::UnsupportedNetwork, "network base-sepolia is not supported"),
            Progress::default(),
        );
        assert_eq!(
            describe("supply", &result),
            "Failed to execute supply: UnsupportedNetwork (network base-sepolia is not \
             supported)."
        );
    }
}
