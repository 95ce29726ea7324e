use {crate::domain::eth, thiserror::Error};

/// Categories of failures. Callers branch on the kind, the accompanying
/// detail is only meant for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
pub enum ErrorKind {
    /// The network is not supported by the action. Detected before any side
    /// effect.
    UnsupportedNetwork,
    /// The asset is not supported by the action on this network. Detected
    /// before any side effect.
    UnsupportedAsset,
    /// The allowance could not be read or raised. Plan execution never began.
    ApprovalFailed,
    /// No plan could be obtained from the plan source.
    QuoteFailed,
    /// A transaction could not be submitted or its receipt never arrived.
    SubmissionFailed,
    /// A transaction was mined but reverted.
    TransactionReverted,
    /// The wallet refused or failed to sign a payload.
    SigningFailed,
    /// The aggregator rejected a signed order.
    PostbackFailed,
    /// A step of unknown kind. Never fatal, the step is skipped.
    UnrecognizedStepKind,
}

/// A failure of a single unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct Error {
    pub kind: ErrorKind,
    pub detail: String,
}

impl Error {
    pub fn new(kind: ErrorKind, detail: impl ToString) -> Self {
        Self {
            kind,
            detail: detail.to_string(),
        }
    }
}

/// Everything produced by the items that were executed so far, in execution
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    pub transaction_hashes: Vec<eth::TxHash>,
    pub post_responses: Vec<serde_json::Value>,
    /// Signatures of items that had no postback. Signatures that were
    /// delivered are represented by their post response instead.
    pub signatures: Vec<eth::Bytes>,
}

impl Progress {
    pub fn is_empty(&self) -> bool {
        self.transaction_hashes.is_empty()
            && self.post_responses.is_empty()
            && self.signatures.is_empty()
    }
}

/// Terminal outcome of an execution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success(Progress),
    Failure(Failure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub reason: ErrorKind,
    pub detail: String,
    /// Work that completed before the failure. `None` if nothing did.
    pub partial: Option<Progress>,
}

impl ExecutionResult {
    /// A failure that preserves the given progress, unless it is empty.
    pub fn failed(err: Error, progress: Progress) -> Self {
        Self::Failure(Failure {
            reason: err.kind,
            detail: err.detail,
            partial: (!progress.is_empty()).then_some(progress),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The progress made, whether or not the attempt succeeded.
    pub fn progress(&self) -> Option<&Progress> {
        match self {
            Self::Success(progress) => Some(progress),
            Self::Failure(failure) => failure.partial.as_ref(),
        }
    }

    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "Success",
            Self::Failure(failure) => failure.reason.into(),
        }
    }
}
