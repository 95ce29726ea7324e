use {plan_executor::domain::plan, thiserror::Error};

/// Errors that indicate a bug in the caller or in a plan source. Everything
/// that can go wrong at runtime is reported as an outcome instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    Params(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidPlan(#[from] plan::Invalid),
    #[error("unknown action {0:?}")]
    UnknownAction(String),
}
