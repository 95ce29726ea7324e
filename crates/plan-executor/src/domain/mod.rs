pub mod approvals;
pub mod eth;
pub mod execution;
pub mod intent;
pub mod plan;
