//! Drives multi-step execution plans returned by DeFi aggregators: ensures
//! token allowances, executes on-chain transaction steps and off-chain
//! signature steps in order, and reports what was achieved.

pub mod domain;
pub mod infra;
pub mod util;

pub use domain::{
    approvals::AllowanceGuard,
    execution::{ErrorKind, ExecutionResult, StepExecutor},
    intent::Intent,
    plan::ExecutionPlan,
};
