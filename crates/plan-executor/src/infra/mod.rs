pub mod aggregator;
pub mod blockchain;
pub mod observe;

pub use {
    aggregator::{PlanFetching, Postback},
    blockchain::ChainClient,
};
