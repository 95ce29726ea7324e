//! Execution plans as returned by aggregators: an ordered list of steps, each
//! of which is either a batch of transactions to send or a batch of payloads
//! to sign. Plans are validated into these types once at the API boundary
//! (see [`dto`]) and never mutated afterwards. Re-quoting produces a new plan.

use {
    crate::domain::eth,
    alloy::dyn_abi::TypedData,
    reqwest::Method,
};

pub mod dto;

pub use dto::Invalid;

/// An ordered sequence of steps. Steps must be executed in order and a later
/// step is never attempted before an earlier one completed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    steps: Vec<Step>,
}

impl ExecutionPlan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Validates an aggregator response into a plan.
    pub fn from_json(value: serde_json::Value) -> Result<Self, Invalid> {
        let plan: dto::Plan = serde_json::from_value(value).map_err(Invalid::Shape)?;
        plan.try_into()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The target of the first transaction that still has to be sent. For
    /// router style aggregators this is the contract that needs an allowance.
    pub fn first_transaction_target(&self) -> Option<eth::Address> {
        self.steps
            .iter()
            .filter_map(|step| match &step.kind {
                Kind::Transaction(items) => Some(items),
                _ => None,
            })
            .flatten()
            .find_map(|item| item.pending().map(|tx| tx.to))
    }

    /// Number of items that still have to be actioned.
    pub fn pending_items(&self) -> usize {
        self.steps
            .iter()
            .map(|step| match &step.kind {
                Kind::Transaction(items) => items.iter().filter(|i| i.is_pending()).count(),
                Kind::Signature(items) => items.iter().filter(|i| i.is_pending()).count(),
                Kind::Unrecognized(_) => 0,
            })
            .sum()
    }
}

/// A named unit of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: String,
    pub action: String,
    pub description: String,
    pub kind: Kind,
}

/// The step discriminant. It alone decides how the step's items are
/// dispatched.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Transaction(Vec<Item<eth::Tx>>),
    Signature(Vec<Item<Signing>>),
    /// A step kind this version does not know about. Such steps are skipped
    /// so that plan sources can evolve their schema.
    Unrecognized(String),
}

impl Kind {
    pub fn name(&self) -> &str {
        match self {
            Kind::Transaction(_) => "transaction",
            Kind::Signature(_) => "signature",
            Kind::Unrecognized(kind) => kind,
        }
    }
}

/// The atomic unit of work inside a step. Complete items carry no further
/// obligation, which is why only incomplete ones hold their payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Item<T> {
    Complete,
    Incomplete(T),
}

impl<T> Item<T> {
    /// The payload of an item that still needs to be actioned.
    pub fn pending(&self) -> Option<&T> {
        match self {
            Item::Complete => None,
            Item::Incomplete(data) => Some(data),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }
}

/// A payload to sign and, optionally, where to deliver the signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Signing {
    pub sign: SignPayload,
    pub post: Option<PostCallback>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignPayload {
    /// EIP-712 typed structured data.
    ///
    /// https://eips.ethereum.org/EIPS/eip-712
    Eip712(Box<TypedData>),
    /// EIP-191 personal message.
    ///
    /// https://eips.ethereum.org/EIPS/eip-191
    Eip191(String),
}

/// HTTP call that finalizes an off-chain order with its signature.
#[derive(Debug, Clone, PartialEq)]
pub struct PostCallback {
    pub endpoint: String,
    pub method: Method,
    pub body: serde_json::Value,
}
