//! Wire format of execution plans. Aggregators return loosely typed JSON, so
//! everything is validated here and converted into the domain types once.

use {
    super::{ExecutionPlan, Item, Kind, PostCallback, SignPayload, Signing, Step},
    crate::{domain::eth, util::serialize::HexOrDecimalU256},
    alloy::dyn_abi::TypedData,
    reqwest::Method,
    serde::Deserialize,
    serde_json::{Value, json},
    serde_with::serde_as,
    thiserror::Error,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub description: String,
    pub kind: String,
    #[serde(default)]
    pub items: Vec<PlanItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub status: Status,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Complete,
    Incomplete,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub from: Option<eth::Address>,
    pub to: eth::Address,
    #[serde(default)]
    pub data: eth::Bytes,
    #[serde_as(as = "Option<HexOrDecimalU256>")]
    #[serde(default)]
    pub value: Option<eth::U256>,
    #[serde_as(as = "Option<HexOrDecimalU256>")]
    #[serde(default)]
    pub gas: Option<eth::U256>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub sign: Sign,
    #[serde(default)]
    pub post: Option<Post>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sign {
    #[serde(default)]
    pub signature_kind: Option<String>,
    #[serde(default)]
    pub domain: Option<Value>,
    #[serde(default)]
    pub types: Option<Value>,
    #[serde(default)]
    pub primary_type: Option<String>,
    /// Typed data message. Some aggregators call it `value`, EIP-712 calls
    /// it `message`, EIP-191 payloads use `message` for the text to sign.
    #[serde(default, alias = "value")]
    pub message: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub endpoint: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub body: Value,
}

fn default_method() -> String {
    "POST".to_owned()
}

/// A plan that does not have the documented shape. This indicates a bug in
/// the plan source or in how it is called, so it is never retried.
#[derive(Debug, Error)]
pub enum Invalid {
    #[error("malformed plan: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("incomplete item {index} of step {step:?} has no data")]
    MissingData { step: String, index: usize },
    #[error("malformed transaction in step {step:?}: {source}")]
    Transaction {
        step: String,
        source: serde_json::Error,
    },
    #[error("gas limit {0} does not fit into 64 bits")]
    Gas(eth::U256),
    #[error("malformed signature request in step {step:?}: {source}")]
    Signature {
        step: String,
        source: serde_json::Error,
    },
    #[error("unsupported signature kind {0:?}")]
    SignatureKind(String),
    #[error("eip-191 payload in step {0:?} has no message")]
    MissingMessage(String),
    #[error("invalid http method {0:?}")]
    Method(String),
}

impl TryFrom<Plan> for ExecutionPlan {
    type Error = Invalid;

    fn try_from(plan: Plan) -> Result<Self, Self::Error> {
        plan.steps
            .into_iter()
            .map(Step::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(ExecutionPlan::new)
    }
}

impl TryFrom<PlanStep> for Step {
    type Error = Invalid;

    fn try_from(step: PlanStep) -> Result<Self, Self::Error> {
        let kind = match step.kind.as_str() {
            "transaction" => Kind::Transaction(items(&step.id, step.items, |data| {
                let tx: Transaction =
                    serde_json::from_value(data).map_err(|source| Invalid::Transaction {
                        step: step.id.clone(),
                        source,
                    })?;
                tx.try_into()
            })?),
            "signature" => Kind::Signature(items(&step.id, step.items, |data| {
                let signature: Signature =
                    serde_json::from_value(data).map_err(|source| Invalid::Signature {
                        step: step.id.clone(),
                        source,
                    })?;
                signing(&step.id, signature)
            })?),
            other => Kind::Unrecognized(other.to_owned()),
        };

        Ok(Step {
            id: step.id,
            action: step.action,
            description: step.description,
            kind,
        })
    }
}

fn items<T>(
    step: &str,
    items: Vec<PlanItem>,
    mut convert: impl FnMut(Value) -> Result<T, Invalid>,
) -> Result<Vec<Item<T>>, Invalid> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match (item.status, item.data) {
            (Status::Complete, _) => Ok(Item::Complete),
            (Status::Incomplete, Some(data)) => convert(data).map(Item::Incomplete),
            (Status::Incomplete, None) => Err(Invalid::MissingData {
                step: step.to_owned(),
                index,
            }),
        })
        .collect()
}

impl TryFrom<Transaction> for eth::Tx {
    type Error = Invalid;

    fn try_from(tx: Transaction) -> Result<Self, Self::Error> {
        let gas = tx
            .gas
            .map(|gas| u64::try_from(gas).map_err(|_| Invalid::Gas(gas)))
            .transpose()?;
        Ok(eth::Tx {
            from: tx.from,
            to: tx.to,
            input: tx.data,
            value: tx.value.unwrap_or_default(),
            gas,
        })
    }
}

fn signing(step: &str, signature: Signature) -> Result<Signing, Invalid> {
    let Sign {
        signature_kind,
        domain,
        types,
        primary_type,
        message,
    } = signature.sign;

    let sign = match signature_kind.as_deref().unwrap_or("eip712") {
        "eip712" => {
            let typed_data: TypedData = serde_json::from_value(json!({
                "domain": domain.unwrap_or_default(),
                "types": types.unwrap_or_default(),
                "primaryType": primary_type.unwrap_or_default(),
                "message": message.unwrap_or_default(),
            }))
            .map_err(|source| Invalid::Signature {
                step: step.to_owned(),
                source,
            })?;
            SignPayload::Eip712(Box::new(typed_data))
        }
        "eip191" => match message {
            Some(Value::String(message)) => SignPayload::Eip191(message),
            _ => return Err(Invalid::MissingMessage(step.to_owned())),
        },
        other => return Err(Invalid::SignatureKind(other.to_owned())),
    };

    let post = signature
        .post
        .map(|post| {
            let method = Method::from_bytes(post.method.to_uppercase().as_bytes())
                .map_err(|_| Invalid::Method(post.method.clone()))?;
            Ok(PostCallback {
                endpoint: post.endpoint,
                method,
                body: post.body,
            })
        })
        .transpose()?;

    Ok(Signing { sign, post })
}
