//! Makes sure a spender may move enough of the owner's tokens before a plan
//! that moves them is executed.

use {
    crate::{
        domain::{
            eth::{self, allowance},
            execution::{Error, ErrorKind},
        },
        infra::{
            blockchain::{ChainClient, Erc20},
            observe,
        },
    },
    std::sync::Arc,
};

/// Raises ERC20 allowances on demand. Allowances are shared chain state that
/// other parties may change at any time, so they are read fresh on every
/// call and never cached.
#[derive(Clone)]
pub struct AllowanceGuard {
    chain: Arc<dyn ChainClient>,
}

impl AllowanceGuard {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    /// Ensures `spender` may move at least `amount` of `token` on behalf of
    /// `owner`. Approves exactly `amount` if the current allowance falls
    /// short and waits for the approval to be mined.
    ///
    /// Returns the hash of the approval transaction, if one was needed. Any
    /// failure is an [`ErrorKind::ApprovalFailed`] and the caller must not go
    /// on to execute its plan.
    pub async fn ensure(
        &self,
        owner: eth::Address,
        spender: eth::Address,
        token: eth::TokenAddress,
        amount: eth::U256,
    ) -> Result<Option<eth::TxHash>, Error> {
        if token.is_native() {
            observe::approval_not_needed(token);
            return Ok(None);
        }

        let erc20 = Erc20::new(self.chain.as_ref(), token);
        let existing = erc20
            .allowance(owner, spender)
            .await
            .map_err(|err| failed(format!("reading allowance: {err}")))?;
        let required = allowance::Required(eth::Allowance {
            owner,
            spender,
            token,
            amount,
        });
        let Some(approval) = required.approval(&existing) else {
            observe::approval_sufficient(&existing);
            return Ok(None);
        };

        observe::approval_required(&existing, &approval);
        let hash = self
            .chain
            .send_transaction(erc20.approve(&approval))
            .await
            .map_err(|err| failed(format!("submitting approval: {err}")))?;
        let receipt = self
            .chain
            .wait_for_receipt(hash)
            .await
            .map_err(|err| failed(format!("waiting for approval {hash}: {err}")))?;
        if receipt.status == eth::TxStatus::Reverted {
            return Err(failed(format!("approval {hash} reverted")));
        }

        observe::approval_confirmed(&approval, hash);
        Ok(Some(hash))
    }
}

fn failed(detail: String) -> Error {
    let err = Error::new(ErrorKind::ApprovalFailed, detail);
    observe::approval_failed(&err);
    err
}
