use {
    super::{Error, ErrorKind},
    crate::{
        domain::eth,
        infra::{blockchain::ChainClient, observe},
    },
};

/// Sends transaction items and waits for them to be mined.
pub struct TransactionStepHandler<'a> {
    chain: &'a dyn ChainClient,
}

impl<'a> TransactionStepHandler<'a> {
    pub fn new(chain: &'a dyn ChainClient) -> Self {
        Self { chain }
    }

    /// Submits the transaction exactly as described and waits for its
    /// receipt. Failing to submit or to obtain a receipt is a
    /// [`ErrorKind::SubmissionFailed`], a mined but reverted transaction is a
    /// [`ErrorKind::TransactionReverted`].
    pub async fn execute(&self, tx: &eth::Tx) -> Result<eth::TxHash, Error> {
        let hash = self
            .chain
            .send_transaction(tx.clone())
            .await
            .map_err(|err| Error::new(ErrorKind::SubmissionFailed, err))?;
        observe::transaction_submitted(tx, hash);

        let receipt = self
            .chain
            .wait_for_receipt(hash)
            .await
            .map_err(|err| Error::new(ErrorKind::SubmissionFailed, err))?;
        match receipt.status {
            eth::TxStatus::Success => {
                observe::transaction_confirmed(&receipt);
                Ok(hash)
            }
            eth::TxStatus::Reverted => {
                observe::transaction_reverted(&receipt);
                Err(Error::new(
                    ErrorKind::TransactionReverted,
                    format!("transaction {hash} reverted"),
                ))
            }
        }
    }
}
