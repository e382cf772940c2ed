use async_trait::async_trait;
use thiserror::Error;

use crate::types::CommittedTx;

/// Read access to the ledger the confidential contracts run on.
///
/// Transport, retries and timeouts are the implementation's concern, every
/// method is awaited exactly once.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Returns the hex encoded code hash of the contract at `contract_address`
    async fn get_code_hash(&self, contract_address: &str) -> Result<String, LedgerError>;

    /// Submits an encrypted query to a contract and returns the encrypted response
    async fn submit_query(
        &self,
        contract_address: &str,
        query: Vec<u8>,
    ) -> Result<Vec<u8>, LedgerError>;

    /// Returns the committed transaction with the given hash, if the ledger knows it
    async fn get_committed_transaction(
        &self,
        hash: &str,
    ) -> Result<Option<CommittedTx>, LedgerError>;
}

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger processed the request and rejected it
    #[error("{0}")]
    Rejected(String),
    /// The request did not reach the ledger
    #[error("Transport error: {0}")]
    Transport(String),
}
