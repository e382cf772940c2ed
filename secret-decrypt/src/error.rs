use secret_confidential::{CryptoContextError, EnvelopeError};
use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors surfaced by the transaction reconstruction and direct query pipelines.
///
/// Every variant here is fatal for the pipeline that returns it. Failures that
/// only affect a single output entry, log attribute or nonce attempt are
/// swallowed where they happen and never reach this type.
#[derive(Debug, Error)]
pub enum SecretDecryptError {
    /// An encrypted message input could not be parsed as an encrypted blob
    #[error("Can't parse encrypted blob: {0}")]
    MalformedEnvelope(#[from] EnvelopeError),

    /// The transaction output data container could not be decoded
    #[error("Can't parse encrypted output data: {0}")]
    MalformedOutputData(String),

    /// A message of the transaction was encrypted by another key
    #[error("Cannot decrypt, not original tx sender of message index {message_index}")]
    NotOriginalSender {
        /// Index of the first message carrying a foreign public key
        message_index: usize,
    },

    /// A ciphertext that must decrypt did not
    #[error("Error while trying to decrypt the {what}: {source}")]
    DecryptionFailed {
        /// What was being decrypted
        what: &'static str,
        #[source]
        source: CryptoContextError,
    },

    /// The tx sender key pair could not be obtained from the crypto context
    #[error("Error in tx sender key pair: {0}")]
    KeyPairUnavailable(#[source] CryptoContextError),

    /// The query could not be encrypted
    #[error("Failed to encrypt query: {0}")]
    EncryptionFailed(#[source] CryptoContextError),

    /// The code hash of the queried contract could not be resolved
    #[error("Contract with address {address} not found")]
    ContractNotFound {
        address: String,
        #[source]
        source: LedgerError,
    },

    /// The code hash is not a 32 byte hex string
    #[error("Invalid code hash: `{0}`")]
    InvalidCodeHash(String),

    /// The contract rejected the query, with the decrypted reason
    #[error("Query result: {message}")]
    QueryFailed { message: String },

    /// The decrypted query response was not base64
    #[error("Failed to decode the decrypted query response as base64: {0}")]
    InvalidResponseEncoding(#[from] base64::DecodeError),

    /// The ledger has no transaction for the requested hash
    #[error("No transaction found with hash {0}")]
    TransactionNotFound(String),

    /// Any other failure reported by the ledger service
    #[error("Ledger service error: {0}")]
    Ledger(#[from] LedgerError),
}
