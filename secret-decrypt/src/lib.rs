#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod decrypt;
pub mod error;
pub mod ledger;
pub mod nonces;
pub mod proto;
pub mod query;
pub mod reconstruct;
pub mod telemetry;
pub mod types;


pub use config::SecretDecryptConfig;
pub use decrypt::status::StatusClassifier;
pub use error::SecretDecryptError;
pub use ledger::{LedgerError, LedgerService};
pub use nonces::NonceLedger;
pub use query::query_contract;
pub use reconstruct::{decrypt_tx_by_hash, reconstruct};
pub use types::{CommittedTx, DecryptedAnswer, DecryptedAnswers, Event, EventAttribute, TxMessage};
