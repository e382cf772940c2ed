#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod envelope;
pub mod key_management;

pub use context::{CryptoContext, CryptoContextError, WasmCryptoContext};
pub use envelope::{EncryptedBlob, EnvelopeError, Nonce};
pub use key_management::{KeyManagementError, X25519KeyPairManager};
