use base64::{prelude::BASE64_STANDARD, Engine};
use thiserror::Error;
use tracing::instrument;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::{
    envelope::{EncryptedBlob, Nonce, NONCE_SIZE},
    key_management::{KeyManagementError, X25519KeyPairManager, X25519_KEY_SIZE},
};

/// Marker preceding the base64 ciphertext of an encrypted contract error in a status text
pub const ENCRYPTED_ERROR_MARKER: &str = "encrypted:";

type Result<T> = std::result::Result<T, CryptoContextError>;

/// The cryptographic capability the decryption pipelines run against.
///
/// Implementations own the tx sender key material and treat it as read-only.
pub trait CryptoContext {
    /// Encrypts `plaintext` for the enclave and returns the encoded [`EncryptedBlob`].
    ///
    /// Every call uses a fresh nonce.
    ///
    /// # Errors
    /// Returns an error if the encryption fails.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypts a ciphertext produced for the tx sender under `nonce`.
    ///
    /// # Errors
    /// Returns an error on authentication failure or malformed ciphertext.
    fn decrypt(&self, ciphertext: &[u8], nonce: &Nonce) -> Result<Vec<u8>>;

    /// Decrypts the encrypted error embedded in a status text.
    ///
    /// # Errors
    /// Returns an error if the status text holds no encrypted error, or if the
    /// embedded ciphertext fails to decrypt under `nonce`.
    fn decrypt_error(&self, raw_status_text: &str, nonce: &Nonce) -> Result<Vec<u8>>;

    /// Returns the tx sender key pair.
    ///
    /// # Errors
    /// Returns an error if the key material is unavailable.
    fn get_tx_sender_keypair(&self) -> Result<(StaticSecret, PublicKey)>;
}

/// [`CryptoContext`] for contracts executed inside the enclave.
///
/// Messages are encrypted with a key derived from the x25519 shared secret
/// between the tx sender key and the enclave io public key, salted with the
/// per-message nonce.
pub struct WasmCryptoContext {
    /// The tx sender key pair
    key_manager: X25519KeyPairManager,
    /// The enclave io public key, published by the chain
    io_public_key: [u8; X25519_KEY_SIZE],
    /// Marker preceding encrypted errors in status texts
    encrypted_error_marker: String,
}

impl WasmCryptoContext {
    /// Constructor
    #[must_use]
    pub fn new(key_manager: X25519KeyPairManager, io_public_key: [u8; X25519_KEY_SIZE]) -> Self {
        Self {
            key_manager,
            io_public_key,
            encrypted_error_marker: ENCRYPTED_ERROR_MARKER.to_string(),
        }
    }

    /// Replaces the marker `decrypt_error` looks for in status texts
    #[must_use]
    pub fn with_encrypted_error_marker(mut self, marker: impl Into<String>) -> Self {
        self.encrypted_error_marker = marker.into();
        self
    }

    /// Returns the tx sender public key
    #[must_use]
    pub fn get_public_key(&self) -> PublicKey {
        self.key_manager.get_public_key()
    }

    /// Encrypts `plaintext` under a caller supplied nonce and returns the encoded blob
    ///
    /// # Errors
    /// Returns an error if the encryption fails.
    pub fn encrypt_with_nonce(&self, plaintext: &[u8], nonce: Nonce) -> Result<Vec<u8>> {
        let ciphertext = self
            .key_manager
            .encrypt_plaintext(self.io_public_key, plaintext, &nonce)?;
        let blob = EncryptedBlob {
            nonce,
            sender_public_key: self.key_manager.get_public_key().to_bytes(),
            ciphertext,
        };
        Ok(blob.encode())
    }
}

impl CryptoContext for WasmCryptoContext {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = rand::random::<[u8; NONCE_SIZE]>();
        self.encrypt_with_nonce(plaintext, nonce)
    }

    fn decrypt(&self, ciphertext: &[u8], nonce: &Nonce) -> Result<Vec<u8>> {
        self.key_manager
            .decrypt_ciphertext(self.io_public_key, ciphertext, nonce)
            .map_err(|e| CryptoContextError::DecryptionFailed(e.to_string()))
    }

    #[instrument(level = "trace", skip_all)]
    fn decrypt_error(&self, raw_status_text: &str, nonce: &Nonce) -> Result<Vec<u8>> {
        let ciphertext_b64 = extract_encrypted_error(raw_status_text, &self.encrypted_error_marker)
            .ok_or(CryptoContextError::EncryptedErrorNotFound)?;
        let ciphertext = BASE64_STANDARD.decode(ciphertext_b64)?;
        self.decrypt(&ciphertext, nonce)
    }

    fn get_tx_sender_keypair(&self) -> Result<(StaticSecret, PublicKey)> {
        Ok((
            self.key_manager.get_secret_key(),
            self.key_manager.get_public_key(),
        ))
    }
}

/// Extracts the base64 ciphertext of an encrypted error from a status text.
///
/// The enclave reports contract errors as `... encrypted: <base64>: <context>`,
/// the ciphertext runs from `marker` up to the next `:`, surrounding
/// whitespace excluded.
#[must_use]
pub fn extract_encrypted_error<'a>(raw_status_text: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }
    let start = raw_status_text.find(marker)? + marker.len();
    let rest = &raw_status_text[start..];
    let end = rest.find(':')?;
    let ciphertext = rest[..end].trim();
    (!ciphertext.is_empty()).then_some(ciphertext)
}

#[derive(Debug, Error)]
pub enum CryptoContextError {
    #[error("Key management error: {0}")]
    KeyManagementError(#[from] KeyManagementError),
    #[error("Failed to decrypt ciphertext: {0}")]
    DecryptionFailed(String),
    #[error("No encrypted error found in status text")]
    EncryptedErrorNotFound,
    #[error("Failed to decode encrypted error as base64: {0}")]
    EncryptedErrorDecodeError(#[from] base64::DecodeError),
}
