use std::path::Path;

use secret_utils::encryption::{
    decrypt_ciphertext, encrypt_plaintext, EncryptionError, NONCE_BYTE_SIZE,
};
use thiserror::Error;
use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};

/// Size of an x25519 secret or public key in bytes
pub const X25519_KEY_SIZE: usize = 32;

type Result<T> = std::result::Result<T, KeyManagementError>;

/// A struct that manages the tx sender's X25519 key pair.
///
/// `X25519KeyPairManager` handles:
/// - Loading the tx sender key from its key file
/// - Public key access for sender identity checks
/// - Shared secret computation with the enclave's io public key
pub struct X25519KeyPairManager {
    /// The X25519 static secret every confidential message of this sender is
    /// encrypted with.
    secret_key: StaticSecret,
}

impl X25519KeyPairManager {
    /// Creates a manager holding a freshly generated random key
    #[must_use]
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let secret_key = StaticSecret::random_from_rng(&mut rng);
        Self { secret_key }
    }

    /// Creates a manager from raw secret key bytes
    #[must_use]
    pub fn from_secret_bytes(secret_bytes: [u8; X25519_KEY_SIZE]) -> Self {
        Self {
            secret_key: StaticSecret::from(secret_bytes),
        }
    }

    /// Creates a manager from a hex encoded secret key.
    ///
    /// Surrounding whitespace and an optional `0x` prefix are ignored.
    ///
    /// # Errors
    /// Returns an error if the string is not valid hex or does not hold exactly 32 bytes.
    pub fn from_hex(secret_hex: &str) -> Result<Self> {
        let secret_hex = secret_hex.trim();
        let secret_hex = secret_hex.strip_prefix("0x").unwrap_or(secret_hex);
        let secret_bytes = hex::decode(secret_hex)?;
        let secret_bytes: [u8; X25519_KEY_SIZE] = secret_bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyManagementError::InvalidKeyLength(secret_bytes.len()))?;
        Ok(Self::from_secret_bytes(secret_bytes))
    }

    /// Loads the tx sender key from a file containing the hex encoded secret key.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not contain a valid key.
    pub fn from_file_path<P: AsRef<Path>>(key_file_path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(key_file_path)?;
        Self::from_hex(&contents)
    }

    /// Returns the X25519 public key matching the managed secret.
    ///
    /// This is the key embedded in every encrypted blob this sender produces,
    /// and the one compared against when recovering a committed transaction.
    #[must_use]
    pub fn get_public_key(&self) -> PublicKey {
        PublicKey::from(&self.secret_key)
    }

    /// Returns a copy of the managed secret key
    #[must_use]
    pub fn get_secret_key(&self) -> StaticSecret {
        self.secret_key.clone()
    }

    /// Computes the shared secret between the current secret key and a given public key.
    ///
    /// # Returns
    /// - `SharedSecret` - The shared secret
    #[must_use]
    pub fn compute_shared_secret(&self, public_key: &PublicKey) -> SharedSecret {
        self.secret_key.diffie_hellman(public_key)
    }

    /// Decrypts a ciphertext using X25519 key exchange and symmetric encryption.
    ///
    /// # Arguments
    /// * `public_key` - The peer's X25519 public key as a 32-byte array
    /// * `ciphertext` - The encrypted data to be decrypted
    /// * `nonce` - The envelope nonce the data was encrypted under
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - The decrypted plaintext as a byte vector
    /// * `Err(KeyManagementError)` - If decryption fails
    pub fn decrypt_ciphertext(
        &self,
        public_key: [u8; X25519_KEY_SIZE],
        ciphertext: &[u8],
        nonce: &[u8; NONCE_BYTE_SIZE],
    ) -> Result<Vec<u8>> {
        let public_key = PublicKey::from(public_key);
        let shared_secret = self.compute_shared_secret(&public_key);
        Ok(decrypt_ciphertext(&shared_secret, ciphertext, nonce)?)
    }

    /// Encrypts plaintext using X25519 key exchange and symmetric encryption.
    ///
    /// # Arguments
    /// * `public_key` - The peer's X25519 public key as a 32-byte array
    /// * `plaintext` - The data to be encrypted
    /// * `nonce` - The envelope nonce to key the message with
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - The encrypted ciphertext
    /// * `Err(KeyManagementError)` - If encryption fails
    pub fn encrypt_plaintext(
        &self,
        public_key: [u8; X25519_KEY_SIZE],
        plaintext: &[u8],
        nonce: &[u8; NONCE_BYTE_SIZE],
    ) -> Result<Vec<u8>> {
        let public_key = PublicKey::from(public_key);
        let shared_secret = self.compute_shared_secret(&public_key);
        Ok(encrypt_plaintext(plaintext, &shared_secret, nonce, None)?)
    }
}

impl Default for X25519KeyPairManager {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum KeyManagementError {
    #[error("Encryption error: `{0}`")]
    EncryptionError(#[from] EncryptionError),
    #[error("Invalid hex encoding of key: `{0}`")]
    InvalidKeyHex(#[from] hex::FromHexError),
    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("Failed to read key file: `{0}`")]
    KeyFileError(#[from] std::io::Error),
}
