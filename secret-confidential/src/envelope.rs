use secret_utils::encryption::NONCE_BYTE_SIZE;
use thiserror::Error;

/// Size of the envelope nonce in bytes
pub const NONCE_SIZE: usize = NONCE_BYTE_SIZE;

/// Size of the x25519 public key of the original tx sender in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of the fixed `nonce || sender_public_key` header
pub const ENCRYPTED_BLOB_HEADER_SIZE: usize = NONCE_SIZE + PUBLIC_KEY_SIZE;

/// Per-message nonce, used both to decrypt a message and to correlate its outputs
pub type Nonce = [u8; NONCE_SIZE];

type Result<T> = std::result::Result<T, EnvelopeError>;

/// The wire-level container of an encrypted contract message.
///
/// Serialized as a straight concatenation without length prefixes:
///
/// ```text
/// +-----------+-------------------------+------------------+
/// | nonce: 32 | sender_public_key: 32   | ciphertext: rest |
/// +-----------+-------------------------+------------------+
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// Nonce the ciphertext was encrypted under
    pub nonce: Nonce,
    /// x25519 public key of the party that encrypted the message
    pub sender_public_key: [u8; PUBLIC_KEY_SIZE],
    /// Encrypted payload, possibly empty
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Parses an encrypted blob.
    ///
    /// Only the header length is validated, the ciphertext is taken as-is.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::TooShort` if the blob is shorter than
    /// [`ENCRYPTED_BLOB_HEADER_SIZE`].
    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.len() < ENCRYPTED_BLOB_HEADER_SIZE {
            return Err(EnvelopeError::TooShort { len: blob.len() });
        }
        let (nonce, rest) = blob.split_at(NONCE_SIZE);
        let (sender_public_key, ciphertext) = rest.split_at(PUBLIC_KEY_SIZE);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(nonce);
        let mut public_key_bytes = [0u8; PUBLIC_KEY_SIZE];
        public_key_bytes.copy_from_slice(sender_public_key);

        Ok(Self {
            nonce: nonce_bytes,
            sender_public_key: public_key_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Serializes the blob as `nonce || sender_public_key || ciphertext`
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ENCRYPTED_BLOB_HEADER_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.sender_public_key);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Encrypted blob of {len} bytes is shorter than the 64 byte header")]
    TooShort { len: usize },
}
