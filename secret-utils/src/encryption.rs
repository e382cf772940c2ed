use aes_gcm::{aead::Aead, Aes256Gcm, Error as AesError, KeyInit};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::SharedSecret;

/// Size of the per-message nonce carried in the encrypted envelope header
pub const NONCE_BYTE_SIZE: usize = 32;

/// Size of the AES-GCM initialization vector prepended to every ciphertext
pub const IV_BYTE_SIZE: usize = 12;

/// Size of the derived symmetric key
pub const SYMMETRIC_KEY_BYTE_SIZE: usize = 32;

type Result<T> = std::result::Result<T, EncryptionError>;

/// Derives the symmetric key for a single message.
///
/// The x25519 shared secret is the input key material and the envelope nonce is
/// used as the HKDF salt, so every message nonce yields an independent key.
///
/// # Errors
/// Returns `EncryptionError::KeyExpansionFailed` if HKDF expansion fails.
pub fn derive_symmetric_key(
    shared_secret: &SharedSecret,
    nonce: &[u8; NONCE_BYTE_SIZE],
) -> Result<[u8; SYMMETRIC_KEY_BYTE_SIZE]> {
    let hkdf = Hkdf::<Sha256>::new(Some(nonce), shared_secret.as_bytes());
    let mut symmetric_key = [0u8; SYMMETRIC_KEY_BYTE_SIZE];
    hkdf.expand(b"", &mut symmetric_key)
        .map_err(EncryptionError::KeyExpansionFailed)?;
    Ok(symmetric_key)
}

/// Decrypts a ciphertext using the provided shared secret and envelope nonce.
///
/// # Arguments
/// * `shared_secret` - The x25519 shared secret between the tx sender and the enclave
/// * `ciphertext` - `iv || sealed bytes`, as produced by [`encrypt_plaintext`]
/// * `nonce` - The envelope nonce the message was encrypted under
///
/// # Returns
/// The decrypted plaintext as a byte vector
///
/// # Errors
/// Returns an error if:
/// - The ciphertext is shorter than the initialization vector
/// - Key derivation fails
/// - Authentication of the ciphertext fails
pub fn decrypt_ciphertext(
    shared_secret: &SharedSecret,
    ciphertext: &[u8],
    nonce: &[u8; NONCE_BYTE_SIZE],
) -> Result<Vec<u8>> {
    if ciphertext.len() < IV_BYTE_SIZE {
        return Err(EncryptionError::CiphertextTooShort(ciphertext.len()));
    }
    let symmetric_key = derive_symmetric_key(shared_secret, nonce)?;
    let (iv, sealed) = ciphertext.split_at(IV_BYTE_SIZE);

    let cipher = Aes256Gcm::new(&symmetric_key.into());
    cipher
        .decrypt(iv.into(), sealed)
        .map_err(EncryptionError::DecryptionFailed)
}

/// Encrypts plaintext using the provided shared secret and envelope nonce.
///
/// # Arguments
/// * `plaintext` - The data to encrypt
/// * `shared_secret` - The x25519 shared secret between the tx sender and the enclave
/// * `nonce` - The envelope nonce to key the message with
/// * `iv` - Optional initialization vector (generated if None)
///
/// # Returns
/// The initialization vector followed by the sealed bytes
///
/// # Errors
/// Returns an error if:
/// - Key derivation fails
/// - Encryption operation fails
pub fn encrypt_plaintext(
    plaintext: &[u8],
    shared_secret: &SharedSecret,
    nonce: &[u8; NONCE_BYTE_SIZE],
    iv: Option<[u8; IV_BYTE_SIZE]>,
) -> Result<Vec<u8>> {
    let symmetric_key = derive_symmetric_key(shared_secret, nonce)?;

    let cipher = Aes256Gcm::new(&symmetric_key.into());
    let iv = iv.unwrap_or_else(rand::random::<[u8; IV_BYTE_SIZE]>);
    let sealed = cipher
        .encrypt(&iv.into(), plaintext)
        .map_err(EncryptionError::EncryptionFailed)?;

    let mut ciphertext = Vec::with_capacity(IV_BYTE_SIZE + sealed.len());
    ciphertext.extend_from_slice(&iv);
    ciphertext.extend_from_slice(&sealed);
    Ok(ciphertext)
}

/// Errors that can occur during encryption/decryption operations
#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("Failed to decrypt ciphertext, with error: `{0}`")]
    DecryptionFailed(AesError),
    #[error("Failed to encrypt plaintext, with error: `{0}`")]
    EncryptionFailed(AesError),
    #[error("Failed to expand key, with error: `{0}`")]
    KeyExpansionFailed(hkdf::InvalidLength),
    #[error("Ciphertext of {0} bytes is shorter than the initialization vector")]
    CiphertextTooShort(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use x25519_dalek::{PublicKey, StaticSecret};

    fn shared_secrets() -> (SharedSecret, SharedSecret) {
        let mut rng = rand::thread_rng();
        let sender = StaticSecret::random_from_rng(&mut rng);
        let enclave = StaticSecret::random_from_rng(&mut rng);
        let sender_side = sender.diffie_hellman(&PublicKey::from(&enclave));
        let enclave_side = enclave.diffie_hellman(&PublicKey::from(&sender));
        (sender_side, enclave_side)
    }

    #[test]
    fn test_encrypt_on_one_side_decrypt_on_the_other() {
        let (sender_side, enclave_side) = shared_secrets();
        let nonce = rand::random::<[u8; NONCE_BYTE_SIZE]>();

        let ciphertext = encrypt_plaintext(b"{\"transfer\":{}}", &enclave_side, &nonce, None)
            .expect("Encryption should succeed");
        assert_eq!(ciphertext.len(), IV_BYTE_SIZE + 15 + 16);

        let plaintext =
            decrypt_ciphertext(&sender_side, &ciphertext, &nonce).expect("Decryption should succeed");
        assert_eq!(plaintext, b"{\"transfer\":{}}");
    }

    #[test]
    fn test_decrypt_with_wrong_nonce_fails() {
        let (sender_side, enclave_side) = shared_secrets();
        let nonce = [7u8; NONCE_BYTE_SIZE];
        let other_nonce = [8u8; NONCE_BYTE_SIZE];

        let ciphertext = encrypt_plaintext(b"secret", &enclave_side, &nonce, Some([1u8; 12]))
            .expect("Encryption should succeed");
        let result = decrypt_ciphertext(&sender_side, &ciphertext, &other_nonce);
        assert!(matches!(result, Err(EncryptionError::DecryptionFailed(_))));
    }

    #[test]
    fn test_ciphertext_shorter_than_iv_is_rejected() {
        let (sender_side, _) = shared_secrets();
        let result = decrypt_ciphertext(&sender_side, &[0u8; 5], &[0u8; NONCE_BYTE_SIZE]);
        assert!(matches!(result, Err(EncryptionError::CiphertextTooShort(5))));
    }

    #[test]
    fn test_derived_key_depends_on_nonce() {
        let (sender_side, enclave_side) = shared_secrets();
        let first = derive_symmetric_key(&sender_side, &[1u8; NONCE_BYTE_SIZE]).unwrap();
        let second = derive_symmetric_key(&sender_side, &[2u8; NONCE_BYTE_SIZE]).unwrap();
        assert_ne!(first, second);
        assert_eq!(
            first,
            derive_symmetric_key(&enclave_side, &[1u8; NONCE_BYTE_SIZE]).unwrap()
        );
    }
}
