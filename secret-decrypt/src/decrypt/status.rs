use secret_confidential::{context::ENCRYPTED_ERROR_MARKER, CryptoContext};
use tracing::instrument;

use super::first_successful_nonce;
use crate::nonces::NonceLedger;

/// Status codes of failed contract instantiations, executions and migrations
pub const DEFAULT_ENCRYPTED_ERROR_CODES: [u32; 3] = [4, 5, 11];

/// Marker of an encrypted contract error in a status text, the same one the
/// crypto context extracts ciphertexts behind
pub const DEFAULT_ENCRYPTED_ERROR_MARKER: &str = ENCRYPTED_ERROR_MARKER;

/// Marker of an internal enclave error, reported in plaintext
pub const DEFAULT_ENCLAVE_ERROR_MARKER: &str = "EnclaveErr";

/// Marker of a failed contract query in a ledger error
pub const DEFAULT_QUERY_ERROR_MARKER: &str = "query contract failed";

/// How a status text has to be treated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    /// A contract error, encrypted for the tx sender
    EncryptedError,
    /// An enclave error, reported in plaintext
    PlaintextEnclaveError,
    /// Anything else, including success
    Ordinary,
}

/// Recognizes encrypted and enclave errors in status texts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusClassifier {
    pub encrypted_error_codes: Vec<u32>,
    pub encrypted_error_marker: String,
    pub enclave_error_marker: String,
    pub query_error_marker: String,
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self {
            encrypted_error_codes: DEFAULT_ENCRYPTED_ERROR_CODES.to_vec(),
            encrypted_error_marker: DEFAULT_ENCRYPTED_ERROR_MARKER.to_string(),
            enclave_error_marker: DEFAULT_ENCLAVE_ERROR_MARKER.to_string(),
            query_error_marker: DEFAULT_QUERY_ERROR_MARKER.to_string(),
        }
    }
}

impl StatusClassifier {
    #[must_use]
    pub fn is_encrypted_error_code(&self, status_code: u32) -> bool {
        self.encrypted_error_codes.contains(&status_code)
    }

    #[must_use]
    pub fn contains_encrypted_error(&self, text: &str) -> bool {
        text.contains(&self.encrypted_error_marker)
    }

    #[must_use]
    pub fn contains_enclave_error(&self, text: &str) -> bool {
        text.contains(&self.enclave_error_marker)
    }

    #[must_use]
    pub fn contains_query_error(&self, text: &str) -> bool {
        text.contains(&self.query_error_marker)
    }

    /// Classifies a transaction status, the classes are mutually exclusive
    #[must_use]
    pub fn classify(&self, status_code: u32, raw_status_text: &str) -> StatusClass {
        if self.is_encrypted_error_code(status_code)
            && self.contains_encrypted_error(raw_status_text)
        {
            StatusClass::EncryptedError
        } else if self.contains_enclave_error(raw_status_text) {
            StatusClass::PlaintextEnclaveError
        } else {
            StatusClass::Ordinary
        }
    }
}

/// The error of a transaction, as recovered by [`decrypt_status_error`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecryptedStatus {
    /// Decrypted contract error, prefixed with the index of the failing message
    pub output_error: String,
    /// Enclave error, copied from the status text
    pub plaintext_error: String,
}

/// Recovers the error of a failed transaction.
///
/// An encrypted contract error is decrypted with the first nonce it decrypts
/// under, that nonce also identifies the failing message. Nothing is
/// recovered if no nonce works.
#[instrument(level = "trace", skip_all, fields(status_code = status_code))]
pub fn decrypt_status_error<C: CryptoContext + ?Sized>(
    status_code: u32,
    raw_status_text: &str,
    nonces: &NonceLedger,
    ctx: &C,
    classifier: &StatusClassifier,
) -> DecryptedStatus {
    match classifier.classify(status_code, raw_status_text) {
        StatusClass::EncryptedError => {
            let output_error = first_successful_nonce(nonces, |nonce| {
                ctx.decrypt_error(raw_status_text, nonce)
            })
            .map(|(index, plaintext)| {
                format!(
                    "message index {index}: {}",
                    String::from_utf8_lossy(&plaintext)
                )
            })
            .unwrap_or_else(|| {
                tracing::debug!(
                    target = "secret-decrypt",
                    event = "status_error_not_decrypted",
                    status_code,
                    "Encrypted error did not decrypt under any message nonce"
                );
                String::new()
            });
            DecryptedStatus {
                output_error,
                plaintext_error: String::new(),
            }
        }
        StatusClass::PlaintextEnclaveError => DecryptedStatus {
            output_error: String::new(),
            plaintext_error: raw_status_text.to_string(),
        },
        StatusClass::Ordinary => DecryptedStatus::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let classifier = StatusClassifier::default();
        assert_eq!(
            classifier.classify(5, "message index: 0: encrypted: AAEC: execute contract failed"),
            StatusClass::EncryptedError
        );
        assert_eq!(
            classifier.classify(3, "encrypted: AAEC: x"),
            StatusClass::Ordinary
        );
        assert_eq!(
            classifier.classify(3, "EnclaveErr: failed to verify transaction signature"),
            StatusClass::PlaintextEnclaveError
        );
        assert_eq!(
            classifier.classify(11, "EnclaveErr without ciphertext"),
            StatusClass::PlaintextEnclaveError
        );
        assert_eq!(classifier.classify(0, ""), StatusClass::Ordinary);
    }

    #[test]
    fn test_custom_markers() {
        let classifier = StatusClassifier {
            encrypted_error_codes: vec![42],
            encrypted_error_marker: "sealed:".to_string(),
            enclave_error_marker: "TeeFault".to_string(),
            query_error_marker: "query failed".to_string(),
        };
        assert_eq!(classifier.classify(42, "sealed: AA: x"), StatusClass::EncryptedError);
        assert_eq!(classifier.classify(5, "encrypted: AA: x"), StatusClass::Ordinary);
        assert_eq!(classifier.classify(0, "TeeFault"), StatusClass::PlaintextEnclaveError);
        assert!(classifier.contains_query_error("rpc error: query failed: x"));
        assert!(!classifier.contains_query_error("query contract failed"));
    }
}
